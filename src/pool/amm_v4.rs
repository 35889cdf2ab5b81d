// DANS: src/pool/amm_v4.rs
// Décodage zero-copy du compte de pool Raydium AMM V4 et du marché OpenBook
// associé, pour produire le descripteur complet d'adresses (PoolKeys) exigé
// par l'instruction de swap du proxy.

use crate::rpc::ResilientRpcClient;
use anyhow::{anyhow, bail, Result};
use bytemuck::{from_bytes, Pod, Zeroable};
use solana_program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use spl_token::state::Account as SplTokenAccount;
use std::mem::size_of;

/// L'ensemble immuable des adresses on-chain décrivant le venue de liquidité
/// d'une paire, enrichi des réserves et des frais pour le quote local.
/// Résolu une fois, jamais muté par le harnais.
#[derive(Debug, Clone)]
pub struct PoolKeys {
    pub amm: Pubkey,
    pub amm_program: Pubkey,
    pub amm_authority: Pubkey,
    pub open_orders: Pubkey,
    pub target_orders: Pubkey,
    pub coin_mint: Pubkey,
    pub pc_mint: Pubkey,
    pub coin_vault: Pubkey,
    pub pc_vault: Pubkey,
    pub market_program: Pubkey,
    pub market: Pubkey,
    pub market_bids: Pubkey,
    pub market_asks: Pubkey,
    pub market_event_queue: Pubkey,
    pub market_coin_vault: Pubkey,
    pub market_pc_vault: Pubkey,
    pub market_vault_signer: Pubkey,
    pub coin_decimals: u8,
    pub pc_decimals: u8,
    pub coin_reserve: u64,
    pub pc_reserve: u64,
    pub trade_fee_numerator: u64,
    pub trade_fee_denominator: u64,
}

// --- Layouts on-chain (format du programme AMM V4, 752 octets) ---

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct Fees {
    min_separate_numerator: u64,
    min_separate_denominator: u64,
    trade_fee_numerator: u64,
    trade_fee_denominator: u64,
    pnl_numerator: u64,
    pnl_denominator: u64,
    swap_fee_numerator: u64,
    swap_fee_denominator: u64,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct StateData {
    need_take_pnl_coin: u64,
    need_take_pnl_pc: u64,
    total_pnl_pc: u64,
    total_pnl_coin: u64,
    pool_open_time: u64,
    punish_pc_amount: u64,
    punish_coin_amount: u64,
    orderbook_to_init_time: u64,
    swap_coin_in_amount: u128,
    swap_pc_out_amount: u128,
    swap_take_pc_fee: u64,
    swap_pc_in_amount: u128,
    swap_coin_out_amount: u128,
    swap_take_coin_fee: u64,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct AmmInfoLayout {
    status: u64,
    nonce: u64,
    order_num: u64,
    depth: u64,
    coin_decimals: u64,
    pc_decimals: u64,
    state: u64,
    reset_flag: u64,
    min_size: u64,
    vol_max_cut_ratio: u64,
    amount_wave: u64,
    coin_lot_size: u64,
    pc_lot_size: u64,
    min_price_multiplier: u64,
    max_price_multiplier: u64,
    sys_decimal_value: u64,
    fees: Fees,
    state_data: StateData,
    token_coin: [u8; 32],
    token_pc: [u8; 32],
    coin_mint: [u8; 32],
    pc_mint: [u8; 32],
    lp_mint: [u8; 32],
    open_orders: [u8; 32],
    market: [u8; 32],
    market_program: [u8; 32],
    target_orders: [u8; 32],
    withdraw_queue: [u8; 32],
    token_temp_lp: [u8; 32],
    amm_owner: [u8; 32],
    lp_amount: u64,
    client_order_id: u64,
    padding: [u64; 2],
}

// L'en-tête du marché OpenBook : 5 octets de préfixe ("serum"), puis 376
// octets de champs. Seules les clés et le nonce du vault signer nous servent.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct MarketHeader {
    account_flags: u64,
    own_address: [u8; 32],
    vault_signer_nonce: u64,
    coin_mint: [u8; 32],
    pc_mint: [u8; 32],
    coin_vault: [u8; 32],
    coin_deposits_total: u64,
    coin_fees_accrued: u64,
    pc_vault: [u8; 32],
    pc_deposits_total: u64,
    pc_fees_accrued: u64,
    pc_dust_threshold: u64,
    request_queue: [u8; 32],
    event_queue: [u8; 32],
    bids: [u8; 32],
    asks: [u8; 32],
    coin_lot_size: u64,
    pc_lot_size: u64,
    fee_rate_bps: u64,
    referrer_rebate_accrued: u64,
}

const MARKET_HEADER_PREFIX: usize = 5;

fn decode_amm_info(data: &[u8]) -> Result<AmmInfoLayout> {
    if data.len() < size_of::<AmmInfoLayout>() {
        bail!(
            "Données de pool AMM V4 trop courtes: {} octets au lieu de {}",
            data.len(),
            size_of::<AmmInfoLayout>()
        );
    }
    let layout: &AmmInfoLayout = from_bytes(&data[..size_of::<AmmInfoLayout>()]);
    let status = layout.status;
    if status == 0 {
        bail!("Le pool n'est pas initialisé (status = 0).");
    }
    Ok(*layout)
}

fn decode_market_header(data: &[u8]) -> Result<MarketHeader> {
    let body = data
        .get(MARKET_HEADER_PREFIX..MARKET_HEADER_PREFIX + size_of::<MarketHeader>())
        .ok_or_else(|| anyhow!("Données du marché OpenBook trop courtes"))?;
    let header: &MarketHeader = from_bytes(body);
    Ok(*header)
}

/// Résout le descripteur complet du pool à partir de son identifiant :
/// décode le compte AMM V4, puis le marché OpenBook qu'il référence, dérive
/// le vault signer et l'autorité de l'AMM, et lit les réserves des vaults.
/// C'est la source authoritaire des adresses mises dans l'instruction ;
/// l'API d'indexation ne fournit que l'identifiant du pool.
pub async fn resolve_pool_keys(
    rpc_client: &ResilientRpcClient,
    pool_id: &Pubkey,
    amm_program: &Pubkey,
) -> Result<PoolKeys> {
    let pool_data = rpc_client.get_account_data(pool_id).await?;
    let amm_info = decode_amm_info(&pool_data)?;

    let market = Pubkey::new_from_array(amm_info.market);
    let market_program = Pubkey::new_from_array(amm_info.market_program);
    let coin_vault = Pubkey::new_from_array(amm_info.token_coin);
    let pc_vault = Pubkey::new_from_array(amm_info.token_pc);

    let accounts_to_fetch = vec![market, coin_vault, pc_vault];
    let mut accounts = rpc_client.get_multiple_accounts(&accounts_to_fetch).await?;

    let market_account = accounts[0]
        .take()
        .ok_or_else(|| anyhow!("Marché OpenBook {} non trouvé", market))?;
    let header = decode_market_header(&market_account.data)?;

    let coin_vault_account = accounts[1]
        .take()
        .ok_or_else(|| anyhow!("Vault coin {} non trouvé", coin_vault))?;
    let coin_reserve = SplTokenAccount::unpack(&coin_vault_account.data)?.amount;

    let pc_vault_account = accounts[2]
        .take()
        .ok_or_else(|| anyhow!("Vault pc {} non trouvé", pc_vault))?;
    let pc_reserve = SplTokenAccount::unpack(&pc_vault_account.data)?.amount;

    // Le vault signer est une PDA du marché, dérivée avec le nonce stocké
    // dans l'en-tête du marché lui-même.
    let vault_signer_nonce = header.vault_signer_nonce;
    let market_vault_signer = Pubkey::create_program_address(
        &[&market.to_bytes(), &vault_signer_nonce.to_le_bytes()],
        &market_program,
    )?;

    let (amm_authority, _) = Pubkey::find_program_address(&[b"amm authority"], amm_program);

    let coin_decimals = amm_info.coin_decimals;
    let pc_decimals = amm_info.pc_decimals;
    let trade_fee_numerator = amm_info.fees.trade_fee_numerator;
    let trade_fee_denominator = amm_info.fees.trade_fee_denominator;

    Ok(PoolKeys {
        amm: *pool_id,
        amm_program: *amm_program,
        amm_authority,
        open_orders: Pubkey::new_from_array(amm_info.open_orders),
        target_orders: Pubkey::new_from_array(amm_info.target_orders),
        coin_mint: Pubkey::new_from_array(amm_info.coin_mint),
        pc_mint: Pubkey::new_from_array(amm_info.pc_mint),
        coin_vault,
        pc_vault,
        market_program,
        market,
        market_bids: Pubkey::new_from_array(header.bids),
        market_asks: Pubkey::new_from_array(header.asks),
        market_event_queue: Pubkey::new_from_array(header.event_queue),
        market_coin_vault: Pubkey::new_from_array(header.coin_vault),
        market_pc_vault: Pubkey::new_from_array(header.pc_vault),
        market_vault_signer,
        coin_decimals: coin_decimals as u8,
        pc_decimals: pc_decimals as u8,
        coin_reserve,
        pc_reserve,
        trade_fee_numerator,
        trade_fee_denominator,
    })
}

impl PoolKeys {
    pub fn fee_as_percent(&self) -> f64 {
        if self.trade_fee_denominator == 0 {
            return 0.0;
        }
        (self.trade_fee_numerator as f64 / self.trade_fee_denominator as f64) * 100.0
    }

    /// Estimation locale du montant de sortie pour `amount_in`, par la formule
    /// du produit constant avec les frais propres du pool. Sert uniquement à
    /// dériver une protection de slippage, jamais à valider le règlement.
    pub fn get_quote(&self, token_in_mint: &Pubkey, amount_in: u64) -> Result<u64> {
        let (in_reserve, out_reserve) = if *token_in_mint == self.coin_mint {
            (self.coin_reserve, self.pc_reserve)
        } else if *token_in_mint == self.pc_mint {
            (self.pc_reserve, self.coin_reserve)
        } else {
            bail!("Le mint {} n'appartient pas à ce pool", token_in_mint);
        };

        if in_reserve == 0 || out_reserve == 0 {
            return Ok(0);
        }

        let fee_numerator = self.trade_fee_numerator as u128;
        let fee_denominator = self.trade_fee_denominator.max(1) as u128;
        let amount_in_after_fee =
            (amount_in as u128).saturating_mul(fee_denominator - fee_numerator) / fee_denominator;

        let denominator = (in_reserve as u128).saturating_add(amount_in_after_fee);
        if denominator == 0 {
            return Ok(0);
        }
        let amount_out = amount_in_after_fee.saturating_mul(out_reserve as u128) / denominator;
        Ok(amount_out as u64)
    }
}

/// Applique une tolérance de slippage (en points de base) à un montant attendu.
pub fn apply_slippage(amount: u64, slippage_bps: u64) -> u64 {
    let kept = 10_000u128.saturating_sub(slippage_bps as u128);
    ((amount as u128).saturating_mul(kept) / 10_000) as u64
}
