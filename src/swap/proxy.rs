// DANS: src/swap/proxy.rs
// Assemblage de l'instruction `amm_swap_base_input` du programme proxy.
// Le proxy relaie le swap vers le programme AMM V4 par CPI ; côté client,
// on lui fournit la liste complète des comptes dans l'ordre de sa struct
// de comptes Anchor.

use crate::pool::PoolKeys;
use anchor_lang::prelude::borsh;
use anchor_lang::AnchorSerialize;
use anyhow::{bail, Result};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey,
    pubkey::Pubkey,
};

pub const SWAP_PROXY_PROGRAM_ID: Pubkey = pubkey!("EYhqyD1Sm6UBxj7yKa9YCcSnQD5a41NmVZXLUCLDKXRt");

// sha256("global:amm_swap_base_input")[..8]
const AMM_SWAP_BASE_INPUT_DISCRIMINATOR: [u8; 8] = [225, 230, 165, 164, 61, 45, 194, 160];

#[derive(AnchorSerialize, Clone, Debug)]
struct AmmSwapBaseInputArgs {
    amount_in: u64,
    minimum_amount_out: u64,
}

/// Une demande de swap, construite à neuf pour chaque appel. Aucun état
/// n'est conservé entre deux swaps.
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub amount_in: u64,
    pub minimum_amount_out: u64,
    pub user_token_source: Pubkey,
    pub user_token_destination: Pubkey,
    pub user_source_owner: Pubkey,
    pub pool: PoolKeys,
}

/// Invariant du harnais : le payeur des frais de transaction doit être le
/// propriétaire déclaré du compte source. Vérifié avant toute construction
/// d'instruction et avant tout appel réseau.
pub fn check_fee_payer(fee_payer: &Pubkey, user_source_owner: &Pubkey) -> Result<()> {
    if fee_payer != user_source_owner {
        bail!(
            "Le payeur des frais ({}) ne correspond pas au propriétaire du compte source ({})",
            fee_payer,
            user_source_owner
        );
    }
    Ok(())
}

/// Construit l'instruction de swap du proxy : 18 comptes dans l'ordre de la
/// struct Anchor du programme, plus les deux arguments numériques.
pub fn build_swap_instruction(request: &SwapRequest) -> Result<Instruction> {
    let pool = &request.pool;

    let args = AmmSwapBaseInputArgs {
        amount_in: request.amount_in,
        minimum_amount_out: request.minimum_amount_out,
    };
    let mut instruction_data = Vec::new();
    instruction_data.extend_from_slice(&AMM_SWAP_BASE_INPUT_DISCRIMINATOR);
    instruction_data.extend_from_slice(&args.try_to_vec()?);

    let keys = vec![
        AccountMeta::new(request.user_source_owner, true),
        AccountMeta::new(pool.amm, false),
        AccountMeta::new_readonly(pool.amm_authority, false),
        AccountMeta::new(pool.open_orders, false),
        AccountMeta::new(pool.coin_vault, false),
        AccountMeta::new(pool.pc_vault, false),
        AccountMeta::new_readonly(pool.market_program, false),
        AccountMeta::new(pool.market, false),
        AccountMeta::new(pool.market_bids, false),
        AccountMeta::new(pool.market_asks, false),
        AccountMeta::new(pool.market_event_queue, false),
        AccountMeta::new(pool.market_coin_vault, false),
        AccountMeta::new(pool.market_pc_vault, false),
        AccountMeta::new(pool.market_vault_signer, false),
        AccountMeta::new(request.user_token_source, false),
        AccountMeta::new(request.user_token_destination, false),
        AccountMeta::new_readonly(pool.amm_program, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ];

    Ok(Instruction {
        program_id: SWAP_PROXY_PROGRAM_ID,
        accounts: keys,
        data: instruction_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> SwapRequest {
        SwapRequest {
            amount_in: 100_000_000,
            minimum_amount_out: 42,
            user_token_source: Pubkey::new_unique(),
            user_token_destination: Pubkey::new_unique(),
            user_source_owner: Pubkey::new_unique(),
            pool: PoolKeys {
                amm: Pubkey::new_unique(),
                amm_program: Pubkey::new_unique(),
                amm_authority: Pubkey::new_unique(),
                open_orders: Pubkey::new_unique(),
                target_orders: Pubkey::new_unique(),
                coin_mint: Pubkey::new_unique(),
                pc_mint: Pubkey::new_unique(),
                coin_vault: Pubkey::new_unique(),
                pc_vault: Pubkey::new_unique(),
                market_program: Pubkey::new_unique(),
                market: Pubkey::new_unique(),
                market_bids: Pubkey::new_unique(),
                market_asks: Pubkey::new_unique(),
                market_event_queue: Pubkey::new_unique(),
                market_coin_vault: Pubkey::new_unique(),
                market_pc_vault: Pubkey::new_unique(),
                market_vault_signer: Pubkey::new_unique(),
                coin_decimals: 9,
                pc_decimals: 6,
                coin_reserve: 0,
                pc_reserve: 0,
                trade_fee_numerator: 25,
                trade_fee_denominator: 10_000,
            },
        }
    }

    #[test]
    fn l_instruction_contient_les_18_comptes_dans_l_ordre() {
        let request = sample_request();
        let instruction = build_swap_instruction(&request).unwrap();

        assert_eq!(instruction.program_id, SWAP_PROXY_PROGRAM_ID);
        assert_eq!(instruction.accounts.len(), 18);

        assert_eq!(instruction.accounts[0].pubkey, request.user_source_owner);
        assert_eq!(instruction.accounts[1].pubkey, request.pool.amm);
        assert_eq!(instruction.accounts[2].pubkey, request.pool.amm_authority);
        assert_eq!(instruction.accounts[13].pubkey, request.pool.market_vault_signer);
        assert_eq!(instruction.accounts[14].pubkey, request.user_token_source);
        assert_eq!(instruction.accounts[15].pubkey, request.user_token_destination);
        assert_eq!(instruction.accounts[16].pubkey, request.pool.amm_program);
        assert_eq!(instruction.accounts[17].pubkey, spl_token::id());
    }

    #[test]
    fn seul_le_proprietaire_signe() {
        let instruction = build_swap_instruction(&sample_request()).unwrap();

        assert!(instruction.accounts[0].is_signer);
        assert!(instruction.accounts[0].is_writable);
        let other_signers = instruction.accounts[1..]
            .iter()
            .filter(|meta| meta.is_signer)
            .count();
        assert_eq!(other_signers, 0);
    }

    #[test]
    fn les_comptes_en_lecture_seule_sont_marques() {
        let instruction = build_swap_instruction(&sample_request()).unwrap();

        // amm_authority, market_program, programme AMM et programme de token.
        for index in [2, 6, 16, 17] {
            assert!(!instruction.accounts[index].is_writable, "compte {}", index);
        }
        // Les vaults et carnets d'ordres sont mutables.
        for index in [1, 3, 4, 5, 7, 8, 9, 10, 11, 12, 13, 14, 15] {
            assert!(instruction.accounts[index].is_writable, "compte {}", index);
        }
    }

    #[test]
    fn les_donnees_sont_discriminateur_puis_arguments_le() {
        let request = sample_request();
        let instruction = build_swap_instruction(&request).unwrap();

        assert_eq!(instruction.data.len(), 24);
        assert_eq!(instruction.data[..8], AMM_SWAP_BASE_INPUT_DISCRIMINATOR);
        assert_eq!(instruction.data[8..16], 100_000_000u64.to_le_bytes());
        assert_eq!(instruction.data[16..24], 42u64.to_le_bytes());
    }

    #[test]
    fn check_fee_payer_accepte_le_proprietaire() {
        let owner = Pubkey::new_unique();
        assert!(check_fee_payer(&owner, &owner).is_ok());
    }

    #[test]
    fn check_fee_payer_rejette_un_payeur_different() {
        let owner = Pubkey::new_unique();
        let intrus = Pubkey::new_unique();
        let err = check_fee_payer(&intrus, &owner).unwrap_err();
        assert!(err.to_string().contains("ne correspond pas"));
    }
}
