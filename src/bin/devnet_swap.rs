// src/bin/devnet_swap.rs
// Scénario de bout en bout contre le programme proxy de swap sur devnet :
// financement, wrap, comptes, résolution du pool, swap, vérification, nettoyage.
// Le flux est strictement linéaire, chaque étape attend la précédente.

use anyhow::{bail, Result};
use proxy_swap::{
    config::Config,
    monitoring::logging::setup_logging,
    pool::{amm_v4, api},
    rpc::ResilientRpcClient,
    swap::{executor, SwapRequest},
    wallet::{accounts, funding, wrap},
};
use solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer};
use std::str::FromStr;
use tracing::info;

const RPC_MAX_RETRIES: u8 = 3;
const RPC_RETRY_DELAY_MS: u64 = 500;

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    println!("--- Harnais de Swap Devnet (Proxy AMM V4) ---");

    let config = Config::load()?;
    let rpc_client = ResilientRpcClient::new(
        config.solana_rpc_url.clone(),
        RPC_MAX_RETRIES,
        RPC_RETRY_DELAY_MS,
    );
    let payer = Keypair::from_base58_string(&config.payer_private_key);
    let wallet = payer.pubkey();

    let quote_mint = Pubkey::from_str(&config.quote_mint)?;
    let token_mint = Pubkey::from_str(&config.token_mint)?;

    println!("Portefeuille payeur : {}", wallet);
    println!("Paire : {} -> {}", quote_mint, token_mint);

    // --- [1/7] Financement (best-effort) et wrap ---
    if config.airdrop_enabled {
        println!("\n[1/7] Financement du portefeuille...");
        funding::ensure_funded(&rpc_client, &wallet, config.airdrop_lamports).await?;

        println!("\n[2/7] Wrap de SOL en WSOL...");
        let wrapped = wrap::wrap_sol(&rpc_client, &payer, config.airdrop_lamports / 2).await?;
        println!("-> ATA WSOL : {}", wrapped);
    } else {
        println!("\n[1/7] Airdrop désactivé, on garde le solde existant.");
        println!("[2/7] Wrap sauté (airdrop désactivé).");
    }

    // --- [3/7] Comptes de token associés ---
    println!("\n[3/7] Résolution des comptes de token...");
    let user_token_source = accounts::get_or_create_ata(&rpc_client, &payer, &quote_mint).await?;
    let user_token_destination =
        accounts::get_or_create_ata(&rpc_client, &payer, &token_mint).await?;
    let balance_before = accounts::token_balance(&rpc_client, &user_token_destination).await?;
    println!("-> Source : {}", user_token_source);
    println!("-> Destination : {} (solde avant swap : {})", user_token_destination, balance_before);

    // --- [4/7] Résolution du pool : API d'indexation puis RPC authoritaire ---
    println!("\n[4/7] Résolution du pool...");
    let api_pool = api::fetch_pool(&config.raydium_api_url, &quote_mint, &token_mint, "standard").await?;
    println!("-> Pool trouvé via l'API : {} ({})", api_pool.id, api_pool.pool_type);

    let pool_id = Pubkey::from_str(&api_pool.id)?;
    let amm_program = Pubkey::from_str(&api_pool.program_id)?;
    let pool_keys = amm_v4::resolve_pool_keys(&rpc_client, &pool_id, &amm_program).await?;
    println!(
        "-> Clés on-chain résolues. Marché : {}. Frais : {:.4}%.",
        pool_keys.market,
        pool_keys.fee_as_percent()
    );

    // --- [5/7] Quote local et protection de slippage ---
    println!("\n[5/7] Quote local...");
    let predicted_out = pool_keys.get_quote(&quote_mint, config.amount_in)?;
    let minimum_amount_out = if config.minimum_amount_out > 0 {
        config.minimum_amount_out
    } else {
        amm_v4::apply_slippage(predicted_out, config.slippage_bps)
    };
    println!(
        "-> Sortie prédite : {} unités de base. Minimum exigé : {}.",
        predicted_out, minimum_amount_out
    );

    // --- [6/7] Exécution du swap via le proxy ---
    println!("\n[6/7] Exécution du swap...");
    let request = SwapRequest {
        amount_in: config.amount_in,
        minimum_amount_out,
        user_token_source,
        user_token_destination,
        user_source_owner: wallet,
        pool: pool_keys,
    };
    let signature = executor::execute_swap(&rpc_client, &payer, &request, true).await?;
    println!("-> Signature : {}", signature);

    // --- [7/7] Vérification du solde puis nettoyage ---
    println!("\n[7/7] Vérification et nettoyage...");
    let balance_after = accounts::token_balance(&rpc_client, &user_token_destination).await?;
    println!(
        "-> Solde de destination : {} avant, {} après.",
        balance_before, balance_after
    );
    if balance_after <= balance_before {
        bail!(
            "Le solde de destination n'a pas augmenté ({} -> {}).",
            balance_before,
            balance_after
        );
    }
    info!(
        "[Harnais] Swap réglé : +{} unités de base sur le compte de destination.",
        balance_after - balance_before
    );

    // On ferme le compte WSOL temporaire créé par l'étape de wrap ; le solde
    // restant retourne au propriétaire.
    wrap::close_wsol_account(&rpc_client, &payer, &user_token_source).await?;
    println!("-> Compte WSOL temporaire fermé.");

    println!("\n✅ Scénario terminé avec succès.");
    Ok(())
}
