// DANS: src/swap/executor.rs
// Construction, simulation préalable et envoi de la transaction de swap.

use crate::rpc::ResilientRpcClient;
use crate::swap::proxy::{build_swap_instruction, check_fee_payer, SwapRequest};
use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use solana_account_decoder::{UiAccountData, UiAccountEncoding};
use solana_client::rpc_config::{
    RpcSimulateTransactionAccountsConfig, RpcSimulateTransactionConfig,
};
use solana_program_pack::Pack;
use solana_sdk::{
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::VersionedTransaction,
};
use solana_transaction_status::UiTransactionEncoding;
use spl_token::state::Account as SplTokenAccount;
use tracing::{error, info};

/// Exécute la demande de swap : vérifie l'invariant payeur/propriétaire,
/// construit la transaction V0, la simule si demandé, puis l'envoie et
/// attend la confirmation. Un échec d'envoi est loggé puis propagé, sans
/// nouvel essai.
pub async fn execute_swap(
    rpc_client: &ResilientRpcClient,
    payer: &Keypair,
    request: &SwapRequest,
    simulate_first: bool,
) -> Result<Signature> {
    // L'invariant est vérifié avant de construire quoi que ce soit.
    check_fee_payer(&payer.pubkey(), &request.user_source_owner)?;

    let swap_instruction = build_swap_instruction(request)?;

    let recent_blockhash = rpc_client.get_latest_blockhash().await?;
    let message = VersionedMessage::V0(v0::Message::try_compile(
        &payer.pubkey(),
        &[swap_instruction],
        &[],
        recent_blockhash,
    )?);
    let transaction = VersionedTransaction::try_new(message, &[payer])?;

    if simulate_first {
        let simulated_out =
            simulate_destination_delta(rpc_client, &transaction, &request.user_token_destination)
                .await?;
        info!(
            "[Swap] Simulation passée : le compte de destination recevrait {} unités de base.",
            simulated_out
        );
    }

    match rpc_client.send_and_confirm_transaction(&transaction).await {
        Ok(signature) => {
            info!("[Swap] Transaction confirmée. Signature : {}", signature);
            Ok(signature)
        }
        Err(e) => {
            error!("[Swap] La transaction de swap a échoué : {:?}", e);
            Err(e).context("La transaction de swap a échoué")
        }
    }
}

/// Simule la transaction en demandant au RPC l'état post-simulation du compte
/// de destination, et retourne le gain simulé de ce compte. Échoue si la
/// simulation elle-même échoue.
async fn simulate_destination_delta(
    rpc_client: &ResilientRpcClient,
    transaction: &VersionedTransaction,
    destination: &Pubkey,
) -> Result<u64> {
    let initial_balance = match rpc_client.get_account(destination).await {
        Ok(account) => SplTokenAccount::unpack(&account.data)?.amount,
        Err(_) => 0,
    };

    let sim_config = RpcSimulateTransactionConfig {
        sig_verify: false,
        replace_recent_blockhash: true,
        commitment: Some(rpc_client.commitment()),
        encoding: Some(UiTransactionEncoding::Base64),
        accounts: Some(RpcSimulateTransactionAccountsConfig {
            encoding: Some(UiAccountEncoding::Base64),
            addresses: vec![destination.to_string()],
        }),
        ..Default::default()
    };

    let sim_response = rpc_client
        .simulate_transaction_with_config(transaction, sim_config)
        .await?;
    let sim_result = sim_response.value;

    if let Some(err) = sim_result.err {
        error!("[Swap] Erreur de simulation : {:?}", err);
        error!("[Swap] Logs : {:?}", sim_result.logs);
        bail!("La simulation du swap a échoué : {:?}", err);
    }

    let post_accounts = sim_result
        .accounts
        .ok_or_else(|| anyhow!("La simulation n'a pas retourné l'état des comptes."))?;
    let destination_state = post_accounts
        .first()
        .and_then(|account| account.as_ref())
        .ok_or_else(|| anyhow!("L'état du compte de destination n'a pas été retourné."))?;

    let decoded_data = match &destination_state.data {
        UiAccountData::Binary(data_str, _) => STANDARD.decode(data_str)?,
        _ => bail!("Format de données de compte inattendu."),
    };
    let post_balance = SplTokenAccount::unpack(&decoded_data)?.amount;

    Ok(post_balance.saturating_sub(initial_balance))
}
