use crate::rpc::ResilientRpcClient;
use anyhow::Result;
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};

/// S'assure que le portefeuille dispose d'au moins `target_lamports`.
/// Si le solde est déjà suffisant, ne fait rien (l'étape est idempotente).
/// Sinon, demande un airdrop et attend sa confirmation. Un échec d'airdrop
/// n'est jamais fatal : on logge un avertissement et on continue avec le
/// solde existant.
///
/// Retourne le solde du portefeuille après l'étape.
pub async fn ensure_funded(
    rpc_client: &ResilientRpcClient,
    wallet: &Pubkey,
    target_lamports: u64,
) -> Result<u64> {
    let balance = rpc_client.get_balance(wallet).await?;
    if balance >= target_lamports {
        info!(
            "[Funding] Solde suffisant ({} lamports >= {}), pas d'airdrop.",
            balance, target_lamports
        );
        return Ok(balance);
    }

    info!(
        "[Funding] Solde insuffisant ({} lamports). Demande d'airdrop de {} lamports...",
        balance, target_lamports
    );

    match rpc_client.request_airdrop(wallet, target_lamports).await {
        Ok(signature) => {
            let recent_blockhash = rpc_client.get_latest_blockhash().await?;
            if let Err(e) = rpc_client
                .confirm_transaction(&signature, &recent_blockhash)
                .await
            {
                warn!(
                    "[Funding] Airdrop non confirmé, on continue avec le solde existant : {:?}",
                    e
                );
            } else {
                info!("[Funding] Airdrop confirmé. Signature : {}", signature);
            }
        }
        Err(e) => {
            // Un seul essai : le faucet devnet est capricieux, ce n'est pas bloquant.
            warn!(
                "[Funding] L'airdrop a échoué, on continue avec le solde existant : {:?}",
                e
            );
        }
    }

    let balance = rpc_client.get_balance(wallet).await?;
    info!("[Funding] Solde final du portefeuille : {} lamports", balance);
    Ok(balance)
}
