use crate::rpc::ResilientRpcClient;
use anyhow::{Context, Result};
use solana_sdk::{
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    transaction::VersionedTransaction,
};
use spl_associated_token_account::get_associated_token_address;
use tracing::info;

/// Retourne l'ATA du payeur pour `mint`, en le créant s'il n'existe pas encore.
pub async fn get_or_create_ata(
    rpc_client: &ResilientRpcClient,
    payer: &Keypair,
    mint: &Pubkey,
) -> Result<Pubkey> {
    let owner = payer.pubkey();
    let ata = get_associated_token_address(&owner, mint);

    if rpc_client.get_account(&ata).await.is_ok() {
        return Ok(ata);
    }

    info!("[Accounts] ATA absent pour le mint {}, création de {}...", mint, ata);

    let create_ata_instruction =
        spl_associated_token_account::instruction::create_associated_token_account(
            &owner,
            &owner,
            mint,
            &spl_token::id(),
        );

    let recent_blockhash = rpc_client.get_latest_blockhash().await?;
    let message = VersionedMessage::V0(v0::Message::try_compile(
        &owner,
        &[create_ata_instruction],
        &[],
        recent_blockhash,
    )?);
    let transaction = VersionedTransaction::try_new(message, &[payer])?;

    let signature = rpc_client
        .send_and_confirm_transaction(&transaction)
        .await
        .with_context(|| format!("La création de l'ATA pour le mint {} a échoué", mint))?;

    info!("[Accounts] ATA {} créé. Signature : {}", ata, signature);
    Ok(ata)
}

/// Solde brut (en unités de base) d'un compte de token. Un compte inexistant
/// est traité comme un solde nul.
pub async fn token_balance(rpc_client: &ResilientRpcClient, ata: &Pubkey) -> Result<u64> {
    if rpc_client.get_account(ata).await.is_err() {
        return Ok(0);
    }

    let amount = rpc_client.get_token_account_balance(ata).await?;
    let balance = amount
        .amount
        .parse::<u64>()
        .with_context(|| format!("Solde de token illisible pour {}", ata))?;
    Ok(balance)
}
