use crate::rpc::ResilientRpcClient;
use anyhow::{Context, Result};
use solana_sdk::{
    instruction::Instruction,
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    system_instruction,
};
use spl_associated_token_account::get_associated_token_address;
use tracing::info;

/// Construit le plan d'instructions pour wrapper `lamports` de SOL natif
/// dans l'ATA WSOL du propriétaire. La création de l'ATA n'est planifiée
/// que si le compte n'existe pas encore : rejouer l'étape sur un compte
/// existant ne produit que le transfert et le SyncNative.
pub fn wrap_instructions(
    payer: &Pubkey,
    wsol_ata: &Pubkey,
    ata_exists: bool,
    lamports: u64,
) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();

    if !ata_exists {
        instructions.push(
            spl_associated_token_account::instruction::create_associated_token_account(
                payer,
                payer,
                &spl_token::native_mint::id(),
                &spl_token::id(),
            ),
        );
    }

    // On transfère les SOL natifs vers l'ATA, puis SyncNative met à jour
    // le solde WSOL pour refléter les lamports reçus.
    instructions.push(system_instruction::transfer(payer, wsol_ata, lamports));
    instructions.push(spl_token::instruction::sync_native(
        &spl_token::id(),
        wsol_ata,
    )?);

    Ok(instructions)
}

/// Instruction de fermeture de l'ATA WSOL : le solde restant (les lamports
/// du compte) retourne au propriétaire, qui est aussi l'autorité.
pub fn close_instruction(owner: &Pubkey, wsol_ata: &Pubkey) -> Result<Instruction> {
    let instruction =
        spl_token::instruction::close_account(&spl_token::id(), wsol_ata, owner, owner, &[])?;
    Ok(instruction)
}

/// Wrap `lamports` de SOL natif dans l'ATA WSOL du payeur.
/// Retourne l'adresse de l'ATA WSOL.
pub async fn wrap_sol(
    rpc_client: &ResilientRpcClient,
    payer: &Keypair,
    lamports: u64,
) -> Result<Pubkey> {
    let owner = payer.pubkey();
    let wsol_ata = get_associated_token_address(&owner, &spl_token::native_mint::id());

    let ata_exists = rpc_client.get_account(&wsol_ata).await.is_ok();
    let instructions = wrap_instructions(&owner, &wsol_ata, ata_exists, lamports)?;

    let recent_blockhash = rpc_client.get_latest_blockhash().await?;
    let message = VersionedMessage::V0(v0::Message::try_compile(
        &owner,
        &instructions,
        &[],
        recent_blockhash,
    )?);
    let transaction = solana_sdk::transaction::VersionedTransaction::try_new(message, &[payer])?;

    let signature = rpc_client
        .send_and_confirm_transaction(&transaction)
        .await
        .context("La transaction de wrap SOL -> WSOL a échoué")?;

    info!(
        "[Wrap] {} lamports wrappés dans {}. Signature : {}",
        lamports, wsol_ata, signature
    );
    Ok(wsol_ata)
}

/// Ferme le compte WSOL temporaire créé par l'étape de wrap et renvoie
/// les lamports restants au propriétaire.
pub async fn close_wsol_account(
    rpc_client: &ResilientRpcClient,
    payer: &Keypair,
    wsol_ata: &Pubkey,
) -> Result<Signature> {
    let owner = payer.pubkey();
    let instructions = vec![close_instruction(&owner, wsol_ata)?];

    let recent_blockhash = rpc_client.get_latest_blockhash().await?;
    let message = VersionedMessage::V0(v0::Message::try_compile(
        &owner,
        &instructions,
        &[],
        recent_blockhash,
    )?);
    let transaction = solana_sdk::transaction::VersionedTransaction::try_new(message, &[payer])?;

    let signature = rpc_client
        .send_and_confirm_transaction(&transaction)
        .await
        .context("La fermeture du compte WSOL temporaire a échoué")?;

    info!("[Cleanup] Compte WSOL {} fermé. Signature : {}", wsol_ata, signature);
    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> (Pubkey, Pubkey) {
        let owner = Pubkey::new_unique();
        let wsol_ata = get_associated_token_address(&owner, &spl_token::native_mint::id());
        (owner, wsol_ata)
    }

    #[test]
    fn wrap_cree_l_ata_quand_il_est_absent() {
        let (owner, wsol_ata) = keys();
        let instructions = wrap_instructions(&owner, &wsol_ata, false, 500_000_000).unwrap();

        assert_eq!(instructions.len(), 3);
        assert_eq!(instructions[0].program_id, spl_associated_token_account::id());
        assert_eq!(instructions[1].program_id, solana_sdk::system_program::id());
        assert_eq!(instructions[2].program_id, spl_token::id());
    }

    #[test]
    fn wrap_est_idempotent_quand_l_ata_existe() {
        let (owner, wsol_ata) = keys();
        let instructions = wrap_instructions(&owner, &wsol_ata, true, 500_000_000).unwrap();

        // Pas de seconde création : uniquement transfert + SyncNative.
        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[0].program_id, solana_sdk::system_program::id());
        assert_eq!(instructions[1].program_id, spl_token::id());
    }

    #[test]
    fn wrap_transfere_le_bon_montant_vers_l_ata() {
        let (owner, wsol_ata) = keys();
        let instructions = wrap_instructions(&owner, &wsol_ata, true, 123_456).unwrap();

        let expected = system_instruction::transfer(&owner, &wsol_ata, 123_456);
        assert_eq!(instructions[0], expected);
    }

    #[test]
    fn close_cible_l_ata_et_credite_le_proprietaire() {
        let (owner, wsol_ata) = keys();
        let instruction = close_instruction(&owner, &wsol_ata).unwrap();

        assert_eq!(instruction.program_id, spl_token::id());
        // Ordre des comptes de close_account : compte à fermer, destination, autorité.
        assert_eq!(instruction.accounts[0].pubkey, wsol_ata);
        assert_eq!(instruction.accounts[1].pubkey, owner);
        assert_eq!(instruction.accounts[2].pubkey, owner);
        assert!(instruction.accounts[2].is_signer);
    }
}
