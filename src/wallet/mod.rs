// src/wallet/mod.rs

// Les trois préoccupations "portefeuille" du harnais : financement du payeur,
// wrap/unwrap du SOL natif, et comptes de token associés.
pub mod accounts;
pub mod funding;
pub mod wrap;
