// src/pool/mod.rs

// Résolution d'un pool en deux temps : l'API d'indexation Raydium fournit
// l'identifiant du pool, puis le RPC fournit l'ensemble authoritaire des
// adresses on-chain (vaults, open orders, comptes du marché OpenBook).
pub mod amm_v4;
pub mod api;

pub use amm_v4::PoolKeys;
