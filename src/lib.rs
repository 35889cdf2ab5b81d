// src/lib.rs

// On déclare tous nos modules principaux pour les rendre publics et
// utilisables par le binaire du harnais (devnet_swap.rs).
pub mod config;
pub mod monitoring;
pub mod pool;
pub mod rpc;
pub mod swap;
pub mod wallet;
