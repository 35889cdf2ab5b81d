// src/swap/mod.rs

pub mod executor;
pub mod proxy;

pub use proxy::SwapRequest;
