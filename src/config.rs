use anyhow::Result;
use serde::Deserialize;

// Le mint natif WSOL, identique sur tous les clusters.
fn default_quote_mint() -> String {
    "So11111111111111111111111111111111111111112".to_string()
}

// L'API V3 de Raydium pour le devnet.
fn default_raydium_api_url() -> String {
    "https://api-v3-devnet.raydium.io".to_string()
}

fn default_airdrop_enabled() -> bool {
    true
}

// 2 SOL : la moitié sera wrappée, le reste paie les frais.
fn default_airdrop_lamports() -> u64 {
    2_000_000_000
}

// 0.1 SOL par défaut pour le swap.
fn default_amount_in() -> u64 {
    100_000_000
}

fn default_slippage_bps() -> u64 {
    100
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub solana_rpc_url: String,
    pub payer_private_key: String,
    /// Le mint du jeton reçu par le swap (la destination).
    pub token_mint: String,
    #[serde(default = "default_quote_mint")]
    pub quote_mint: String,
    #[serde(default = "default_raydium_api_url")]
    pub raydium_api_url: String,
    #[serde(default = "default_airdrop_enabled")]
    pub airdrop_enabled: bool,
    #[serde(default = "default_airdrop_lamports")]
    pub airdrop_lamports: u64,
    #[serde(default = "default_amount_in")]
    pub amount_in: u64,
    /// 0 = dérivé du quote local avec la tolérance de slippage ci-dessous.
    #[serde(default)]
    pub minimum_amount_out: u64,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()?;
        Ok(config)
    }
}
