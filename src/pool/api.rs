use anyhow::{anyhow, Result};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;

// L'enveloppe standard des réponses de l'API V3 de Raydium.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RaydiumApiV3Response<T> {
    success: bool,
    data: Option<T>,
    msg: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ApiPoolsData {
    pub count: i64,
    pub data: Vec<ApiPoolInfo>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApiPoolInfo {
    pub id: String,
    pub program_id: String,
    #[serde(rename = "type")]
    pub pool_type: String,
    pub mint_a: ApiMintInfo,
    pub mint_b: ApiMintInfo,
    #[serde(default)]
    pub tvl: f64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApiMintInfo {
    pub address: String,
    pub decimals: i32,
}

/// Décode la réponse brute de l'API et en extrait le premier pool.
/// L'API trie par défaut du plus liquide au moins liquide ; le premier
/// résultat est donc le venue de référence pour la paire.
fn parse_pool_response(raw_text: &str, mint1: &Pubkey, mint2: &Pubkey) -> Result<ApiPoolInfo> {
    let response_body: RaydiumApiV3Response<ApiPoolsData> = serde_json::from_str(raw_text)
        .map_err(|e| anyhow!("Erreur de décodage JSON: {}. Réponse reçue: {}", e, raw_text))?;

    if !response_body.success {
        let error_msg = response_body
            .msg
            .unwrap_or_else(|| "Erreur API inconnue".to_string());
        return Err(anyhow!("L'API Raydium a retourné une erreur: {}", error_msg));
    }

    response_body
        .data
        .and_then(|pools| {
            tracing::debug!(
                "L'API a retourné {} pool(s) pour la paire.",
                pools.count
            );
            pools.data.into_iter().next()
        })
        .ok_or_else(|| {
            anyhow!(
                "Aucun pool trouvé pour les mints {} et {}",
                mint1,
                mint2
            )
        })
}

/// Interroge l'API V3 de Raydium pour trouver un pool appariant `mint1` et `mint2`.
/// Un statut HTTP non-succès ou un résultat vide font échouer l'étape immédiatement.
pub async fn fetch_pool(
    api_base_url: &str,
    mint1: &Pubkey,
    mint2: &Pubkey,
    pool_type: &str,
) -> Result<ApiPoolInfo> {
    let url = format!(
        "{}/pools/info/mint?mint1={}&mint2={}&poolType={}&poolSortField=default&sortType=desc&pageSize=100&page=1",
        api_base_url, mint1, mint2, pool_type
    );

    let client = reqwest::Client::new();
    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Erreur API Raydium: statut HTTP {}",
            response.status()
        ));
    }

    let raw_text = response.text().await?;
    parse_pool_response(&raw_text, mint1, mint2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const SAMPLE_RESPONSE: &str = r#"{
        "success": true,
        "data": {
            "count": 2,
            "data": [
                {
                    "id": "HTvjzsfX3yU6BUodCjZ5vZkUrAxMDTrBs3CJaq43ashR",
                    "programId": "HWy1jotHpo6UqeQxx49dpYYdQB8wj9Qk9MdxwjLvDHB8",
                    "type": "Standard",
                    "mintA": { "address": "So11111111111111111111111111111111111111112", "decimals": 9 },
                    "mintB": { "address": "Gh9ZwEmdLJ8DscKNTkTqPbNwLNNBjuSzaG9Vp2KGtKJr", "decimals": 6 },
                    "tvl": 12345.67
                },
                {
                    "id": "58oQChx4yWmvKdwLLZzBi4ChoCc2fqCUWBkwMihLYQo2",
                    "programId": "HWy1jotHpo6UqeQxx49dpYYdQB8wj9Qk9MdxwjLvDHB8",
                    "type": "Standard",
                    "mintA": { "address": "So11111111111111111111111111111111111111112", "decimals": 9 },
                    "mintB": { "address": "Gh9ZwEmdLJ8DscKNTkTqPbNwLNNBjuSzaG9Vp2KGtKJr", "decimals": 6 },
                    "tvl": 99.0
                }
            ]
        }
    }"#;

    fn mints() -> (Pubkey, Pubkey) {
        (
            Pubkey::from_str("So11111111111111111111111111111111111111112").unwrap(),
            Pubkey::from_str("Gh9ZwEmdLJ8DscKNTkTqPbNwLNNBjuSzaG9Vp2KGtKJr").unwrap(),
        )
    }

    #[test]
    fn parse_retourne_le_premier_pool() {
        let (mint1, mint2) = mints();
        let pool = parse_pool_response(SAMPLE_RESPONSE, &mint1, &mint2).unwrap();
        assert_eq!(pool.id, "HTvjzsfX3yU6BUodCjZ5vZkUrAxMDTrBs3CJaq43ashR");
        assert_eq!(pool.program_id, "HWy1jotHpo6UqeQxx49dpYYdQB8wj9Qk9MdxwjLvDHB8");
        assert_eq!(pool.pool_type, "Standard");
        assert_eq!(pool.mint_a.decimals, 9);
        assert_eq!(pool.mint_b.decimals, 6);
        assert!(pool.tvl > 0.0);
    }

    #[test]
    fn parse_echoue_sur_un_resultat_vide() {
        let (mint1, mint2) = mints();
        let raw = r#"{ "success": true, "data": { "count": 0, "data": [] } }"#;
        let err = parse_pool_response(raw, &mint1, &mint2).unwrap_err();
        assert!(err.to_string().contains("Aucun pool trouvé"));
    }

    #[test]
    fn parse_echoue_quand_l_api_signale_une_erreur() {
        let (mint1, mint2) = mints();
        let raw = r#"{ "success": false, "data": null, "msg": "pool type invalide" }"#;
        let err = parse_pool_response(raw, &mint1, &mint2).unwrap_err();
        assert!(err.to_string().contains("pool type invalide"));
    }

    #[test]
    fn parse_echoue_sur_du_json_invalide() {
        let (mint1, mint2) = mints();
        assert!(parse_pool_response("<html>502</html>", &mint1, &mint2).is_err());
    }
}
