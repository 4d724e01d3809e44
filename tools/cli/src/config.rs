use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub contract: ContractConfig,
    pub auth: AuthConfig,
    pub pinning: PinningConfig,
    pub records: RecordsConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContractConfig {
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Connected account address.
    pub address: Option<String>,
    /// Signing key handed to the gateway daemon with each write.
    pub secret_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PinningConfig {
    pub api_url: String,
    pub gateway_url: String,
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordsConfig {
    /// Upload record store location; defaults to ~/.medisure/records.json.
    pub path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                name: "localhost".to_string(),
                rpc_url: "http://127.0.0.1:8545".to_string(),
            },
            contract: ContractConfig { address: None },
            auth: AuthConfig {
                address: None,
                secret_key: None,
            },
            pinning: PinningConfig {
                api_url: "https://api.pinata.cloud".to_string(),
                gateway_url: "https://gateway.pinata.cloud".to_string(),
                api_key: None,
                secret_key: None,
            },
            records: RecordsConfig { path: None },
        }
    }
}

pub async fn load_config(config_path: &Path) -> Result<Config> {
    // Expand tilde in path
    let expanded_path = if config_path.starts_with("~") {
        let home_dir =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        let path_str = config_path.to_string_lossy();
        let without_tilde = &path_str[1..];
        home_dir.join(without_tilde.trim_start_matches('/'))
    } else {
        config_path.to_path_buf()
    };

    if !expanded_path.exists() {
        // Create default config if it doesn't exist
        let default_config = Config::default();
        create_config_file(&expanded_path, &default_config).await?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&expanded_path).await?;
    let config: Config = toml::from_str(&config_content)?;

    Ok(config)
}

async fn create_config_file(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let config_content = toml::to_string_pretty(config)?;
    fs::write(path, config_content).await?;

    println!("Created default config file at: {}", path.display());

    Ok(())
}

/// Connected account, environment first then config.
pub fn account(config: &Config) -> Option<String> {
    std::env::var("MEDISURE_ACCOUNT")
        .ok()
        .or_else(|| config.auth.address.clone())
}

/// Signing key, environment first then config.
pub fn secret_key(config: &Config) -> Option<String> {
    std::env::var("MEDISURE_SECRET_KEY")
        .ok()
        .or_else(|| config.auth.secret_key.clone())
}

pub fn pinning_credentials(config: &Config) -> Result<(String, String)> {
    let api_key = std::env::var("MEDISURE_PINNING_KEY")
        .ok()
        .or_else(|| config.pinning.api_key.clone());
    let secret_key = std::env::var("MEDISURE_PINNING_SECRET")
        .ok()
        .or_else(|| config.pinning.secret_key.clone());

    match (api_key, secret_key) {
        (Some(api_key), Some(secret_key)) => Ok((api_key, secret_key)),
        _ => Err(anyhow::anyhow!(
            "Missing pinning credentials. Set MEDISURE_PINNING_KEY and MEDISURE_PINNING_SECRET or add them to the config file"
        )),
    }
}

pub fn records_path(config: &Config) -> Result<PathBuf> {
    if let Some(path) = &config.records.path {
        return Ok(path.clone());
    }
    dirs::home_dir()
        .map(|home| home.join(".medisure").join("records.json"))
        .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))
}
