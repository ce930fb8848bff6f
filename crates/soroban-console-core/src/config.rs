use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_CONFIG_FILE: &str = ".soroban-console.toml";

/// Environment variable overriding the resolved RPC endpoint
pub const RPC_URL_ENV: &str = "SOROBAN_CONSOLE_RPC_URL";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
}

/// Built-in Stellar networks the console knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Futurenet,
    Local,
}

impl Network {
    pub const ALL: [Network; 4] = [
        Network::Mainnet,
        Network::Testnet,
        Network::Futurenet,
        Network::Local,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Futurenet => "futurenet",
            Network::Local => "local",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "Mainnet",
            Network::Testnet => "Testnet",
            Network::Futurenet => "Futurenet",
            Network::Local => "Local Standalone",
        }
    }

    pub fn rpc_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://soroban-rpc.mainnet.stellar.org",
            Network::Testnet => "https://soroban-testnet.stellar.org",
            Network::Futurenet => "https://rpc-futurenet.stellar.org",
            Network::Local => "http://localhost:8000/soroban/rpc",
        }
    }

    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Mainnet => "Public Global Stellar Network ; September 2015",
            Network::Testnet => "Test SDF Network ; September 2015",
            Network::Futurenet => "Test SDF Future Network ; October 2022",
            Network::Local => "Standalone Network ; February 2017",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Network::ALL
            .iter()
            .copied()
            .find(|n| n.id() == lower)
            .ok_or_else(|| ConfigError::UnknownNetwork(s.to_string()))
    }
}

/// Configuration for the console
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub network: NetworkOptions,
    /// User-defined endpoints, keyed by name
    pub networks: Option<HashMap<String, CustomNetwork>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkOptions {
    /// Built-in id or the name of a custom network
    pub default: String,
    /// Overrides the endpoint of the default network
    pub rpc_url: Option<String>,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            default: Network::Testnet.id().to_string(),
            rpc_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomNetwork {
    pub rpc_url: String,
    pub passphrase: Option<String>,
}

/// One row of the `networks` listing
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NetworkEntry {
    pub id: String,
    pub name: String,
    pub rpc_url: String,
    pub passphrase: Option<String>,
    pub custom: bool,
}

impl ConsoleConfig {
    /// Load config from file or use defaults
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        if let Some(path) = config_path {
            let content = fs::read_to_string(path)
                .context(format!("Failed to read config file: {}", path))?;
            toml::from_str(&content).context("Failed to parse config file")
        } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
            let content = fs::read_to_string(DEFAULT_CONFIG_FILE)?;
            toml::from_str(&content).context(format!("Failed to parse {}", DEFAULT_CONFIG_FILE))
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the RPC endpoint for `selection`, or the configured default.
    ///
    /// Precedence: `SOROBAN_CONSOLE_RPC_URL`, then an explicit selection, then
    /// `network.rpc_url`, then the default network. A name is looked up among
    /// custom networks before the built-in ones.
    pub fn endpoint(&self, selection: Option<&str>) -> Result<String, ConfigError> {
        if let Ok(url) = env::var(RPC_URL_ENV) {
            if !url.trim().is_empty() {
                return Ok(url);
            }
        }
        self.endpoint_without_env(selection)
    }

    fn endpoint_without_env(&self, selection: Option<&str>) -> Result<String, ConfigError> {
        match selection {
            Some(name) => self.named_endpoint(name),
            None => match &self.network.rpc_url {
                Some(url) => Ok(url.clone()),
                None => self.named_endpoint(&self.network.default),
            },
        }
    }

    fn named_endpoint(&self, name: &str) -> Result<String, ConfigError> {
        if let Some(custom) = self.networks.as_ref().and_then(|n| n.get(name)) {
            return Ok(custom.rpc_url.clone());
        }
        name.parse::<Network>().map(|n| n.rpc_url().to_string())
    }

    /// Built-in networks followed by configured custom ones, sorted by name
    pub fn network_listing(&self) -> Vec<NetworkEntry> {
        let mut listing: Vec<NetworkEntry> = Network::ALL
            .iter()
            .map(|n| NetworkEntry {
                id: n.id().to_string(),
                name: n.name().to_string(),
                rpc_url: n.rpc_url().to_string(),
                passphrase: Some(n.passphrase().to_string()),
                custom: false,
            })
            .collect();

        if let Some(custom) = &self.networks {
            let mut names: Vec<&String> = custom.keys().collect();
            names.sort();
            for name in names {
                let network = &custom[name];
                listing.push(NetworkEntry {
                    id: name.clone(),
                    name: name.clone(),
                    rpc_url: network.rpc_url.clone(),
                    passphrase: network.passphrase.clone(),
                    custom: true,
                });
            }
        }
        listing
    }

    /// Save config to file
    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConsoleConfig::default();
        assert_eq!(config.network.default, "testnet");
        assert_eq!(
            config.endpoint_without_env(None).unwrap(),
            "https://soroban-testnet.stellar.org"
        );
    }

    #[test]
    fn test_network_from_str() {
        assert_eq!("Mainnet".parse::<Network>(), Ok(Network::Mainnet));
        assert_eq!("local".parse::<Network>(), Ok(Network::Local));
        assert_eq!(
            "moonnet".parse::<Network>(),
            Err(ConfigError::UnknownNetwork("moonnet".to_string()))
        );
    }

    #[test]
    fn test_custom_network_from_toml() {
        let config: ConsoleConfig = toml::from_str(
            r#"
            [network]
            default = "staging"

            [networks.staging]
            rpc_url = "https://rpc.staging.example"
            passphrase = "Staging ; 2024"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.endpoint_without_env(None).unwrap(),
            "https://rpc.staging.example"
        );
        assert_eq!(
            config.endpoint_without_env(Some("futurenet")).unwrap(),
            "https://rpc-futurenet.stellar.org"
        );
        assert!(config.endpoint_without_env(Some("nowhere")).is_err());
    }

    #[test]
    fn test_rpc_url_override_applies_to_default_only() {
        let mut config = ConsoleConfig::default();
        config.network.rpc_url = Some("http://127.0.0.1:8000".to_string());
        assert_eq!(
            config.endpoint_without_env(None).unwrap(),
            "http://127.0.0.1:8000"
        );
        assert_eq!(
            config.endpoint_without_env(Some("mainnet")).unwrap(),
            "https://soroban-rpc.mainnet.stellar.org"
        );
    }

    #[test]
    fn test_network_section_without_default() {
        let config: ConsoleConfig =
            toml::from_str("[network]\nrpc_url = \"http://127.0.0.1:8000\"\n").unwrap();
        assert_eq!(config.network.default, "testnet");
        assert_eq!(
            config.endpoint_without_env(None).unwrap(),
            "http://127.0.0.1:8000"
        );
    }

    #[test]
    fn test_env_var_wins_over_everything() {
        let mut config = ConsoleConfig::default();
        config.network.rpc_url = Some("http://127.0.0.1:8000".to_string());

        env::set_var(RPC_URL_ENV, "http://rpc.from-env:8000");
        let selected = config.endpoint(Some("mainnet"));
        let default = config.endpoint(None);
        env::set_var(RPC_URL_ENV, "  ");
        let blank = config.endpoint(None);
        env::remove_var(RPC_URL_ENV);

        assert_eq!(selected.unwrap(), "http://rpc.from-env:8000");
        assert_eq!(default.unwrap(), "http://rpc.from-env:8000");
        assert_eq!(blank.unwrap(), "http://127.0.0.1:8000");
    }

    #[test]
    fn test_save_then_load() {
        let path = env::temp_dir().join(format!("soroban-console-{}.toml", std::process::id()));
        let path = path.to_string_lossy().to_string();

        let mut config = ConsoleConfig::default();
        config.network.default = "futurenet".to_string();
        config.save(&path).unwrap();
        let loaded = ConsoleConfig::load(Some(&path));
        fs::remove_file(&path).unwrap();

        let loaded = loaded.unwrap();
        assert_eq!(loaded.network.default, "futurenet");
        assert!(loaded.network.rpc_url.is_none());
    }

    #[test]
    fn test_network_listing_includes_custom() {
        let mut networks = HashMap::new();
        networks.insert(
            "devbox".to_string(),
            CustomNetwork {
                rpc_url: "http://devbox:8000".to_string(),
                passphrase: None,
            },
        );
        let config = ConsoleConfig {
            networks: Some(networks),
            ..ConsoleConfig::default()
        };
        let listing = config.network_listing();
        assert_eq!(listing.len(), 5);
        assert_eq!(listing[3].name, "Local Standalone");
        assert_eq!(
            listing[3].passphrase.as_deref(),
            Some("Standalone Network ; February 2017")
        );
        assert_eq!(listing[4].id, "devbox");
        assert!(listing[4].custom);
        assert!(listing[4].passphrase.is_none());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: ConsoleConfig = toml::from_str("").unwrap();
        assert_eq!(config.network.default, "testnet");
        assert!(config.networks.is_none());
    }
}
