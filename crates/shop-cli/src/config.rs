//! Startup configuration
//!
//! Everything is read from the environment (after `.env` is loaded) and then
//! overridden by command-line flags. Missing required values abort startup.

use std::time::Duration;

use agent_payments::PRODUCTION_URL;
use agent_runtime::{OllamaConfig, OpenAiConfig};
use onchain_tools::{Address, LocalSigner, WalletError};
use thiserror::Error;

use crate::Cli;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key} is invalid: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Which LLM backend drives the reasoning engine
#[derive(Clone, Debug)]
pub enum LlmBackend {
    Ollama(OllamaConfig),
    OpenAi(OpenAiConfig),
}

impl LlmBackend {
    const fn default_model(&self) -> &'static str {
        match self {
            Self::Ollama(_) => "llama3.2",
            Self::OpenAi(_) => "gpt-4o-mini",
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Signing key; absent only with the in-memory wallet
    pub signer: Option<LocalSigner>,
    pub wallet_address: Address,
    pub rpc_url: Option<String>,
    pub crossmint_api_key: String,
    pub crossmint_base_url: String,
    pub llm: LlmBackend,
    pub model: String,
    pub max_iterations: usize,
    pub mock_wallet: bool,
    pub tool_timeout: Option<Duration>,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env(cli: &Cli) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), cli)
    }

    /// Read configuration through `lookup`; flags in `cli` take precedence
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        cli: &Cli,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let signer = get("WALLET_PRIVATE_KEY")
            .map(|raw| LocalSigner::from_hex(&raw))
            .transpose()
            .map_err(|e| ConfigError::Invalid {
                key: "WALLET_PRIVATE_KEY",
                message: e.to_string(),
            })?;

        // the in-memory wallet can run from a bare address
        let wallet_address = match (&signer, get("WALLET_ADDRESS")) {
            (Some(signer), _) => signer.address(),
            (None, Some(raw)) if cli.mock_wallet => {
                raw.parse().map_err(|e: WalletError| ConfigError::Invalid {
                    key: "WALLET_ADDRESS",
                    message: e.to_string(),
                })?
            }
            (None, _) => return Err(ConfigError::Missing("WALLET_PRIVATE_KEY")),
        };

        let rpc_url = if cli.mock_wallet {
            get("RPC_PROVIDER_URL")
        } else {
            Some(require("RPC_PROVIDER_URL")?)
        };

        let crossmint_api_key = require("CROSSMINT_API_KEY")?;
        let crossmint_base_url =
            get("CROSSMINT_BASE_URL").unwrap_or_else(|| PRODUCTION_URL.to_string());

        let llm = match get("LLM_PROVIDER").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("ollama") => {
                let mut ollama = OllamaConfig::default();
                if let Some(host) = get("OLLAMA_HOST") {
                    ollama.host = host;
                }
                if let Some(port) = get("OLLAMA_PORT") {
                    ollama.port = parse("OLLAMA_PORT", &port)?;
                }
                LlmBackend::Ollama(ollama)
            }
            Some("openai") => {
                let mut openai = OpenAiConfig::new(require("OPENAI_API_KEY")?);
                if let Some(base_url) = get("OPENAI_BASE_URL") {
                    openai = openai.base_url(base_url);
                }
                LlmBackend::OpenAi(openai)
            }
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LLM_PROVIDER",
                    message: format!("unknown provider '{other}' (expected ollama or openai)"),
                });
            }
        };

        let model = cli
            .model
            .clone()
            .or_else(|| get("MODEL"))
            .unwrap_or_else(|| llm.default_model().to_string());

        let max_iterations = match (cli.max_iterations, get("MAX_ITERATIONS")) {
            (Some(n), _) => n,
            (None, Some(raw)) => parse("MAX_ITERATIONS", &raw)?,
            (None, None) => 10,
        };
        if max_iterations == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_ITERATIONS",
                message: "must be at least 1".into(),
            });
        }

        Ok(Self {
            signer,
            wallet_address,
            rpc_url,
            crossmint_api_key,
            crossmint_base_url,
            llm,
            model,
            max_iterations,
            mock_wallet: cli.mock_wallet,
            tool_timeout: cli.tool_timeout_secs.map(Duration::from_secs),
        })
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    const WALLET: &str = "0x00000000000000000000000000000000000000aa";
    const KEY: &str = "0x4646464646464646464646464646464646464646464646464646464646464646";
    const KEY_ADDRESS: &str = "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f";

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("shop-cli").chain(args.iter().copied()))
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("WALLET_PRIVATE_KEY", KEY),
            ("RPC_PROVIDER_URL", "https://mainnet.base.org"),
            ("CROSSMINT_API_KEY", "sk_test"),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(env(&base()), &cli(&[])).unwrap();
        assert_eq!(config.wallet_address.to_string(), KEY_ADDRESS);
        assert_eq!(config.signer.unwrap().address(), config.wallet_address);
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.crossmint_base_url, PRODUCTION_URL);
        assert!(matches!(config.llm, LlmBackend::Ollama(_)));
        assert!(config.tool_timeout.is_none());
    }

    #[test]
    fn test_missing_required_values() {
        let mut vars = base();
        vars.retain(|(k, _)| *k != "CROSSMINT_API_KEY");
        assert_eq!(
            AppConfig::from_lookup(env(&vars), &cli(&[])).unwrap_err(),
            ConfigError::Missing("CROSSMINT_API_KEY")
        );

        let mut vars = base();
        vars.retain(|(k, _)| *k != "RPC_PROVIDER_URL");
        assert_eq!(
            AppConfig::from_lookup(env(&vars), &cli(&[])).unwrap_err(),
            ConfigError::Missing("RPC_PROVIDER_URL")
        );
        // the in-memory wallet needs no node
        assert!(AppConfig::from_lookup(env(&vars), &cli(&["--mock-wallet"])).is_ok());
    }

    #[test]
    fn test_invalid_private_key() {
        let mut vars = base();
        vars[0] = ("WALLET_PRIVATE_KEY", "0xdeadbeef");
        let err = AppConfig::from_lookup(env(&vars), &cli(&[])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "WALLET_PRIVATE_KEY",
                ..
            }
        ));
        assert!(!err.to_string().contains("deadbeef"));
    }

    #[test]
    fn test_key_required_for_real_wallet() {
        let mut vars = base();
        vars.retain(|(k, _)| *k != "WALLET_PRIVATE_KEY");
        vars.push(("WALLET_ADDRESS", WALLET));
        assert_eq!(
            AppConfig::from_lookup(env(&vars), &cli(&[])).unwrap_err(),
            ConfigError::Missing("WALLET_PRIVATE_KEY")
        );

        let config = AppConfig::from_lookup(env(&vars), &cli(&["--mock-wallet"])).unwrap();
        assert!(config.signer.is_none());
        assert_eq!(config.wallet_address.to_string(), WALLET);

        vars.retain(|(k, _)| *k != "WALLET_ADDRESS");
        vars.push(("WALLET_ADDRESS", "not-an-address"));
        assert!(matches!(
            AppConfig::from_lookup(env(&vars), &cli(&["--mock-wallet"])),
            Err(ConfigError::Invalid {
                key: "WALLET_ADDRESS",
                ..
            })
        ));
    }

    #[test]
    fn test_flags_override_environment() {
        let mut vars = base();
        vars.push(("MAX_ITERATIONS", "4"));
        vars.push(("MODEL", "qwen2.5"));

        let config = AppConfig::from_lookup(env(&vars), &cli(&[])).unwrap();
        assert_eq!(config.max_iterations, 4);
        assert_eq!(config.model, "qwen2.5");

        let config = AppConfig::from_lookup(
            env(&vars),
            &cli(&["--max-iterations", "6", "--model", "llama3.1", "--tool-timeout-secs", "30"]),
        )
        .unwrap();
        assert_eq!(config.max_iterations, 6);
        assert_eq!(config.model, "llama3.1");
        assert_eq!(config.tool_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_openai_backend() {
        let mut vars = base();
        vars.push(("LLM_PROVIDER", "OpenAI"));
        assert_eq!(
            AppConfig::from_lookup(env(&vars), &cli(&[])).unwrap_err(),
            ConfigError::Missing("OPENAI_API_KEY")
        );

        vars.push(("OPENAI_API_KEY", "sk-test"));
        vars.push(("OPENAI_BASE_URL", "http://localhost:1234/v1"));
        let config = AppConfig::from_lookup(env(&vars), &cli(&[])).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        let LlmBackend::OpenAi(openai) = config.llm else {
            panic!("expected openai backend");
        };
        assert_eq!(openai.base_url, "http://localhost:1234/v1");
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let mut vars = base();
        vars.push(("MAX_ITERATIONS", "0"));
        assert!(AppConfig::from_lookup(env(&vars), &cli(&[])).is_err());
        assert!(AppConfig::from_lookup(env(&base()), &cli(&["--max-iterations", "0"])).is_err());
    }

    #[test]
    fn test_unknown_llm_provider() {
        let mut vars = base();
        vars.push(("LLM_PROVIDER", "llamafile"));
        assert!(matches!(
            AppConfig::from_lookup(env(&vars), &cli(&[])),
            Err(ConfigError::Invalid {
                key: "LLM_PROVIDER",
                ..
            })
        ));
    }
}
