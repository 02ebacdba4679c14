//! shop-cli
//!
//! Terminal shopping assistant: a line-oriented REPL in front of the agent
//! loop, with wallet, ERC-20 and checkout tools registered in that order.

mod config;
mod prompt;
mod repl;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{
    AgentBuilder, LlmProvider, LlmReasoningEngine, SessionLoop, ToolProvider, ToolRegistry,
    provider::GenerationOptions,
};
use agent_payments::{CheckoutToolProvider, CrossmintClient};
use agent_runtime::{OllamaProvider, OpenAiProvider};
use onchain_tools::{
    Chain, Erc20Provider, MockWalletClient, RpcWalletClient, WalletClient, WalletToolProvider,
    usdc,
};

use crate::config::{AppConfig, LlmBackend};
use crate::prompt::SHOPPING_INSTRUCTIONS;
use crate::repl::Repl;

#[derive(Parser, Debug)]
#[command(name = "shop-cli")]
#[command(about = "Conversational shopping agent that pays from your crypto wallet", long_about = None)]
pub struct Cli {
    /// LLM model to use (overrides MODEL)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum reasoning steps per request (overrides MAX_ITERATIONS)
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Use an in-memory wallet seeded with test funds instead of the RPC node
    #[arg(long)]
    pub mock_wallet: bool,

    /// Abort a single tool call after this many seconds
    #[arg(long)]
    pub tool_timeout_secs: Option<u64>,
}

fn llm_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn LlmProvider>> {
    Ok(match &config.llm {
        LlmBackend::Ollama(ollama) => Arc::new(OllamaProvider::from_config(ollama.clone())),
        LlmBackend::OpenAi(openai) => Arc::new(OpenAiProvider::new(openai.clone())?),
    })
}

fn wallet_client(config: &AppConfig) -> anyhow::Result<Arc<dyn WalletClient>> {
    let address = config.wallet_address;

    if config.mock_wallet {
        let usdc_base = usdc()
            .address_on(Chain::BASE.id)
            .context("USDC has no Base deployment")?;
        tracing::warn!("Using in-memory wallet; no real funds will move");

        return Ok(Arc::new(
            MockWalletClient::new(address)
                .with_native_balance(address, 100_000_000_000_000_000)
                .with_token_balance(usdc_base, address, 100_000_000),
        ));
    }

    let url = config
        .rpc_url
        .as_deref()
        .context("RPC_PROVIDER_URL is not set")?;
    let signer = config
        .signer
        .clone()
        .context("WALLET_PRIVATE_KEY is not set")?;
    Ok(Arc::new(RpcWalletClient::new(url, signer)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never interleave with the conversation
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env(&cli).context("invalid configuration")?;

    // Initialize LLM provider
    let provider = llm_provider(&config)?;
    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ {} reachable, model {}", provider.name(), config.model),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ LLM provider not available - requests will fail until it is");
        }
    }

    // Wallet and plugins, in registration order
    let wallet = wallet_client(&config)?;
    let checkout_api = Arc::new(CrossmintClient::new(
        config.crossmint_api_key.clone(),
        config.crossmint_base_url.clone(),
    )?);

    let providers: Vec<Arc<dyn ToolProvider>> = vec![
        Arc::new(WalletToolProvider::new(Arc::clone(&wallet))),
        Arc::new(Erc20Provider::new(Arc::clone(&wallet), vec![usdc()])),
        Arc::new(CheckoutToolProvider::new(checkout_api, Arc::clone(&wallet))),
    ];
    let tools = ToolRegistry::from_providers(&providers)?;

    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let mut generation = GenerationOptions::for_model(config.model.clone());
    generation.stop_sequences.push("Observation:".into());
    let engine = LlmReasoningEngine::new(provider, generation);

    let mut builder = AgentBuilder::new()
        .engine(Arc::new(engine))
        .tools(Arc::new(tools))
        .instructions(SHOPPING_INSTRUCTIONS)
        .max_iterations(config.max_iterations);
    if let Some(limit) = config.tool_timeout {
        builder = builder.tool_timeout(limit);
    }
    let agent = builder.build()?;

    Repl::new(SessionLoop::new(agent)).run().await
}
