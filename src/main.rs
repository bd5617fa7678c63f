//! Linea token list maintenance CLI
//!
//! - `verify` re-derives every token of a list from bridge state and
//!   persists corrections
//! - `sync` folds the curated shortlist into the full list
//! - `check` validates configuration and both list files offline

use clap::{Parser, Subcommand, ValueEnum};
use eyre::Result;
use std::sync::Arc;
use tracing::info;

use linea_token_list::config::Config;
use linea_token_list::logo::{CoinGeckoLogoResolver, CoinMarketCapLogoResolver, LogoResolver};
use linea_token_list::reconciler::ReconcileOutcome;
use linea_token_list::rpc_fallback::mask_url;
use linea_token_list::service::{sync_full_list, verify_token_list};
use linea_token_list::types::current_date;
use linea_token_list::{
    BatchVerifier, ChainClient, EvmChainClient, JsonFileStore, Layer, TokenClassifier,
    TokenListStore, RESERVED_STATUS,
};

#[derive(Parser)]
#[command(name = "linea-token-list")]
#[command(about = "Verify and maintain the Linea bridged token list", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a token list against on-chain bridge state
    Verify {
        /// Which list to verify
        #[arg(long, value_enum, default_value_t = ListKind::Short)]
        list: ListKind,
    },
    /// Merge the shortlist into the full list
    Sync,
    /// Validate configuration and list files without touching the network
    Check,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ListKind {
    Full,
    Short,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);

    let config = Config::load()?;
    config.validate()?;
    info!(
        l1_chain_id = config.l1_chain_id,
        l2_chain_id = config.l2_chain_id,
        batch_size = config.batch_size,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Verify { list } => {
            let path = match list {
                ListKind::Full => &config.full_list_path,
                ListKind::Short => &config.short_list_path,
            };
            info!(list = ?list, path = %path.display(), "Starting token list verification");

            let l1 = connect(&config, Layer::L1).await?;
            let l2 = connect(&config, Layer::L2).await?;
            let verifier = BatchVerifier::new(
                l1,
                l2,
                TokenClassifier::new(RESERVED_STATUS, config.networks()),
                config.batch_size,
            );

            let store = JsonFileStore::new(path);
            let outcome = verify_token_list(&store, &verifier, current_date()).await?;
            report(&outcome);
        }

        Commands::Sync => {
            info!("Starting full list sync");

            let full = JsonFileStore::new(&config.full_list_path);
            let short = JsonFileStore::new(&config.short_list_path);
            let resolvers = logo_resolvers(&config)?;

            let outcome = sync_full_list(&full, &short, &resolvers, current_date()).await?;
            report(&outcome);
        }

        Commands::Check => {
            for path in [&config.full_list_path, &config.short_list_path] {
                let list = JsonFileStore::new(path).read().await?;
                info!(
                    path = %path.display(),
                    tokens = list.tokens.len(),
                    version = %list.versions.first().map(|v| v.to_string()).unwrap_or_default(),
                    "Token list OK"
                );
            }
        }
    }

    Ok(())
}

async fn connect(config: &Config, layer: Layer) -> Result<Arc<dyn ChainClient>> {
    let endpoints = config.endpoints(layer);
    let masked: Vec<String> = endpoints.iter().map(|u| mask_url(u)).collect();
    info!(layer = layer.as_str(), endpoints = ?masked, "Connecting");

    let client = EvmChainClient::connect(
        layer,
        &endpoints,
        config.chain_id(layer),
        config.bridge_address(layer)?,
        config.rpc_timeout(),
    )
    .await?;

    Ok(Arc::new(client))
}

fn logo_resolvers(config: &Config) -> Result<Vec<Box<dyn LogoResolver>>> {
    let mut resolvers: Vec<Box<dyn LogoResolver>> = vec![Box::new(CoinGeckoLogoResolver::new(
        &config.coingecko_url,
        config.l1_chain_id,
    )?)];

    if !config.coinmarketcap_api_key.is_empty() {
        resolvers.push(Box::new(CoinMarketCapLogoResolver::new(
            &config.coinmarketcap_url,
            &config.coinmarketcap_api_key,
            config.l1_chain_id,
        )?));
    }

    Ok(resolvers)
}

fn report(outcome: &ReconcileOutcome) {
    match outcome {
        ReconcileOutcome::Unchanged => info!("Token list already up to date"),
        ReconcileOutcome::Written { version, diff } => info!(
            version = %version,
            added = diff.added.len(),
            removed = diff.removed.len(),
            changed = diff.changed.len(),
            "Token list written"
        ),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,linea_token_list=debug"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}
