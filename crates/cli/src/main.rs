//! Emporium CLI - shopfront search and catalog administration.
//!
//! # Usage
//!
//! ```bash
//! # Search the catalog (no sign-in needed)
//! emporium search espresso
//!
//! # Sign in; the session is stored in the catalog backend
//! emporium login -e admin@example.com -p secret
//!
//! # Manage products
//! emporium products list --search grinder
//! emporium products create --name "Cold Brew" --category Beverages --features "Smooth, Low acid"
//! emporium products update 12 --price '$18' --spec Origin=Colombia --image ./cold-brew.png
//! emporium products delete 12
//!
//! # Sign out
//! emporium logout
//! ```
//!
//! # Commands
//!
//! - `search` - Case-insensitive search over names, descriptions and categories
//! - `login` / `logout` / `status` - Admin session management
//! - `products` - List, browse categories, create, update and delete products

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use emporium_admin::AdminConfig;
use emporium_core::ProductId;
use secrecy::{ExposeSecret, SecretString};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::products::ProductArgs;

#[derive(Parser)]
#[command(name = "emporium")]
#[command(author, version, about = "Emporium catalog tools")]
struct Cli {
    /// Catalog backend base URL (overrides `CATALOG_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search products by name, description or category
    Search {
        /// Text to look for (case-insensitive)
        query: String,
    },
    /// Sign in as an admin
    Login {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin password
        #[arg(short, long)]
        password: String,
    },
    /// End the current admin session
    Logout,
    /// Show the current admin session
    Status,
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products, optionally filtered
    List {
        /// Only show products matching this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show the category hierarchy
    Categories {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a product
    Create(ProductArgs),
    /// Update a product; unspecified fields keep their values
    Update {
        /// Product ID
        id: ProductId,

        #[command(flatten)]
        fields: ProductArgs,
    },
    /// Delete a product
    Delete {
        /// Product ID
        id: ProductId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Initialize Sentry error tracking if configured.
fn init_sentry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
    let sentry_config = config.sentry.as_ref()?;

    let guard = sentry::init((
        sentry_config.dsn.expose_secret(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: sentry_config
                .environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: sentry_config.sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber. Logs go to stderr so command output stays clean.
fn init_tracing(json_logs: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "emporium_admin=info,emporium_cli=info".into());

    let json_layer = json_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

fn load_config(api_url: Option<&str>) -> Result<AdminConfig, emporium_admin::config::ConfigError> {
    let config = AdminConfig::from_env()?;
    match api_url {
        Some(raw) => config.with_base_url(raw),
        None => Ok(config),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.api_url.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(false);
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = init_sentry(&config);
    init_tracing(config.json_logs);
    if sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!("Command failed: {e}");
        // exit() skips destructors; flush Sentry first
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &AdminConfig) -> Result<(), commands::CommandError> {
    match command {
        Commands::Search { query } => commands::search::search(config, &query).await?,
        Commands::Login { email, password } => {
            let password = SecretString::from(password);
            commands::session::login(config, &email, &password).await?;
        }
        Commands::Logout => commands::session::logout(config).await?,
        Commands::Status => commands::session::status(config).await?,
        Commands::Products { action } => match action {
            ProductAction::List { search } => {
                commands::products::list(config, search.as_deref()).await?;
            }
            ProductAction::Categories { json } => {
                commands::products::categories(config, json).await?;
            }
            ProductAction::Create(fields) => commands::products::create(config, &fields).await?,
            ProductAction::Update { id, fields } => {
                commands::products::update(config, &id, &fields).await?;
            }
            ProductAction::Delete { id, yes } => commands::products::delete(config, &id, yes).await?,
        },
    }
    Ok(())
}
