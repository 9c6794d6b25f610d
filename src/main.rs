use clap::{Parser, Subcommand};
use fap_mapping::{config, render, server, DataStore, FilterSelection, GeoCache, View};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve map layers and tables as JSON
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Render one selection and print it as JSON
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// status, types, proximity or density
        #[arg(long, default_value = "status")]
        view: View,
        #[arg(long, default_value = "All")]
        state: String,
        #[arg(long, default_value = "All")]
        category: String,
    },
    /// Print the values each selector offers
    Options {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

fn open_store(config: &config::AppConfig) -> anyhow::Result<DataStore> {
    DataStore::open(&config.input, Arc::new(GeoCache::new()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { config } => {
            info!("Serving with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;
            let store = open_store(&app_config)?;
            server::start_server(app_config, store).await?;
        }
        Commands::Render { config, view, state, category } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let store = open_store(&app_config)?;
            let selection = FilterSelection::new(*view, state, category);
            let output = render(&store, &selection, &app_config.map)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Options { config } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let store = open_store(&app_config)?;
            println!("{}", serde_json::to_string_pretty(&store.options())?);
        }
    }

    Ok(())
}
