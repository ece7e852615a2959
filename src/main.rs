//! NoShow Sentinel
//!
//! Main entry point: serves the dashboard API or runs a one-off prediction.

use std::path::PathBuf;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

use sentinel::api::{self, AppState};
use sentinel::config;
use sentinel::core::data;
use sentinel::core::Predictor;
use sentinel::error::join_errors;
use sentinel::models::request::RawForm;

#[derive(Parser)]
#[command(name = "noshow-sentinel", about = "Appointment no-show risk prediction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard API
    Serve,
    /// Validate a JSON form from a file and print the prediction
    Predict {
        #[arg(long)]
        input: PathBuf,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let config = config::load_config().context("Failed to load configuration")?;

    // Initialize logger
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.server.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Predict { input } => predict_once(config, input).await,
    }
}

async fn serve(config: config::Config) -> Result<()> {
    let bind = (config.server.host.clone(), config.server.port);
    let server_config = config.server.clone();
    info!(backend = ?config.predictor.backend, "Starting NoShow Sentinel on {}:{}", bind.0, bind.1);

    // Create app state
    let app_state = web::Data::new(AppState::new(config).context("Failed to build predictor")?);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(api::middleware::cors(&server_config))
            .wrap(TracingLogger::default())
            .configure(api::configure)
    })
    .bind(bind)?
    .run()
    .await?;
    Ok(())
}

async fn predict_once(config: config::Config, input: PathBuf) -> Result<()> {
    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let raw: RawForm = serde_json::from_str(&text).context("Input must be a JSON object")?;

    let request = data::validate(&raw).map_err(|errors| anyhow::anyhow!("Invalid input: {}", join_errors(&errors)))?;
    let predictor = config.predictor.build().context("Failed to build predictor")?;
    info!(backend = predictor.name(), "Requesting prediction");

    let result = predictor.predict(&request).await.context("Prediction failed")?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
