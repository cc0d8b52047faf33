//! Song mood predictor (spm-mood) - Main entry point
//!
//! Runs the HTTP prediction service by default, or classifies a single file
//! from the command line with `spm-mood predict <FILE>`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spm_common::config::TomlConfig;
use spm_mood::audio::{AudioDecoder, FfmpegTranscoder, Transcoder};
use spm_mood::config::{CliOverrides, ServiceConfig};
use spm_mood::model::ModelBundle;
use spm_mood::pipeline::MoodPredictor;
use spm_mood::{build_router, AppState};

/// Command-line arguments for spm-mood
#[derive(Parser, Debug)]
#[command(name = "spm-mood")]
#[command(about = "Song mood prediction service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "SPM_CONFIG")]
    config: Option<PathBuf>,

    /// Model artifact (JSON)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve,

    /// Predict the mood of one audio file and print the result as JSON
    Predict {
        /// Audio file to classify
        file: PathBuf,

        /// Also print the 15-value feature vector
        #[arg(long)]
        features: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    let directive = toml_config.logging.filter_directive(&["spm_mood", "spm_common", "tower_http"]);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| directive.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        build = env!("SPM_GIT_HASH"),
        built_at = env!("SPM_BUILD_TIMESTAMP"),
        "Starting spm-mood"
    );
    match &toml_config.source_path {
        Some(path) => info!(path = %path.display(), "Loaded config file"),
        None => info!("No config file found, using built-in defaults"),
    }

    let cli = CliOverrides {
        model_path: args.model.clone(),
        host: args.host.clone(),
        port: args.port,
    };
    let config = ServiceConfig::resolve(&cli, &toml_config).context("Invalid configuration")?;

    let predictor = build_predictor(&config)?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, predictor).await,
        Command::Predict { file, features } => predict_once(predictor, file, features).await,
    }
}

fn build_predictor(config: &ServiceConfig) -> Result<MoodPredictor> {
    let bundle = ModelBundle::load(&config.model_path)
        .with_context(|| format!("Failed to load model bundle from {}", config.model_path.display()))?;
    let metadata = bundle.metadata();
    info!(
        schema_version = metadata.schema_version,
        model_type = %metadata.model_type,
        classes = ?metadata.classes,
        "Model loaded"
    );

    let decoder = if config.transcoder_enabled {
        let transcoder = FfmpegTranscoder::new(config.transcoder_program.clone());
        if !transcoder.is_available() {
            warn!(program = %config.transcoder_program, "Transcoder not found; fallback decoding will fail");
        }
        AudioDecoder::with_transcoder(Arc::new(transcoder))
    } else {
        AudioDecoder::new()
    };

    Ok(MoodPredictor::new(Arc::new(bundle), decoder))
}

async fn serve(config: ServiceConfig, predictor: MoodPredictor) -> Result<()> {
    let app = build_router(AppState::new(predictor, config.max_upload_bytes));

    let addr = config.bind_address();
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn predict_once(predictor: MoodPredictor, file: PathBuf, with_features: bool) -> Result<()> {
    let detailed = tokio::task::spawn_blocking(move || predictor.analyze_file(Path::new(&file)))
        .await
        .context("Prediction task failed")??;

    let output = if with_features {
        let features: serde_json::Map<String, serde_json::Value> = detailed
            .features
            .named()
            .map(|(name, value)| (name.to_string(), json!(value)))
            .collect();
        json!({ "prediction": detailed.result, "features": features })
    } else {
        serde_json::to_value(&detailed.result)?
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
