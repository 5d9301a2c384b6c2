use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use video_message::config::StorageBackend;
use video_message::{
    create_router, AppState, CaptureConfig, CaptureDeviceFactory, CaptureSource, Config,
    DeviceType, MemoryUploader, RecordingController, RecordingState, RestUploader, Uploader,
};

#[derive(Parser)]
#[command(name = "video-message", version, about = "Record and upload short video messages")]
struct Cli {
    /// Config file path (extension optional; missing file is fine)
    #[arg(long, global = true, default_value = "config/video-message")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record from a media file, stop, and upload
    Record {
        /// Media file to capture from
        #[arg(long)]
        input: PathBuf,

        /// Stop after this many seconds (default: run until the duration cap)
        #[arg(long)]
        seconds: Option<u64>,

        /// Override the configured device type (web | mobile)
        #[arg(long)]
        device_type: Option<DeviceType>,
    },
    /// Serve the HTTP control API
    Serve {
        /// Media file to capture from
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "video_message=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::load(&cli.config)?;

    info!("Video Message v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    match cli.command {
        Command::Record {
            input,
            seconds,
            device_type,
        } => {
            if let Some(device_type) = device_type {
                cfg.recorder.device_type = device_type;
            }
            record(cfg, input, seconds).await
        }
        Command::Serve { input } => serve(cfg, input).await,
    }
}

fn build_uploader(cfg: &Config) -> Result<Arc<dyn Uploader>> {
    match cfg.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; uploads are lost on exit");
            Ok(Arc::new(MemoryUploader::new()))
        }
        StorageBackend::Rest => Ok(Arc::new(RestUploader::new(cfg.storage.rest()?)?)),
    }
}

fn build_controller(cfg: Config, input: PathBuf) -> Result<RecordingController> {
    let uploader = build_uploader(&cfg)?;
    let device = CaptureDeviceFactory::create(CaptureSource::File(input), CaptureConfig::default())?;
    Ok(RecordingController::new(cfg.recorder, device, uploader))
}

async fn record(cfg: Config, input: PathBuf, seconds: Option<u64>) -> Result<()> {
    let controller = build_controller(cfg, input)?;

    controller.request_permission().await?;
    controller.start_recording().await?;

    let mut updates = controller.subscribe();
    let limit = seconds.map(Duration::from_secs);
    let stopped_by_cap = async {
        while updates.borrow_and_update().state == RecordingState::Recording {
            if updates.changed().await.is_err() {
                break;
            }
        }
    };

    match limit {
        Some(limit) => {
            tokio::select! {
                _ = tokio::time::sleep(limit) => controller.stop_recording().await?,
                _ = stopped_by_cap => info!("Recording ended before {:?}", limit),
            }
        }
        None => stopped_by_cap.await,
    }

    let snapshot = controller.snapshot();
    if snapshot.state != RecordingState::Stopped {
        anyhow::bail!(
            "recording ended in state {}: {}",
            snapshot.state,
            snapshot.error.unwrap_or_default()
        );
    }

    let descriptor = controller.upload().await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&descriptor).context("Failed to encode descriptor")?
    );

    controller.shutdown().await;
    Ok(())
}

async fn serve(cfg: Config, input: PathBuf) -> Result<()> {
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let controller = build_controller(cfg, input)?;
    let router = create_router(AppState::new(controller.clone()));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP control API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    controller.shutdown().await;
    Ok(())
}
