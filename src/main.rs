use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use clap::Parser;
use traffic_density::detection::{self, DetectorParams};
use traffic_density::server::{self, AppState};
use traffic_density::source;
use traffic_density::PipelineSettings;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to serve the upload page on
    #[arg(short, long, default_value = "127.0.0.1:8501")]
    bind: String,

    /// Path to the YOLOv8 detection model (ONNX file)
    #[arg(short, long, default_value = "yolov8n.onnx")]
    model: String,

    /// Keep every Nth frame for the sample gallery
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    sample_interval: u64,

    /// Minimum class score for a detection
    #[arg(long, default_value_t = 0.25)]
    conf_threshold: f32,

    /// IoU above which overlapping boxes of one class are merged
    #[arg(long, default_value_t = 0.7)]
    iou_threshold: f32,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("Traffic density analyzer starting");

    anyhow::ensure!(
        source::DECODER_AVAILABLE,
        "built without the `ffmpeg` feature, uploaded videos cannot be decoded"
    );

    tracing::info!("Model: {}", args.model);
    tracing::info!("Sample interval: {}", args.sample_interval);

    let params = DetectorParams {
        conf_threshold: args.conf_threshold,
        iou_threshold: args.iou_threshold,
        ..DetectorParams::default()
    };
    let detector = detection::create_default_detector(&args.model, params)
        .context("Failed to load detection model")?;

    let settings = PipelineSettings {
        sample_interval: args.sample_interval,
    };
    let state = web::Data::new(AppState::new(detector, settings));

    tracing::info!("Serving upload page on http://{}", args.bind);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(server::configure)
    })
    .bind(&args.bind)
    .with_context(|| format!("Failed to bind {}", args.bind))?
    .run()
    .await
    .context("HTTP server failed")?;

    Ok(())
}
