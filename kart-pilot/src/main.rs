#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use kart_pilot::config::{ConfigOverrides, PilotConfig};
use kart_pilot::debug;
use kart_pilot::drive::MonotonicClock;
use kart_pilot::link::SerialLink;
use kart_pilot::pilot::Pilot;
use log::{info, warn};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "kart_pilot=info,kart_inference=info,kart_media=info,ort=warn";

#[derive(Parser)]
#[command(name = "kart-pilot", version, about = "Camera driven go-kart pilot")]
struct Cli {
    /// TOML configuration file; defaults are used when it does not exist
    #[arg(short, long, default_value = "kart.toml")]
    config: PathBuf,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive: capture, perceive and send commands until interrupted
    Run,
    /// Print the detections of a single image
    Detect { image: PathBuf },
    /// Print the road centre percentage of a single image
    Road { image: PathBuf },
    /// Draw detections and the road estimate onto an image
    Visualize { image: PathBuf, output: PathBuf },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let mut config = PilotConfig::load(&cli.config)?;
    cli.overrides.apply(&mut config);
    config.validate()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => drive(config).await,
        Commands::Detect { image } => debug::detect_image(&config, &image).map(|_| ()),
        Commands::Road { image } => debug::road_image(&config, &image).map(|_| ()),
        Commands::Visualize { image, output } => debug::visualize(&config, &image, &output),
    }
}

async fn drive(config: PilotConfig) -> Result<()> {
    let detector = debug::open_detector(&config)?;
    let estimator = debug::open_road_estimator(&config)?;

    let source = debug::open_frame_source(&config)?;

    let link = SerialLink::open(
        &config.serial.port,
        config.serial.baud_rate,
        config.serial_timeout(),
        config.serial_settle(),
    )?;

    let pilot = Pilot::new(
        source,
        detector,
        estimator,
        link,
        MonotonicClock::new(),
        config.decision.clone(),
        config.tick_period(),
    );

    let reason = pilot
        .run(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl-C: {err}");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    info!("Control loop finished: {:?}", reason);
    Ok(())
}
