//! gesture-controller - drive a two-motor robot with hand gestures
//!
//! Reads hand landmark detections (one JSON object per line) and sends
//! drive commands to the robot over UDP.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use gesture_controller::config::{ControllerConfig, Scheme};
use gesture_controller::hand::{GripStrategy, JsonLinesSource};
use gesture_controller::pipeline::{Pipeline, TracingObserver};
use gesture_controller::session;
use gesture_controller::transport::{ChangeRule, LogTransport, Transport, UdpTransport};

#[derive(Parser, Debug)]
#[command(
    name = "gesture-controller",
    about = "Hand-gesture to differential-drive command bridge over UDP"
)]
struct Cli {
    /// Control scheme: differential or discrete
    #[arg(long, default_value = "differential")]
    scheme: String,

    /// Receiver host (default: 192.168.1.8)
    #[arg(long)]
    host: Option<String>,

    /// Receiver UDP port (default: 4210)
    #[arg(long)]
    port: Option<u16>,

    /// Detection results file, one JSON object per line (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Keep-alive interval for unchanged commands, in milliseconds
    #[arg(long)]
    cooldown_ms: Option<u64>,

    /// Samples averaged per motor (differential scheme)
    #[arg(long)]
    smoothing_window: Option<usize>,

    /// Grip heuristic: tip-below-pip or tip-near-wrist
    #[arg(long)]
    grip: Option<String>,

    /// Steering calibration offset in degrees (default depends on scheme)
    #[arg(long, allow_negative_numbers = true)]
    steering_offset: Option<f32>,

    /// Camera image width in pixels
    #[arg(long)]
    image_width: Option<u32>,

    /// Camera image height in pixels
    #[arg(long)]
    image_height: Option<u32>,

    /// Flip landmarks horizontally (selfie camera; default for discrete)
    #[arg(long, conflicts_with = "no_mirror")]
    mirror: bool,

    /// Use landmarks as detected, without flipping
    #[arg(long)]
    no_mirror: bool,

    /// What counts as a changed command: payload or class
    #[arg(long)]
    change_rule: Option<String>,

    /// Log commands instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the scheme defaults.
    fn to_config(&self) -> anyhow::Result<ControllerConfig> {
        let Some(scheme) = Scheme::parse(&self.scheme) else {
            bail!(
                "Unknown scheme: {}. Use: differential or discrete",
                self.scheme
            );
        };
        let mut config = ControllerConfig::for_scheme(scheme);

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ms) = self.cooldown_ms {
            config.dispatch.cooldown = Duration::from_millis(ms);
        }
        if let Some(window) = self.smoothing_window {
            config.smoothing_window = window;
        }
        if let Some(grip) = &self.grip {
            config.features.grip = GripStrategy::parse(grip).with_context(|| {
                format!("Unknown grip strategy: {grip}. Use: tip-below-pip or tip-near-wrist")
            })?;
        }
        if let Some(offset) = self.steering_offset {
            config.features.steering_offset_deg = offset;
        }
        if let Some(w) = self.image_width {
            config.features.image_width = w;
        }
        if let Some(h) = self.image_height {
            config.features.image_height = h;
        }
        if self.mirror {
            config.features.mirror = true;
        } else if self.no_mirror {
            config.features.mirror = false;
        }
        if let Some(rule) = &self.change_rule {
            config.dispatch.change_rule = ChangeRule::parse(rule).with_context(|| {
                format!("Unknown change rule: {rule}. Use: payload or class")
            })?;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn open_input(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn BufRead>> {
    match path {
        Some(p) if p.as_os_str() != "-" => {
            let file = File::open(p)
                .with_context(|| format!("failed to open input {}", p.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("gesture-controller {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesture_controller=info".into()),
        )
        .init();

    info!("gesture-controller v{} starting", env!("CARGO_PKG_VERSION"));

    let config = cli.to_config()?;
    info!("config: {}", config.config_sexp());

    let transport: Box<dyn Transport> = if cli.dry_run {
        info!("dry run: commands are logged, not sent");
        Box::new(LogTransport)
    } else {
        let udp = UdpTransport::connect(&config.host, config.port).with_context(|| {
            format!("failed to open UDP transport to {}:{}", config.host, config.port)
        })?;
        Box::new(udp)
    };

    let mut source = JsonLinesSource::new(open_input(cli.input.as_ref())?);
    let mut pipeline = Pipeline::new(&config, transport).with_observer(TracingObserver);

    session::install_signal_handlers();
    let summary = session::run(&mut pipeline, &mut source)?;
    info!(
        "gesture-controller exiting ({}, {} frame(s))",
        summary.reason.as_str(),
        summary.frames
    );
    Ok(())
}
