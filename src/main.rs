use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::Rng;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dashboard_gauge::{DashboardGauge, GaugeCommand, GaugeFont, GaugeStyle, WindowConfig};

#[derive(Parser)]
#[command(name = "dashboard-gauge")]
#[command(author, version, about = "Animated speedometer gauge demo")]
struct Cli {
    /// TrueType/OpenType font used for all gauge text
    #[arg(short, long)]
    font: PathBuf,

    /// TOML style table (color_dial_middle, text_size_dial, animator_play_time, ...)
    #[arg(short, long)]
    style: Option<PathBuf>,

    /// Lower bound of the range
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    min: i32,

    /// Upper bound of the range
    #[arg(long, default_value_t = 230, allow_negative_numbers = true)]
    max: i32,

    /// Unit shown under the reading
    #[arg(short, long, default_value = "km/h")]
    unit: String,

    /// Delay between random targets in milliseconds
    #[arg(long, default_value_t = 2500)]
    interval_ms: u64,

    /// Window size in logical pixels
    #[arg(long, default_value_t = 320)]
    size: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(
        cli.max > cli.min,
        "--max ({}) must be greater than --min ({})",
        cli.max,
        cli.min
    );

    let style = match &cli.style {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read style {}", path.display()))?;
            GaugeStyle::from_toml_str(&source)
                .with_context(|| format!("invalid style {}", path.display()))?
        }
        None => GaugeStyle::default(),
    };

    let font_data = std::fs::read(&cli.font)
        .with_context(|| format!("failed to read font {}", cli.font.display()))?;
    let font = GaugeFont::from_bytes(font_data)
        .with_context(|| format!("failed to load font {}", cli.font.display()))?;

    let mut gauge = DashboardGauge::new(style)?;
    gauge.configure(cli.min, cli.max, cli.unit.clone());

    let window = WindowConfig::builder()
        .title(format!("Dashboard ({})", cli.unit))
        .width(cli.size)
        .height(cli.size)
        .build();

    // Stand-in for the external control that produces values
    let (sender, receiver) = mpsc::channel();
    let interval = Duration::from_millis(cli.interval_ms);
    thread::spawn(move || {
        let mut rng = rand::rng();
        loop {
            let percent = rng.random_range(0.0..=100.0);
            if sender.send(GaugeCommand::SetPercent(percent)).is_err() {
                break;
            }
            thread::sleep(interval);
        }
    });

    info!(min = cli.min, max = cli.max, unit = %cli.unit, "showing gauge");
    gauge.show_with_commands(&font, &window, receiver)?;
    Ok(())
}
