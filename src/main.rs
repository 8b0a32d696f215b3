//! Static Mask CLI
//!
//! Streams raw planar video through the static-region mask. Frames are
//! read tightly packed (planes back to back) from a file or stdin and
//! written the same way to a file or stdout.

use clap::Parser;
use static_mask::{
    config::FileConfig,
    mask::{ChromaAddressing, ConfigError, MaskError, StaticMask},
    metrics::{MetricsRegistry, MetricsSnapshot},
    video::{
        FrameSource, PixelFormat, RawVideoReader, RawVideoWriter, SourceError, SyntheticSource,
    },
};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "static-mask", version, about = "Blank unchanging blocks of raw planar video")]
struct Cli {
    /// Raw input video ("-" for stdin).
    #[arg(short, long, conflicts_with = "synthetic")]
    input: Option<String>,

    /// Raw output video ("-" for stdout). Frames are discarded if omitted.
    #[arg(short, long)]
    output: Option<String>,

    /// TOML configuration file; command-line flags override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frame width in pixels.
    #[arg(long)]
    width: Option<usize>,

    /// Frame height in pixels.
    #[arg(long)]
    height: Option<usize>,

    /// Pixel format of the raw frames (e.g. yuv420p).
    #[arg(long)]
    pix_fmt: Option<PixelFormat>,

    /// Block side in pixels (1-600).
    #[arg(long)]
    size: Option<u32>,

    /// Normalized difference threshold (0-1000).
    #[arg(long)]
    threshold: Option<f64>,

    /// Number of frames to look back (1-100).
    #[arg(long)]
    frame_back: Option<u32>,

    /// Address chroma with the format's own subsampling instead of halving.
    #[arg(long)]
    native_chroma: bool,

    /// Generate this many synthetic frames instead of reading input.
    #[arg(long)]
    synthetic: Option<u64>,

    /// Serve Prometheus metrics on this port (requires the `metrics` feature).
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Print the final metrics in Prometheus text format to stderr.
    #[arg(long)]
    dump_metrics: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Mask(#[from] MaskError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Metrics(#[from] static_mask::metrics::MetricsError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("no input given: pass --input or --synthetic")]
    NoInput,
}

fn main() {
    // Logs go to stderr so stdout can carry video.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<FileConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    if let Some(width) = cli.width {
        config.input.width = width;
    }
    if let Some(height) = cli.height {
        config.input.height = height;
    }
    if let Some(format) = cli.pix_fmt {
        config.input.pixel_format = format;
    }
    if let Some(size) = cli.size {
        config.mask.block_size = size;
    }
    if let Some(threshold) = cli.threshold {
        config.mask.threshold = threshold;
    }
    if let Some(frame_back) = cli.frame_back {
        config.mask.frame_back = frame_back;
    }
    if cli.native_chroma {
        config.mask.chroma = ChromaAddressing::Native;
    }
    if let Some(port) = cli.metrics_port {
        config.output.metrics_port = port;
    }

    config.mask.validate()?;
    Ok(config)
}

fn open_source(cli: &Cli, config: &FileConfig) -> Result<Box<dyn FrameSource>, CliError> {
    let geometry = config.input.geometry();
    if let Some(count) = cli.synthetic {
        let square = config.mask.block_size as usize * 2;
        return Ok(Box::new(SyntheticSource::new(geometry, count, square)?));
    }

    let reader: Box<dyn Read> = match cli.input.as_deref() {
        Some("-") => Box::new(io::stdin().lock()),
        Some(path) => Box::new(File::open(path)?),
        None => return Err(CliError::NoInput),
    };
    Ok(Box::new(RawVideoReader::new(BufReader::new(reader), geometry)?))
}

fn open_sink(cli: &Cli) -> Result<Option<RawVideoWriter<Box<dyn Write>>>, CliError> {
    let writer: Box<dyn Write> = match cli.output.as_deref() {
        None => return Ok(None),
        Some("-") => Box::new(BufWriter::new(io::stdout().lock())),
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
    };
    Ok(Some(RawVideoWriter::new(writer)))
}

fn run(cli: Cli) -> Result<(), CliError> {
    info!("Static Mask v{}", static_mask::VERSION);

    let config = load_config(&cli)?;
    let mut source = open_source(&cli, &config)?;
    let mut sink = open_sink(&cli)?;

    let mut mask = StaticMask::new(config.mask.clone())?;
    mask.setup(source.geometry())?;

    let registry = MetricsRegistry::new()?;
    let exporter = start_exporter(&config)?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    while running.load(Ordering::SeqCst) {
        let Some(mut frame) = source.next_frame()? else {
            break;
        };

        mask.process(&mut frame)?;
        if let Some(writer) = sink.as_mut() {
            writer.write_frame(&frame)?;
        }

        let processed = mask.frame_index();
        if config.output.log_every > 0 && processed % config.output.log_every == 0 {
            let stats = mask.stats();
            info!(
                frames = processed,
                masked_ratio = stats.masked_ratio(),
                "Progress"
            );
            exporter.publish(&registry, &MetricsSnapshot::from_stage(&mask));
        }
    }

    if !running.load(Ordering::SeqCst) {
        warn!("Interrupted, stopping after frame {}", mask.frame_index());
    }

    if let Some(writer) = sink {
        let frames = writer.frames_written();
        writer.finish()?;
        info!(frames, "Output flushed");
    }

    let snapshot = MetricsSnapshot::from_stage(&mask);
    exporter.publish(&registry, &snapshot);

    let stats = mask.stats();
    info!(
        "Processed {} frames: {} of {} blocks masked ({:.1}%)",
        stats.frames_processed,
        stats.blocks_masked,
        stats.blocks_total,
        stats.masked_ratio() * 100.0
    );

    if cli.dump_metrics {
        eprint!("{}", registry.encode()?);
    }

    mask.teardown();
    exporter.publish(&registry, &MetricsSnapshot::from_stage(&mask));
    Ok(())
}

/// Where metric snapshots go: the local registry and, if serving, the HTTP exporter.
struct Exporter {
    #[cfg(feature = "metrics")]
    served: Option<(
        tokio::runtime::Runtime,
        Arc<tokio::sync::RwLock<static_mask::metrics::MetricsState>>,
    )>,
}

impl Exporter {
    fn publish(&self, registry: &MetricsRegistry, snapshot: &MetricsSnapshot) {
        registry.update(snapshot);
        #[cfg(feature = "metrics")]
        {
            if let Some((_, state)) = &self.served {
                state.blocking_write().publish(snapshot);
            }
        }
    }
}

#[cfg(feature = "metrics")]
fn start_exporter(config: &FileConfig) -> Result<Exporter, CliError> {
    use static_mask::metrics::{MetricsServer, MetricsServerConfig};

    let Some(server_config) = MetricsServerConfig::from_output(&config.output) else {
        return Ok(Exporter { served: None });
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let server = MetricsServer::new(server_config, MetricsRegistry::new()?);
    let state = server.state();
    runtime.spawn(async move {
        if let Err(e) = server.run().await {
            error!("Metrics exporter failed: {}", e);
        }
    });

    Ok(Exporter {
        served: Some((runtime, state)),
    })
}

#[cfg(not(feature = "metrics"))]
fn start_exporter(config: &FileConfig) -> Result<Exporter, CliError> {
    if config.output.metrics_port != 0 {
        warn!(
            port = config.output.metrics_port,
            "Built without the `metrics` feature; metrics server disabled"
        );
    }
    Ok(Exporter {})
}
