use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use verdict_core::batch::{batch, summarize};
use verdict_core::compare::compare;
use verdict_core::config::{DEFAULT_DETECTION_THRESHOLD, DEFAULT_UNCERTAINTY_RANGE};
use verdict_core::{FacesVerdict, TemporalResult, ThresholdConfig, VideoVerdict};

mod render;

#[derive(Parser)]
#[command(name = "verdict", about = "Deepfake verdict scoring CLI")]
struct Cli {
    /// Talk to verdictd on the system bus instead of the session bus
    #[arg(long, global = true)]
    system: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ScoringOpts {
    /// Detection threshold (center of the uncertain band)
    #[arg(long, default_value_t = DEFAULT_DETECTION_THRESHOLD)]
    threshold: f64,
    /// Half-width of the uncertain band
    #[arg(long, default_value_t = DEFAULT_UNCERTAINTY_RANGE)]
    range: f64,
    /// Print JSON instead of a summary
    #[arg(long)]
    json: bool,
}

/// Scoring that can also run inside verdictd.
#[derive(Args)]
struct RemoteOpts {
    #[command(flatten)]
    scoring: ScoringOpts,
    /// Score with the daemon's current threshold instead
    #[arg(long, conflicts_with_all = ["threshold", "range"])]
    remote: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the face scores of one image
    Faces {
        /// Raw classifier scores, comma separated (0 = fake, 1 = real)
        #[arg(required = true, value_delimiter = ',')]
        scores: Vec<f64>,
        #[command(flatten)]
        opts: RemoteOpts,
    },
    /// Temporal consistency of per-frame scores
    Temporal {
        #[arg(required = true, value_delimiter = ',')]
        scores: Vec<f64>,
        /// Frame numbers matching the scores (default 0, 1, 2, ...)
        #[arg(long, value_delimiter = ',')]
        frames: Vec<u64>,
        #[command(flatten)]
        opts: RemoteOpts,
    },
    /// Whole-video verdict from sampled frame scores
    Video {
        #[arg(required = true, value_delimiter = ',')]
        scores: Vec<f64>,
        #[command(flatten)]
        opts: RemoteOpts,
    },
    /// Compare two media files by their scores
    Compare {
        /// First file name; its extension picks image or video scoring
        #[arg(long)]
        first_name: String,
        #[arg(long, required = true, value_delimiter = ',')]
        first: Vec<f64>,
        /// Second file name
        #[arg(long)]
        second_name: String,
        #[arg(long, required = true, value_delimiter = ',')]
        second: Vec<f64>,
        #[command(flatten)]
        opts: ScoringOpts,
    },
    /// Score several media files; failures are reported per file
    Batch {
        /// NAME=SCORES items, e.g. face.jpg=0.9,0.8 clip.mp4=0.2,0.3
        #[arg(required = true, value_parser = parse_batch_item)]
        items: Vec<(String, Vec<f64>)>,
        #[command(flatten)]
        opts: ScoringOpts,
    },
    /// Set the daemon's detection threshold
    SetThreshold {
        /// New threshold, clamped by the daemon to [0.1, 0.9]
        value: f64,
    },
    /// Show daemon status
    Status,
}

// `#[zbus::proxy]` generates the async `VerdictDaemonProxy`.
#[zbus::proxy(
    interface = "org.freedesktop.Verdict1",
    default_service = "org.freedesktop.Verdict1",
    default_path = "/org/freedesktop/Verdict1"
)]
trait VerdictDaemon {
    async fn classify_faces(&self, scores: &[f64]) -> zbus::Result<String>;
    async fn classify_temporal(
        &self,
        scores: &[f64],
        frame_numbers: &[u64],
    ) -> zbus::Result<String>;
    async fn classify_video(&self, scores: &[f64]) -> zbus::Result<String>;
    async fn set_threshold(&self, threshold: f64) -> zbus::Result<f64>;
    async fn status(&self) -> zbus::Result<String>;
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Faces { scores, opts } => {
            let result: FacesVerdict = if opts.remote {
                let reply = connect(cli.system).await?.classify_faces(&scores).await?;
                serde_json::from_str(&reply)?
            } else {
                verdict_core::validate_scores(&scores)?;
                verdict_core::classify_faces(&scores, &local_config(&opts.scoring)?)?
            };
            emit(&result, opts.scoring.json, render::faces)?;
        }
        Commands::Temporal {
            scores,
            frames,
            opts,
        } => {
            let result: TemporalResult = if opts.remote {
                let reply = connect(cli.system)
                    .await?
                    .classify_temporal(&scores, &frames)
                    .await?;
                serde_json::from_str(&reply)?
            } else {
                verdict_core::validate_scores(&scores)?;
                let config = local_config(&opts.scoring)?;
                if frames.is_empty() {
                    verdict_core::classify_temporal_indexed(&scores, &config)?
                } else {
                    verdict_core::classify_temporal(&scores, &frames, &config)?
                }
            };
            emit(&result, opts.scoring.json, render::temporal)?;
        }
        Commands::Video { scores, opts } => {
            let result: VideoVerdict = if opts.remote {
                let reply = connect(cli.system).await?.classify_video(&scores).await?;
                serde_json::from_str(&reply)?
            } else {
                verdict_core::validate_scores(&scores)?;
                verdict_core::classify_video_sampled(&scores, &local_config(&opts.scoring)?)?
            };
            emit(&result, opts.scoring.json, render::video)?;
        }
        Commands::Compare {
            first_name,
            first,
            second_name,
            second,
            opts,
        } => {
            let config = local_config(&opts)?;
            let a = summarize(first_name, &first, &config)?;
            let b = summarize(second_name, &second, &config)?;
            emit(&compare(a, b), opts.json, render::comparison)?;
        }
        Commands::Batch { items, opts } => {
            let report = batch(items, &local_config(&opts)?);
            emit(&report, opts.json, render::batch)?;
        }
        Commands::SetThreshold { value } => {
            let applied = connect(cli.system).await?.set_threshold(value).await?;
            println!("Detection threshold set to {applied:.2}");
        }
        Commands::Status => {
            let reply = connect(cli.system)
                .await
                .context("verdictd: not connected")?
                .status()
                .await?;
            let status: serde_json::Value = serde_json::from_str(&reply)?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

async fn connect(system: bool) -> Result<VerdictDaemonProxy<'static>> {
    tracing::debug!(system, "connecting to verdictd");
    let conn = if system {
        zbus::Connection::system().await?
    } else {
        zbus::Connection::session().await?
    };
    Ok(VerdictDaemonProxy::new(&conn).await?)
}

fn local_config(opts: &ScoringOpts) -> Result<ThresholdConfig> {
    Ok(ThresholdConfig::new(opts.threshold, opts.range)?)
}

/// Parse one `NAME=SCORES` batch item. An empty score list is kept so the
/// batch can report it against that file.
fn parse_batch_item(raw: &str) -> Result<(String, Vec<f64>)> {
    let (name, scores) = raw
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("expected NAME=SCORES, got {raw:?}"))?;
    let scores = scores
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().with_context(|| format!("bad score {s:?} for {name}")))
        .collect::<Result<Vec<_>>>()?;
    Ok((name.to_string(), scores))
}

fn emit<T: serde::Serialize>(value: &T, json: bool, render: fn(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", render(value));
    }
    Ok(())
}
