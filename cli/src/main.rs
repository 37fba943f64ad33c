//! Kiosk CLI - binary entry point.
//!
//! Reads one identification per line from stdin and submits it to the
//! [`CheckInEngine`]. Each submit runs on its own task, so a line entered
//! while an attempt is in flight reaches the engine and is turned away as
//! busy instead of queueing behind it.
//!
//! ```text
//! stdin line ──> spawn(engine.submit) ──> AttemptReport ──> Console::report
//! frame tick ──> FeedbackChannel::advance ──────────────> Console::render_feedback
//! ```
//!
//! Logs go to `~/.kiosk/logs/kiosk.log`; stdout belongs to the operator.

mod announcer;
mod console;
mod evidence;
mod store;

use std::{
    env,
    fs::{self, OpenOptions},
    io::{self, stdout},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinSet};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use kiosk_engine::{
    AttemptReport, CaptureDevice, CheckInEngine, EngineSettings, EvidencePipeline,
    FeedbackChannel, KioskConfig, SubmitRejected,
};

use crate::announcer::CommandAnnouncer;
use crate::console::Console;
use crate::evidence::{DirectoryEvidenceStore, FileCaptureDevice};
use crate::store::JsonFileRegistrantStore;

const FRAME_DURATION: Duration = Duration::from_millis(50);

const USAGE: &str = "\
Usage: kiosk [--config <path>] [--json]

Reads one identification per line from stdin and checks the registrant in or out.

Options:
  --config <path>  Config file (default: $KIOSK_CONFIG or ~/.kiosk/config.toml)
  --json           Print one JSON attempt report per line
  -h, --help       Show this help";

struct Args {
    config: Option<PathBuf>,
    json: bool,
}

impl Args {
    /// `Ok(None)` when help was requested.
    fn parse(raw: impl IntoIterator<Item = String>) -> Result<Option<Self>> {
        let mut args = Args {
            config: None,
            json: false,
        };
        let mut raw = raw.into_iter();
        while let Some(arg) = raw.next() {
            match arg.as_str() {
                "--json" => args.json = true,
                "--config" => {
                    let path = raw.next().context("--config requires a path")?;
                    args.config = Some(PathBuf::from(path));
                }
                "-h" | "--help" => return Ok(None),
                other => bail!("unknown argument: {other}\n\n{USAGE}"),
            }
        }
        Ok(Some(args))
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut unusable = Vec::new();
    let log_file = kiosk_log_file_candidates()
        .into_iter()
        .find_map(|path| match open_log_file(&path) {
            Ok(file) => Some((path, file)),
            Err(e) => {
                unusable.push(format!("{}: {e}", path.display()));
                None
            }
        });

    let Some((log_path, file)) = log_file else {
        // Stdout belongs to the operator; without a log file nothing is logged.
        tracing_subscriber::registry().with(env_filter).init();
        return;
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(env_filter)
        .init();
    tracing::info!(path = %log_path.display(), "Logging initialized");
    for problem in unusable {
        tracing::warn!("Skipped log file {problem}");
    }
}

fn open_log_file(path: &Path) -> io::Result<fs::File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn kiosk_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: next to the config file, normally ~/.kiosk/logs/kiosk.log
    if let Some(config_path) = KioskConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("kiosk.log"));
    }

    // Fallback: ./.kiosk/logs/kiosk.log
    candidates.push(PathBuf::from(".kiosk").join("logs").join("kiosk.log"));

    candidates
}

fn load_config(path: Option<&Path>) -> Result<KioskConfig> {
    if let Some(path) = path {
        return KioskConfig::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }
    match KioskConfig::load().context("failed to load config")? {
        Some(config) => Ok(config),
        None => {
            tracing::info!("No config file found; using defaults");
            Ok(KioskConfig::default())
        }
    }
}

fn build_engine(config: &KioskConfig) -> CheckInEngine {
    let registrants = JsonFileRegistrantStore::new(config.registrants_file());
    tracing::info!(path = %registrants.path().display(), "Registrant store");

    let announcer = CommandAnnouncer::from_config(&config.announcer());
    if announcer.is_silent() {
        tracing::warn!("No speech command configured; announcements are only shown");
    }

    let feedback = Arc::new(Mutex::new(FeedbackChannel::new(
        config.fade_timings(),
        config.notice_ttl(),
    )));
    let engine = CheckInEngine::new(
        EngineSettings::from_config(config),
        Arc::new(registrants),
        Arc::new(announcer),
    )
    .with_feedback(feedback);

    let evidence = config.evidence();
    if !evidence.enabled {
        tracing::info!("Evidence capture disabled");
        return engine;
    }

    let device = config.capture_source().map(|source| {
        tracing::info!(source = %source.display(), "Capture device");
        Arc::new(FileCaptureDevice::new(source)) as Arc<dyn CaptureDevice>
    });
    if device.is_none() {
        tracing::warn!("No capture source configured; every attempt will report missing evidence");
    }
    let store = DirectoryEvidenceStore::new(config.evidence_dir());
    tracing::info!(root = %store.root().display(), "Evidence store");

    engine.with_evidence(
        EvidencePipeline::new(device, Arc::new(store))
            .with_options(config.capture_options())
            .with_prefix(evidence.prefix),
    )
}

type AttemptResult = Result<AttemptReport, SubmitRejected>;

fn spawn_attempt(
    attempts: &mut JoinSet<AttemptResult>,
    engine: &Arc<CheckInEngine>,
    line: String,
) {
    let engine = Arc::clone(engine);
    attempts.spawn(async move { engine.submit(Some(&line)).await });
}

/// The attempt's result, or `None` when its task died before producing one.
fn settle(joined: Result<AttemptResult, JoinError>) -> Option<AttemptResult> {
    match joined {
        Ok(result) => Some(result),
        Err(err) => {
            tracing::error!(error = %err, "Attempt task ended without a result");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let Some(args) = Args::parse(env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };

    init_tracing();

    let config = load_config(args.config.as_deref())?;
    let engine = Arc::new(build_engine(&config));
    let feedback = engine.feedback();
    let mut console = Console::new(stdout(), args.json);

    let mut attempts = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut frames = tokio::time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last_frame = Instant::now();
    let mut input_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                match line.context("failed to read stdin")? {
                    Some(line) => spawn_attempt(&mut attempts, &engine, line),
                    None => input_open = false,
                }
            }
            Some(joined) = attempts.join_next(), if !attempts.is_empty() => {
                if let Some(result) = settle(joined) {
                    console.report(&result)?;
                }
            }
            _ = frames.tick() => {
                let now = Instant::now();
                let mut feedback = feedback.lock().unwrap_or_else(PoisonError::into_inner);
                feedback.advance(now - last_frame);
                last_frame = now;
                console.render_feedback(&feedback)?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }

        if !input_open && attempts.is_empty() {
            break;
        }
    }

    // Notices raised by the last attempt.
    let feedback = feedback.lock().unwrap_or_else(PoisonError::into_inner);
    console.render_feedback(&feedback)?;
    Ok(())
}
