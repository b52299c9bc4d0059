use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nova::assistant::Assistant;
use nova::automation::{Automation, DesktopAutomation, RecordingAutomation};
use nova::config::{Config, InputSource};
use nova::context::SessionContext;
use nova::listen::{self, KeyboardRecognizer, ListenEvent, Recognizer};
use nova::router::{Router, RouterSettings};
use nova::ui::{Status, StatusLine};
use nova::utterance::Utterance;
use nova::{catalog, chat, speech};

#[derive(Parser)]
#[command(name = "nova", version, about = "Voice-driven desktop assistant")]
struct Cli {
    /// Config file (default: ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log automation instead of touching the desktop
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Listen on the configured input source (default)
    Listen,
    /// Typed utterances only
    Repl,
    /// Print every command with examples
    Commands,
    /// Show which command an utterance resolves to, without running it
    Route {
        #[arg(required = true)]
        text: Vec<String>,
    },
}

#[hotpath::main]
fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref());
    init_tracing(&config.log_level);

    match cli.command.unwrap_or(Command::Listen) {
        Command::Commands => {
            print!("{}", catalog::render());
            Ok(())
        }
        Command::Route { text } => {
            route_once(&config, &text.join(" "));
            Ok(())
        }
        Command::Repl => run(&config, cli.dry_run, InputSource::Keyboard),
        Command::Listen => run(&config, cli.dry_run, config.listen.source),
    }
}

/// `RUST_LOG` wins; otherwise the configured level. Logs go to stderr.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn route_once(config: &Config, text: &str) {
    let router = Router::new(RouterSettings::from(&config.automation));
    match router.resolve(&Utterance::new(text), &SessionContext::new()) {
        Some(res) => println!("{} [{}]: {:?}", res.rule, res.category, res.command),
        None => println!("unhandled"),
    }
}

#[cfg_attr(not(feature = "mic"), allow(unused_variables))]
fn recognizer(
    config: &Config,
    source: InputSource,
    running: Arc<AtomicBool>,
) -> Result<Box<dyn Recognizer>> {
    match source {
        InputSource::Keyboard => Ok(Box::new(KeyboardRecognizer::stdin())),
        #[cfg(feature = "mic")]
        InputSource::Mic => {
            let mic = listen::MicRecognizer::start(&config.listen, running)
                .context("starting microphone capture")?;
            Ok(Box::new(mic))
        }
        #[cfg(not(feature = "mic"))]
        InputSource::Mic => bail!("microphone input needs a build with --features mic"),
    }
}

fn run(config: &Config, dry_run: bool, source: InputSource) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
        .context("installing Ctrl+C handler")?;

    let automation: Box<dyn Automation> = if dry_run {
        Box::new(RecordingAutomation::new())
    } else {
        Box::new(DesktopAutomation::new())
    };
    let chat = chat::from_config(&config.chat).unwrap_or_else(|e| {
        warn!(error = %e, "chat fallback disabled");
        None
    });
    let speaker = speech::speaker_from_config(&config.speech);

    let mut assistant = Assistant::new(config, automation, chat, speaker);
    if source == InputSource::Mic {
        assistant.set_idle_status(Status::Listening);
    }
    info!(
        name = assistant.name(),
        automation = assistant.automation().name(),
        ?source,
        "starting"
    );

    let recognizer = recognizer(config, source, running.clone())?;
    let (tx, rx) = flume::unbounded();
    let capture = {
        let running = running.clone();
        thread::Builder::new()
            .name("capture".into())
            .spawn(move || listen::run_capture(recognizer, tx, running))
            .context("starting capture thread")?
    };

    let mut ui = StatusLine::new();
    ui.show_message(&format!(
        "{} is ready. Say \"help\" to hear what I can do.",
        assistant.name()
    ));
    ui.set(Status::Ready);

    let mut failure = None;
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(250)) {
            Ok(ListenEvent::Utterance(text)) => {
                ui.show_user(&text);
                if let Some(turn) = assistant.handle(&text, &mut |s| ui.set(s)) {
                    ui.show_response(assistant.name(), &turn.response);
                }
            }
            Ok(ListenEvent::Status(Status::Stopped)) => break,
            Ok(ListenEvent::Status(Status::Error(msg))) => {
                ui.set(Status::Error(msg.clone()));
                failure = Some(msg);
                break;
            }
            Ok(ListenEvent::Status(status)) => ui.set(status),
            Err(flume::RecvTimeoutError::Timeout) => {}
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }
    }

    running.store(false, Ordering::SeqCst);
    if failure.is_none() {
        ui.set(Status::Stopped);
    }
    ui.finish();

    // A keyboard reader may still be blocked on stdin; only join a finished thread
    if capture.is_finished() {
        let _ = capture.join();
    }

    match failure {
        Some(msg) => bail!("listening stopped: {}", msg),
        None => Ok(()),
    }
}
