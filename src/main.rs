//! Ghost Monitor - tail game server logs and forward matched events to webhooks.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use ghost_monitor::config::{AppConfig, ConfigLoader, TargetList};
use ghost_monitor::extract::EventExtractor;
use ghost_monitor::sink::{NotificationSink, WebhookSink};
use ghost_monitor::status::{ConsoleStatus, StatusEvent, StatusSink};
use ghost_monitor::supervisor::{Supervisor, TargetReloader};
use ghost_monitor::templates::{MessageKey, TemplateStore};
use ghost_monitor::watcher::WatchContext;

#[derive(Parser)]
#[command(
    name = "ghost-monitor",
    about = "Tail game server logs and forward matched events to webhooks",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (default: ./ghost-monitor.toml, then the user config dir).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Template source, overriding the config file.
    #[arg(long, global = true)]
    templates: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch every configured log file until Ctrl+C.
    Run {
        /// Target list, overriding the config file.
        #[arg(long)]
        targets: Option<PathBuf>,
        /// Restart watchers when the target list changes.
        #[arg(long)]
        watch_targets: bool,
        /// Print status lines without colors.
        #[arg(long)]
        plain: bool,
    },
    /// Validate the configuration and show what would be watched.
    Check {
        /// Target list, overriding the config file.
        #[arg(long)]
        targets: Option<PathBuf>,
    },
    /// Render log lines with the current templates without delivering.
    Extract {
        /// Lines to render.
        #[arg(required = true)]
        lines: Vec<String>,
    },
    /// Post one message to a webhook and print the outcome.
    Send {
        /// Destination webhook URL.
        webhook: Url,
        /// Message text.
        message: String,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig, String> {
    let loader = path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    loader.load().map_err(|e| e.to_string())
}

fn build_sink(config: &AppConfig) -> Result<WebhookSink, String> {
    WebhookSink::with_timeouts(
        config.delivery.success,
        config.delivery.connect_timeout(),
        config.delivery.timeout(),
    )
    .map_err(|e| format!("Failed to build HTTP client: {e}"))
}

/// Open the template store, reporting a broken source on the status channel.
fn open_templates(path: PathBuf, status: &dyn StatusSink) -> TemplateStore {
    let store = TemplateStore::new(path);
    if let Err(e) = store.reload() {
        status.emit(StatusEvent::TemplatesInvalid {
            error: e.to_string(),
        });
    }
    store
}

async fn run(
    config: AppConfig,
    targets_path: PathBuf,
    watch_targets: bool,
    plain: bool,
) -> Result<(), String> {
    let status: Arc<dyn StatusSink> = Arc::new(ConsoleStatus::new(plain));
    let templates = Arc::new(open_templates(config.paths.templates.clone(), status.as_ref()));
    let sink: Arc<dyn NotificationSink> = Arc::new(build_sink(&config)?);

    let ctx = WatchContext::new(templates, sink, Arc::clone(&status))
        .with_extractor(EventExtractor::new(config.rules.rule_set()))
        .with_poll_interval(config.watcher.poll_interval());
    let mut supervisor = Supervisor::new(ctx);

    let targets = supervisor.load_targets(&targets_path);
    let reload = watch_targets || config.service.reload_targets;
    if targets.is_empty() && !reload {
        return Err(format!(
            "No watch targets configured in {}",
            targets_path.display()
        ));
    }

    tracing::info!(
        targets = targets.len(),
        reload,
        templates = %config.paths.templates.display(),
        "Starting ghost monitor"
    );
    supervisor.start_all(&targets);

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    if reload {
        TargetReloader::new(&targets_path, config.service.check_interval())
            .run(&mut supervisor, &shutdown)
            .await;
    } else {
        shutdown.cancelled().await;
    }

    let finished = supervisor.shutdown().await;
    tracing::info!(watchers = finished.len(), "Ghost monitor stopped");
    Ok(())
}

fn check(config: &AppConfig, targets_path: &Path) -> Result<(), String> {
    println!("Templates: {}", config.paths.templates.display());
    let templates = TemplateStore::new(config.paths.templates.clone());
    match templates.reload() {
        Ok(map) => println!("  {} template(s) loaded", map.len()),
        Err(e) => println!("  {e} (built-in defaults in use)"),
    }
    let snapshot = templates.snapshot();
    for key in MessageKey::ALL {
        println!("  {key} = {:?}", snapshot.template(key));
    }

    println!("Targets: {}", targets_path.display());
    let list = TargetList::load(targets_path).map_err(|e| e.to_string())?;
    for target in &list.targets {
        let state = if target.logfile().exists() {
            "ok"
        } else {
            "missing"
        };
        println!("  [{state}] {target}");
    }
    for skipped in &list.skipped {
        println!("  [skipped #{}] {}", skipped.index, skipped.reason);
    }
    if list.targets.is_empty() {
        return Err("No valid watch targets".to_string());
    }
    Ok(())
}

fn extract(config: &AppConfig, lines: &[String]) {
    let templates = TemplateStore::open(config.paths.templates.clone());
    let snapshot = templates.snapshot();
    let extractor = EventExtractor::new(config.rules.rule_set());
    for line in lines {
        match extractor.extract(line, &snapshot) {
            Some(event) => println!("{:?}: {event}", event.kind),
            None => println!("(no match): {line}"),
        }
    }
}

async fn send(config: &AppConfig, webhook: &Url, message: &str) -> Result<(), String> {
    let sink = build_sink(config)?;
    let result = sink.deliver(webhook, message).await;
    println!("{result}");
    if result.is_delivered() {
        Ok(())
    } else {
        Err(format!("Delivery to {webhook} failed"))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(templates) = cli.templates {
        config.paths.templates = templates;
    }

    let result = match cli.command {
        Commands::Run {
            targets,
            watch_targets,
            plain,
        } => {
            let targets_path = targets.unwrap_or_else(|| config.paths.targets.clone());
            run(config, targets_path, watch_targets, plain).await
        }
        Commands::Check { targets } => {
            let targets_path = targets.unwrap_or_else(|| config.paths.targets.clone());
            check(&config, &targets_path)
        }
        Commands::Extract { lines } => {
            extract(&config, &lines);
            Ok(())
        }
        Commands::Send { webhook, message } => send(&config, &webhook, &message).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
