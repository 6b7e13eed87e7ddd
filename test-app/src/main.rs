// linkdial test application -- CLI tool for dialing connection descriptors
// through the linkdial orchestrator.
//
// Usage:
//   linkdial-test-app --config linkdial.toml connect varahf://LA1B?freq=3585 telnet://LA1B
//   linkdial-test-app --config linkdial.toml --radio-only connect ardop://LA1B
//   linkdial-test-app --config linkdial.toml --event-log events.jsonl connect home
//   linkdial-test-app --config linkdial.toml parse home
//   linkdial-test-app --config linkdial.toml aliases
//   linkdial-test-app --config linkdial.toml rigs
//
// Logging follows RUST_LOG (default: info).
// Ctrl-C aborts the connect (QSY, busy wait, or dial) and waits for its
// cleanup; a second Ctrl-C stops waiting.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use linkdial::{
    profile, resolve_alias, Config, Connection, ConnectionDescriptor, DialEvent, DialerBuilder,
    EventLog, Exchange, JsonLinesEventLog, Rig, RigLookup, RigTable, Scheme, TracingEventLog,
};

/// How long exit waits for a cancelled connect to restore the rig.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// linkdial test application -- dials connection descriptors from the command line.
#[derive(Parser)]
#[command(name = "linkdial-test-app", version, about)]
struct Cli {
    /// TOML configuration file. Without one, built-in defaults are used.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override the station callsign.
    #[arg(long)]
    mycall: Option<String>,

    /// Dial in radio-only mode.
    #[arg(long)]
    radio_only: bool,

    /// Dial without waiting for a busy channel to clear.
    #[arg(long)]
    ignore_busy: bool,

    /// Append one JSON line per connection attempt to this file.
    #[arg(long)]
    event_log: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dial each descriptor (or alias) in order until one connects, then
    /// bridge the session to stdin/stdout.
    Connect {
        /// Descriptors or alias names, in priority order.
        #[arg(required = true)]
        descriptors: Vec<String>,
    },

    /// Show how a descriptor (or alias) would be dialed.
    Parse {
        /// Descriptor or alias name.
        descriptor: String,
    },

    /// List configured connect aliases.
    Aliases,

    /// Connect to the configured rigctld rigs and print their frequencies.
    Rigs,
}

// ---------------------------------------------------------------------------
// Exchange: stdin/stdout bridge
// ---------------------------------------------------------------------------

/// Copies the remote stream to stdout and stdin to the remote until either
/// side closes.
struct Terminal;

#[async_trait]
impl Exchange for Terminal {
    async fn exchange(&self, conn: Connection, target: &str) -> linkdial::Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("*** Connected to {target} ({})\n", conn.remote).as_bytes())
            .await?;

        let (mut from_remote, mut to_remote) = tokio::io::split(conn.stream);
        let mut stdin = tokio::io::stdin();
        tokio::select! {
            r = tokio::io::copy(&mut from_remote, &mut stdout) => { r?; }
            r = tokio::io::copy(&mut stdin, &mut to_remote) => {
                r?;
                to_remote.shutdown().await?;
            }
        }
        stdout.flush().await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_connect(cli: &Cli, config: Config, descriptors: &[String]) -> Result<bool> {
    let events: Arc<dyn EventLog> = match &cli.event_log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening event log {}", path.display()))?;
            Arc::new(JsonLinesEventLog::new(file))
        }
        None => Arc::new(TracingEventLog),
    };

    tracing::debug!(candidates = descriptors.len(), "Starting connect");

    let (status_tx, mut status_rx) = broadcast::channel(16);
    tokio::spawn(async move {
        while let Ok(event) = status_rx.recv().await {
            match event {
                DialEvent::DialingStarted { descriptor } => eprintln!("Dialing {descriptor}"),
                DialEvent::DialingEnded => {}
            }
        }
    });

    let rigs = RigTable::connect_rigctld(&config).await;
    let dialer = Arc::new(
        DialerBuilder::new(config, Arc::new(Terminal))
            .rigs(Arc::new(rigs))
            .status_sink(Arc::new(status_tx))
            .event_log(events)
            .build(),
    );

    let task = dialer.start_any(descriptors.to_vec());
    let abort = task.abort_handle();
    let run = task.wait();
    tokio::pin!(run);
    let connected = loop {
        tokio::select! {
            connected = &mut run => break connected,
            _ = tokio::signal::ctrl_c() => {
                if abort.is_aborted() {
                    eprintln!("Interrupted");
                    break false;
                }
                eprintln!("Aborting...");
                abort.abort();
            }
        }
    };

    // Shutdown waits for the connect task to release the radio, so a pending
    // QSX still reaches the rig. Bounded in case an exchange is still open.
    if tokio::time::timeout(SHUTDOWN_GRACE, dialer.shutdown()).await.is_err() {
        tracing::warn!("Shutdown timed out; rig may not be back on its previous frequency");
    }
    Ok(connected)
}

fn cmd_parse(config: &Config, descriptor: &str) -> Result<()> {
    let resolved = resolve_alias(&config.connect_aliases, descriptor)?;
    if resolved != descriptor {
        println!("alias:      {descriptor} -> {resolved}");
    }
    let parsed = ConnectionDescriptor::parse(resolved)?;
    let profile = profile(parsed.scheme());
    let dialed = profile.apply_defaults(parsed, config);

    println!("scheme:     {}", dialed.scheme());
    println!("user:       {}", dialed.user().unwrap_or("-"));
    println!("host:       {}", if dialed.host().is_empty() { "-" } else { dialed.host() });
    println!("target:     {}", dialed.target());
    if !dialed.via().is_empty() {
        println!("via:        {}", dialed.via().join(" "));
    }
    for (key, value) in dialed.params().iter() {
        println!("param:      {key} = {value}");
    }
    match dialed.frequency() {
        Some(Ok(freq)) => println!("frequency:  {freq}"),
        Some(Err(e)) => println!("frequency:  invalid ({e})"),
        None => {}
    }
    println!("radio-only: {}", if profile.radio_only { "supported" } else { "not supported" });
    println!("busy gate:  {}", if profile.shared_channel { "yes" } else { "no" });
    println!("rig:        {}", config.rig_name_for(dialed.scheme()).unwrap_or("-"));
    println!("canonical:  {dialed}");
    Ok(())
}

fn cmd_aliases(config: &Config) -> Result<()> {
    let mut aliases: Vec<_> = config.connect_aliases.iter().collect();
    aliases.sort();
    if aliases.is_empty() {
        println!("No connect aliases configured.");
    }
    for (name, descriptor) in aliases {
        println!("{name:<16} {descriptor}");
    }
    Ok(())
}

async fn cmd_rigs(config: &Config) -> Result<()> {
    let rigs = RigTable::connect_rigctld(config).await;
    let loaded = rigs.loaded();
    if loaded.is_empty() {
        println!("No rigs loaded.");
    }
    for name in loaded {
        let Some(rig) = rigs.rig_named(name) else {
            continue;
        };
        match rig.get_frequency().await {
            Ok(freq) => println!("{name:<12} {freq}"),
            Err(e) => println!("{name:<12} error: {e}"),
        }
    }
    for scheme in Scheme::ALL {
        if let Some(name) = config.rig_name_for(scheme) {
            println!("{:<12} -> {name}", scheme.as_str());
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(mycall) = &cli.mycall {
        config.mycall = mycall.to_uppercase();
    }
    config.radio_only |= cli.radio_only;
    config.ignore_busy |= cli.ignore_busy;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Command::Connect { descriptors } => {
            if !cmd_connect(&cli, config, descriptors).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Parse { descriptor } => cmd_parse(&config, descriptor),
        Command::Aliases => cmd_aliases(&config),
        Command::Rigs => cmd_rigs(&config).await,
    }
}
