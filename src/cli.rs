// src/cli.rs
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use internship_sentinel::config::Settings;
use internship_sentinel::discovery::config::load_watchers_from;
use internship_sentinel::discovery::{
    build_watchers, provider_context, run_with_state, state,
};
use internship_sentinel::metrics::Metrics;
use internship_sentinel::notify::NotifierMux;

#[derive(Parser, Debug)]
#[command(
    name = "sentinel",
    about = "Poll ATS job boards and alert once per new internship listing",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every watcher once, send alerts, persist state (default command)
    Run,
    /// Print the listings recorded by the last run
    Show {
        /// Only this watcher
        #[arg(long)]
        watcher: Option<String>,
    },
    /// Forget every notified fingerprint so all current listings alert again
    Reset,
    /// Fetch a single watcher and print its listings without alerting
    Check {
        /// Watcher name as it appears in the watchers file
        name: String,
    },
}

pub(crate) async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load()?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_discovery(&settings).await,
        Command::Show { watcher } => show(&settings, watcher.as_deref()),
        Command::Reset => reset(&settings),
        Command::Check { name } => check(&settings, &name).await,
    }
}

async fn run_discovery(settings: &Settings) -> Result<()> {
    let metrics = match &settings.metrics_path {
        Some(_) => Some(Metrics::init()?),
        None => None,
    };

    let configs = load_watchers_from(&settings.watchers_path)?;
    let ctx = provider_context(settings)?;
    let watchers = build_watchers(&configs, &ctx);
    let notifier = NotifierMux::from_env();

    let outcome = run_with_state(&settings.state_paths(), &watchers, &notifier).await?;
    println!(
        "{} watcher(s), {} new alert(s), {} failure(s)",
        watchers.len(),
        outcome.new_alerts,
        outcome.failures.len()
    );

    if let (Some(m), Some(path)) = (metrics, &settings.metrics_path) {
        if let Err(e) = m.write_textfile(path) {
            tracing::warn!(error = %e, "metrics textfile not written");
        }
    }
    Ok(())
}

fn show(settings: &Settings, only: Option<&str>) -> Result<()> {
    let snapshot = state::load_snapshot(&settings.state_paths().snapshot);
    if snapshot.is_empty() {
        println!("No listings recorded yet.");
        return Ok(());
    }
    let mut printed = false;
    for (name, listings) in snapshot.iter() {
        if only.is_some_and(|w| w != name) {
            continue;
        }
        printed = true;
        println!("{name} ({})", listings.len());
        for l in listings {
            println!("  - {} → {}", l.title, l.url);
        }
    }
    if !printed {
        if let Some(w) = only {
            return Err(anyhow!("no snapshot entry for watcher {w:?}"));
        }
    }
    Ok(())
}

fn reset(settings: &Settings) -> Result<()> {
    let path = settings.state_paths().notified;
    state::reset_notified(&path)?;
    println!("Cleared {}", path.display());
    Ok(())
}

async fn check(settings: &Settings, name: &str) -> Result<()> {
    let configs = load_watchers_from(&settings.watchers_path)?;
    let cfg = configs
        .into_iter()
        .find(|c| c.name == name)
        .ok_or_else(|| anyhow!("no valid watcher named {name:?}"))?;
    let ctx = provider_context(settings)?;
    let provider = cfg.spec()?.build(&ctx);
    let notified = state::load_notified(&settings.state_paths().notified)?;

    let listings = provider.fetch().await?;
    println!("{name} via {}: {} listing(s)", provider.name(), listings.len());
    for l in &listings {
        let mark = if notified.contains(&provider.fingerprint(l)) {
            " "
        } else {
            "*"
        };
        println!("{mark} {} → {}", l.title, l.url);
    }
    Ok(())
}
