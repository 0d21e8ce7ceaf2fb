// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Volt CLI
//!
//! Runs demo circuits on the Volt engine and manages simulation prefs.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::Table;
use tokio::time::{self, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use volt_app_core::config::ConfigService;
use volt_app_core::prefs::{SimPrefs, PREFS_KEY};
use volt_app_core::prefs_port::PrefsPort;
use volt_clock::Simulation;
use volt_config_fs::FsConfigStore;
use volt_core::{AdvanceOutcome, NonConvergence};

mod demos;
mod render;

#[derive(Parser, Debug)]
#[command(author, version, about = "Volt tri-state logic simulator")]
struct Args {
    /// Directory holding `sim.json` (defaults to the platform config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    /// Propagation ceiling per advance, for this run only
    #[arg(long, global = true)]
    iteration_limit: Option<usize>,
    /// Oscillator refresh step in milliseconds, for this run only
    #[arg(long, global = true)]
    refresh_ms: Option<u64>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Walk a NOR SR latch through set, hold, reset, hold
    Latch,
    /// Drive XOR/AND gates from two clocks and draw the waveforms
    Clock {
        /// Half-period of the fast clock; the slow clock runs at twice this
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
        /// Simulated run length
        #[arg(long, default_value_t = 1000)]
        run_ms: u64,
        /// Step simulated time directly instead of pacing on the wall clock
        #[arg(long)]
        no_wait: bool,
        /// Width of each waveform strip
        #[arg(long, default_value_t = 64)]
        columns: usize,
    },
    /// Print the effective prefs as JSON
    Prefs {
        /// Persist the effective prefs (including overrides)
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    match &args.cmd {
        Command::Latch => latch(&demo_prefs(&args)),
        Command::Clock {
            interval_ms,
            run_ms,
            no_wait,
            columns,
        } => {
            let prefs = demo_prefs(&args);
            clock(&prefs, *interval_ms, *run_ms, *no_wait, *columns).await
        }
        Command::Prefs { save } => show_prefs(&args, *save),
    }
}

fn open_config(args: &Args) -> Result<ConfigService<FsConfigStore>> {
    let store = match &args.config_dir {
        Some(dir) => FsConfigStore::with_base(dir),
        None => FsConfigStore::new(),
    }
    .context("open config store")?;
    Ok(ConfigService::new(store))
}

fn apply_overrides(args: &Args, mut prefs: SimPrefs) -> SimPrefs {
    if let Some(limit) = args.iteration_limit {
        prefs.circuit.iteration_limit = limit;
    }
    if let Some(refresh) = args.refresh_ms {
        prefs.oscillator.refresh_rate_ms = refresh;
    }
    prefs
}

/// Demos still run when the config store is unreadable.
fn demo_prefs(args: &Args) -> SimPrefs {
    let stored = open_config(args).and_then(|service| service.load_prefs().context("load prefs"));
    let prefs = stored.unwrap_or_else(|err| {
        warn!(error = %err, "falling back to default prefs");
        SimPrefs::default()
    });
    apply_overrides(args, prefs)
}

fn latch(prefs: &SimPrefs) -> Result<()> {
    let rows = demos::latch_walkthrough(prefs.circuit)?;
    let mut table = Table::new();
    table.set_header(vec!["step", "S", "R", "Q", "Qn", "propagations"]);
    for row in rows {
        table.add_row(vec![
            row.label.to_owned(),
            row.s.to_string(),
            row.r.to_string(),
            row.q.to_string(),
            row.qn.to_string(),
            describe(row.outcome),
        ]);
    }
    let mut out = std::io::stdout().lock();
    writeln!(out, "{table}")?;
    Ok(())
}

fn describe(outcome: AdvanceOutcome) -> String {
    match outcome {
        AdvanceOutcome::Settled { steps } => steps.to_string(),
        AdvanceOutcome::Unsettled { steps, pending } => {
            format!("{steps} (did not converge, {pending} queued)")
        }
    }
}

async fn clock(
    prefs: &SimPrefs,
    interval_ms: u64,
    run_ms: u64,
    no_wait: bool,
    columns: usize,
) -> Result<()> {
    let mut demo = demos::clocked_gates(prefs, interval_ms)?;
    let refresh_ms = prefs.oscillator.refresh_rate_ms;
    let stalled = if no_wait {
        run_stepped(&mut demo.sim, run_ms, refresh_ms)
    } else {
        run_paced(&mut demo.sim, run_ms, refresh_ms).await
    };
    demo.sim.stop();
    if let Some(err) = stalled {
        warn!(%err, "circuit did not converge during the run");
    }

    let end_ms = demo.sim.oscillator().time_ms_elapsed();
    let start_ms = end_ms.saturating_sub(prefs.waveform_window_ms);
    let mut out = std::io::stdout().lock();
    writeln!(out, "t = {start_ms}..{end_ms} ms")?;
    for wave in &demo.waves {
        let strip = render::strip(&wave.segments(), start_ms, end_ms, columns);
        writeln!(out, "{:>5} |{strip}|", wave.name())?;
    }
    Ok(())
}

/// Feeds simulated time straight into the oscillator, one refresh at a time.
fn run_stepped(sim: &mut Simulation, run_ms: u64, refresh_ms: u64) -> Option<NonConvergence> {
    let mut stalled = None;
    let mut now_ms = 0;
    sim.start(now_ms);
    while now_ms < run_ms {
        now_ms = now_ms.saturating_add(refresh_ms).min(run_ms);
        stalled = stalled.or(sim.tick(now_ms).non_convergence);
    }
    stalled
}

/// Ticks on a wall-clock interval until `run_ms` has passed.
async fn run_paced(sim: &mut Simulation, run_ms: u64, refresh_ms: u64) -> Option<NonConvergence> {
    let mut stalled = None;
    let mut ticker = time::interval(Duration::from_millis(refresh_ms));
    let started = Instant::now();
    sim.start(0);
    info!(run_ms, refresh_ms, "clock demo running");
    loop {
        ticker.tick().await;
        let now_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let tick = sim.tick(now_ms.min(run_ms));
        stalled = stalled.or(tick.non_convergence);
        if now_ms >= run_ms {
            break;
        }
    }
    stalled
}

fn show_prefs(args: &Args, save: bool) -> Result<()> {
    let service = open_config(args)?;
    let prefs = apply_overrides(args, service.load_prefs().context("load prefs")?);
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", serde_json::to_string_pretty(&prefs)?)?;
    if save {
        service.save_prefs(&prefs).context("save prefs")?;
        let path = service.store().path_for(PREFS_KEY);
        info!(path = %path.display(), "prefs saved");
        writeln!(out, "saved {}", path.display())?;
    }
    Ok(())
}
