//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::snapshot_adapter;
use crate::domain::analysis::IndicatorTable;
use crate::domain::error::EmasweepError;
use crate::domain::pipeline::EngineConfig;
use crate::domain::position::BenefitTiming;
use crate::domain::session::AnalysisSession;
use crate::domain::sweep::{CancelToken, SweepConfig};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "emasweep", about = "EMA cross backtest and parameter sweep")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sweep the EMA period grid over a bar dataset
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        /// Write a session snapshot (JSON) after the sweep
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Emit the chart dataset for a bar range as JSON
    Chart {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long, default_value_t = 0)]
        start: usize,
        #[arg(long)]
        end: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compute the full indicator table and export it as CSV
    Indicators {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Replay a tick file through a live session
    ReplayTicks {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        ticks: PathBuf,
    },
    /// Validate an engine configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Sweep {
            config,
            data,
            output,
        } => run_sweep_command(&config, &data, output.as_ref()),
        Command::Chart {
            config,
            data,
            start,
            end,
            output,
        } => run_chart(&config, &data, start, end, output.as_ref()),
        Command::Indicators {
            config,
            data,
            output,
        } => run_indicators(&config, &data, &output),
        Command::ReplayTicks { config, ticks } => run_replay_ticks(&config, &ticks),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = EmasweepError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Read the `[engine]` section into a sweep configuration. Unset keys
/// fall back to the engine defaults.
pub fn build_sweep_config(adapter: &dyn ConfigPort) -> Result<SweepConfig, EmasweepError> {
    let defaults = SweepConfig::default();
    let base_defaults = EngineConfig::default();

    let timing = match adapter.get_string("engine", "benefit_timing") {
        Some(s) => BenefitTiming::parse(&s).ok_or_else(|| EmasweepError::ConfigInvalid {
            section: "engine".into(),
            key: "benefit_timing".into(),
            reason: format!("expected worst, mean or open, got '{s}'"),
        })?,
        None => base_defaults.timing,
    };

    let config = SweepConfig {
        n_ema_min: adapter.get_int("engine", "n_ema_min", defaults.n_ema_min as i64) as usize,
        n_ema_max: adapter.get_int("engine", "n_ema_max", defaults.n_ema_max as i64) as usize,
        base: EngineConfig {
            n_ema1: adapter.get_int("engine", "n_ema1", base_defaults.n_ema1 as i64) as usize,
            n_ema2: adapter.get_int("engine", "n_ema2", base_defaults.n_ema2 as i64) as usize,
            n_macd: adapter.get_int("engine", "n_macd", base_defaults.n_macd as i64) as usize,
            delta: adapter.get_double("engine", "delta", base_defaults.delta),
            n_dec: adapter.get_int("engine", "n_dec", base_defaults.n_dec as i64) as usize,
            timing,
        },
    };
    config.validate()?;
    Ok(config)
}

/// Split a dataset path into the adapter base directory and file name.
fn split_data_path(path: &Path) -> Result<(PathBuf, String), EmasweepError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| EmasweepError::DataFormat {
            reason: format!("invalid data path: {}", path.display()),
        })?;
    let base = path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((base, name.to_string()))
}

fn load_session(config_path: &PathBuf, data_path: &Path) -> Result<AnalysisSession, ExitCode> {
    let adapter = load_config(config_path)?;
    let config = build_sweep_config(&adapter).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;

    let (base, name) = split_data_path(data_path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;

    eprintln!("Loading bars from {}", data_path.display());
    let bars = CsvAdapter::new(base).load_bars(&name).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    eprintln!("  {} bars loaded", bars.len());

    let mut session = match AnalysisSession::new(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return Err(ExitCode::from(&e));
        }
    };
    session.set_bars(bars);
    Ok(session)
}

fn run_sweep_command(
    config_path: &PathBuf,
    data_path: &Path,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    let mut session = match load_session(config_path, data_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let config = *session.config();
    eprintln!(
        "Sweeping EMA pairs {}..={} ({} pairs)",
        config.n_ema_min,
        config.n_ema_max,
        config.pairs().len(),
    );

    let outcome = match session.run_sweep(&CancelToken::new()) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut best = (config.n_ema_min, config.n_ema_min + 1, f64::NEG_INFINITY);
    for (n1, n2) in config.pairs() {
        let benefit = outcome.benefit_map[n1][n2];
        if benefit > best.2 {
            best = (n1, n2, benefit);
        }
    }

    eprintln!("\n=== Sweep Results ===");
    eprintln!(
        "Best pair:        N1={} N2={} (benefit {:.2})",
        best.0, best.1, best.2,
    );
    // the live pair may sit outside the swept grid; the map has no
    // cell for it then
    let (live1, live2) = (config.base.n_ema1, config.base.n_ema2);
    if live1 >= config.n_ema_min && live1 < live2 && live2 <= config.n_ema_max {
        eprintln!(
            "Configured pair:  N1={} N2={} (benefit {:.2})",
            live1, live2, outcome.benefit_map[live1][live2],
        );
    } else {
        eprintln!("Configured pair:  N1={live1} N2={live2} (outside the swept range)");
    }

    if let Some(path) = output_path {
        let snapshot = session.snapshot();
        if let Err(e) = snapshot_adapter::save_snapshot(path, &snapshot) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("\nSnapshot written to: {}", path.display());
    }
    ExitCode::SUCCESS
}

fn run_chart(
    config_path: &PathBuf,
    data_path: &Path,
    start: usize,
    end: Option<usize>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    let mut session = match load_session(config_path, data_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let dataset = match session.chart_dataset(start, end) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let json = match serde_json::to_string_pretty(&dataset) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("error: failed to serialize chart dataset: {e}");
            return ExitCode::from(1);
        }
    };

    match output_path {
        Some(path) => match fs::write(path, json) {
            Ok(()) => {
                eprintln!("Chart dataset written to: {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: failed to write {}: {}", path.display(), e);
                ExitCode::from(1)
            }
        },
        None => {
            println!("{json}");
            ExitCode::SUCCESS
        }
    }
}

fn run_indicators(config_path: &PathBuf, data_path: &Path, output_path: &Path) -> ExitCode {
    let session = match load_session(config_path, data_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let table = IndicatorTable::compute(session.bars(), &session.config().base);
    let (base, name) = match split_data_path(output_path) {
        Ok(split) => split,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match CsvAdapter::new(base).export_indicator_table(&name, &table) {
        Ok(path) => {
            eprintln!("Indicator table written to: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_replay_ticks(config_path: &PathBuf, ticks_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let config = match build_sweep_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let (base, name) = match split_data_path(ticks_path) {
        Ok(split) => split,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Loading ticks from {}", ticks_path.display());
    let ticks = match CsvAdapter::new(base).load_ticks(&name) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("  {} ticks loaded", ticks.len());

    let mut session = match AnalysisSession::new(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // prime the live pipeline so ticks advance it in place
    let mut state = session.position_state();
    let mut committed = 0usize;
    for tick in &ticks {
        if session.apply_tick(tick).is_some() {
            committed += 1;
            let next = session.position_state();
            if next != state {
                eprintln!("bar {}: position {:?} -> {:?}", committed - 1, state, next);
                state = next;
            }
        }
    }

    eprintln!("\n=== Replay Results ===");
    eprintln!("Committed bars:   {committed}");
    eprintln!("Final position:   {state:?}");
    let ds = match session.chart_dataset(0, None) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!(
        "Final benefit:    {:.2}",
        ds.cumulative_benefit.last().copied().unwrap_or(0.0),
    );
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let config = match build_sweep_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nEngine:");
    eprintln!("  n_ema1:         {}", config.base.n_ema1);
    eprintln!("  n_ema2:         {}", config.base.n_ema2);
    eprintln!("  n_macd:         {}", config.base.n_macd);
    eprintln!("  delta:          {}", config.base.delta);
    eprintln!("  n_dec:          {}", config.base.n_dec);
    eprintln!("  benefit_timing: {}", config.base.timing.as_str());
    eprintln!("\nSweep range: {}..={}", config.n_ema_min, config.n_ema_max);
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
