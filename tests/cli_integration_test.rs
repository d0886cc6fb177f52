//! CLI integration tests: config loading, argument dispatch and the
//! file-to-file commands run against real temp directories.

mod common;

use clap::Parser;
use common::*;
use emasweep::adapters::file_config_adapter::FileConfigAdapter;
use emasweep::adapters::snapshot_adapter;
use emasweep::cli::{build_sweep_config, run, Cli};
use emasweep::domain::error::EmasweepError;
use emasweep::domain::position::BenefitTiming;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;

const VALID_INI: &str = r#"
[engine]
n_ema1 = 2
n_ema2 = 3
n_macd = 14
delta = 1000.0
n_dec = 5
benefit_timing = worst
n_ema_min = 2
n_ema_max = 3
"#;

fn write_workspace(closes: &[f64]) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("engine.ini"), VALID_INI).unwrap();
    fs::write(dir.path().join("bars.csv"), bars_csv(closes)).unwrap();
    dir
}

fn cli(args: &[&str]) -> Cli {
    Cli::parse_from(std::iter::once("emasweep").chain(args.iter().copied()))
}

// ExitCode has no PartialEq; compare through its Debug form
fn succeeded(code: ExitCode) -> bool {
    format!("{code:?}") == format!("{:?}", ExitCode::SUCCESS)
}

fn path_arg(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).display().to_string()
}

mod config_loading {
    use super::*;

    #[test]
    fn valid_ini_builds_a_sweep_config() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = build_sweep_config(&adapter).unwrap();

        assert_eq!(config.base.n_ema1, 2);
        assert_eq!(config.base.n_ema2, 3);
        assert_eq!(config.base.delta, 1000.0);
        assert_eq!(config.base.timing, BenefitTiming::Worst);
        assert_eq!((config.n_ema_min, config.n_ema_max), (2, 3));
    }

    #[test]
    fn unknown_timing_is_rejected() {
        let adapter =
            FileConfigAdapter::from_string("[engine]\nbenefit_timing = optimistic\n").unwrap();
        assert!(matches!(
            build_sweep_config(&adapter),
            Err(EmasweepError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn inverted_sweep_range_is_rejected() {
        let adapter =
            FileConfigAdapter::from_string("[engine]\nn_ema_min = 9\nn_ema_max = 4\n").unwrap();
        assert!(matches!(
            build_sweep_config(&adapter),
            Err(EmasweepError::OutOfRange { .. })
        ));
    }
}

mod dispatch {
    use super::*;

    #[test]
    fn validate_accepts_a_good_config() {
        let dir = write_workspace(&one_short_closes());
        let code = run(cli(&["validate", "--config", &path_arg(&dir, "engine.ini")]));
        assert!(succeeded(code));
    }

    #[test]
    fn validate_rejects_a_missing_config() {
        let code = run(cli(&["validate", "--config", "/nonexistent/engine.ini"]));
        assert!(!succeeded(code));
    }

    #[test]
    fn sweep_writes_a_loadable_snapshot() {
        let dir = write_workspace(&one_short_closes());
        let snapshot_path = path_arg(&dir, "session.json");

        let code = run(cli(&[
            "sweep",
            "--config",
            &path_arg(&dir, "engine.ini"),
            "--data",
            &path_arg(&dir, "bars.csv"),
            "--output",
            &snapshot_path,
        ]));
        assert!(succeeded(code));

        let snapshot = snapshot_adapter::load_snapshot(&snapshot_path).unwrap();
        let sweep = snapshot.sweep.unwrap();
        assert!(sweep.complete);
        assert_eq!(sweep.benefit_map.len(), 4);
    }

    #[test]
    fn sweep_succeeds_when_the_live_pair_is_outside_the_range() {
        // only the sweep bounds are set, so the live pair keeps the
        // defaults (20, 21) beyond the swept grid
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("engine.ini"),
            "[engine]\nn_ema_min = 2\nn_ema_max = 10\n",
        )
        .unwrap();
        fs::write(dir.path().join("bars.csv"), bars_csv(&one_short_closes())).unwrap();

        let code = run(cli(&[
            "sweep",
            "--config",
            &path_arg(&dir, "engine.ini"),
            "--data",
            &path_arg(&dir, "bars.csv"),
        ]));
        assert!(succeeded(code));
    }

    #[test]
    fn chart_emits_json_to_the_output_file() {
        let dir = write_workspace(&one_short_closes());
        let out = path_arg(&dir, "chart.json");

        let code = run(cli(&[
            "chart",
            "--config",
            &path_arg(&dir, "engine.ini"),
            "--data",
            &path_arg(&dir, "bars.csv"),
            "--start",
            "0",
            "--output",
            &out,
        ]));
        assert!(succeeded(code));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(
            json["close"].as_array().unwrap().len(),
            one_short_closes().len()
        );
    }

    #[test]
    fn chart_start_past_the_series_fails() {
        let dir = write_workspace(&one_short_closes());
        let code = run(cli(&[
            "chart",
            "--config",
            &path_arg(&dir, "engine.ini"),
            "--data",
            &path_arg(&dir, "bars.csv"),
            "--start",
            "999",
        ]));
        assert!(!succeeded(code));
    }

    #[test]
    fn indicators_exports_a_csv_with_the_full_header() {
        let dir = write_workspace(&one_short_closes());
        let out = path_arg(&dir, "indicators.csv");

        let code = run(cli(&[
            "indicators",
            "--config",
            &path_arg(&dir, "engine.ini"),
            "--data",
            &path_arg(&dir, "bars.csv"),
            "--output",
            &out,
        ]));
        assert!(succeeded(code));

        let content = fs::read_to_string(Path::new(&out)).unwrap();
        let header = content.lines().next().unwrap();
        assert!(header.starts_with("timestamp,open,high,low,close,volume"));
        assert!(header.contains("rsi"));
        assert_eq!(content.lines().count(), one_short_closes().len() + 1);
    }

    #[test]
    fn replay_ticks_runs_a_tick_file_to_completion() {
        let dir = write_workspace(&[]);
        let mut ticks = String::from("timestamp,price,size\n");
        for (i, c) in one_short_closes().iter().enumerate() {
            ticks.push_str(&format!("2024-01-15T09:{:02}:00,{c},1\n", 30 + i));
        }
        fs::write(dir.path().join("ticks.csv"), ticks).unwrap();

        let code = run(cli(&[
            "replay-ticks",
            "--config",
            &path_arg(&dir, "engine.ini"),
            "--ticks",
            &path_arg(&dir, "ticks.csv"),
        ]));
        assert!(succeeded(code));
    }

    #[test]
    fn sweep_with_missing_data_file_fails_cleanly() {
        let dir = write_workspace(&[]);
        let code = run(cli(&[
            "sweep",
            "--config",
            &path_arg(&dir, "engine.ini"),
            "--data",
            &path_arg(&dir, "missing.csv"),
        ]));
        assert!(!succeeded(code));
    }
}
