//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::console_report::ConsoleReport;
use crate::adapters::csv_market::CsvMarketData;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sqlite_store::SqliteStore;
use crate::domain::backtest::{run_backtest, BacktestConfig};
use crate::domain::ensemble;
use crate::domain::error::TradewindError;
use crate::domain::settings::{
    LiveSettings, DEFAULT_EVAL_INTERVAL_MS, DEFAULT_GUARD_INTERVAL_MS,
};
use crate::domain::strategy::StrategyKind;
use crate::live::LiveSession;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_port::MarketDataPort;
use crate::ports::report_port::ReportPort;
use crate::ports::store_port::StorePort;

#[derive(Parser, Debug)]
#[command(name = "tradewind", about = "Trading strategy backtester and live runner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over a CSV price series
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// CSV price series; overrides [data] csv from the config
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Validate live settings and persist them to the session store
    Configure {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        db: PathBuf,
    },
    /// Start a live session from stored settings
    Live {
        #[arg(long)]
        db: PathBuf,
        /// CSV replay feed serving as the market data source
        #[arg(short, long)]
        data: PathBuf,
    },
    /// Validate a config file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest { config, data } => run_backtest_command(&config, data.as_deref()),
        Command::Configure { config, db } => run_configure(&config, &db),
        Command::Live { db, data } => run_live(&db, &data),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &std::path::Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TradewindError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Assemble and validate a backtest config from the `[backtest]`
/// section.
pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TradewindError> {
    let bt_config = BacktestConfig {
        initial_balance: config.get_double("backtest", "initial_balance", 10_000.0),
        strategy: parse_strategy(config, "backtest")?,
        stop_loss_pct: config.get_double("backtest", "stop_loss", 0.0),
        take_profit_pct: config.get_double("backtest", "take_profit", 0.0),
        risk_per_trade_pct: config.get_double("backtest", "risk_per_trade", 10.0),
        ensemble_threshold: config.get_double(
            "backtest",
            "ensemble_threshold",
            ensemble::DEFAULT_THRESHOLD,
        ),
    };
    bt_config.validate()?;
    Ok(bt_config)
}

/// Assemble and validate live settings from the `[live]` section.
pub fn build_live_settings(config: &dyn ConfigPort) -> Result<LiveSettings, TradewindError> {
    let instrument =
        config
            .get_string("live", "instrument")
            .ok_or_else(|| TradewindError::ConfigMissing {
                section: "live".into(),
                key: "instrument".into(),
            })?;

    let mut settings = LiveSettings::new(instrument, parse_strategy(config, "live")?);
    settings.initial_balance =
        config.get_double("live", "initial_balance", settings.initial_balance);
    settings.stop_loss_pct = config.get_double("live", "stop_loss", settings.stop_loss_pct);
    settings.take_profit_pct =
        config.get_double("live", "take_profit", settings.take_profit_pct);
    settings.risk_per_trade_pct =
        config.get_double("live", "risk_per_trade", settings.risk_per_trade_pct);
    settings.ensemble_threshold =
        config.get_double("live", "ensemble_threshold", settings.ensemble_threshold);
    settings.buy_price = optional_double(config, "live", "buy_price")?;
    settings.sell_price = optional_double(config, "live", "sell_price")?;
    settings.eval_interval_ms =
        interval_ms(config, "eval_interval_ms", DEFAULT_EVAL_INTERVAL_MS)?;
    settings.guard_interval_ms =
        interval_ms(config, "guard_interval_ms", DEFAULT_GUARD_INTERVAL_MS)?;

    settings.validate()?;
    Ok(settings)
}

fn parse_strategy(config: &dyn ConfigPort, section: &str) -> Result<StrategyKind, TradewindError> {
    let name =
        config
            .get_string(section, "strategy")
            .ok_or_else(|| TradewindError::ConfigMissing {
                section: section.into(),
                key: "strategy".into(),
            })?;
    name.parse().map_err(|reason| TradewindError::ConfigInvalid {
        section: section.into(),
        key: "strategy".into(),
        reason,
    })
}

fn optional_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, TradewindError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| TradewindError::ConfigInvalid {
                section: section.into(),
                key: key.into(),
                reason: format!("invalid number '{raw}'"),
            }),
    }
}

fn interval_ms(
    config: &dyn ConfigPort,
    key: &str,
    default: u64,
) -> Result<u64, TradewindError> {
    let value = config.get_int("live", key, default as i64);
    u64::try_from(value).map_err(|_| TradewindError::ConfigInvalid {
        section: "live".into(),
        key: key.into(),
        reason: "must be non-negative".into(),
    })
}

fn run_backtest_command(config_path: &std::path::Path, data_override: Option<&std::path::Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_path: PathBuf = match data_override {
        Some(p) => p.to_path_buf(),
        None => match adapter.get_string("data", "csv") {
            Some(p) => PathBuf::from(p),
            None => {
                let err = TradewindError::ConfigMissing {
                    section: "data".into(),
                    key: "csv".into(),
                };
                eprintln!("error: {err}");
                return (&err).into();
            }
        },
    };
    let instrument = adapter
        .get_string("data", "instrument")
        .unwrap_or_else(|| "SERIES".to_string());

    eprintln!("Loading bars from {}", data_path.display());
    let feed = match CsvMarketData::from_file(&data_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let bars = match feed.historical_bars(&instrument, usize::MAX) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if bars.is_empty() {
        eprintln!("error: {} holds no bars", data_path.display());
        return ExitCode::from(4);
    }

    eprintln!(
        "Running backtest: {} bars, strategy {}",
        bars.len(),
        bt_config.strategy,
    );

    let result = match run_backtest(&bars, &bt_config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let report = ConsoleReport::new();
    if let Err(e) = report.on_backtest(&result) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    ExitCode::SUCCESS
}

fn run_configure(config_path: &std::path::Path, db_path: &std::path::Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let settings = match build_live_settings(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let store = match SqliteStore::open(db_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if let Err(e) = store.save_settings(&settings) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!(
        "Settings saved: {} via {} (stop {}%, take {}%, risk {}%)",
        settings.instrument,
        settings.strategy,
        settings.stop_loss_pct,
        settings.take_profit_pct,
        settings.risk_per_trade_pct,
    );
    ExitCode::SUCCESS
}

fn run_live(db_path: &std::path::Path, data_path: &std::path::Path) -> ExitCode {
    let store = match SqliteStore::open(db_path) {
        Ok(s) => Arc::new(s) as Arc<dyn StorePort>,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let market = match CsvMarketData::from_file(data_path) {
        Ok(m) => Arc::new(m) as Arc<dyn MarketDataPort>,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let report = Arc::new(ConsoleReport::new()) as Arc<dyn ReportPort>;

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::from(1);
        }
    };

    runtime.block_on(async {
        let mut session = LiveSession::new(market, store, report);
        if let Err(e) = session.start() {
            eprintln!("error: {e}");
            return (&e).into();
        }

        eprintln!("Live session running; Ctrl-C to stop");
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("error: failed to wait for Ctrl-C: {e}");
        }
        session.stop();
        ExitCode::SUCCESS
    })
}

fn run_validate(config_path: &std::path::Path) -> ExitCode {
    eprintln!("Validating {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let has_backtest = adapter.get_string("backtest", "strategy").is_some();
    let has_live = adapter.get_string("live", "instrument").is_some();

    if !has_backtest && !has_live {
        eprintln!("error: config declares neither a [backtest] nor a [live] section");
        return ExitCode::from(2);
    }

    if has_backtest {
        match build_backtest_config(&adapter) {
            Ok(config) => eprintln!("  [backtest] ok: strategy {}", config.strategy),
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    }

    if has_live {
        match build_live_settings(&adapter) {
            Ok(settings) => eprintln!(
                "  [live] ok: {} via {}",
                settings.instrument, settings.strategy
            ),
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    }

    eprintln!("Configuration is valid");
    ExitCode::SUCCESS
}
