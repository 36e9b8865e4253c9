//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::chart_svg::SvgChartAdapter;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report::TextReportAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{parse_date, validate_config};
use crate::domain::error::GoldenCrossError;
use crate::domain::returns::{CostModel, EvaluationSpan};
use crate::domain::signal::CrossoverWindows;
use crate::domain::stats::EvaluationConfig;
use crate::domain::stats::bootstrap::BootstrapConfig;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PricePort;
use crate::ports::report_port::{ReportContext, ReportPort};

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_OUTPUT_DIR: &str = "screenshots";

#[derive(Parser, Debug)]
#[command(
    name = "goldencross",
    about = "Golden-cross moving-average backtest with statistical evaluation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and print the evaluation report
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Override [data] ticker
        #[arg(short, long)]
        ticker: Option<String>,
        /// Override [data] path
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Override [report] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        no_charts: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// List tickers available in a data directory
    ListTickers {
        #[arg(short, long)]
        data: PathBuf,
    },
    /// Show the data range for a ticker
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        ticker: Option<String>,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub ticker: Option<String>,
    pub data: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            ticker,
            data,
            output,
            no_charts,
            dry_run,
        } => {
            let overrides = Overrides {
                ticker,
                data,
                output,
            };
            if dry_run {
                run_dry_run(&config, &overrides)
            } else {
                run_backtest(&config, &overrides, no_charts)
            }
        }
        Command::ListTickers { data } => run_list_tickers(&data),
        Command::Info { config, ticker } => run_info(&config, ticker.as_deref()),
    }
}

pub fn load_config(path: &Path, overrides: &Overrides) -> Result<FileConfigAdapter, ExitCode> {
    let mut adapter = FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    apply_overrides(&mut adapter, overrides);
    Ok(adapter)
}

pub fn apply_overrides(adapter: &mut FileConfigAdapter, overrides: &Overrides) {
    if let Some(ticker) = &overrides.ticker {
        adapter.set("data", "ticker", ticker);
    }
    if let Some(data) = &overrides.data {
        adapter.set("data", "path", &data.display().to_string());
    }
    if let Some(output) = &overrides.output {
        adapter.set("report", "output_dir", &output.display().to_string());
    }
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, GoldenCrossError> {
    let ticker = adapter
        .get_string("data", "ticker")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| GoldenCrossError::ConfigMissing {
            section: "data".into(),
            key: "ticker".into(),
        })?;
    let start_date = parse_date(adapter.get_string("data", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(adapter.get_string("data", "end_date").as_deref(), "end_date")?;

    let windows = CrossoverWindows::new(
        adapter.get_usize("strategy", "short_window", 50),
        adapter.get_usize("strategy", "long_window", 200),
    )?;

    let span = match adapter
        .get_string("evaluation", "span")
        .as_deref()
        .map(str::trim)
    {
        None | Some("signal") => EvaluationSpan::SignalOnly,
        Some("full") => EvaluationSpan::Full,
        Some(other) => {
            return Err(GoldenCrossError::invalid(
                "evaluation",
                "span",
                format!("unknown span '{other}'"),
            ));
        }
    };

    let defaults = EvaluationConfig::default();
    let evaluation = EvaluationConfig {
        alpha: adapter.get_double("evaluation", "alpha", defaults.alpha),
        bootstrap: BootstrapConfig {
            resamples: adapter.get_usize(
                "evaluation",
                "bootstrap_resamples",
                defaults.bootstrap.resamples,
            ),
            seed: adapter.get_usize("evaluation", "bootstrap_seed", defaults.bootstrap.seed as usize)
                as u64,
        },
        shapiro_cap: adapter.get_usize("evaluation", "shapiro_cap", defaults.shapiro_cap),
        shapiro_seed: adapter.get_usize("evaluation", "shapiro_seed", defaults.shapiro_seed as usize)
            as u64,
        periods_per_year: adapter.get_double(
            "evaluation",
            "trading_days",
            defaults.periods_per_year,
        ),
    };

    Ok(BacktestConfig {
        ticker,
        start_date,
        end_date,
        windows,
        costs: CostModel::new(
            adapter.get_double("costs", "one_way_bps", 10.0),
            adapter.get_double("costs", "slippage_bps", 0.0),
        ),
        span,
        evaluation,
    })
}

pub fn data_dir(adapter: &dyn ConfigPort) -> PathBuf {
    PathBuf::from(
        adapter
            .get_string("data", "path")
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
    )
}

pub fn build_report_context(adapter: &dyn ConfigPort, ticker: &str) -> ReportContext {
    let output_dir = adapter
        .get_string("report", "output_dir")
        .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());
    let mut ctx = ReportContext::new(ticker, output_dir);
    ctx.histogram_bins = adapter.get_usize("report", "histogram_bins", ctx.histogram_bins);
    ctx
}

fn run_backtest(config_path: &Path, overrides: &Overrides, no_charts: bool) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path, overrides) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let ctx = build_report_context(&adapter, &bt_config.ticker);
    let price_port = CsvAdapter::new(data_dir(&adapter));
    let text = TextReportAdapter::stdout();
    let charts = SvgChartAdapter::new();
    let mut reporters: Vec<&dyn ReportPort> = vec![&text];
    if !no_charts && adapter.get_bool("report", "charts", true) {
        reporters.push(&charts);
    }

    match run_backtest_pipeline(&price_port, &bt_config, &reporters, &ctx) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load prices, run the engine and hand the result to every reporter.
pub fn run_backtest_pipeline(
    price_port: &dyn PricePort,
    bt_config: &BacktestConfig,
    reporters: &[&dyn ReportPort],
    ctx: &ReportContext,
) -> Result<BacktestResult, GoldenCrossError> {
    let series =
        price_port.fetch_closes(&bt_config.ticker, bt_config.start_date, bt_config.end_date)?;
    if series.is_empty() {
        return Err(GoldenCrossError::NoData {
            ticker: bt_config.ticker.clone(),
            start: bt_config.start_date.to_string(),
            end: bt_config.end_date.to_string(),
        });
    }

    eprintln!(
        "Running backtest: {}, {} bars, {} to {}",
        bt_config.ticker,
        series.len(),
        bt_config.start_date,
        bt_config.end_date,
    );
    let result = backtest_engine::run_backtest(&series, bt_config)?;

    for reporter in reporters {
        reporter.write(&result, bt_config, ctx)?;
    }
    Ok(result)
}

pub fn run_dry_run(config_path: &Path, overrides: &Overrides) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path, overrides) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let ctx = build_report_context(&adapter, &bt_config.ticker);

    eprintln!("Config validated successfully");
    eprintln!("\nData:");
    eprintln!("  ticker: {}", bt_config.ticker);
    eprintln!("  path:   {}", data_dir(&adapter).display());
    eprintln!("  period: {} to {}", bt_config.start_date, bt_config.end_date);
    eprintln!("\nStrategy:");
    eprintln!(
        "  SMA({}) / SMA({})",
        bt_config.windows.short(),
        bt_config.windows.long()
    );
    eprintln!("\nCosts:");
    eprintln!(
        "  one-way {} bps + slippage {} bps (round trip {} bps)",
        bt_config.costs.one_way_bps,
        bt_config.costs.slippage_bps,
        bt_config.costs.round_trip_bps()
    );
    let eval = &bt_config.evaluation;
    eprintln!("\nEvaluation:");
    eprintln!("  alpha:      {}", eval.alpha);
    eprintln!(
        "  bootstrap:  {} resamples, seed {}",
        eval.bootstrap.resamples, eval.bootstrap.seed
    );
    eprintln!(
        "  shapiro:    cap {}, seed {}",
        eval.shapiro_cap, eval.shapiro_seed
    );
    eprintln!("  periods:    {} per year", eval.periods_per_year);
    eprintln!("  span:       {:?}", bt_config.span);
    eprintln!("\nReport:");
    eprintln!("  output_dir: {}", ctx.output_dir.display());
    eprintln!("  bins:       {}", ctx.histogram_bins);

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_list_tickers(data: &Path) -> ExitCode {
    let adapter = CsvAdapter::new(data.to_path_buf());
    let tickers = match adapter.list_tickers() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if tickers.is_empty() {
        eprintln!("No tickers found in {}", data.display());
    } else {
        for ticker in &tickers {
            println!("{}", ticker);
        }
        eprintln!("{} tickers found", tickers.len());
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, ticker: Option<&str>) -> ExitCode {
    let overrides = Overrides {
        ticker: ticker.map(str::to_string),
        ..Overrides::default()
    };
    let config = match load_config(config_path, &overrides) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let Some(ticker) = config
        .get_string("data", "ticker")
        .filter(|t| !t.trim().is_empty())
    else {
        eprintln!("error: ticker is required (use --ticker or set [data] ticker)");
        return ExitCode::from(2);
    };

    let adapter = CsvAdapter::new(data_dir(&config));
    match adapter.data_range(&ticker) {
        Ok(Some((first, last, count))) => {
            println!("{}: {} rows, {} to {}", ticker, count, first, last);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", ticker);
            ExitCode::from(5)
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
