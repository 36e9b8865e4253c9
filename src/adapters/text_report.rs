//! Plain-text evaluation report.
//!
//! Percentages carry two decimals; any undefined value prints as `N/A`.

use std::fs;
use std::path::PathBuf;

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::GoldenCrossError;
use crate::domain::metrics::Metrics;
use crate::domain::stats::StatError;
use crate::domain::stats::inference::MeanConfidence;
use crate::ports::report_port::{ReportContext, ReportPort};

const NA: &str = "N/A";
const RULE: &str = "================";

/// Writes the report to stdout, or to a file when constructed with [`TextReportAdapter::to_file`].
#[derive(Debug, Clone, Default)]
pub struct TextReportAdapter {
    destination: Option<PathBuf>,
}

impl TextReportAdapter {
    pub fn stdout() -> Self {
        Self { destination: None }
    }

    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            destination: Some(path.into()),
        }
    }
}

impl ReportPort for TextReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        config: &BacktestConfig,
        ctx: &ReportContext,
    ) -> Result<(), GoldenCrossError> {
        let text = render(result, config, ctx);
        match &self.destination {
            None => print!("{text}"),
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, text)?;
                tracing::info!(path = %path.display(), "wrote text report");
            }
        }
        Ok(())
    }
}

pub fn pct(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}%", value * 100.0)
    } else {
        NA.to_string()
    }
}

pub fn num(value: f64, precision: usize) -> String {
    if value.is_finite() {
        format!("{:.*}", precision, value)
    } else {
        NA.to_string()
    }
}

/// Integer with thousands separators.
pub fn fmt_count(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn or_na<T>(value: &Result<T, StatError>, f: impl FnOnce(&T) -> String) -> String {
    value.as_ref().map(f).unwrap_or_else(|_| NA.to_string())
}

fn performance_line(label: &str, m: &Metrics, cagr: f64) -> String {
    format!(
        "  {label}: Average Return = {}, Volatility = {}, Sharpe Ratio = {}, Max Drawdown = {}, CAGR = {}\n",
        pct(m.mean_annual),
        pct(m.std_annual),
        num(m.sharpe, 2),
        pct(m.max_drawdown),
        pct(cagr),
    )
}

fn confidence_line(label: &str, ci: &Result<MeanConfidence, StatError>) -> String {
    let body = or_na(ci, |c| {
        format!(
            "{} (Range: {} to {})",
            num(c.mean, 6),
            num(c.lower, 6),
            num(c.upper, 6)
        )
    });
    format!("  {label}: {body}\n")
}

pub fn render(result: &BacktestResult, config: &BacktestConfig, ctx: &ReportContext) -> String {
    let strategy = &result.comparison.strategy;
    let baseline = &result.comparison.baseline;
    let level = (1.0 - config.evaluation.alpha) * 100.0;
    let (start, end) = result
        .period
        .unwrap_or((config.start_date, config.end_date));

    let mut out = String::new();
    out.push_str(&format!(
        "\n{RULE} Golden Cross Backtest: Statistical Evaluation (with Transaction Costs) {RULE}\n\n"
    ));
    out.push_str(&format!(
        "Ticker: {}   Period: {} to {}   Observations: {}\n",
        ctx.ticker,
        start,
        end,
        fmt_count(result.observations())
    ));
    out.push_str(&format!(
        "Windows: SMA({}) / SMA({})   Trades: {}   Days long: {}\n",
        config.windows.short(),
        config.windows.long(),
        result.ledger.trades(),
        result.signals.days_long()
    ));
    out.push_str(&format!(
        "Costs: one-way = {} bps (+ slippage {} bps), round trip = {} bps\n\n",
        config.costs.one_way_bps,
        config.costs.slippage_bps,
        config.costs.round_trip_bps()
    ));

    out.push_str("Annualized Performance (per year)\n");
    out.push_str(&performance_line("Buy and Hold", &result.buy_hold, result.cagr_buy_hold()));
    out.push_str(&performance_line("Golden Cross Gross", &result.gross, result.cagr_gross()));
    out.push_str(&performance_line("Golden Cross Net", &result.net, result.cagr_net()));
    out.push('\n');

    out.push_str(&format!(
        "Mean Daily Return with {level:.0}% Confidence Interval\n"
    ));
    out.push_str(&confidence_line("Buy and Hold", &baseline.mean_ci));
    out.push_str(&confidence_line("Golden Cross Gross", &result.gross_mean_ci));
    out.push_str(&confidence_line("Golden Cross Net", &strategy.mean_ci));
    out.push('\n');

    out.push_str("Hypothesis Tests (Golden Cross Net vs Buy and Hold)\n");
    out.push_str(&format!(
        "  Welch t-test: {}  (H0: means are equal)\n",
        or_na(&result.comparison.welch, |t| format!(
            "t-statistic = {}, p-value = {}",
            num(t.statistic, 3),
            num(t.p_value, 4)
        ))
    ));
    out.push_str(&format!(
        "  Mann-Whitney U test: {}  (H0: distributions are the same)\n\n",
        or_na(&result.comparison.mann_whitney, |t| format!(
            "U-statistic = {}, p-value = {}",
            num(t.statistic, 0),
            num(t.p_value, 4)
        ))
    ));

    out.push_str("Normality Test (Shapiro-Wilk, p-values; low p-value means data is not normal)\n");
    for (label, stats) in [("Buy and Hold", baseline), ("Golden Cross Net", strategy)] {
        out.push_str(&format!(
            "  {label}: p-value = {}\n",
            or_na(&stats.normality, |s| num(s.p_value, 4))
        ));
    }
    out.push('\n');

    out.push_str("Nonparametric Summary\n");
    for (label, stats) in [("Buy and Hold", baseline), ("Golden Cross Net", strategy)] {
        out.push_str(&format!(
            "  {label}: {}\n",
            or_na(&stats.summary, |s| format!(
                "Median = {}, Interquartile Range = {}",
                num(s.median, 6),
                num(s.iqr(), 6)
            ))
        ));
    }
    out.push('\n');

    out.push_str("Bootstrap Sharpe Ratio with 95% Confidence Interval\n");
    for (label, stats) in [("Buy and Hold", baseline), ("Golden Cross Net", strategy)] {
        out.push_str(&format!(
            "  {label}: {}\n",
            or_na(&stats.bootstrap, |b| format!(
                "Average Sharpe = {}, 95% CI = [{}, {}]",
                num(b.mean, 2),
                num(b.lower, 2),
                num(b.upper, 2)
            ))
        ));
    }
    out
}
