//! SVG chart generation.
//!
//! Three charts per run, written to the report output directory:
//! - `price_<T>.svg`: closes with both moving averages and crossover markers
//! - `cumulative_<T>.svg`: growth of $1 for buy-hold, gross and net
//! - `hist_daily_<T>.svg`: overlaid daily-return histograms, buy-hold vs net

use std::fs;
use std::iter;

use chrono::NaiveDate;

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::GoldenCrossError;
use crate::domain::indicator::MovingAverage;
use crate::domain::signal::CrossKind;
use crate::ports::report_port::{ReportContext, ReportPort};

const CHART_WIDTH: f64 = 900.0;
const CHART_HEIGHT: f64 = 420.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;

const PLOT_WIDTH: f64 = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
const PLOT_HEIGHT: f64 = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

const BLUE: &str = "#2563eb";
const ORANGE: &str = "#ea580c";
const GREEN: &str = "#16a34a";
const RED: &str = "#dc2626";
const GREY: &str = "#6b7280";

#[derive(Debug, Clone, Copy, Default)]
pub struct SvgChartAdapter;

impl SvgChartAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportPort for SvgChartAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        config: &BacktestConfig,
        ctx: &ReportContext,
    ) -> Result<(), GoldenCrossError> {
        fs::create_dir_all(&ctx.output_dir)?;

        let charts = [
            (
                format!("price_{}.svg", ctx.ticker),
                price_chart(result, config, &ctx.ticker),
            ),
            (
                format!("cumulative_{}.svg", ctx.ticker),
                cumulative_chart(result, config, &ctx.ticker),
            ),
            (
                format!("hist_daily_{}.svg", ctx.ticker),
                histogram_chart(result, config, &ctx.ticker, ctx.histogram_bins),
            ),
        ];

        for (name, svg) in charts {
            if svg.is_empty() {
                tracing::warn!(chart = %name, "not enough data to draw chart");
                continue;
            }
            let path = ctx.output_dir.join(&name);
            fs::write(&path, svg)?;
            tracing::info!(path = %path.display(), "wrote chart");
        }
        Ok(())
    }
}

/// One plotted series; `None` values break the line.
pub struct Line<'a> {
    pub label: String,
    pub color: &'a str,
    pub values: Vec<Option<f64>>,
}

pub struct Marker<'a> {
    pub index: usize,
    pub value: f64,
    pub color: &'a str,
    pub up: bool,
}

/// Min and max over every defined value, widened when flat.
fn value_range<'a>(values: impl Iterator<Item = &'a f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return None;
    }
    if hi - lo < f64::EPSILON {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.05 };
        return Some((lo - pad, hi + pad));
    }
    Some((lo, hi))
}

fn open_svg(title: &str, y_label: &str) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        r##"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"##,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"20\" text-anchor=\"middle\" font-size=\"14\" fill=\"#111\">{}</text>\n",
        CHART_WIDTH / 2.0,
        escape(title)
    ));
    svg.push_str(&format!(
        "  <text x=\"14\" y=\"{}\" text-anchor=\"middle\" font-size=\"11\" fill=\"{GREY}\" transform=\"rotate(-90 14 {})\">{}</text>\n",
        MARGIN_TOP + PLOT_HEIGHT / 2.0,
        MARGIN_TOP + PLOT_HEIGHT / 2.0,
        escape(y_label)
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM,
        CHART_WIDTH - MARGIN_RIGHT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg
}

fn y_ticks(svg: &mut String, lo: f64, hi: f64, fmt: impl Fn(f64) -> String) {
    for (frac, value) in [(0.0, lo), (0.5, (lo + hi) / 2.0), (1.0, hi)] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"{GREY}\">{}</text>\n",
            MARGIN_LEFT - 5.0,
            MARGIN_TOP + PLOT_HEIGHT * (1.0 - frac) + 4.0,
            fmt(value)
        ));
    }
}

fn x_labels(svg: &mut String, labels: [String; 3]) {
    let xs = [MARGIN_LEFT, MARGIN_LEFT + PLOT_WIDTH / 2.0, CHART_WIDTH - MARGIN_RIGHT];
    for (x, label) in xs.into_iter().zip(labels) {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"{GREY}\">{}</text>\n",
            x,
            CHART_HEIGHT - MARGIN_BOTTOM + 16.0,
            escape(&label)
        ));
    }
}

fn legend(svg: &mut String, entries: &[(&str, &str)]) {
    for (i, (label, color)) in entries.iter().enumerate() {
        let y = MARGIN_TOP + 12.0 + i as f64 * 16.0;
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"12\" height=\"4\" fill=\"{}\"/>\n",
            MARGIN_LEFT + 10.0,
            y - 4.0,
            color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"#111\">{}</text>\n",
            MARGIN_LEFT + 28.0,
            y,
            escape(label)
        ));
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn date_labels(dates: &[NaiveDate]) -> [String; 3] {
    match (dates.first(), dates.get(dates.len() / 2), dates.last()) {
        (Some(first), Some(mid), Some(last)) => {
            [first.to_string(), mid.to_string(), last.to_string()]
        }
        _ => Default::default(),
    }
}

/// Multi-series line chart over a shared date axis. Empty when nothing is plottable.
pub fn line_chart(
    title: &str,
    y_label: &str,
    dates: &[NaiveDate],
    lines: &[Line],
    markers: &[Marker],
) -> String {
    if dates.is_empty() {
        return String::new();
    }
    let Some((lo, hi)) = value_range(lines.iter().flat_map(|l| l.values.iter().flatten()))
    else {
        return String::new();
    };
    let range = hi - lo;
    let n = dates.len();

    let x_scale = |i: usize| MARGIN_LEFT + (i as f64 / (n - 1).max(1) as f64) * PLOT_WIDTH;
    let y_scale = |v: f64| MARGIN_TOP + PLOT_HEIGHT - ((v - lo) / range) * PLOT_HEIGHT;

    let mut svg = open_svg(title, y_label);
    y_ticks(&mut svg, lo, hi, |v| format!("{:.2}", v));
    x_labels(&mut svg, date_labels(dates));

    for line in lines {
        let mut path_data = String::new();
        let mut pen_down = false;
        for (i, value) in line.values.iter().enumerate() {
            match value {
                Some(v) if v.is_finite() => {
                    let cmd = if pen_down { " L" } else { " M" };
                    path_data.push_str(&format!("{} {:.1} {:.1}", cmd, x_scale(i), y_scale(*v)));
                    pen_down = true;
                }
                _ => pen_down = false,
            }
        }
        if !path_data.is_empty() {
            svg.push_str(&format!(
                "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
                path_data.trim_start(),
                line.color
            ));
        }
    }

    for marker in markers {
        let x = x_scale(marker.index);
        let y = y_scale(marker.value);
        let points = if marker.up {
            format!("{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}", x, y - 6.0, x - 5.0, y + 4.0, x + 5.0, y + 4.0)
        } else {
            format!("{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}", x, y + 6.0, x - 5.0, y - 4.0, x + 5.0, y - 4.0)
        };
        svg.push_str(&format!(
            "  <polygon points=\"{}\" fill=\"{}\"/>\n",
            points, marker.color
        ));
    }

    let entries: Vec<(&str, &str)> = lines.iter().map(|l| (l.label.as_str(), l.color)).collect();
    legend(&mut svg, &entries);
    svg.push_str("</svg>");
    svg
}

fn ma_values(ma: &MovingAverage) -> Vec<Option<f64>> {
    ma.values.iter().map(|p| p.value).collect()
}

fn curve_line<'a>(label: String, color: &'a str, curve: &[f64]) -> Line<'a> {
    Line {
        label,
        color,
        values: curve.iter().copied().map(Some).collect(),
    }
}

pub fn price_chart(result: &BacktestResult, config: &BacktestConfig, ticker: &str) -> String {
    let signals = &result.signals;
    let lines = [
        Line {
            label: "Close".to_string(),
            color: GREY,
            values: result.closes.iter().copied().map(Some).collect(),
        },
        Line {
            label: signals.short_ma.to_string(),
            color: BLUE,
            values: ma_values(&signals.short_ma),
        },
        Line {
            label: signals.long_ma.to_string(),
            color: ORANGE,
            values: ma_values(&signals.long_ma),
        },
    ];
    let markers: Vec<Marker> = signals
        .crossovers()
        .into_iter()
        .filter_map(|event| {
            let value = event.marker.or_else(|| result.closes.get(event.index).copied())?;
            let up = event.kind == CrossKind::GoldenCross;
            Some(Marker {
                index: event.index,
                value,
                color: if up { GREEN } else { RED },
                up,
            })
        })
        .collect();

    line_chart(
        &format!(
            "{} Price with SMA({}) and SMA({})",
            ticker,
            config.windows.short(),
            config.windows.long()
        ),
        "Price",
        &signals.dates,
        &lines,
        &markers,
    )
}

pub fn cumulative_chart(result: &BacktestResult, config: &BacktestConfig, ticker: &str) -> String {
    let Some((base, _)) = result.period else {
        return String::new();
    };
    let dates: Vec<NaiveDate> = iter::once(base)
        .chain(result.ledger.dates.iter().copied())
        .collect();
    let lines = [
        curve_line("Buy & Hold".to_string(), GREY, &result.curves.buy_hold),
        curve_line("Golden Cross (Gross)".to_string(), BLUE, &result.curves.gross),
        curve_line(
            format!("Golden Cross (Net, {} bps)", config.costs.one_way_bps),
            GREEN,
            &result.curves.net,
        ),
    ];
    line_chart(
        &format!("Cumulative Returns: {ticker} | GC vs GC Net vs Buy & Hold"),
        "Growth of $1",
        &dates,
        &lines,
        &[],
    )
}

/// Shared bin edges over both samples, `bins + 1` values.
pub fn bin_edges(a: &[f64], b: &[f64], bins: usize) -> Option<Vec<f64>> {
    if bins == 0 {
        return None;
    }
    let (lo, hi) = value_range(a.iter().chain(b.iter()))?;
    let width = (hi - lo) / bins as f64;
    Some(
        (0..=bins)
            .map(|i| if i == bins { hi } else { lo + width * i as f64 })
            .collect(),
    )
}

/// Counts per bin; the last bin is closed on the right.
pub fn bin_counts(values: &[f64], edges: &[f64]) -> Vec<usize> {
    let bins = edges.len().saturating_sub(1);
    let mut counts = vec![0; bins];
    if bins == 0 {
        return counts;
    }
    let lo = edges[0];
    let width = (edges[bins] - lo) / bins as f64;
    for &v in values.iter().filter(|v| v.is_finite()) {
        if v < lo || v > edges[bins] {
            continue;
        }
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
}

pub fn histogram_chart(
    result: &BacktestResult,
    config: &BacktestConfig,
    ticker: &str,
    bins: usize,
) -> String {
    let buy_hold = &result.ledger.buy_hold;
    let net = &result.ledger.net;
    let Some(edges) = bin_edges(buy_hold, net, bins) else {
        return String::new();
    };
    let series = [
        ("Buy & Hold".to_string(), GREY, bin_counts(buy_hold, &edges)),
        (
            format!("GC Net ({} bps)", config.costs.one_way_bps),
            GREEN,
            bin_counts(net, &edges),
        ),
    ];
    let max_count = series
        .iter()
        .flat_map(|(_, _, c)| c.iter().copied())
        .max()
        .unwrap_or(0)
        .max(1);

    let bar_width = PLOT_WIDTH / bins as f64;
    let mut svg = open_svg(&format!("Distribution of Daily Returns: {ticker}"), "Frequency");
    y_ticks(&mut svg, 0.0, max_count as f64, |v| format!("{:.0}", v));
    let last = edges.len() - 1;
    x_labels(
        &mut svg,
        [
            format!("{:.2}%", edges[0] * 100.0),
            format!("{:.2}%", (edges[0] + edges[last]) / 2.0 * 100.0),
            format!("{:.2}%", edges[last] * 100.0),
        ],
    );

    for (_, color, counts) in &series {
        for (i, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let height = count as f64 / max_count as f64 * PLOT_HEIGHT;
            svg.push_str(&format!(
                "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\" fill-opacity=\"0.55\"/>\n",
                MARGIN_LEFT + i as f64 * bar_width,
                MARGIN_TOP + PLOT_HEIGHT - height,
                bar_width,
                height,
                color
            ));
        }
    }

    let entries: Vec<(&str, &str)> = series.iter().map(|(l, c, _)| (l.as_str(), *c)).collect();
    legend(&mut svg, &entries);
    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::run_backtest;
    use crate::domain::price::{PricePoint, PriceSeries};
    use crate::domain::returns::{CostModel, EvaluationSpan};
    use crate::domain::signal::CrossoverWindows;
    use crate::domain::stats::EvaluationConfig;
    use crate::domain::stats::bootstrap::BootstrapConfig;
    use tempfile::TempDir;

    fn sample_config() -> BacktestConfig {
        BacktestConfig {
            ticker: "TEST".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            windows: CrossoverWindows::new(3, 8).unwrap(),
            costs: CostModel::new(10.0, 0.0),
            span: EvaluationSpan::Full,
            evaluation: EvaluationConfig {
                bootstrap: BootstrapConfig {
                    resamples: 50,
                    seed: 42,
                },
                ..EvaluationConfig::default()
            },
        }
    }

    fn wavy_result(n: usize) -> BacktestResult {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.2).sin() * 10.0;
                PricePoint::new(start + chrono::Duration::days(i as i64), close)
            })
            .collect();
        run_backtest(&PriceSeries::new(points).unwrap(), &sample_config()).unwrap()
    }

    #[test]
    fn bin_counts_cover_every_value() {
        let a = [0.0, 0.1, 0.2, 0.3, 1.0];
        let b = [0.5, 0.5];
        let edges = bin_edges(&a, &b, 4).unwrap();
        assert_eq!(edges.len(), 5);
        assert_eq!(edges[0], 0.0);
        assert_eq!(edges[4], 1.0);

        let counts = bin_counts(&a, &edges);
        assert_eq!(counts, vec![3, 1, 0, 1]);
        assert_eq!(counts.iter().sum::<usize>(), a.len());
        assert_eq!(bin_counts(&b, &edges), vec![0, 0, 2, 0]);
    }

    #[test]
    fn bin_edges_of_constant_data_are_widened() {
        let edges = bin_edges(&[0.0, 0.0], &[0.0], 10).unwrap();
        assert!(edges[0] < 0.0 && edges[10] > 0.0);
        assert_eq!(bin_counts(&[0.0, 0.0], &edges).iter().sum::<usize>(), 2);
        assert!(bin_edges(&[], &[], 10).is_none());
        assert!(bin_edges(&[1.0], &[], 0).is_none());
    }

    #[test]
    fn line_chart_breaks_on_missing_values() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..4).map(|i| start + chrono::Duration::days(i)).collect();
        let lines = [Line {
            label: "x".into(),
            color: BLUE,
            values: vec![Some(1.0), None, Some(2.0), Some(3.0)],
        }];
        let svg = line_chart("t", "y", &dates, &lines, &[]);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches(" M ").count() + usize::from(svg.contains("d=\"M ")), 2);
        assert!(line_chart("t", "y", &dates, &[], &[]).is_empty());
    }

    #[test]
    fn price_chart_has_markers_for_crossovers() {
        let result = wavy_result(120);
        let svg = price_chart(&result, &sample_config(), "TEST");
        let events = result.signals.crossovers().len();

        assert!(events > 0);
        assert_eq!(svg.matches("<polygon").count(), events);
        assert!(svg.contains("SMA(3)"));
        assert!(svg.contains("SMA(8)"));
    }

    #[test]
    fn writes_three_files() {
        let dir = TempDir::new().unwrap();
        let result = wavy_result(120);
        let mut ctx = ReportContext::new("TEST", dir.path().join("charts"));
        ctx.histogram_bins = 20;

        SvgChartAdapter::new()
            .write(&result, &sample_config(), &ctx)
            .unwrap();

        for name in ["price_TEST.svg", "cumulative_TEST.svg", "hist_daily_TEST.svg"] {
            let content = fs::read_to_string(dir.path().join("charts").join(name)).unwrap();
            assert!(content.contains("</svg>"), "{name}");
        }
        let hist = fs::read_to_string(dir.path().join("charts").join("hist_daily_TEST.svg")).unwrap();
        assert!(hist.contains("fill-opacity"));
    }

    #[test]
    fn empty_result_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let result = run_backtest(&PriceSeries::new(vec![]).unwrap(), &sample_config()).unwrap();
        let ctx = ReportContext::new("EMPTY", dir.path());

        SvgChartAdapter::new()
            .write(&result, &sample_config(), &ctx)
            .unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
