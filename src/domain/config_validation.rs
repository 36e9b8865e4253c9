//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::error::GoldenCrossError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

use super::stats::normality::{MAX_SHAPIRO_N, MIN_SHAPIRO_N};

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), GoldenCrossError> {
    validate_data(config)?;
    validate_windows(config)?;
    validate_costs(config)?;
    validate_evaluation(config)?;
    validate_report(config)?;
    Ok(())
}

pub fn validate_data(config: &dyn ConfigPort) -> Result<(), GoldenCrossError> {
    match config.get_string("data", "ticker") {
        Some(s) if !s.trim().is_empty() => {}
        Some(_) => {
            return Err(GoldenCrossError::invalid(
                "data",
                "ticker",
                "ticker must not be empty",
            ));
        }
        None => {
            return Err(GoldenCrossError::ConfigMissing {
                section: "data".to_string(),
                key: "ticker".to_string(),
            });
        }
    }

    let start_date = parse_date(config.get_string("data", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("data", "end_date").as_deref(), "end_date")?;
    if start_date >= end_date {
        return Err(GoldenCrossError::invalid(
            "data",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, GoldenCrossError> {
    match value {
        None => Err(GoldenCrossError::ConfigMissing {
            section: "data".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            GoldenCrossError::invalid(
                "data",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), GoldenCrossError> {
    let short = config.get_int("strategy", "short_window", 50);
    let long = config.get_int("strategy", "long_window", 200);
    if short < 1 {
        return Err(GoldenCrossError::invalid(
            "strategy",
            "short_window",
            "short_window must be at least 1",
        ));
    }
    if long <= short {
        return Err(GoldenCrossError::invalid(
            "strategy",
            "long_window",
            "long_window must be greater than short_window",
        ));
    }
    Ok(())
}

fn validate_costs(config: &dyn ConfigPort) -> Result<(), GoldenCrossError> {
    for key in ["one_way_bps", "slippage_bps"] {
        let value = config.get_double("costs", key, 0.0);
        if !value.is_finite() || value < 0.0 {
            return Err(GoldenCrossError::invalid(
                "costs",
                key,
                format!("{} must be non-negative", key),
            ));
        }
    }
    Ok(())
}

fn validate_evaluation(config: &dyn ConfigPort) -> Result<(), GoldenCrossError> {
    let alpha = config.get_double("evaluation", "alpha", 0.05);
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(GoldenCrossError::invalid(
            "evaluation",
            "alpha",
            "alpha must be between 0 and 1",
        ));
    }

    if config.get_int("evaluation", "bootstrap_resamples", 5000) < 1 {
        return Err(GoldenCrossError::invalid(
            "evaluation",
            "bootstrap_resamples",
            "bootstrap_resamples must be at least 1",
        ));
    }

    for key in ["bootstrap_seed", "shapiro_seed"] {
        if config.get_int("evaluation", key, 42) < 0 {
            return Err(GoldenCrossError::invalid(
                "evaluation",
                key,
                format!("{} must be non-negative", key),
            ));
        }
    }

    let cap = config.get_int("evaluation", "shapiro_cap", MAX_SHAPIRO_N as i64);
    if cap < MIN_SHAPIRO_N as i64 || cap > MAX_SHAPIRO_N as i64 {
        return Err(GoldenCrossError::invalid(
            "evaluation",
            "shapiro_cap",
            format!("shapiro_cap must be between {MIN_SHAPIRO_N} and {MAX_SHAPIRO_N}"),
        ));
    }

    let trading_days = config.get_double("evaluation", "trading_days", 252.0);
    if !trading_days.is_finite() || trading_days <= 0.0 {
        return Err(GoldenCrossError::invalid(
            "evaluation",
            "trading_days",
            "trading_days must be positive",
        ));
    }

    match config.get_string("evaluation", "span").as_deref().map(str::trim) {
        None | Some("full") | Some("signal") => Ok(()),
        Some(other) => Err(GoldenCrossError::invalid(
            "evaluation",
            "span",
            format!("unknown span '{}', expected full or signal", other),
        )),
    }
}

fn validate_report(config: &dyn ConfigPort) -> Result<(), GoldenCrossError> {
    if config.get_int("report", "histogram_bins", 80) < 1 {
        return Err(GoldenCrossError::invalid(
            "report",
            "histogram_bins",
            "histogram_bins must be at least 1",
        ));
    }
    Ok(())
}
