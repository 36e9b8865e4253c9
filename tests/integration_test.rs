//! End-to-end backtest scenarios.
//!
//! Tests cover:
//! - Rising-then-flat series with 5/20 windows and zero cost
//! - Constant price series
//! - Default span dropping the moving-average warm-up
//! - History shorter than the long window
//! - Cost accounting on trade days across a full run
//! - Reproducibility of the statistical report for a fixed seed

mod common;

use approx::assert_relative_eq;
use common::*;
use goldencross::domain::backtest::run_backtest;
use goldencross::domain::metrics::max_drawdown;
use goldencross::domain::returns::EvaluationSpan;
use goldencross::domain::signal::{CrossKind, Position};

mod rising_then_flat_scenario {
    use super::*;

    fn run() -> goldencross::domain::backtest::BacktestResult {
        let series = make_series(&rising_then_flat(250, 50));
        run_backtest(&series, &sample_config(5, 20, 0.0)).unwrap()
    }

    #[test]
    fn enters_shortly_after_day_twenty() {
        let result = run();
        let positions = &result.signals.positions;

        assert_eq!(positions.len(), 300);
        assert!(positions[..20].iter().all(|&p| p == Position::Flat));
        assert!(positions[20..=250].iter().all(|&p| p == Position::Long));

        let events = result.signals.crossovers();
        assert_eq!(events[0].index, 20);
        assert_eq!(events[0].kind, CrossKind::GoldenCross);
    }

    #[test]
    fn exits_once_both_averages_go_flat() {
        let result = run();
        let positions = &result.signals.positions;

        // From index 268 the 20-day window holds only the flat close, so both
        // averages equal 349.0 and the strict `>` signals flat; the position
        // follows one day later.
        assert_eq!(result.signals.short_ma.get(268), result.signals.long_ma.get(268));
        assert!(positions[20..=268].iter().all(|&p| p == Position::Long));
        assert!(positions[269..].iter().all(|&p| p == Position::Flat));

        let events = result.signals.crossovers();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].index, 269);
        assert_eq!(events[1].kind, CrossKind::DeathCross);
    }

    #[test]
    fn gross_matches_buy_hold_once_long() {
        let result = run();
        let ledger = &result.ledger;

        // Ledger row k is price index 19 + k; the position turns long at 20.
        assert_eq!(ledger.start, 19);
        assert_eq!(ledger.gross[0], 0.0);
        for k in 1..ledger.len() {
            assert_eq!(ledger.gross[k], ledger.buy_hold[k], "row {k}");
        }
    }

    #[test]
    fn never_draws_down() {
        let result = run();

        assert_eq!(result.buy_hold.max_drawdown, 0.0);
        assert_eq!(result.gross.max_drawdown, 0.0);
        assert_eq!(result.net.max_drawdown, 0.0);
        assert_eq!(max_drawdown(&result.curves.net), 0.0);
        assert!(result.buy_hold.total_return > 1.0);
    }

    #[test]
    fn zero_cost_leaves_net_equal_to_gross() {
        let result = run();
        assert_eq!(result.ledger.net, result.ledger.gross);
        assert_eq!(result.ledger.trades(), 2);
    }
}

mod warm_up_handling {
    use super::*;

    #[test]
    fn default_span_drops_rows_before_long_average() {
        let series = make_series(&wavy(400));
        let mut config = sample_config(50, 200, 10.0);
        config.span = EvaluationSpan::default();
        let result = run_backtest(&series, &config).unwrap();

        assert_eq!(config.span, EvaluationSpan::SignalOnly);
        assert_eq!(result.ledger.start, 199);
        assert_eq!(result.observations(), 400 - 199);
        assert_eq!(result.ledger.dates[0], series.points()[199].date);
        assert!(result.signals.long_ma.get(result.ledger.start).is_some());
    }

    #[test]
    fn full_span_zero_fills_warm_up_strategy_returns() {
        let series = make_series(&wavy(400));
        let mut signal = sample_config(50, 200, 10.0);
        signal.span = EvaluationSpan::SignalOnly;
        let mut full = signal.clone();
        full.span = EvaluationSpan::Full;

        let trimmed = run_backtest(&series, &signal).unwrap();
        let padded = run_backtest(&series, &full).unwrap();

        assert_eq!(padded.observations(), 399);
        assert!(padded.ledger.gross[..198].iter().all(|&r| r == 0.0));
        assert!(padded.ledger.buy_hold[..198].iter().any(|&r| r != 0.0));
        assert_eq!(&padded.ledger.net[198..], &trimmed.ledger.net[..]);
        assert_ne!(padded.buy_hold.mean_annual, trimmed.buy_hold.mean_annual);
    }

    #[test]
    fn statistics_cover_the_same_rows_as_metrics() {
        let series = make_series(&wavy(400));
        let result = run_backtest(&series, &sample_config(50, 200, 10.0)).unwrap();

        let net_ci = result.comparison.strategy.mean_ci.as_ref().unwrap();
        let bh_ci = result.comparison.baseline.mean_ci.as_ref().unwrap();
        assert_eq!(net_ci.observations, result.net.observations);
        assert_eq!(bh_ci.observations, result.buy_hold.observations);
        assert_relative_eq!(net_ci.mean, result.net.mean_daily, epsilon = 1e-15);
        assert_relative_eq!(bh_ci.mean, result.buy_hold.mean_daily, epsilon = 1e-15);
    }
}

mod constant_price_scenario {
    use super::*;

    #[test]
    fn returns_are_zero_and_sharpe_undefined() {
        let series = make_series(&constant(120, 50.0));
        let result = run_backtest(&series, &sample_config(5, 20, 10.0)).unwrap();

        assert!(result.ledger.buy_hold.iter().all(|&r| r == 0.0));
        assert!(result.buy_hold.sharpe.is_nan());
        assert!(result.gross.sharpe.is_nan());
        assert!(result.net.sharpe.is_nan());
        assert_eq!(result.buy_hold.max_drawdown, 0.0);
        assert_eq!(result.net.max_drawdown, 0.0);
    }

    #[test]
    fn degenerate_statistics_are_errors_not_panics() {
        let series = make_series(&constant(120, 50.0));
        let result = run_backtest(&series, &sample_config(5, 20, 10.0)).unwrap();
        let report = &result.comparison;

        assert!(report.baseline.normality.is_err());
        assert!(report.baseline.bootstrap.is_err());
        assert!(report.mann_whitney.is_err());
        let ci = report.baseline.mean_ci.as_ref().unwrap();
        assert_eq!(ci.lower, 0.0);
        assert_eq!(ci.upper, 0.0);
    }

    #[test]
    fn equal_averages_never_go_long() {
        let series = make_series(&constant(120, 50.0));
        let result = run_backtest(&series, &sample_config(5, 20, 10.0)).unwrap();
        assert_eq!(result.signals.days_long(), 0);
        assert_eq!(result.ledger.trades(), 0);
    }
}

mod short_history {
    use super::*;

    #[test]
    fn positions_stay_flat_and_returns_are_empty() {
        let series = make_series(&wavy(15));
        let result = run_backtest(&series, &sample_config(5, 20, 10.0)).unwrap();

        assert!(result.signals.signals.iter().all(Option::is_none));
        assert_eq!(result.signals.days_long(), 0);
        assert_eq!(result.observations(), 0);
        assert!(result.net.sharpe.is_nan());
        assert!(result.buy_hold.sharpe.is_nan());
        assert!(result.period.is_none());
    }

    #[test]
    fn full_span_keeps_buy_hold_rows() {
        let series = make_series(&wavy(15));
        let mut config = sample_config(5, 20, 10.0);
        config.span = EvaluationSpan::Full;
        let result = run_backtest(&series, &config).unwrap();

        assert_eq!(result.observations(), 14);
        assert!(result.gross.sharpe.is_nan());
        assert!(result.buy_hold.sharpe.is_finite());
    }
}

mod costs {
    use super::*;

    #[test]
    fn net_is_gross_minus_rate_on_trade_days() {
        let series = make_series(&wavy(400));
        let result = run_backtest(&series, &sample_config(5, 20, 25.0)).unwrap();
        let ledger = &result.ledger;

        assert!(ledger.trades() >= 4);
        for k in 0..ledger.len() {
            if ledger.turnover[k] == 1 {
                assert_relative_eq!(ledger.net[k], ledger.gross[k] - 0.0025, epsilon = 1e-15);
            } else {
                assert_eq!(ledger.net[k], ledger.gross[k]);
            }
        }
        assert!(result.net.total_return < result.gross.total_return);
    }

    #[test]
    fn crossovers_alternate() {
        let series = make_series(&wavy(400));
        let result = run_backtest(&series, &sample_config(5, 20, 0.0)).unwrap();
        let events = result.signals.crossovers();

        assert_eq!(events.len(), result.ledger.trades());
        assert!(events.windows(2).all(|w| w[0].kind != w[1].kind));
        assert_eq!(events[0].kind, CrossKind::GoldenCross);
        assert!(events.iter().all(|e| e.marker.is_some()));
    }

    #[test]
    fn signal_span_starts_at_long_window() {
        let series = make_series(&wavy(400));
        let mut config = sample_config(5, 20, 10.0);
        config.span = EvaluationSpan::SignalOnly;
        let result = run_backtest(&series, &config).unwrap();

        assert_eq!(result.ledger.start, 19);
        assert_eq!(result.observations(), 400 - 19);
        assert_eq!(result.curves.net.len(), result.observations() + 1);
    }
}

mod reproducibility {
    use super::*;

    #[test]
    fn identical_runs_are_bit_identical() {
        let series = make_series(&wavy(500));
        let config = sample_config(10, 40, 10.0);
        let a = run_backtest(&series, &config).unwrap();
        let b = run_backtest(&series, &config).unwrap();

        let boot_a = a.comparison.strategy.bootstrap.as_ref().unwrap();
        let boot_b = b.comparison.strategy.bootstrap.as_ref().unwrap();
        assert_eq!(boot_a.mean.to_bits(), boot_b.mean.to_bits());
        assert_eq!(boot_a.lower.to_bits(), boot_b.lower.to_bits());
        assert_eq!(boot_a.upper.to_bits(), boot_b.upper.to_bits());

        let sw_a = a.comparison.baseline.normality.as_ref().unwrap();
        let sw_b = b.comparison.baseline.normality.as_ref().unwrap();
        assert_eq!(sw_a, sw_b);
    }

    #[test]
    fn seed_changes_bootstrap_output() {
        let series = make_series(&wavy(500));
        let config = sample_config(10, 40, 10.0);
        let mut reseeded = config.clone();
        reseeded.evaluation.bootstrap.seed = 7;

        let a = run_backtest(&series, &config).unwrap();
        let b = run_backtest(&series, &reseeded).unwrap();
        assert_ne!(
            a.comparison.strategy.bootstrap.as_ref().unwrap().mean,
            b.comparison.strategy.bootstrap.as_ref().unwrap().mean
        );
    }
}
