//! End-to-end governor behaviour

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use trade_governor::config::{ConfigError, RiskConfig};
use trade_governor::risk::{
    AssetClass, HaltReason, RejectionCategory, RejectionReason, RiskGovernor, Side, TradeDecision,
    TradeRequest,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap()
}

fn governor() -> RiskGovernor {
    RiskGovernor::new(RiskConfig::default()).unwrap()
}

fn equity(symbol: &str) -> TradeRequest {
    TradeRequest {
        symbol: symbol.to_string(),
        side: Side::Buy,
        asset_class: AssetClass::Equity,
        entry_price: dec!(100),
        stop_loss_price: dec!(95),
        take_profit_price: None,
        confidence_score: dec!(0.8),
        account_balance: dec!(10000),
        buying_power: dec!(10000),
    }
}

fn crypto(symbol: &str, entry: Decimal, stop: Decimal) -> TradeRequest {
    TradeRequest {
        symbol: symbol.to_string(),
        asset_class: AssetClass::Crypto,
        entry_price: entry,
        stop_loss_price: stop,
        ..equity(symbol)
    }
}

fn rejection(decision: &TradeDecision) -> &RejectionReason {
    decision
        .rejection_reason()
        .unwrap_or_else(|| panic!("expected rejection, got {decision:?}"))
}

#[test]
fn test_approved_decisions_respect_invariants() {
    let governor = governor();
    let balances = [dec!(50), dec!(1000), dec!(10000), dec!(250000)];
    let stops = [dec!(99.5), dec!(97), dec!(90), dec!(60)];
    let confidences = [dec!(0.6), dec!(0.75), dec!(1.0)];
    let symbols = [("AAPL", AssetClass::Equity), ("BTC/USD", AssetClass::Crypto)];

    let mut approvals = [0, 0];
    for (row, (symbol, asset_class)) in symbols.into_iter().enumerate() {
        for balance in balances {
            for stop in stops {
                for confidence in confidences {
                    let request = TradeRequest {
                        asset_class,
                        stop_loss_price: stop,
                        confidence_score: confidence,
                        account_balance: balance,
                        buying_power: balance,
                        ..equity(symbol)
                    };
                    let TradeDecision::Approved(a) = governor.evaluate_at(&request, t0()) else {
                        continue;
                    };
                    approvals[row] += 1;

                    assert!(a.notional_value <= balance * dec!(0.25), "{a:?}");
                    assert!(a.notional_value >= dec!(1.0), "{a:?}");
                    // Default capital_use_percentage is 2%
                    assert!(a.risk_amount <= balance * dec!(2.0) / dec!(100), "{a:?}");
                    match asset_class {
                        AssetClass::Equity => {
                            assert_eq!(a.position_size, a.position_size.floor())
                        }
                        AssetClass::Crypto => {
                            let distance_pct =
                                (a.entry_price - a.stop_loss_price) / a.entry_price * dec!(100);
                            assert!(distance_pct >= dec!(8.0), "{a:?}");
                            assert!(a.position_size.scale() <= 8);
                        }
                    }
                }
            }
        }
    }
    assert!(approvals.iter().all(|n| *n > 0), "{approvals:?}");
}

#[test]
fn test_out_of_range_arithmetic_is_rejected() {
    let governor = governor();
    let tiny_stop = TradeRequest {
        stop_loss_price: dec!(99.99999999999999999999999999),
        account_balance: dec!(1000000),
        buying_power: dec!(1000000),
        ..equity("AAPL")
    };
    let tiny_entry = TradeRequest {
        entry_price: dec!(0.0000000000000000000000000002),
        stop_loss_price: dec!(0.0000000000000000000000000001),
        ..equity("MSFT")
    };

    for request in [tiny_stop, tiny_entry] {
        let decision = governor.evaluate_at(&request, t0());
        assert_eq!(rejection(&decision), &RejectionReason::ArithmeticOverflow);
        assert_eq!(rejection(&decision).category(), RejectionCategory::Input);
    }
}

#[test]
fn test_oversized_window_fails_at_construction() {
    let config = RiskConfig {
        window_duration_secs: 10_000_000_000_000,
        ..Default::default()
    };
    assert!(matches!(
        RiskGovernor::new(config),
        Err(ConfigError::Validation(_))
    ));

    let config = RiskConfig {
        min_trade_interval_secs: Some(u64::MAX),
        ..Default::default()
    };
    assert!(RiskGovernor::new(config).is_err());
}

#[test]
fn test_entry_equal_to_stop_is_invalid() {
    let governor = governor();
    for side in [Side::Buy, Side::Sell] {
        let request = TradeRequest {
            side,
            stop_loss_price: dec!(100),
            ..equity("AAPL")
        };
        let decision = governor.evaluate_at(&request, t0());
        assert_eq!(
            rejection(&decision),
            &RejectionReason::InvalidStopLoss {
                entry: dec!(100),
                stop: dec!(100)
            }
        );
        assert_eq!(rejection(&decision).category(), RejectionCategory::Input);
    }
}

#[test]
fn test_three_losses_halt_until_reset() {
    let governor = governor();
    let request = equity("AAPL");
    assert!(governor.evaluate_at(&request, t0()).is_approved());

    for i in 0..3 {
        governor.record_outcome_at("AAPL", dec!(-10.0), t0() + Duration::minutes(i));
    }
    assert!(governor.is_halted());
    assert_eq!(governor.consecutive_losses(), 3);

    let decision = governor.evaluate_at(&request, t0() + Duration::minutes(5));
    assert_eq!(
        rejection(&decision),
        &RejectionReason::TradingHalted(HaltReason::ConsecutiveLosses(3))
    );

    // A win alone does not lift the halt
    governor.record_outcome_at("AAPL", dec!(40), t0() + Duration::minutes(6));
    assert!(governor.is_halted());

    governor.reset();
    assert!(!governor.is_halted());
    assert!(governor
        .evaluate_at(&request, t0() + Duration::minutes(7))
        .is_approved());
}

#[test]
fn test_win_after_two_losses_clears_streak() {
    let governor = governor();
    governor.record_outcome_at("AAPL", dec!(-10.0), t0());
    governor.record_outcome_at("MSFT", dec!(-10.0), t0());
    assert_eq!(governor.consecutive_losses(), 2);

    let report = governor.record_outcome_at("NVDA", dec!(15.0), t0());
    assert_eq!(report.consecutive_losses, 0);
    assert!(!report.trading_halted);
    assert_eq!(governor.consecutive_losses(), 0);
    assert!(!governor.is_halted());
}

#[test]
fn test_loss_streak_shrinks_size() {
    let config = RiskConfig {
        max_position_size: dec!(1.0),
        ..Default::default()
    };
    let governor = RiskGovernor::new(config).unwrap();
    let request = equity("AAPL");

    let fresh = governor.evaluate_at(&request, t0());
    assert_eq!(fresh.assessment().unwrap().position_size, dec!(32));

    governor.record_outcome_at("MSFT", dec!(-10.0), t0());
    let after_loss = governor.evaluate_at(&request, t0());
    let assessment = after_loss.assessment().unwrap();
    assert_eq!(assessment.scaling_factor, dec!(0.5));
    assert_eq!(assessment.position_size, dec!(16));
}

#[test]
fn test_frequency_window() {
    let governor = governor();
    for (i, symbol) in ["AAPL", "MSFT", "NVDA"].iter().enumerate() {
        let at = t0() + Duration::seconds(i as i64 * 5);
        let decision = governor.evaluate_at(&equity(symbol), at);
        let assessment = decision.assessment().unwrap();
        governor.record_execution_at(assessment, at);
    }

    let decision = governor.evaluate_at(&equity("AMD"), t0() + Duration::seconds(10));
    assert_eq!(
        rejection(&decision),
        &RejectionReason::FrequencyLimitExceeded {
            executions: 3,
            window_secs: 60
        }
    );
    assert_eq!(rejection(&decision).category(), RejectionCategory::Safety);

    let later = t0() + Duration::seconds(75);
    assert!(governor.evaluate_at(&equity("AMD"), later).is_approved());
}

#[test]
fn test_crypto_stop_floor() {
    let governor = governor();

    // 5% stop on a crypto pair is too tight whatever else is offered
    let tight = TradeRequest {
        confidence_score: dec!(1.0),
        take_profit_price: Some(dec!(200)),
        ..crypto("BTC/USD", dec!(100), dec!(95))
    };
    let decision = governor.evaluate_at(&tight, t0());
    assert!(matches!(
        rejection(&decision),
        RejectionReason::CryptoStopTooTight { .. }
    ));

    let wide = crypto("BTC/USD", dec!(100), dec!(92));
    let decision = governor.evaluate_at(&wide, t0());
    let assessment = decision.assessment().unwrap();
    // Fractional quantity, at most 8 decimal places
    assert!(assessment.position_size.scale() <= 8);
    assert_eq!(assessment.take_profit_price, dec!(115));
}

#[test]
fn test_tiny_balance_below_minimum_notional() {
    let governor = governor();
    for asset_class in [AssetClass::Equity, AssetClass::Crypto] {
        let request = TradeRequest {
            asset_class,
            entry_price: dec!(186.05),
            stop_loss_price: dec!(176.75),
            confidence_score: dec!(0.68),
            account_balance: dec!(1.55),
            buying_power: dec!(1.55),
            ..equity("AAPL")
        };
        let decision = governor.evaluate_at(&request, t0());
        match rejection(&decision) {
            RejectionReason::BelowMinimumNotional { notional, minimum } => {
                assert!(*notional < dec!(1.0));
                assert_eq!(*minimum, dec!(1.0));
            }
            other => panic!("unexpected rejection {other:?}"),
        }
    }
}

#[test]
fn test_evaluate_is_idempotent() {
    let governor = governor();
    governor.record_outcome_at("MSFT", dec!(-20), t0());
    let before = governor.snapshot();

    let request = equity("AAPL");
    let first = governor.evaluate_at(&request, t0());
    let second = governor.evaluate_at(&request, t0());

    assert_eq!(first, second);
    assert_eq!(governor.snapshot(), before);
}

#[test]
fn test_daily_loss_budget_and_rollover() {
    let config = RiskConfig {
        max_daily_loss: dec!(200),
        consecutive_loss_limit: 10,
        ..Default::default()
    };
    let governor = RiskGovernor::new(config).unwrap();
    governor.record_outcome_at("MSFT", dec!(-150), t0());

    // One loss halves the budget: 16 shares * 5 = 80 at risk; 150 + 80 > 200
    let decision = governor.evaluate_at(&equity("AAPL"), t0());
    assert_eq!(
        rejection(&decision),
        &RejectionReason::DailyLossLimitExceeded {
            projected: dec!(230),
            limit: dec!(200)
        }
    );

    let next_day = t0() + Duration::days(1);
    assert!(governor.evaluate_at(&equity("AAPL"), next_day).is_approved());
    assert_eq!(governor.daily_loss_total(), dec!(0));
}

#[test]
fn test_positions_open_and_close() {
    let governor = governor();
    let decision = governor.evaluate_at(&equity("AAPL"), t0());
    let id = governor.record_execution_at(decision.assessment().unwrap(), t0());

    assert_eq!(governor.open_position_count(), 1);
    assert_eq!(governor.open_notional(), dec!(2500));

    let decision = governor.evaluate_at(&equity("AAPL"), t0() + Duration::minutes(2));
    assert_eq!(
        rejection(&decision),
        &RejectionReason::PositionAlreadyOpen("AAPL".to_string())
    );

    let report = governor.record_outcome_at("AAPL", dec!(-12.5), t0() + Duration::minutes(3));
    assert_eq!(report.closed.unwrap().position.id, id);
    assert_eq!(governor.open_position_count(), 0);
    assert_eq!(governor.open_notional(), dec!(0));
    assert_eq!(governor.daily_loss_total(), dec!(12.5));
}

#[test]
fn test_manual_halt() {
    let governor = governor();
    governor.halt_at("broker outage", t0());

    let decision = governor.evaluate_at(&equity("AAPL"), t0());
    assert_eq!(
        rejection(&decision),
        &RejectionReason::TradingHalted(HaltReason::Manual("broker outage".to_string()))
    );

    let snapshot = governor.snapshot();
    assert!(snapshot.trading_halted);
    assert_eq!(snapshot.halted_at, Some(t0()));
}

#[tokio::test]
async fn test_concurrent_callers_share_state() {
    let governor = Arc::new(RiskGovernor::new(RiskConfig {
        max_trades_per_window: 100,
        max_positions: 100,
        consecutive_loss_limit: 50,
        max_daily_loss: dec!(1000000),
        ..Default::default()
    })
    .unwrap());

    let mut handles = Vec::new();
    for i in 0..20 {
        let governor = Arc::clone(&governor);
        handles.push(tokio::spawn(async move {
            let symbol = format!("SYM{i}");
            let decision = governor.evaluate_at(&equity(&symbol), t0());
            if let TradeDecision::Approved(assessment) = decision {
                governor.record_execution_at(&assessment, t0());
            }
            governor.record_outcome_at(&symbol, dec!(-1), t0() + Duration::seconds(1));
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(governor.consecutive_losses(), 20);
    assert_eq!(governor.open_position_count(), 0);
    assert_eq!(governor.daily_loss_total(), dec!(20));
    assert!(!governor.is_halted());
}
