//! Event log replay through the public CLI helpers

use rust_decimal_macros::dec;
use trade_governor::cli::{parse_events, replay, ReplayEvent, ReplayOutput};
use trade_governor::config::RiskConfig;
use trade_governor::risk::{RejectionReason, RiskGovernor};

const LOG: &str = r#"
{"type":"evaluate","at":"2024-03-04T15:00:00Z","execute":true,"request":{"symbol":"ETH/USD","side":"buy","asset_class":"crypto","entry_price":"3000","stop_loss_price":"2700","confidence_score":"0.9","account_balance":"20000","buying_power":"20000"}}
{"type":"evaluate","at":"2024-03-04T15:00:30Z","request":{"symbol":"ETH/USD","side":"buy","asset_class":"crypto","entry_price":"3000","stop_loss_price":"2700","confidence_score":"0.9","account_balance":"20000","buying_power":"20000"}}
{"type":"outcome","at":"2024-03-04T16:00:00Z","symbol":"ETH/USD","pnl":"-250"}
{"type":"halt","at":"2024-03-04T16:05:00Z","reason":"exchange maintenance"}
{"type":"reset_daily","at":"2024-03-04T16:10:00Z"}
"#;

#[test]
fn test_replay_crypto_session() {
    let events = parse_events(LOG).unwrap();
    assert!(matches!(events[4].1, ReplayEvent::ResetDaily { .. }));

    let governor = RiskGovernor::new(RiskConfig::default()).unwrap();
    let outputs = replay(&governor, events);

    let ReplayOutput::Decision {
        decision,
        position_id,
        ..
    } = &outputs[0]
    else {
        panic!("expected decision");
    };
    let assessment = decision.assessment().unwrap();
    // Budget 20000 * 2% * 0.9 = 360 over a 300 stop -> 1.2 ETH
    assert_eq!(assessment.position_size, dec!(1.2));
    assert!(position_id.is_some());

    let ReplayOutput::Decision { decision, .. } = &outputs[1] else {
        panic!("expected decision");
    };
    assert_eq!(
        decision.rejection_reason(),
        Some(&RejectionReason::PositionAlreadyOpen("ETH/USD".to_string()))
    );

    let ReplayOutput::Outcome { report, .. } = &outputs[2] else {
        panic!("expected outcome");
    };
    assert!(report.closed.is_some());
    assert_eq!(report.consecutive_losses, 1);

    assert!(governor.is_halted());
    assert_eq!(governor.daily_loss_total(), dec!(0));
    assert_eq!(governor.open_position_count(), 0);
}

#[test]
fn test_outputs_serialize_as_tagged_json() {
    let governor = RiskGovernor::new(RiskConfig::default()).unwrap();
    let outputs = replay(&governor, parse_events(r#"{"type":"reset"}"#).unwrap());

    let json = serde_json::to_value(&outputs[0]).unwrap();
    assert_eq!(json["type"], "reset");
    assert_eq!(json["line"], 1);
}
