// src/endpoint.rs

//! Endpoint descriptors and payload decoding.
//!
//! Decoding is deliberately lenient: a payload missing an expected field
//! decodes to a safe per-field default. Only an unparseable body counts as
//! a fetch failure, and that is handled at the transport layer.
use std::time::Duration;

use serde_json::Value;

/// One polled endpoint on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Distance,
    Lights,
    Timers,
    BridgeState,
}

impl EndpointKind {
    pub const ALL: [EndpointKind; 4] = [
        EndpointKind::Distance,
        EndpointKind::Lights,
        EndpointKind::Timers,
        EndpointKind::BridgeState,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            EndpointKind::Distance => "/distance",
            EndpointKind::Lights => "/lights",
            EndpointKind::Timers => "/timers",
            EndpointKind::BridgeState => "/state",
        }
    }

    /// Default poll cadence. Staleness of the proximity sensors and lamp
    /// mirror is safety-relevant, so those poll faster than bridge state.
    pub fn cadence(&self) -> Duration {
        match self {
            EndpointKind::Distance => Duration::from_millis(500),
            EndpointKind::Lights => Duration::from_millis(250),
            EndpointKind::Timers => Duration::from_millis(200),
            EndpointKind::BridgeState => Duration::from_millis(350),
        }
    }

    pub fn decode(&self, raw: &Value) -> PolledValue {
        match self {
            EndpointKind::Distance => PolledValue::Distance(DistancePair::decode(raw)),
            EndpointKind::Lights => PolledValue::Lights(LightsSnapshot::decode(raw)),
            EndpointKind::Timers => PolledValue::Timers(TimersSnapshot::decode(raw)),
            EndpointKind::BridgeState => PolledValue::Bridge(BridgeState::decode(raw)),
        }
    }

    /// Value emitted before the first successful poll.
    pub fn placeholder(&self) -> PolledValue {
        match self {
            EndpointKind::Distance => PolledValue::Distance(DistancePair::default()),
            EndpointKind::Lights => PolledValue::Lights(LightsSnapshot::default()),
            EndpointKind::Timers => PolledValue::Timers(TimersSnapshot::default()),
            EndpointKind::BridgeState => PolledValue::Bridge(BridgeState::default()),
        }
    }
}

/// Decoded result of one poll, tagged by endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolledValue {
    Distance(DistancePair),
    Lights(LightsSnapshot),
    Timers(TimersSnapshot),
    Bridge(BridgeState),
}

/// Proximity sensor readings in centimeters. `None` means the field was
/// missing or non-numeric, not a zero reading.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DistancePair {
    pub a: Option<f64>,
    pub b: Option<f64>,
}

impl DistancePair {
    fn decode(raw: &Value) -> Self {
        Self {
            a: raw.get("A").and_then(Value::as_f64),
            b: raw.get("B").and_then(Value::as_f64),
        }
    }
}

/// One light group's lamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LampTriple {
    pub red: bool,
    pub yellow: bool,
    pub green: bool,
}

impl LampTriple {
    fn decode(group: Option<&Value>) -> Self {
        // The firmware serializes lamps as 0/1; accept real booleans too.
        let lamp = |name: &str| {
            group
                .and_then(|g| g.get(name))
                .map(|v| match v {
                    Value::Bool(b) => *b,
                    Value::Number(n) => n.as_f64().unwrap_or(0.0) != 0.0,
                    _ => false,
                })
                .unwrap_or(false)
        };
        Self {
            red: lamp("red"),
            yellow: lamp("yellow"),
            green: lamp("green"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightsSnapshot {
    pub road: LampTriple,
    pub boat: LampTriple,
}

impl LightsSnapshot {
    fn decode(raw: &Value) -> Self {
        Self {
            road: LampTriple::decode(raw.get("road")),
            boat: LampTriple::decode(raw.get("boat")),
        }
    }
}

/// Remaining phase time per light group, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimersSnapshot {
    pub road_remaining_ms: i64,
    pub boat_remaining_ms: i64,
}

impl TimersSnapshot {
    fn decode(raw: &Value) -> Self {
        let remaining = |group: &str| {
            raw.get(group)
                .and_then(|g| g.get("remaining_ms"))
                .and_then(Value::as_f64)
                .map(|ms| ms as i64)
                .unwrap_or(0)
        };
        Self {
            road_remaining_ms: remaining("road"),
            boat_remaining_ms: remaining("boat"),
        }
    }
}

/// Lift state as reported by the device. Unrecognized labels fall back to
/// `Idle` rather than failing the poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BridgeState {
    #[default]
    Idle,
    RoadWarning,
    BoatWarning,
    Opening,
    Open,
    Closing,
}

impl BridgeState {
    pub fn parse(label: &str) -> Self {
        match label {
            "ROAD_WARNING" => BridgeState::RoadWarning,
            "BOAT_WARNING" => BridgeState::BoatWarning,
            "OPENING" => BridgeState::Opening,
            "OPEN" => BridgeState::Open,
            "CLOSING" => BridgeState::Closing,
            _ => BridgeState::Idle,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BridgeState::Idle => "IDLE",
            BridgeState::RoadWarning => "ROAD_WARNING",
            BridgeState::BoatWarning => "BOAT_WARNING",
            BridgeState::Opening => "OPENING",
            BridgeState::Open => "OPEN",
            BridgeState::Closing => "CLOSING",
        }
    }

    fn decode(raw: &Value) -> Self {
        raw.get("state")
            .and_then(Value::as_str)
            .map(BridgeState::parse)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_distance_decodes_numeric_fields() {
        let value = EndpointKind::Distance.decode(&json!({"A": 12.34, "B": 7}));
        assert_eq!(
            value,
            PolledValue::Distance(DistancePair {
                a: Some(12.34),
                b: Some(7.0)
            })
        );
    }

    #[test]
    fn test_distance_non_numeric_field_is_none() {
        let value = EndpointKind::Distance.decode(&json!({"A": "x"}));
        assert_eq!(
            value,
            PolledValue::Distance(DistancePair { a: None, b: None })
        );
    }

    #[test]
    fn test_lights_decode_numeric_and_boolean_flags() {
        let value = EndpointKind::Lights.decode(&json!({
            "road": {"red": 1, "yellow": 0, "green": false},
            "boat": {"red": false, "yellow": true, "green": 1}
        }));
        let PolledValue::Lights(lights) = value else {
            panic!("wrong variant");
        };
        assert!(lights.road.red);
        assert!(!lights.road.yellow);
        assert!(!lights.road.green);
        assert!(lights.boat.yellow);
        assert!(lights.boat.green);
    }

    #[test]
    fn test_lights_absent_group_is_all_off() {
        let value = EndpointKind::Lights.decode(&json!({"road": {"red": true}}));
        let PolledValue::Lights(lights) = value else {
            panic!("wrong variant");
        };
        assert!(lights.road.red);
        assert_eq!(lights.boat, LampTriple::default());
    }

    #[test]
    fn test_timers_absent_or_bad_fields_are_zero() {
        let value = EndpointKind::Timers.decode(&json!({"road": {"remaining_ms": "soon"}}));
        assert_eq!(
            value,
            PolledValue::Timers(TimersSnapshot {
                road_remaining_ms: 0,
                boat_remaining_ms: 0
            })
        );
    }

    #[test]
    fn test_timers_decode_milliseconds() {
        let value = EndpointKind::Timers.decode(&json!({
            "road": {"remaining_ms": 2500},
            "boat": {"remaining_ms": 150.0}
        }));
        assert_eq!(
            value,
            PolledValue::Timers(TimersSnapshot {
                road_remaining_ms: 2500,
                boat_remaining_ms: 150
            })
        );
    }

    #[test]
    fn test_state_known_labels_round_trip() {
        for label in ["IDLE", "ROAD_WARNING", "BOAT_WARNING", "OPENING", "OPEN", "CLOSING"] {
            let state = BridgeState::parse(label);
            assert_eq!(state.label(), label);
        }
    }

    #[test]
    fn test_state_unrecognized_label_falls_back_to_idle() {
        let value = EndpointKind::BridgeState.decode(&json!({"state": "foo"}));
        assert_eq!(value, PolledValue::Bridge(BridgeState::Idle));
        let value = EndpointKind::BridgeState.decode(&json!({}));
        assert_eq!(value, PolledValue::Bridge(BridgeState::Idle));
    }
}
