// src/reconcile.rs

//! Pure mapping from polled values to presentation fields.
//!
//! The reconciler performs no I/O of its own. It drains updates emitted by
//! the poll loops, the mode gate and the command dispatcher, and drives the
//! presenter with display-ready fields.
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::endpoint::{BridgeState, LampTriple, PolledValue};
use crate::mode::Mode;

pub const DISTANCE_PLACEHOLDER: &str = "--";
pub const TIMER_PLACEHOLDER: &str = "\u{2014}";

/// Everything the engine can report to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Polled(PolledValue),
    Mode(Mode),
    CommandStatus(String),
}

/// Color family for the bridge status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateColor {
    Green,
    Red,
    Amber,
    Neutral,
}

pub fn state_color(state: BridgeState) -> StateColor {
    match state {
        BridgeState::Opening => StateColor::Green,
        BridgeState::Closing => StateColor::Red,
        BridgeState::BoatWarning | BridgeState::RoadWarning => StateColor::Amber,
        BridgeState::Idle | BridgeState::Open => StateColor::Neutral,
    }
}

pub fn format_distance(value: Option<f64>) -> String {
    match value {
        Some(cm) => format!("{:.1} cm", cm),
        None => DISTANCE_PLACEHOLDER.to_string(),
    }
}

/// Zero or negative remaining time renders as the placeholder, never "0.0s".
pub fn format_timer(remaining_ms: i64) -> String {
    if remaining_ms > 0 {
        format!("{:.1}s", remaining_ms as f64 / 1000.0)
    } else {
        TIMER_PLACEHOLDER.to_string()
    }
}

/// Which lamp column a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightGroup {
    Road,
    Vessel,
}

/// Render capability driven by the reconciler.
///
/// Every method is called unconditionally; an absent UI is a
/// [`NullPresenter`], not a skipped call site.
pub trait Presenter: Send + Sync {
    fn bridge_state(&self, label: &str, color: StateColor);
    fn distances(&self, a: &str, b: &str);
    fn lamps(&self, group: LightGroup, lamps: LampTriple);
    fn timer(&self, group: LightGroup, text: &str);
    fn mode(&self, label: &str, controls_enabled: bool);
    fn command_status(&self, text: &str);
}

/// Presenter that renders nowhere.
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn bridge_state(&self, _label: &str, _color: StateColor) {}
    fn distances(&self, _a: &str, _b: &str) {}
    fn lamps(&self, _group: LightGroup, _lamps: LampTriple) {}
    fn timer(&self, _group: LightGroup, _text: &str) {}
    fn mode(&self, _label: &str, _controls_enabled: bool) {}
    fn command_status(&self, _text: &str) {}
}

pub struct Reconciler {
    presenter: Arc<dyn Presenter>,
}

impl Reconciler {
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self { presenter }
    }

    /// Apply one update to the presentation fields.
    pub fn apply(&self, update: FieldUpdate) {
        match update {
            FieldUpdate::Polled(PolledValue::Bridge(state)) => {
                self.presenter.bridge_state(state.label(), state_color(state));
            }
            FieldUpdate::Polled(PolledValue::Distance(d)) => {
                self.presenter
                    .distances(&format_distance(d.a), &format_distance(d.b));
            }
            FieldUpdate::Polled(PolledValue::Lights(lights)) => {
                self.presenter.lamps(LightGroup::Road, lights.road);
                self.presenter.lamps(LightGroup::Vessel, lights.boat);
            }
            FieldUpdate::Polled(PolledValue::Timers(timers)) => {
                self.presenter
                    .timer(LightGroup::Road, &format_timer(timers.road_remaining_ms));
                self.presenter
                    .timer(LightGroup::Vessel, &format_timer(timers.boat_remaining_ms));
            }
            FieldUpdate::Mode(mode) => {
                self.presenter.mode(mode.label(), mode == Mode::Manual);
            }
            FieldUpdate::CommandStatus(text) => {
                self.presenter.command_status(&text);
            }
        }
    }

    /// Drain updates until every producer is gone.
    pub fn run(self, mut updates: mpsc::UnboundedReceiver<FieldUpdate>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                self.apply(update);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_color_mapping() {
        assert_eq!(state_color(BridgeState::Opening), StateColor::Green);
        assert_eq!(state_color(BridgeState::Closing), StateColor::Red);
        assert_eq!(state_color(BridgeState::BoatWarning), StateColor::Amber);
        assert_eq!(state_color(BridgeState::RoadWarning), StateColor::Amber);
        assert_eq!(state_color(BridgeState::Idle), StateColor::Neutral);
        assert_eq!(state_color(BridgeState::Open), StateColor::Neutral);
        assert_eq!(state_color(BridgeState::parse("foo")), StateColor::Neutral);
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(Some(12.34)), "12.3 cm");
        assert_eq!(format_distance(Some(7.0)), "7.0 cm");
        assert_eq!(format_distance(None), "--");
    }

    #[test]
    fn test_format_timer_positive_and_placeholder() {
        assert_eq!(format_timer(2500), "2.5s");
        assert_eq!(format_timer(500), "0.5s");
        assert_eq!(format_timer(0), TIMER_PLACEHOLDER);
        assert_eq!(format_timer(-20), TIMER_PLACEHOLDER);
    }
}
