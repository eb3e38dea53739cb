// src/poll.rs

//! Poll loops: one per endpoint, each with its own cadence and its own
//! last-good value. Loops are independent; a stalled endpoint degrades only
//! its own fields.
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::ClientConfig;
use crate::endpoint::{EndpointKind, PolledValue};
use crate::log_warn;
use crate::reconcile::FieldUpdate;
use crate::transport::DeviceTransport;

/// Lifecycle of one polled value.
///
/// Once `Fresh` has been observed the externally visible value never
/// regresses to `Unknown`; a failed poll carries the last value forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollState {
    /// No successful poll yet.
    Unknown,
    /// Value from the most recent poll.
    Fresh(PolledValue, Instant),
    /// Carried-forward value after a failed poll.
    Stale(PolledValue, Instant),
}

impl PollState {
    pub fn last_value(&self) -> Option<PolledValue> {
        match self {
            PollState::Unknown => None,
            PollState::Fresh(value, _) | PollState::Stale(value, _) => Some(*value),
        }
    }
}

pub struct PollLoop {
    kind: EndpointKind,
    transport: Arc<dyn DeviceTransport>,
    updates: mpsc::UnboundedSender<FieldUpdate>,
    state: PollState,
}

impl PollLoop {
    pub fn new(
        kind: EndpointKind,
        transport: Arc<dyn DeviceTransport>,
        updates: mpsc::UnboundedSender<FieldUpdate>,
    ) -> Self {
        Self {
            kind,
            transport,
            updates,
            state: PollState::Unknown,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// One fetch-and-reconcile step.
    ///
    /// The spawned loop awaits this before sleeping again, so ticks for one
    /// endpoint are strictly serialized: two outstanding fetches for the
    /// same endpoint never exist.
    pub async fn tick(&mut self) {
        match self.transport.get_json(self.kind.path()).await {
            Ok(raw) => {
                let value = self.kind.decode(&raw);
                self.state = PollState::Fresh(value, Instant::now());
                self.emit(value);
            }
            Err(err) => {
                log_warn!("poll {} failed: {}", self.kind.path(), err);
                match self.state.last_value() {
                    Some(previous) => {
                        // Keep showing the last known value instead of
                        // flickering to an error state on a missed poll.
                        self.state = PollState::Stale(previous, Instant::now());
                        self.emit(previous);
                    }
                    None => self.emit(self.kind.placeholder()),
                }
            }
        }
    }

    fn emit(&self, value: PolledValue) {
        let _ = self.updates.send(FieldUpdate::Polled(value));
    }
}

/// Owns the repeating poll tasks so they can be cancelled together on
/// shutdown. No loop outlives the supervisor.
pub struct PollSupervisor {
    handles: Vec<JoinHandle<()>>,
}

impl PollSupervisor {
    pub fn spawn(
        transport: Arc<dyn DeviceTransport>,
        updates: mpsc::UnboundedSender<FieldUpdate>,
        config: &ClientConfig,
    ) -> Self {
        let handles = EndpointKind::ALL
            .iter()
            .map(|&kind| {
                let mut poll = PollLoop::new(kind, transport.clone(), updates.clone());
                let cadence = config.cadence(kind);
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(cadence);
                    // A slow fetch delays the next tick rather than stacking
                    // a burst of catch-up fetches behind it.
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        ticker.tick().await;
                        poll.tick().await;
                    }
                })
            })
            .collect();

        Self { handles }
    }

    pub fn shutdown(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for PollSupervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{BridgeState, DistancePair};
    use crate::transport::FetchError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Transport that replays a scripted sequence of responses.
    struct ScriptedTransport {
        responses: Mutex<Vec<Result<Value, FetchError>>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<Value, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
            })
        }
    }

    #[async_trait]
    impl DeviceTransport for ScriptedTransport {
        async fn get_json(&self, _path: &str) -> Result<Value, FetchError> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Err(FetchError::Network("script exhausted".into()))
            } else {
                responses.remove(0)
            }
        }

        async fn post_text(&self, _path: &str) -> Result<String, FetchError> {
            Err(FetchError::Network("not scripted".into()))
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<FieldUpdate>) -> Vec<FieldUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }
        updates
    }

    #[tokio::test]
    async fn test_failed_poll_before_first_success_emits_placeholder() {
        let transport =
            ScriptedTransport::new(vec![Err(FetchError::Network("unreachable".into()))]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poll = PollLoop::new(EndpointKind::Distance, transport, tx);

        poll.tick().await;

        assert_eq!(poll.state(), PollState::Unknown);
        assert_eq!(
            drain(&mut rx),
            vec![FieldUpdate::Polled(EndpointKind::Distance.placeholder())]
        );
    }

    #[tokio::test]
    async fn test_failed_poll_after_fresh_keeps_last_value() {
        let transport = ScriptedTransport::new(vec![
            Ok(json!({"A": 42.0, "B": 17.5})),
            Err(FetchError::BadStatus(500)),
            Err(FetchError::Network("timeout".into())),
        ]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poll = PollLoop::new(EndpointKind::Distance, transport, tx);

        let expected = PolledValue::Distance(DistancePair {
            a: Some(42.0),
            b: Some(17.5),
        });

        poll.tick().await;
        assert!(matches!(poll.state(), PollState::Fresh(value, _) if value == expected));

        poll.tick().await;
        assert!(matches!(poll.state(), PollState::Stale(value, _) if value == expected));

        poll.tick().await;
        assert!(matches!(poll.state(), PollState::Stale(value, _) if value == expected));

        // Every emission carries the same value; the UI never sees a
        // placeholder once a real reading exists.
        assert_eq!(drain(&mut rx), vec![FieldUpdate::Polled(expected); 3]);
    }

    #[tokio::test]
    async fn test_recovery_returns_to_fresh() {
        let transport = ScriptedTransport::new(vec![
            Ok(json!({"state": "OPENING"})),
            Err(FetchError::Network("blip".into())),
            Ok(json!({"state": "CLOSING"})),
        ]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poll = PollLoop::new(EndpointKind::BridgeState, transport, tx);

        poll.tick().await;
        poll.tick().await;
        poll.tick().await;

        assert!(matches!(
            poll.state(),
            PollState::Fresh(PolledValue::Bridge(BridgeState::Closing), _)
        ));
        assert_eq!(
            drain(&mut rx),
            vec![
                FieldUpdate::Polled(PolledValue::Bridge(BridgeState::Opening)),
                FieldUpdate::Polled(PolledValue::Bridge(BridgeState::Opening)),
                FieldUpdate::Polled(PolledValue::Bridge(BridgeState::Closing)),
            ]
        );
    }

    #[tokio::test]
    async fn test_supervisor_shutdown_stops_all_loops() {
        let transport = ScriptedTransport::new(vec![]);
        let (tx, _rx) = mpsc::unbounded_channel();
        let config = ClientConfig::default();

        let mut supervisor = PollSupervisor::spawn(transport, tx, &config);
        supervisor.shutdown();
        assert!(supervisor.handles.is_empty());
    }
}
