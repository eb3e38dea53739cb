// src/command.rs

//! Fire-and-forget manual commands.
//!
//! Open/close are gated on the cached mode here as well as in the UI, since
//! a queued command can race a concurrent mode flip. Commands never block
//! the poll loops and are never retried or queued; device-side idempotency
//! is assumed.
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::mode::{Mode, ModeGate};
use crate::reconcile::FieldUpdate;
use crate::transport::DeviceTransport;
use crate::{log_debug, log_warn};

const OPEN_PATH: &str = "/led/on";
const CLOSE_PATH: &str = "/led/off";
const STOP_PATH: &str = "/stop";

pub const COMMAND_ERROR_STATUS: &str = "Status: Error";

pub struct CommandDispatcher {
    gate: ModeGate,
    transport: Arc<dyn DeviceTransport>,
    updates: mpsc::UnboundedSender<FieldUpdate>,
}

impl CommandDispatcher {
    pub fn new(
        gate: ModeGate,
        transport: Arc<dyn DeviceTransport>,
        updates: mpsc::UnboundedSender<FieldUpdate>,
    ) -> Self {
        Self {
            gate,
            transport,
            updates,
        }
    }

    /// Raise the bridge deck. A no-op issuing zero requests outside manual
    /// mode.
    pub fn open(&self) {
        self.send_gated(OPEN_PATH);
    }

    /// Lower the bridge deck. A no-op issuing zero requests outside manual
    /// mode.
    pub fn close(&self) {
        self.send_gated(CLOSE_PATH);
    }

    /// Halt the lift motor where it is. The device accepts this in any
    /// mode, so it is not gated.
    pub fn stop(&self) {
        self.send(STOP_PATH);
    }

    fn send_gated(&self, path: &'static str) {
        if self.gate.get() != Mode::Manual {
            log_debug!("dropped {} command outside manual mode", path);
            return;
        }
        self.send(path);
    }

    fn send(&self, path: &'static str) {
        let transport = self.transport.clone();
        let updates = self.updates.clone();
        tokio::spawn(async move {
            let status = match transport.post_text(path).await {
                Ok(body) => format!("Status: {}", body.trim()),
                Err(err) => {
                    log_warn!("command {} failed: {}", path, err);
                    COMMAND_ERROR_STATUS.to_string()
                }
            };
            let _ = updates.send(FieldUpdate::CommandStatus(status));
        });
    }
}
