// src/mode.rs

//! Cached manual/automatic mode. The device owns the truth; this gate owns
//! the client's cached copy, and every gating or rendering decision reads
//! the cache, never a write-command outcome.
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::transport::DeviceTransport;
use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Automatic,
    Manual,
}

impl Mode {
    /// Wire form used by the /mode endpoint.
    pub fn wire_value(&self) -> &'static str {
        match self {
            Mode::Automatic => "auto",
            Mode::Manual => "manual",
        }
    }

    pub fn parse(value: &str) -> Option<Mode> {
        match value {
            "auto" => Some(Mode::Automatic),
            "manual" => Some(Mode::Manual),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Automatic => "Automatic",
            Mode::Manual => "Manual",
        }
    }

    pub fn toggled(&self) -> Mode {
        match self {
            Mode::Automatic => Mode::Manual,
            Mode::Manual => Mode::Automatic,
        }
    }
}

/// Owns the cached mode. Written only through its own operations; shared by
/// clone, since all readers hold the same inner cell.
#[derive(Clone, Default)]
pub struct ModeGate {
    cached: Arc<Mutex<Mode>>,
}

impl ModeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous read of the cached mode.
    pub fn get(&self) -> Mode {
        *self.cached.lock().unwrap()
    }

    pub fn set(&self, mode: Mode) {
        *self.cached.lock().unwrap() = mode;
    }

    /// Startup sync against the device. An unreadable or unrecognized
    /// response leaves the gate in Automatic; a mode read failure never
    /// blocks initialization.
    pub async fn sync_from_device(&self, transport: &dyn DeviceTransport) -> Mode {
        let mode = match transport.get_json("/mode").await {
            Ok(raw) => raw
                .get("value")
                .and_then(Value::as_str)
                .and_then(Mode::parse)
                .unwrap_or_default(),
            Err(err) => {
                log_warn!("mode sync failed, assuming automatic: {}", err);
                Mode::default()
            }
        };
        self.set(mode);
        log_info!("mode gate synced: {}", mode.label());
        mode
    }

    /// Optimistic change: the cache updates immediately so the controls feel
    /// responsive; the device write runs in the background. A failed write is
    /// logged and the cache is deliberately NOT rolled back; the device
    /// catches up on the next manual toggle.
    pub fn request_change(&self, mode: Mode, transport: Arc<dyn DeviceTransport>) {
        self.set(mode);
        tokio::spawn(async move {
            let path = format!("/mode?value={}", mode.wire_value());
            match transport.post_text(&path).await {
                Ok(body) => log_info!("mode set to {}: {}", mode.wire_value(), body.trim()),
                Err(err) => log_warn!("mode write failed, cache kept: {}", err),
            }
        });
    }
}
