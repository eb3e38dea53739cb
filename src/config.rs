// src/config.rs

//! Client configuration, loaded from a YAML file beside the binary.
use std::path::Path;
use std::time::Duration;

use color_eyre::Result;
use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointKind;

fn default_base_url() -> String {
    "http://192.168.4.1".to_string()
}

fn default_request_timeout_ms() -> u64 {
    3000
}

fn default_distance_ms() -> u64 {
    EndpointKind::Distance.cadence().as_millis() as u64
}

fn default_lights_ms() -> u64 {
    EndpointKind::Lights.cadence().as_millis() as u64
}

fn default_timers_ms() -> u64 {
    EndpointKind::Timers.cadence().as_millis() as u64
}

fn default_state_ms() -> u64 {
    EndpointKind::BridgeState.cadence().as_millis() as u64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the bridge controller.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub poll: PollCadences,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Poll cadence per endpoint, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollCadences {
    #[serde(default = "default_distance_ms")]
    pub distance_ms: u64,
    #[serde(default = "default_lights_ms")]
    pub lights_ms: u64,
    #[serde(default = "default_timers_ms")]
    pub timers_ms: u64,
    #[serde(default = "default_state_ms")]
    pub state_ms: u64,
}

impl Default for PollCadences {
    fn default() -> Self {
        Self {
            distance_ms: default_distance_ms(),
            lights_ms: default_lights_ms(),
            timers_ms: default_timers_ms(),
            state_ms: default_state_ms(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll: PollCadences::default(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ClientConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    /// A file that exists but does not parse is a startup error; polling
    /// never starts against a half-read configuration.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    pub fn cadence(&self, kind: EndpointKind) -> Duration {
        let ms = match kind {
            EndpointKind::Distance => self.poll.distance_ms,
            EndpointKind::Lights => self.poll.lights_ms,
            EndpointKind::Timers => self.poll.timers_ms,
            EndpointKind::BridgeState => self.poll.state_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
