//! Declarative YAML scenario specification

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use qoe_common::{Error, ImpairmentRule, ParticipantIdentity, ParticipantRole, Result};

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// URL of the conference demo under test
    pub sut_url: String,

    /// Shared session id joining both participants into one logical room
    pub session_id: String,

    pub presenter: ParticipantSpec,
    pub viewer: ParticipantSpec,

    /// Loss percentage applied at the presenter's container
    #[serde(default = "default_loss_percent")]
    pub loss_percent: u8,

    /// Interface the netem rule is attached to
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Wall-clock hold between applying and clearing the rule
    #[serde(default = "default_hold_secs")]
    pub hold_secs: u64,
}

fn default_loss_percent() -> u8 {
    50
}

fn default_interface() -> String {
    "eth0".to_string()
}

fn default_hold_secs() -> u64 {
    30
}

/// One participant in the scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantSpec {
    pub display_name: String,

    /// Container name filter backing this participant's browser, if any
    #[serde(default)]
    pub container: Option<String>,

    /// Which stream to record; defaults by role (presenter records what it
    /// sends, viewer what it receives)
    #[serde(default)]
    pub record: Option<StreamDirection>,
}

impl ParticipantSpec {
    pub fn direction(&self, role: ParticipantRole) -> StreamDirection {
        self.record.unwrap_or(match role {
            ParticipantRole::Presenter => StreamDirection::Outbound,
            ParticipantRole::Viewer => StreamDirection::Inbound,
        })
    }
}

/// Which side of the peer connection a recording captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamDirection {
    /// The stream this participant sends
    Outbound,
    /// The stream this participant receives
    Inbound,
}

impl StreamDirection {
    /// In-page expression for the stream this direction records
    pub fn stream_expression(&self) -> &'static str {
        match self {
            StreamDirection::Outbound => {
                "session.streamManagers[0].stream.webRtcPeer.pc.getLocalStreams()[0]"
            }
            StreamDirection::Inbound => {
                "session.streamManagers[0].stream.webRtcPeer.pc.getRemoteStreams()[0]"
            }
        }
    }
}

impl ScenarioSpec {
    /// Parse a scenario from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load all scenarios from a directory
    pub fn load_all(dir: &Path) -> Result<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            specs.push(Self::from_file(entry.path())?);
        }

        Ok(specs)
    }

    /// Identity a role joins the session with
    pub fn identity(&self, role: ParticipantRole) -> ParticipantIdentity {
        let spec = match role {
            ParticipantRole::Presenter => &self.presenter,
            ParticipantRole::Viewer => &self.viewer,
        };
        ParticipantIdentity::new(&spec.display_name, &self.session_id)
    }

    /// The impairment rule this scenario applies
    pub fn rule(&self) -> Result<ImpairmentRule> {
        ImpairmentRule::new(&self.interface, self.loss_percent)
    }

    pub fn hold_duration(&self) -> Duration {
        Duration::from_secs(self.hold_secs)
    }
}
