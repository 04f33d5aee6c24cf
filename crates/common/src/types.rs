//! Core types for the QoE scenario harness
//!
//! Every entity here is scoped to a single scenario run; nothing is
//! persisted between runs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File extension for recording artifacts
pub const WEBM_EXT: &str = ".webm";

/// Role a participant plays in the conference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Presenter,
    Viewer,
}

impl std::fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParticipantRole::Presenter => write!(f, "presenter"),
            ParticipantRole::Viewer => write!(f, "viewer"),
        }
    }
}

/// Identity used once to populate the join form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantIdentity {
    pub display_name: String,
    pub session_id: String,
}

impl ParticipantIdentity {
    pub fn new(display_name: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            session_id: session_id.into(),
        }
    }

    /// Expected artifact file name for this participant
    pub fn recording_file_name(&self) -> String {
        format!("{}{}", self.display_name, WEBM_EXT)
    }
}

/// A netem packet-loss rule on a container network interface
///
/// Represents both the desired state (e.g. 50%) and the cleared state (0%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpairmentRule {
    pub interface: String,
    pub loss_percent: u8,
}

impl ImpairmentRule {
    /// Create a rule, rejecting loss percentages above 100
    pub fn new(interface: impl Into<String>, loss_percent: u8) -> Result<Self> {
        if loss_percent > 100 {
            return Err(Error::InvalidLoss { loss_percent });
        }
        Ok(Self {
            interface: interface.into(),
            loss_percent,
        })
    }

    /// The 0% rule that removes the impairment from an interface
    pub fn cleared(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            loss_percent: 0,
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.loss_percent == 0
    }

    /// Render the rule as the `tc` command executed inside the container
    pub fn tc_args(&self) -> Vec<String> {
        let pct = format!("{}%", self.loss_percent);
        [
            "sudo",
            "tc",
            "qdisc",
            "replace",
            "dev",
            self.interface.as_str(),
            "root",
            "netem",
            "loss",
            pct.as_str(),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

/// A captured media stream written to disk after stop-and-fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingArtifact {
    pub owner: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl RecordingArtifact {
    /// Verify that a recording exists on disk and is non-empty
    pub fn verify(owner: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let owner = owner.into();
        let path = path.as_ref().to_path_buf();

        let meta = std::fs::metadata(&path).map_err(|_| Error::RecordingMissing {
            owner: owner.clone(),
            path: path.clone(),
        })?;

        if meta.len() == 0 {
            return Err(Error::RecordingEmpty { owner, path });
        }

        Ok(Self {
            owner,
            path,
            size_bytes: meta.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_file_name() {
        let id = ParticipantIdentity::new("presenter", "qoe-session");
        assert_eq!(id.recording_file_name(), "presenter.webm");
    }

    #[test]
    fn test_impairment_rule_args() {
        let rule = ImpairmentRule::new("eth0", 50).unwrap();
        assert_eq!(
            rule.tc_args(),
            vec!["sudo", "tc", "qdisc", "replace", "dev", "eth0", "root", "netem", "loss", "50%"]
        );
    }

    #[test]
    fn test_cleared_rule() {
        let rule = ImpairmentRule::cleared("eth0");
        assert!(rule.is_cleared());
        assert_eq!(rule.tc_args().last().unwrap(), "0%");
    }

    #[test]
    fn test_loss_out_of_range() {
        assert!(matches!(
            ImpairmentRule::new("eth0", 101),
            Err(Error::InvalidLoss { loss_percent: 101 })
        ));
        assert!(ImpairmentRule::new("eth0", 100).is_ok());
    }

    #[test]
    fn test_artifact_verify() {
        let dir = std::env::temp_dir().join("qoe-artifact-test");
        std::fs::create_dir_all(&dir).unwrap();

        let missing = dir.join("nobody.webm");
        let _ = std::fs::remove_file(&missing);
        assert!(matches!(
            RecordingArtifact::verify("nobody", &missing),
            Err(Error::RecordingMissing { .. })
        ));

        let empty = dir.join("empty.webm");
        std::fs::write(&empty, b"").unwrap();
        assert!(matches!(
            RecordingArtifact::verify("empty", &empty),
            Err(Error::RecordingEmpty { .. })
        ));

        let ok = dir.join("ok.webm");
        std::fs::write(&ok, b"\x1a\x45\xdf\xa3").unwrap();
        let artifact = RecordingArtifact::verify("ok", &ok).unwrap();
        assert_eq!(artifact.size_bytes, 4);
    }
}
