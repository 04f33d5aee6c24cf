//! Scenario orchestration
//!
//! Sequences the strictly ordered steps of a packet-loss scenario and
//! produces a serializable report. The first failing step aborts the
//! remaining sequence; if the impairment rule went in before the failure,
//! one best-effort clear attempt is made before returning.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

use qoe_common::{ImpairmentRule, RecordingArtifact, Result};

use crate::docker::ContainerExec;
use crate::fault::FaultInjector;
use crate::hold::HoldTimer;
use crate::participant::{ConferenceClient, Participant};
use crate::scenario::ScenarioSpec;

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub started_at: i64,
    /// Whether the loss rule was actually applied to a container
    pub loss_applied: bool,
    pub artifacts: Vec<RecordingArtifact>,
    pub error: Option<String>,
}

/// Aggregate over all scenarios of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn from_reports(reports: Vec<ScenarioReport>) -> Self {
        let passed = reports.iter().filter(|r| r.success).count();
        Self {
            total: reports.len(),
            passed,
            failed: reports.len() - passed,
            duration_ms: reports.iter().map(|r| r.duration_ms).sum(),
            scenarios: reports,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Write the report as pretty JSON into the output directory
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let path = output_dir.join("scenario-results.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Run one scenario end to end
///
/// An error inside the sequence is captured in the report; an `Err` return
/// means the scenario could not be set up at all (e.g. an invalid rule).
pub async fn run_scenario<P, V, E>(
    spec: &ScenarioSpec,
    presenter: &mut Participant<P>,
    viewer: &mut Participant<V>,
    injector: &FaultInjector<'_, E>,
) -> Result<ScenarioReport>
where
    P: ConferenceClient,
    V: ConferenceClient,
    E: ContainerExec,
{
    let rule = spec.rule()?;
    let start = Instant::now();
    let started_at = chrono::Utc::now().timestamp();
    let mut loss_applied = false;

    let outcome = drive(spec, presenter, viewer, injector, &rule, &mut loss_applied).await;

    // The sequence failed after the rule went in; do not leave the
    // impairment behind. The original error is what surfaces.
    if outcome.is_err() && loss_applied {
        if let Err(e) = injector.clear(presenter.name(), &spec.interface).await {
            warn!("Failed to clear impairment after error: {}", e);
        }
    }

    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(artifacts) => {
            info!("✓ {} ({} ms)", spec.name, duration_ms);
            Ok(ScenarioReport {
                name: spec.name.clone(),
                success: true,
                duration_ms,
                started_at,
                loss_applied,
                artifacts,
                error: None,
            })
        }
        Err(e) => {
            error!("✗ {} - {}", spec.name, e);
            Ok(ScenarioReport {
                name: spec.name.clone(),
                success: false,
                duration_ms,
                started_at,
                loss_applied,
                artifacts: vec![],
                error: Some(e.to_string()),
            })
        }
    }
}

async fn drive<P, V, E>(
    spec: &ScenarioSpec,
    presenter: &mut Participant<P>,
    viewer: &mut Participant<V>,
    injector: &FaultInjector<'_, E>,
    rule: &ImpairmentRule,
    loss_applied: &mut bool,
) -> Result<Vec<RecordingArtifact>>
where
    P: ConferenceClient,
    V: ConferenceClient,
    E: ContainerExec,
{
    // Both participants submit the join form with the same session id
    presenter.join(&spec.sut_url).await?;
    viewer.join(&spec.sut_url).await?;

    // Presenter records what it sends, viewer what it receives
    info!("Starting recordings");
    presenter
        .start_recording(spec.presenter.direction(presenter.role).stream_expression())
        .await?;
    viewer
        .start_recording(spec.viewer.direction(viewer.role).stream_expression())
        .await?;

    // Loss goes in at the sender
    info!(
        "Applying {}% loss on {} of {}",
        rule.loss_percent,
        rule.interface,
        presenter.name()
    );
    *loss_applied = injector.apply(presenter.name(), rule).await?;

    info!("Holding for {}s", spec.hold_secs);
    let (timer, _handle) = HoldTimer::new(spec.hold_duration());
    timer.wait().await;

    // Clear before stopping the recordings
    injector.clear(presenter.name(), &spec.interface).await?;

    info!("Stopping recordings");
    presenter.stop_recording().await?;
    viewer.stop_recording().await?;

    let presenter_artifact = presenter.fetch_recording().await?;
    let viewer_artifact = viewer.fetch_recording().await?;

    Ok(vec![presenter_artifact, viewer_artifact])
}
