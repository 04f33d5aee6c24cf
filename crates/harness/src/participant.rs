//! Conference participants and in-page recording capture
//!
//! The harness depends on the narrow `ConferenceClient` capability surface
//! only; `BrowserClient` implements it over a WebDriver session, tests
//! implement it in memory.

use async_trait::async_trait;
use base64::Engine;
use serde_json::json;
use std::path::PathBuf;
use tracing::{debug, info};

use qoe_common::{Error, ParticipantIdentity, ParticipantRole, RecordingArtifact, Result, WEBM_EXT};

use crate::webdriver::BrowserSession;

/// Join form field holding the display name
const USER_NAME_FIELD: &str = "userName";

/// Join form field holding the session id
const SESSION_ID_FIELD: &str = "sessionId";

/// Submit control of the join form
const JOIN_CONTROL: &str = "[name=\"commit\"]";

/// Installs a MediaRecorder over the stream expression in `arguments[0]`
const START_RECORDING_JS: &str = r#"
const stream = eval(arguments[0]);
window.__qoeChunks = [];
window.__qoeRecorder = new MediaRecorder(stream);
window.__qoeRecorder.ondataavailable = (e) => {
  if (e.data && e.data.size > 0) window.__qoeChunks.push(e.data);
};
window.__qoeRecorder.start(1000);
"#;

/// Stops the recorder, resolving once the final chunk is flushed
const STOP_RECORDING_JS: &str = r#"
const done = arguments[arguments.length - 1];
const rec = window.__qoeRecorder;
if (!rec || rec.state === 'inactive') { done(true); return; }
rec.onstop = () => done(true);
rec.stop();
"#;

/// Reads the recorded chunks back as a base64 webm payload
const FETCH_RECORDING_JS: &str = r#"
const done = arguments[arguments.length - 1];
const blob = new Blob(window.__qoeChunks || [], { type: 'video/webm' });
const reader = new FileReader();
reader.onloadend = () => done(reader.result.split(',')[1] || '');
reader.readAsDataURL(blob);
"#;

/// Capability surface the orchestrator drives a participant through
#[async_trait]
pub trait ConferenceClient: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;
    async fn fill_field_by_id(&mut self, id: &str, value: &str) -> Result<()>;
    async fn click_control(&mut self, selector: &str) -> Result<()>;
    async fn start_recording(&mut self, stream_expr: &str) -> Result<()>;
    async fn stop_recording(&mut self) -> Result<()>;
    async fn fetch_recording(&mut self, file_name: &str) -> Result<RecordingArtifact>;
}

/// WebDriver-backed conference client
pub struct BrowserClient {
    session: BrowserSession,
    recordings_dir: PathBuf,
}

impl BrowserClient {
    pub fn new(session: BrowserSession, recordings_dir: impl Into<PathBuf>) -> Self {
        Self {
            session,
            recordings_dir: recordings_dir.into(),
        }
    }

    /// End the underlying browser session
    pub async fn quit(self) -> Result<()> {
        self.session.quit().await
    }
}

#[async_trait]
impl ConferenceClient for BrowserClient {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.session.navigate(url).await
    }

    async fn fill_field_by_id(&mut self, id: &str, value: &str) -> Result<()> {
        let element = self.session.find_element(&format!("#{}", id)).await?;
        self.session.clear_element(&element).await?;
        self.session.send_keys(&element, value).await
    }

    async fn click_control(&mut self, selector: &str) -> Result<()> {
        let element = self.session.find_element(selector).await?;
        self.session.click_element(&element).await
    }

    async fn start_recording(&mut self, stream_expr: &str) -> Result<()> {
        debug!("Starting recorder over {}", stream_expr);
        self.session
            .execute(START_RECORDING_JS, vec![json!(stream_expr)])
            .await?;
        Ok(())
    }

    async fn stop_recording(&mut self) -> Result<()> {
        self.session.execute_async(STOP_RECORDING_JS, vec![]).await?;
        Ok(())
    }

    async fn fetch_recording(&mut self, file_name: &str) -> Result<RecordingArtifact> {
        let value = self.session.execute_async(FETCH_RECORDING_JS, vec![]).await?;
        let encoded = value.as_str().ok_or_else(|| Error::WebDriver {
            kind: "invalid response".to_string(),
            message: "recording fetch did not return a string".to_string(),
        })?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| Error::WebDriver {
                kind: "invalid recording payload".to_string(),
                message: e.to_string(),
            })?;

        tokio::fs::create_dir_all(&self.recordings_dir).await?;
        let path = self.recordings_dir.join(file_name);
        tokio::fs::write(&path, &bytes).await?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());

        let owner = file_name.trim_end_matches(WEBM_EXT).to_string();
        RecordingArtifact::verify(owner, &path)
    }
}

/// One browser-driven client acting as presenter or viewer
pub struct Participant<C> {
    pub identity: ParticipantIdentity,
    pub role: ParticipantRole,
    client: C,
}

impl<C: ConferenceClient> Participant<C> {
    pub fn new(identity: ParticipantIdentity, role: ParticipantRole, client: C) -> Self {
        Self {
            identity,
            role,
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.identity.display_name
    }

    /// Navigate to the demo and submit the join form
    pub async fn join(&mut self, sut_url: &str) -> Result<()> {
        info!("{} joining session '{}'", self.role, self.identity.session_id);
        self.client.navigate(sut_url).await?;
        self.client
            .fill_field_by_id(USER_NAME_FIELD, &self.identity.display_name)
            .await?;
        self.client
            .fill_field_by_id(SESSION_ID_FIELD, &self.identity.session_id)
            .await?;
        self.client.click_control(JOIN_CONTROL).await
    }

    pub async fn start_recording(&mut self, stream_expr: &str) -> Result<()> {
        self.client.start_recording(stream_expr).await
    }

    pub async fn stop_recording(&mut self) -> Result<()> {
        self.client.stop_recording().await
    }

    /// Fetch the artifact named after this participant and verify it
    pub async fn fetch_recording(&mut self) -> Result<RecordingArtifact> {
        let file_name = self.identity.recording_file_name();
        self.client.fetch_recording(&file_name).await
    }

    /// Release the underlying client for teardown
    pub fn into_client(self) -> C {
        self.client
    }
}
