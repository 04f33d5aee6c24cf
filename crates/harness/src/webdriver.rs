//! W3C WebDriver protocol client
//!
//! Thin JSON-over-HTTP client for a chromedriver endpoint. Sessions are
//! created with Chrome's fake-media launch arguments so no real camera or
//! permission prompt is involved.

use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, trace};

use qoe_common::{Error, Result};

/// Chrome flag replacing the camera with a synthetic test pattern
pub const FAKE_DEVICE_ARG: &str = "--use-fake-device-for-media-stream";

/// Chrome flag auto-accepting getUserMedia permission prompts
pub const FAKE_UI_ARG: &str = "--use-fake-ui-for-media-stream";

/// W3C element identifier key in element references
const ELEMENT_KEY: &str = "element-6066-11e4-a852-e17ca95735";

/// Options for a new browser session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Chrome launch arguments
    pub browser_args: Vec<String>,

    /// Script timeout applied to the session (bounds async recording fetches)
    pub script_timeout: Duration,

    /// Run the browser headless
    pub headless: bool,
}

impl SessionOptions {
    /// Options for a participant using fake media devices
    pub fn fake_media() -> Self {
        Self {
            browser_args: vec![FAKE_DEVICE_ARG.to_string(), FAKE_UI_ARG.to_string()],
            script_timeout: Duration::from_secs(120),
            headless: true,
        }
    }

    /// Play a Y4M file as the fake camera feed
    pub fn with_fake_video_file(mut self, path: impl AsRef<str>) -> Self {
        self.browser_args
            .push(format!("--use-file-for-fake-video-capture={}", path.as_ref()));
        self
    }

    pub fn with_script_timeout(mut self, timeout: Duration) -> Self {
        self.script_timeout = timeout;
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::fake_media()
    }
}

/// Client bound to a WebDriver server endpoint
pub struct WebDriverClient {
    http: reqwest::Client,
    base_url: String,
}

impl WebDriverClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Create a new browser session
    pub async fn new_session(&self, opts: &SessionOptions) -> Result<BrowserSession> {
        let mut args = opts.browser_args.clone();
        if opts.headless {
            args.push("--headless=new".to_string());
            args.push("--no-sandbox".to_string());
        }

        let caps = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        });

        let url = format!("{}/session", self.base_url);
        debug!("Creating browser session at {}", url);

        let resp = self.http.post(&url).json(&caps).send().await?;
        let value = unwrap_value(resp).await?;

        let session_id = value["sessionId"]
            .as_str()
            .ok_or_else(|| Error::WebDriver {
                kind: "session not created".to_string(),
                message: format!("missing sessionId in {}", value),
            })?
            .to_string();

        let session = BrowserSession {
            http: self.http.clone(),
            session_url: format!("{}/session/{}", self.base_url, session_id),
            session_id,
        };

        session.set_script_timeout(opts.script_timeout).await?;
        Ok(session)
    }
}

/// Reference to a located DOM element
#[derive(Debug, Clone)]
pub struct ElementRef(String);

/// A live browser session
pub struct BrowserSession {
    http: reqwest::Client,
    session_url: String,
    pub session_id: String,
}

impl BrowserSession {
    /// Navigate to a URL
    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.post("url", json!({ "url": url })).await?;
        Ok(())
    }

    /// Locate an element by CSS selector
    pub async fn find_element(&self, selector: &str) -> Result<ElementRef> {
        let body = json!({ "using": "css selector", "value": selector });
        let value = match self.post("element", body).await {
            Ok(v) => v,
            Err(Error::WebDriver { kind, .. }) if kind == "no such element" => {
                return Err(Error::ElementNotFound {
                    selector: selector.to_string(),
                })
            }
            Err(e) => return Err(e),
        };

        let id = value[ELEMENT_KEY]
            .as_str()
            .ok_or_else(|| Error::WebDriver {
                kind: "invalid response".to_string(),
                message: format!("missing element reference in {}", value),
            })?
            .to_string();
        Ok(ElementRef(id))
    }

    /// Clear an input element
    pub async fn clear_element(&self, element: &ElementRef) -> Result<()> {
        self.post(&format!("element/{}/clear", element.0), json!({}))
            .await?;
        Ok(())
    }

    /// Type text into an element
    pub async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
        self.post(&format!("element/{}/value", element.0), json!({ "text": text }))
            .await?;
        Ok(())
    }

    /// Click an element
    pub async fn click_element(&self, element: &ElementRef) -> Result<()> {
        self.post(&format!("element/{}/click", element.0), json!({}))
            .await?;
        Ok(())
    }

    /// Execute a synchronous script in the page
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.post("execute/sync", json!({ "script": script, "args": args }))
            .await
    }

    /// Execute an asynchronous script; the page resolves it via the trailing
    /// callback argument
    pub async fn execute_async(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.post("execute/async", json!({ "script": script, "args": args }))
            .await
    }

    /// Set the session script timeout
    pub async fn set_script_timeout(&self, timeout: Duration) -> Result<()> {
        self.post("timeouts", json!({ "script": timeout.as_millis() as u64 }))
            .await?;
        Ok(())
    }

    /// End the session and close the browser
    pub async fn quit(self) -> Result<()> {
        let resp = self.http.delete(&self.session_url).send().await?;
        unwrap_value(resp).await?;
        Ok(())
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let url = format!("{}/{}", self.session_url, path);
        trace!("WebDriver command: POST {} {}", url, body);

        let resp = self.http.post(&url).json(&body).send().await?;
        unwrap_value(resp).await
    }
}

/// Unwrap the W3C `{"value": ...}` envelope, surfacing protocol errors
async fn unwrap_value(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let body: Value = resp.json().await?;
    trace!("WebDriver response ({}): {}", status, body);

    let value = &body["value"];
    if !status.is_success() || value["error"].is_string() {
        return Err(Error::WebDriver {
            kind: value["error"].as_str().unwrap_or("unknown").to_string(),
            message: value["message"].as_str().unwrap_or("").to_string(),
        });
    }

    Ok(value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_media_options() {
        let opts = SessionOptions::fake_media();
        assert!(opts.browser_args.contains(&FAKE_DEVICE_ARG.to_string()));
        assert!(opts.browser_args.contains(&FAKE_UI_ARG.to_string()));
        assert!(opts.headless);
    }

    #[test]
    fn test_fake_video_file_arg() {
        let opts = SessionOptions::fake_media().with_fake_video_file("/media/test.y4m");
        assert!(opts
            .browser_args
            .iter()
            .any(|a| a == "--use-file-for-fake-video-capture=/media/test.y4m"));
    }
}
