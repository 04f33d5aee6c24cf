//! QoE Meter Scenario Harness
//!
//! This crate provides a Rust-controlled E2E harness that:
//! - Spawns a WebDriver server (chromedriver) as a subprocess
//! - Drives two browser participants through a conference join form
//! - Records each participant's media stream in-page
//! - Injects packet loss into the presenter's backing container via `tc`
//! - Verifies that both recordings exist on disk afterwards
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Scenario Runner (Rust)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  run_scenario(spec, presenter, viewer, injector)            │
//! │    ├── Participant::join()        (WebDriver / join form)   │
//! │    ├── start_recording()          (in-page MediaRecorder)   │
//! │    ├── FaultInjector::apply()     (tc netem via exec)       │
//! │    ├── HoldTimer::wait()          (cancellable, 30s)        │
//! │    ├── FaultInjector::clear()                               │
//! │    ├── stop_recording()                                     │
//! │    └── fetch_recording() -> RecordingArtifact               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioSpec (YAML)                                        │
//! │    ├── name, sut_url, session_id                            │
//! │    ├── presenter / viewer: { display_name, container }      │
//! │    └── loss_percent, interface, hold_secs                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod context;
pub mod docker;
pub mod driver;
pub mod fault;
pub mod hold;
pub mod participant;
pub mod runner;
pub mod scenario;
pub mod webdriver;

pub use qoe_common::{Error, Result};
pub use runner::{run_scenario, ScenarioReport, SuiteReport};
pub use scenario::{ParticipantSpec, ScenarioSpec, StreamDirection};
