//! Per-run session context
//!
//! An explicit object mapping participant display names to the containers
//! backing their browsers. Built before a scenario runs and dropped after;
//! there is no ambient global registry.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::docker::ContainerExec;
use crate::scenario::ScenarioSpec;

/// Lookup table from participant display name to container id
#[derive(Debug, Default)]
pub struct SessionContext {
    containers: HashMap<String, String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, participant: impl Into<String>, container: impl Into<String>) {
        self.containers.insert(participant.into(), container.into());
    }

    /// Container handle for a participant, if one was resolved
    pub fn container_for(&self, participant: &str) -> Option<&str> {
        self.containers.get(participant).map(String::as_str)
    }

    /// Resolve container handles for every participant in the spec
    ///
    /// Resolution is best-effort: a miss or a runtime error leaves the
    /// participant unmapped and the scenario proceeds without fault
    /// injection for it.
    pub async fn resolve(spec: &ScenarioSpec, executor: &impl ContainerExec) -> Self {
        let mut ctx = Self::new();

        for p in [&spec.presenter, &spec.viewer] {
            let Some(filter) = &p.container else {
                continue;
            };

            match executor.resolve_container(filter).await {
                Ok(Some(id)) => {
                    debug!("Resolved container {} for {}", id, p.display_name);
                    ctx.register(&p.display_name, id);
                }
                Ok(None) => {
                    warn!("No container matched '{}' for {}", filter, p.display_name);
                }
                Err(e) => {
                    warn!(
                        "Container resolution failed for {} ('{}'): {}",
                        p.display_name, filter, e
                    );
                }
            }
        }

        ctx
    }
}
