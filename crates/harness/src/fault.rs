//! Packet-loss fault injection
//!
//! Applies and clears a netem loss rule on a container's network interface.
//! Injection is best-effort: a participant without a resolved container
//! handle is skipped with a warning and the scenario continues.

use tracing::{debug, warn};

use qoe_common::{ImpairmentRule, Result};

use crate::context::SessionContext;
use crate::docker::ContainerExec;

/// Applies impairment rules through a container command executor
pub struct FaultInjector<'a, E: ContainerExec> {
    executor: &'a E,
    context: &'a SessionContext,
}

impl<'a, E: ContainerExec> FaultInjector<'a, E> {
    pub fn new(executor: &'a E, context: &'a SessionContext) -> Self {
        Self { executor, context }
    }

    /// Apply a rule on the participant's container interface
    ///
    /// Returns `Ok(false)` when no container handle is resolvable for the
    /// participant; a command-execution failure propagates.
    pub async fn apply(&self, participant: &str, rule: &ImpairmentRule) -> Result<bool> {
        let Some(container) = self.context.container_for(participant) else {
            warn!(
                "No container handle for {}; skipping fault injection",
                participant
            );
            return Ok(false);
        };

        debug!(
            "Setting {}% loss on {} of container {}",
            rule.loss_percent, rule.interface, container
        );

        let output = self.executor.exec(container, &rule.tc_args()).await?;
        if !output.trim().is_empty() {
            debug!("tc output: {}", output.trim());
        }

        Ok(true)
    }

    /// Reset the interface to 0% loss
    pub async fn clear(&self, participant: &str, interface: &str) -> Result<bool> {
        self.apply(participant, &ImpairmentRule::cleared(interface))
            .await
    }
}
