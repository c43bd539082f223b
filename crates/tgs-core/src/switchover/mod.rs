//! Blue/green switchover engine.
//!
//! One run walks `SNAPSHOTTING → (REGISTERING → CONVERGING → PRUNING)ⁿ →
//! CLEANUP?` sequentially. Each destination is registered, converged and
//! pruned before the next one is touched, so a failure on destination `k`
//! leaves destinations `1..k` already cut over and `k+1..` untouched. The
//! operation is knowingly non-atomic across groups and nothing is rolled
//! back; re-running a failed plan is safe because registration is
//! idempotent and pruning recomputes its diff on every run.
//!
//! Plan validation (the INIT state) happens in [`SwitchoverPlan::new`].

mod plan;
mod report;


use std::collections::BTreeSet;
use std::fmt;

use orion_error::StructError;

use crate::error::{CoreError, CoreReason};
use crate::gateway::LoadBalancerGateway;
use crate::model::{ReadinessPolicy, TargetGroup, TargetIdentity};
use crate::poll::{PollPolicy, poll_until};

pub use plan::SwitchoverPlan;
pub use report::{DestinationOutcome, SwitchoverFailure, SwitchoverReport};

use plan::Snapshot;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Snapshotting,
    Registering,
    Converging,
    Pruning,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Snapshotting => "snapshotting",
            Self::Registering => "registering",
            Self::Converging => "converging",
            Self::Pruning => "pruning",
            Self::Cleanup => "cleaning up",
        })
    }
}

/// Failure of a single step, before it is placed in run context.
struct StepError {
    phase: Phase,
    reason: CoreReason,
    error: CoreError,
}

impl StepError {
    fn new(phase: Phase, reason: CoreReason, detail: String) -> Self {
        Self {
            phase,
            error: StructError::from(reason.clone()).with_detail(detail),
            reason,
        }
    }

    fn gateway(phase: Phase, reason: CoreReason, what: String, err: anyhow::Error) -> Self {
        Self::new(phase, reason, format!("{what}: {err:#}"))
    }

    fn into_failure(
        self,
        destination: Option<TargetGroup>,
        completed: Vec<DestinationOutcome>,
        untouched: Vec<TargetGroup>,
    ) -> SwitchoverFailure {
        SwitchoverFailure::new(
            self.phase,
            self.reason,
            self.error,
            destination,
            completed,
            untouched,
        )
    }
}

// ---------------------------------------------------------------------------
// Switchover
// ---------------------------------------------------------------------------

/// Drives one or more cutovers through a [`LoadBalancerGateway`].
pub struct Switchover<'g, G: ?Sized> {
    gateway: &'g G,
    poll: PollPolicy,
    readiness: ReadinessPolicy,
}

impl<'g, G> Switchover<'g, G>
where
    G: LoadBalancerGateway + ?Sized,
{
    pub fn new(gateway: &'g G) -> Self {
        Self {
            gateway,
            poll: PollPolicy::default(),
            readiness: ReadinessPolicy::default(),
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_readiness(mut self, readiness: ReadinessPolicy) -> Self {
        self.readiness = readiness;
        self
    }

    /// Copy the source's ready members into every destination, then
    /// optionally retire them from the source.
    ///
    /// The first failing step ends the run; see [`SwitchoverFailure`] for
    /// what has already been changed at that point.
    pub async fn run(
        &self,
        plan: SwitchoverPlan,
        remove_source: bool,
    ) -> Result<SwitchoverReport, SwitchoverFailure> {
        let destinations = plan.destinations();

        let snapshot = match self.snapshot(plan.source()).await {
            Ok(snapshot) => snapshot,
            Err(step) => return Err(step.into_failure(None, Vec::new(), destinations.to_vec())),
        };

        let mut completed = Vec::with_capacity(destinations.len());
        for (idx, destination) in destinations.iter().enumerate() {
            log::info!(
                "cutting over {} ({}/{})",
                destination.name,
                idx + 1,
                destinations.len()
            );
            match self.cut_over(destination, &snapshot).await {
                Ok(outcome) => completed.push(outcome),
                Err(step) => {
                    return Err(step.into_failure(
                        Some(destination.clone()),
                        completed,
                        destinations[idx + 1..].to_vec(),
                    ));
                }
            }
        }

        if remove_source {
            if let Err(step) = self.retire_source(plan.source(), &snapshot).await {
                return Err(step.into_failure(None, completed, Vec::new()));
            }
        }

        Ok(SwitchoverReport {
            source: plan.source().clone(),
            snapshot: snapshot.targets().to_vec(),
            destinations: completed,
            source_retired: remove_source,
        })
    }

    async fn snapshot(&self, source: &TargetGroup) -> Result<Snapshot, StepError> {
        let health = self.gateway.list_health(source, None).await.map_err(|e| {
            StepError::gateway(
                Phase::Snapshotting,
                CoreReason::InventoryFetch,
                format!("listing members of source {}", source.name),
                e,
            )
        })?;
        let listed = health.len();
        for h in &health {
            log::debug!("source {} member {} is {}", source.name, h.target, h.state);
        }
        let snapshot = Snapshot::new(
            health
                .into_iter()
                .filter(|h| self.readiness.is_ready(h.state))
                .map(|h| h.target),
        );
        if snapshot.is_empty() {
            return Err(StepError::new(
                Phase::Snapshotting,
                CoreReason::NoSourceInstances,
                format!(
                    "source {} has no ready members ({listed} listed)",
                    source.name
                ),
            ));
        }
        log::info!(
            "snapshot of {}: {} of {listed} members ready",
            source.name,
            snapshot.len()
        );
        Ok(snapshot)
    }

    async fn cut_over(
        &self,
        destination: &TargetGroup,
        snapshot: &Snapshot,
    ) -> Result<DestinationOutcome, StepError> {
        self.register(destination, snapshot).await?;
        let polls = self.converge(destination, snapshot).await?;
        let pruned = self.prune(destination, snapshot).await?;
        Ok(DestinationOutcome {
            group: destination.clone(),
            registered: snapshot.len(),
            polls,
            pruned,
        })
    }

    async fn register(&self, destination: &TargetGroup, snapshot: &Snapshot) -> Result<(), StepError> {
        self.gateway
            .register(destination, snapshot.targets())
            .await
            .map_err(|e| {
                StepError::gateway(
                    Phase::Registering,
                    CoreReason::PartialMutation,
                    format!("registering {} targets in {}", snapshot.len(), destination.name),
                    e,
                )
            })?;
        log::info!("registered {} targets in {}", snapshot.len(), destination.name);
        Ok(())
    }

    async fn converge(&self, destination: &TargetGroup, snapshot: &Snapshot) -> Result<u32, StepError> {
        let polls = poll_until(&self.poll, |attempt| {
            self.all_ready(destination, snapshot, attempt)
        })
        .await
        .map_err(|timeout| {
            StepError::new(
                Phase::Converging,
                CoreReason::ConvergenceTimeout,
                format!(
                    "{} not ready after {} polls {:?} apart",
                    destination.name, timeout.attempts, self.poll.interval
                ),
            )
        })?;
        log::info!("{} converged after {polls} poll(s)", destination.name);
        Ok(polls)
    }

    /// One convergence probe. A failed health fetch counts as not ready.
    async fn all_ready(&self, destination: &TargetGroup, snapshot: &Snapshot, attempt: u32) -> bool {
        let health = match self
            .gateway
            .list_health(destination, Some(snapshot.targets()))
            .await
        {
            Ok(health) => health,
            Err(e) => {
                log::warn!(
                    "health poll {attempt}/{} of {} failed: {e:#}",
                    self.poll.max_attempts,
                    destination.name
                );
                return false;
            }
        };
        let ready: BTreeSet<&TargetIdentity> = health
            .iter()
            .filter(|h| self.readiness.is_ready(h.state) && snapshot.contains(&h.target))
            .map(|h| &h.target)
            .collect();
        if ready.len() == snapshot.len() {
            return true;
        }
        log::info!(
            "still waiting for health checks on {}: {}/{} ready (poll {attempt}/{})",
            destination.name,
            ready.len(),
            snapshot.len(),
            self.poll.max_attempts
        );
        false
    }

    async fn prune(
        &self,
        destination: &TargetGroup,
        snapshot: &Snapshot,
    ) -> Result<Vec<TargetIdentity>, StepError> {
        let current = self
            .gateway
            .list_health(destination, None)
            .await
            .map_err(|e| {
                StepError::gateway(
                    Phase::Pruning,
                    CoreReason::InventoryFetch,
                    format!("listing members of {}", destination.name),
                    e,
                )
            })?;
        let stale: Vec<TargetIdentity> = current
            .into_iter()
            .map(|h| h.target)
            .filter(|t| !snapshot.contains(t))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        log::info!("removing {} stale targets from {}", stale.len(), destination.name);
        if !stale.is_empty() {
            self.gateway
                .deregister(destination, &stale)
                .await
                .map_err(|e| {
                    StepError::gateway(
                        Phase::Pruning,
                        CoreReason::PartialMutation,
                        format!("deregistering {} stale targets from {}", stale.len(), destination.name),
                        e,
                    )
                })?;
        }
        Ok(stale)
    }

    /// Fire-and-forget: no convergence wait after deregistering.
    async fn retire_source(&self, source: &TargetGroup, snapshot: &Snapshot) -> Result<(), StepError> {
        self.gateway
            .deregister(source, snapshot.targets())
            .await
            .map_err(|e| {
                StepError::gateway(
                    Phase::Cleanup,
                    CoreReason::PartialMutation,
                    format!("deregistering {} targets from source {}", snapshot.len(), source.name),
                    e,
                )
            })?;
        log::info!("retired {} targets from source {}", snapshot.len(), source.name);
        Ok(())
    }
}
