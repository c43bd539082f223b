mod bootstrap;
mod signal;

use std::sync::Arc;

use orion_error::op_context;
use orion_error::prelude::*;
use tokio_util::sync::CancellationToken;

use tgs_config::CutoverConfig;
use tgs_core::{ClassificationResult, LoadBalancerGateway, Switchover, SwitchoverReport};

use crate::error::{RuntimeReason, RuntimeResult};
use crate::gateway::ElbGateway;

pub use bootstrap::CutoverSettings;
pub use signal::wait_for_signal;

// ---------------------------------------------------------------------------
// Cutover: the top-level run handle
// ---------------------------------------------------------------------------

/// One configured cutover against one control plane.
///
/// A run is classify, plan, then switchover. Nothing is retried at this
/// level: a failed or interrupted run is finished by running it again.
pub struct Cutover {
    gateway: Arc<dyn LoadBalancerGateway>,
    settings: CutoverSettings,
}

impl Cutover {
    /// Resolve settings from `config` and connect to ELBv2.
    #[tracing::instrument(name = "cutover.bootstrap", skip_all)]
    pub async fn bootstrap(config: &CutoverConfig) -> RuntimeResult<Self> {
        let settings = CutoverSettings::from_config(config)?;
        let gateway = ElbGateway::from_config(&config.aws).await;
        tgs_info!(
            sys,
            region = config.aws.region.as_deref().unwrap_or("<default chain>"),
            "cutover bootstrap complete"
        );
        Ok(Self::with_gateway(Arc::new(gateway), settings))
    }

    pub fn with_gateway(gateway: Arc<dyn LoadBalancerGateway>, settings: CutoverSettings) -> Self {
        Self { gateway, settings }
    }

    pub fn settings(&self) -> &CutoverSettings {
        &self.settings
    }

    /// Classify the inventory without changing anything.
    #[tracing::instrument(name = "cutover.classify", skip_all)]
    pub async fn classify(&self) -> RuntimeResult<ClassificationResult> {
        let result = tgs_core::classify(self.gateway.as_ref(), &self.settings.filter)
            .await
            .err_conv()?;
        tgs_info!(
            plan,
            sources = result.sources().len(),
            destinations = result.destinations().len(),
            unmatched = result.unmatched(),
            "inventory classified"
        );
        Ok(result)
    }

    /// Classify, validate the plan, then switch every destination over.
    #[tracing::instrument(name = "cutover.run", skip_all)]
    pub async fn run(&self) -> RuntimeResult<SwitchoverReport> {
        let mut op = op_context!("cutover").with_auto_log();
        op.record("environment", self.settings.filter.environment.as_str());
        op.record("elb_type", self.settings.filter.elb_type.as_str());
        op.record("path_name", self.settings.filter.path_name.as_str());

        let plan = self.classify().await?.into_plan().err_conv()?;
        let destination_names: Vec<&str> = plan.destinations().iter().map(|g| g.name.as_str()).collect();
        tgs_info!(
            plan,
            source = %plan.source(),
            destinations = ?destination_names,
            remove_source = self.settings.remove_source,
            "switchover plan ready"
        );

        let switchover = Switchover::new(self.gateway.as_ref())
            .with_poll_policy(self.settings.poll)
            .with_readiness(self.settings.readiness.clone());

        match switchover.run(plan, self.settings.remove_source).await {
            Ok(report) => {
                tgs_info!(
                    plan,
                    source = %report.source,
                    moved = report.snapshot.len(),
                    destinations = report.destinations.len(),
                    source_retired = report.source_retired,
                    "switchover complete"
                );
                op.mark_suc();
                Ok(report)
            }
            Err(failure) => {
                let untouched: Vec<&str> = failure.untouched.iter().map(|g| g.name.as_str()).collect();
                tgs_error!(
                    plan,
                    phase = %failure.phase,
                    destination = failure.destination.as_ref().map(|g| g.name.as_str()).unwrap_or("-"),
                    completed = ?failure.completed_names(),
                    untouched = ?untouched,
                    "switchover stopped, completed destinations stay switched"
                );
                let reason = failure.reason().clone();
                Err(StructError::from(RuntimeReason::Core(reason)).with_detail(failure.to_string()))
            }
        }
    }

    /// [`run`](Self::run), abandoned as soon as `cancel` fires.
    ///
    /// Dropping the run future stops further polls and mutations, but calls
    /// already sent are not undone.
    pub async fn run_until_cancelled(
        &self,
        cancel: CancellationToken,
    ) -> RuntimeResult<SwitchoverReport> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tgs_error!(sys, "cutover interrupted, groups may be partially switched; re-run to finish");
                Err(StructError::from(RuntimeReason::Interrupted)
                    .with_detail("cancelled before the switchover finished".to_string()))
            }
            result = self.run() => result,
        }
    }
}
