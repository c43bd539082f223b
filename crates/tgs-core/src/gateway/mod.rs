pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{TaggedGroup, TargetGroup, TargetHealth, TargetIdentity};

/// Capability handle onto a load-balancing control plane.
///
/// Implementations own transport, authentication, pagination and wire-level
/// retries. Every call is one blocking round trip from the engine's point of
/// view; failures are reported as-is and classified by the caller.
#[async_trait]
pub trait LoadBalancerGateway: Send + Sync {
    /// Every target group visible to the caller, each with its tag set.
    ///
    /// Must fail as a whole if the tags of any single group cannot be fetched.
    async fn list_groups_with_tags(&self) -> Result<Vec<TaggedGroup>>;

    /// Health of the members of `group`. With `targets` set, only those
    /// identities are reported.
    async fn list_health(
        &self,
        group: &TargetGroup,
        targets: Option<&[TargetIdentity]>,
    ) -> Result<Vec<TargetHealth>>;

    /// Add `targets` to `group`. Re-registering a present member is a no-op.
    async fn register(&self, group: &TargetGroup, targets: &[TargetIdentity]) -> Result<()>;

    /// Remove `targets` from `group`.
    async fn deregister(&self, group: &TargetGroup, targets: &[TargetIdentity]) -> Result<()>;
}
