//! Group selection and blue/green switchover orchestration for load-balancer
//! target groups.
//!
//! The crate is transport agnostic: every control-plane call goes through the
//! [`gateway::LoadBalancerGateway`] trait. [`classify`] partitions the tagged
//! target-group inventory into a release (source) group and candidate
//! (destination) groups; [`switchover`] moves the source's ready members into
//! each destination.

pub mod classify;
pub mod error;
pub mod gateway;
pub mod model;
pub mod poll;
pub mod switchover;

pub use classify::{Classification, ClassificationResult, GroupFilter, classify};
pub use error::{CoreError, CoreReason, CoreResult};
pub use gateway::LoadBalancerGateway;
pub use model::{HealthState, ReadinessPolicy, Tag, TaggedGroup, TargetGroup, TargetHealth, TargetIdentity};
pub use poll::{PollPolicy, PollTimeout, poll_until};
pub use switchover::{
    DestinationOutcome, Phase, Switchover, SwitchoverFailure, SwitchoverPlan, SwitchoverReport,
};
