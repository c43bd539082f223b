use std::fmt;
use std::str::FromStr;

use serde::Serialize;

// ---------------------------------------------------------------------------
// TargetGroup / Tag
// ---------------------------------------------------------------------------

/// A routable pool of backends, owned by the load-balancing control plane.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TargetGroup {
    /// Opaque control-plane identifier (an ARN for ELBv2).
    pub arn: String,
    pub name: String,
}

impl TargetGroup {
    pub fn new(arn: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            arn: arn.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TargetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A target group paired with the tag set fetched for it during one
/// inventory pass.
#[derive(Debug, Clone)]
pub struct TaggedGroup {
    pub group: TargetGroup,
    pub tags: Vec<Tag>,
}

// ---------------------------------------------------------------------------
// TargetIdentity
// ---------------------------------------------------------------------------

/// One member of a target group: an instance ID (or IP) plus an optional
/// port override. Two identities are the same member iff both fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TargetIdentity {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
}

impl TargetIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            port: None,
        }
    }

    pub fn with_port(mut self, port: i32) -> Self {
        self.port = Some(port);
        self
    }
}

impl fmt::Display for TargetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{port}", self.id),
            None => f.write_str(&self.id),
        }
    }
}

// ---------------------------------------------------------------------------
// HealthState
// ---------------------------------------------------------------------------

/// Routability verdict the control plane reports for a target in one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
    Initial,
    Draining,
    Unused,
    Unavailable,
}

impl HealthState {
    pub const ALL: [HealthState; 6] = [
        Self::Healthy,
        Self::Unhealthy,
        Self::Initial,
        Self::Draining,
        Self::Unused,
        Self::Unavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
            Self::Initial => "initial",
            Self::Draining => "draining",
            Self::Unused => "unused",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("unknown health state {s:?}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetHealth {
    pub target: TargetIdentity,
    pub state: HealthState,
}

impl TargetHealth {
    pub fn new(target: TargetIdentity, state: HealthState) -> Self {
        Self { target, state }
    }
}

// ---------------------------------------------------------------------------
// ReadinessPolicy
// ---------------------------------------------------------------------------

/// Which health states count as "ready to take traffic".
///
/// The default accepts `healthy` and `unused`: a freshly registered target
/// that has not been routed any traffic yet reports `unused`. Operators may
/// narrow this to `healthy` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessPolicy {
    ready: Vec<HealthState>,
}

impl ReadinessPolicy {
    pub fn new(ready: impl IntoIterator<Item = HealthState>) -> Self {
        let mut states = Vec::new();
        for state in ready {
            if !states.contains(&state) {
                states.push(state);
            }
        }
        Self { ready: states }
    }

    pub fn is_ready(&self, state: HealthState) -> bool {
        self.ready.contains(&state)
    }

    pub fn states(&self) -> &[HealthState] {
        &self.ready
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self::new([HealthState::Healthy, HealthState::Unused])
    }
}
