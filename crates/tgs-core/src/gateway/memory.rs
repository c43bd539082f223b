use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;

use anyhow::{Result, bail};
use async_trait::async_trait;

use super::LoadBalancerGateway;
use crate::model::{HealthState, Tag, TaggedGroup, TargetGroup, TargetHealth, TargetIdentity};

// ---------------------------------------------------------------------------
// Journal types
// ---------------------------------------------------------------------------

/// One call observed by [`MemoryGateway`], in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ListGroups,
    ListHealth {
        group: String,
        filtered: bool,
    },
    Register {
        group: String,
        targets: Vec<TargetIdentity>,
    },
    Deregister {
        group: String,
        targets: Vec<TargetIdentity>,
    },
}

impl GatewayCall {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Register { .. } | Self::Deregister { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    ListGroups,
    ListHealth,
    Register,
    Deregister,
}

// ---------------------------------------------------------------------------
// MemoryGateway
// ---------------------------------------------------------------------------

/// Deterministic in-process control plane.
///
/// Members carry a health script: each health listing that reports a member
/// consumes the head of its script, and the last state sticks. Freshly
/// registered members spend `warmup` listings in `initial` before settling.
/// Filtered listings report unregistered identities as `unused`, the way
/// ELBv2 reports `Target.NotRegistered`.
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

struct MemoryState {
    groups: Vec<TaggedGroup>,
    members: HashMap<String, Vec<Member>>,
    warmup: u32,
    settled: HealthState,
    failures: Vec<(CallKind, Option<String>)>,
    journal: Vec<GatewayCall>,
}

struct Member {
    target: TargetIdentity,
    script: VecDeque<HealthState>,
}

impl Member {
    fn new(target: TargetIdentity, script: impl IntoIterator<Item = HealthState>) -> Self {
        let mut script: VecDeque<HealthState> = script.into_iter().collect();
        if script.is_empty() {
            script.push_back(HealthState::Healthy);
        }
        Self { target, script }
    }

    fn observe(&mut self) -> HealthState {
        let state = self.script[0];
        if self.script.len() > 1 {
            self.script.pop_front();
        }
        state
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                groups: Vec::new(),
                members: HashMap::new(),
                warmup: 0,
                settled: HealthState::Healthy,
                failures: Vec::new(),
                journal: Vec::new(),
            }),
        }
    }

    /// ARN assigned to a group registered under `name`.
    pub fn arn_for(name: &str) -> String {
        format!("arn:aws:elasticloadbalancing:us-east-1:000000000000:targetgroup/{name}/0")
    }

    /// Add a target group with the given `(key, value)` tags.
    pub fn with_group(self, name: &str, tags: &[(&str, &str)]) -> Self {
        {
            let mut st = self.lock();
            let group = TargetGroup::new(Self::arn_for(name), name);
            st.members.entry(group.arn.clone()).or_default();
            st.groups.push(TaggedGroup {
                group,
                tags: tags.iter().map(|(k, v)| Tag::new(*k, *v)).collect(),
            });
        }
        self
    }

    /// Seed a member whose health stays at `state`.
    pub fn with_member(self, group: &str, target: TargetIdentity, state: HealthState) -> Self {
        self.with_scripted_member(group, target, &[state])
    }

    /// Seed a member that reports `script` on successive health listings.
    pub fn with_scripted_member(
        self,
        group: &str,
        target: TargetIdentity,
        script: &[HealthState],
    ) -> Self {
        {
            let mut st = self.lock();
            let members = st.members.entry(Self::arn_for(group)).or_default();
            members.retain(|m| m.target != target);
            members.push(Member::new(target, script.iter().copied()));
        }
        self
    }

    /// Newly registered members report `initial` for `polls` listings, then
    /// `settled` from then on.
    pub fn with_warmup(self, polls: u32, settled: HealthState) -> Self {
        {
            let mut st = self.lock();
            st.warmup = polls;
            st.settled = settled;
        }
        self
    }

    /// Fail every call of `kind`, optionally only against the named group.
    pub fn fail_on(self, kind: CallKind, group: Option<&str>) -> Self {
        self.lock()
            .failures
            .push((kind, group.map(Self::arn_for)));
        self
    }

    pub fn group(&self, name: &str) -> Option<TargetGroup> {
        self.lock()
            .groups
            .iter()
            .find(|g| g.group.name == name)
            .map(|g| g.group.clone())
    }

    pub fn members(&self, group: &str) -> BTreeSet<TargetIdentity> {
        self.lock()
            .members
            .get(&Self::arn_for(group))
            .map(|ms| ms.iter().map(|m| m.target.clone()).collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().journal.clone()
    }

    /// Number of filtered health listings issued against `group`.
    pub fn health_polls(&self, group: &str) -> usize {
        self.lock()
            .journal
            .iter()
            .filter(|c| {
                matches!(c, GatewayCall::ListHealth { group: g, filtered: true } if g == group)
            })
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory gateway lock poisoned")
    }
}

impl MemoryState {
    fn name_of(&self, arn: &str) -> String {
        self.groups
            .iter()
            .find(|g| g.group.arn == arn)
            .map(|g| g.group.name.clone())
            .unwrap_or_else(|| arn.to_string())
    }

    fn check(&self, kind: CallKind, group: Option<&TargetGroup>) -> Result<()> {
        let hit = self.failures.iter().any(|(k, g)| {
            *k == kind
                && match (g, group) {
                    (None, _) => true,
                    (Some(arn), Some(group)) => *arn == group.arn,
                    (Some(_), None) => false,
                }
        });
        if hit {
            bail!("injected {kind:?} failure");
        }
        Ok(())
    }

    fn members_mut(&mut self, group: &TargetGroup) -> Result<&mut Vec<Member>> {
        match self.members.get_mut(&group.arn) {
            Some(members) => Ok(members),
            None => bail!("target group {} not found", group.arn),
        }
    }
}

#[async_trait]
impl LoadBalancerGateway for MemoryGateway {
    async fn list_groups_with_tags(&self) -> Result<Vec<TaggedGroup>> {
        let mut st = self.lock();
        st.journal.push(GatewayCall::ListGroups);
        st.check(CallKind::ListGroups, None)?;
        Ok(st.groups.clone())
    }

    async fn list_health(
        &self,
        group: &TargetGroup,
        targets: Option<&[TargetIdentity]>,
    ) -> Result<Vec<TargetHealth>> {
        let mut st = self.lock();
        let name = st.name_of(&group.arn);
        st.journal.push(GatewayCall::ListHealth {
            group: name,
            filtered: targets.is_some(),
        });
        st.check(CallKind::ListHealth, Some(group))?;
        let members = st.members_mut(group)?;
        let report = match targets {
            None => members
                .iter_mut()
                .map(|m| TargetHealth::new(m.target.clone(), m.observe()))
                .collect(),
            Some(wanted) => wanted
                .iter()
                .map(|t| match members.iter_mut().find(|m| m.target == *t) {
                    Some(m) => TargetHealth::new(t.clone(), m.observe()),
                    None => TargetHealth::new(t.clone(), HealthState::Unused),
                })
                .collect(),
        };
        Ok(report)
    }

    async fn register(&self, group: &TargetGroup, targets: &[TargetIdentity]) -> Result<()> {
        let mut st = self.lock();
        let name = st.name_of(&group.arn);
        st.journal.push(GatewayCall::Register {
            group: name,
            targets: targets.to_vec(),
        });
        st.check(CallKind::Register, Some(group))?;
        let mut script = vec![HealthState::Initial; st.warmup as usize];
        script.push(st.settled);
        let members = st.members_mut(group)?;
        for target in targets {
            if !members.iter().any(|m| m.target == *target) {
                members.push(Member::new(target.clone(), script.iter().copied()));
            }
        }
        Ok(())
    }

    async fn deregister(&self, group: &TargetGroup, targets: &[TargetIdentity]) -> Result<()> {
        let mut st = self.lock();
        let name = st.name_of(&group.arn);
        st.journal.push(GatewayCall::Deregister {
            group: name,
            targets: targets.to_vec(),
        });
        st.check(CallKind::Deregister, Some(group))?;
        let members = st.members_mut(group)?;
        members.retain(|m| !targets.contains(&m.target));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TargetIdentity {
        TargetIdentity::new(s)
    }

    #[tokio::test]
    async fn register_twice_is_idempotent() {
        let gw = MemoryGateway::new().with_group("blue", &[]);
        let group = gw.group("blue").unwrap();
        let targets = vec![id("i-1"), id("i-2")];

        gw.register(&group, &targets).await.unwrap();
        let once = gw.members("blue");
        gw.register(&group, &targets).await.unwrap();

        assert_eq!(gw.members("blue"), once);
        assert_eq!(once.len(), 2);
    }

    #[tokio::test]
    async fn warmup_reports_initial_then_settles() {
        let gw = MemoryGateway::new()
            .with_group("blue", &[])
            .with_warmup(2, HealthState::Unused);
        let group = gw.group("blue").unwrap();
        gw.register(&group, &[id("i-1")]).await.unwrap();

        let mut seen = Vec::new();
        for _ in 0..4 {
            let health = gw.list_health(&group, None).await.unwrap();
            seen.push(health[0].state);
        }
        assert_eq!(
            seen,
            vec![
                HealthState::Initial,
                HealthState::Initial,
                HealthState::Unused,
                HealthState::Unused
            ]
        );
    }

    #[tokio::test]
    async fn filtered_listing_reports_unregistered_as_unused() {
        let gw = MemoryGateway::new()
            .with_group("blue", &[])
            .with_member("blue", id("i-1"), HealthState::Healthy);
        let group = gw.group("blue").unwrap();

        let health = gw
            .list_health(&group, Some(&[id("i-1"), id("i-9")]))
            .await
            .unwrap();
        assert_eq!(health[0].state, HealthState::Healthy);
        assert_eq!(health[1].state, HealthState::Unused);
    }

    #[tokio::test]
    async fn injected_failure_is_scoped_to_group() {
        let gw = MemoryGateway::new()
            .with_group("blue", &[])
            .with_group("green", &[])
            .fail_on(CallKind::Register, Some("green"));
        let blue = gw.group("blue").unwrap();
        let green = gw.group("green").unwrap();

        assert!(gw.register(&blue, &[id("i-1")]).await.is_ok());
        assert!(gw.register(&green, &[id("i-1")]).await.is_err());
        assert!(gw.members("green").is_empty());
    }
}
