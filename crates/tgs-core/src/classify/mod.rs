use std::collections::{BTreeMap, HashMap};

use orion_error::ErrorOweBase;
use serde::Serialize;

use crate::error::{CoreReason, CoreResult};
use crate::gateway::LoadBalancerGateway;
use crate::model::{Tag, TaggedGroup, TargetGroup};
use crate::switchover::SwitchoverPlan;

#[cfg(test)]
mod tests;

pub const ENVIRONMENT_TAG: &str = "Environment";
pub const ELB_TYPE_TAG: &str = "Elb-Type";
pub const PATH_NAME_TAG: &str = "Path-Name";
pub const RELEASE_TAG: &str = "Release";
/// `Release` value marking the group that currently serves live traffic.
pub const RELEASE_LIVE: &str = "yes";

// ---------------------------------------------------------------------------
// GroupFilter
// ---------------------------------------------------------------------------

/// Identity dimensions a target group must carry to take part in a cutover.
///
/// Matching is a set of `tag key → expected value` rules that must all hold,
/// plus a `Release` tag that must be present. The `Release` value does not
/// gate the match; it routes the group to the source or destination bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFilter {
    pub environment: String,
    pub elb_type: String,
    pub path_name: String,
}

impl GroupFilter {
    pub fn new(
        environment: impl Into<String>,
        elb_type: impl Into<String>,
        path_name: impl Into<String>,
    ) -> Self {
        Self {
            environment: environment.into(),
            elb_type: elb_type.into(),
            path_name: path_name.into(),
        }
    }

    fn rules(&self) -> [(&'static str, &str); 3] {
        [
            (ENVIRONMENT_TAG, self.environment.as_str()),
            (ELB_TYPE_TAG, self.elb_type.as_str()),
            (PATH_NAME_TAG, self.path_name.as_str()),
        ]
    }

    /// Classify one group by its tag set.
    ///
    /// Tags are a flat bag: when a key repeats, the last value wins.
    pub fn evaluate(&self, tags: &[Tag]) -> Classification {
        let bag: HashMap<&str, &str> = tags
            .iter()
            .map(|t| (t.key.as_str(), t.value.as_str()))
            .collect();

        let rules = self.rules();
        let matched = rules
            .iter()
            .filter(|(key, want)| bag.get(key) == Some(want))
            .count();
        if matched != rules.len() {
            return Classification::NotFound;
        }
        match bag.get(RELEASE_TAG) {
            Some(&RELEASE_LIVE) => Classification::FoundRelease,
            Some(_) => Classification::FoundNonRelease,
            None => Classification::NotFound,
        }
    }
}

/// Verdict for a single target group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    NotFound,
    /// Matches the filter and is not live: a destination.
    FoundNonRelease,
    /// Matches the filter and is live: a source.
    FoundRelease,
}

// ---------------------------------------------------------------------------
// ClassificationResult
// ---------------------------------------------------------------------------

/// Buckets produced by one classification pass, in inventory order.
///
/// The classifier only reports what it found; zero or several sources are
/// rejected later by [`SwitchoverPlan::new`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassificationResult {
    sources: Vec<TargetGroup>,
    destinations: Vec<TargetGroup>,
    unmatched: usize,
}

impl ClassificationResult {
    pub fn sources(&self) -> &[TargetGroup] {
        &self.sources
    }

    pub fn destinations(&self) -> &[TargetGroup] {
        &self.destinations
    }

    pub fn unmatched(&self) -> usize {
        self.unmatched
    }

    /// Group names keyed by bucket (`source`, `destination`).
    pub fn group_names(&self) -> BTreeMap<&'static str, Vec<String>> {
        let names = |groups: &[TargetGroup]| groups.iter().map(|g| g.name.clone()).collect();
        BTreeMap::from([
            ("source", names(&self.sources)),
            ("destination", names(&self.destinations)),
        ])
    }

    /// Validate the buckets into a plan with exactly one source.
    pub fn into_plan(self) -> CoreResult<SwitchoverPlan> {
        SwitchoverPlan::new(self.sources, self.destinations)
    }
}

/// Pure classification over an already fetched inventory.
pub fn classify_inventory<I>(filter: &GroupFilter, inventory: I) -> ClassificationResult
where
    I: IntoIterator<Item = TaggedGroup>,
{
    let (mut sources, mut destinations, mut unmatched) = (Vec::new(), Vec::new(), 0);
    for TaggedGroup { group, tags } in inventory {
        match filter.evaluate(&tags) {
            Classification::FoundRelease => sources.push(group),
            Classification::FoundNonRelease => destinations.push(group),
            Classification::NotFound => unmatched += 1,
        }
    }
    ClassificationResult {
        sources,
        destinations,
        unmatched,
    }
}

/// Fetch the tagged inventory through `gateway` and classify it.
///
/// A failed inventory aborts the whole pass: a partially classified result
/// could select the wrong source.
pub async fn classify<G>(gateway: &G, filter: &GroupFilter) -> CoreResult<ClassificationResult>
where
    G: LoadBalancerGateway + ?Sized,
{
    let inventory = gateway
        .list_groups_with_tags()
        .await
        .owe(CoreReason::InventoryFetch)?;
    let total = inventory.len();
    let result = classify_inventory(filter, inventory);
    for group in &result.sources {
        log::info!("adding {} to release (source)", group.name);
    }
    for group in &result.destinations {
        log::info!("adding {} to non-release (destination)", group.name);
    }
    log::debug!(
        "classified {total} target groups: {} source, {} destination, {} unmatched",
        result.sources.len(),
        result.destinations.len(),
        result.unmatched
    );
    Ok(result)
}
