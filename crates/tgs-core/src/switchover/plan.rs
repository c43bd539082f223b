use std::collections::BTreeSet;

use orion_error::StructError;

use crate::error::{CoreReason, CoreResult};
use crate::model::{TargetGroup, TargetIdentity};

// ---------------------------------------------------------------------------
// SwitchoverPlan
// ---------------------------------------------------------------------------

/// Validated input of one cutover: exactly one source and a non-empty,
/// ordered list of distinct destinations.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchoverPlan {
    source: TargetGroup,
    destinations: Vec<TargetGroup>,
}

impl SwitchoverPlan {
    /// Build a plan from classifier buckets. Any shape other than one source
    /// plus at least one destination is a configuration error.
    pub fn new(sources: Vec<TargetGroup>, destinations: Vec<TargetGroup>) -> CoreResult<Self> {
        let mut sources = sources.into_iter();
        let source = match (sources.next(), sources.next()) {
            (Some(source), None) => source,
            (None, _) => {
                return Err(StructError::from(CoreReason::Configuration)
                    .with_detail("no release (source) target group matched the filter".to_string()));
            }
            (Some(first), Some(second)) => {
                let names: Vec<String> = [first, second]
                    .into_iter()
                    .chain(sources)
                    .map(|g| g.name)
                    .collect();
                return Err(StructError::from(CoreReason::Configuration).with_detail(format!(
                    "{} release (source) target groups matched, exactly one is required: {}",
                    names.len(),
                    names.join(", ")
                )));
            }
        };
        if destinations.is_empty() {
            return Err(StructError::from(CoreReason::Configuration)
                .with_detail("no non-release (destination) target group matched the filter".to_string()));
        }
        let mut seen = BTreeSet::new();
        for dest in &destinations {
            if dest.arn == source.arn {
                return Err(StructError::from(CoreReason::Configuration).with_detail(format!(
                    "target group {} is both source and destination",
                    dest.name
                )));
            }
            if !seen.insert(dest.arn.as_str()) {
                return Err(StructError::from(CoreReason::Configuration)
                    .with_detail(format!("destination {} listed twice", dest.name)));
            }
        }
        Ok(Self {
            source,
            destinations,
        })
    }

    pub fn source(&self) -> &TargetGroup {
        &self.source
    }

    /// Destinations in processing order.
    pub fn destinations(&self) -> &[TargetGroup] {
        &self.destinations
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Frozen set of ready source identities, sorted and de-duplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Snapshot {
    targets: Vec<TargetIdentity>,
}

impl Snapshot {
    pub(crate) fn new(targets: impl IntoIterator<Item = TargetIdentity>) -> Self {
        let set: BTreeSet<TargetIdentity> = targets.into_iter().collect();
        Self {
            targets: set.into_iter().collect(),
        }
    }

    pub(crate) fn targets(&self) -> &[TargetIdentity] {
        &self.targets
    }

    pub(crate) fn contains(&self, target: &TargetIdentity) -> bool {
        self.targets.binary_search(target).is_ok()
    }

    pub(crate) fn len(&self) -> usize {
        self.targets.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
