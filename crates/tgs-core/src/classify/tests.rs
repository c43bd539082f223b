use super::*;

use crate::gateway::memory::{CallKind, MemoryGateway};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn filter() -> GroupFilter {
    GroupFilter::new("staging", "api", "notifications")
}

fn tags(pairs: &[(&str, &str)]) -> Vec<Tag> {
    pairs.iter().map(|(k, v)| Tag::new(*k, *v)).collect()
}

fn full_tags(release: &str) -> Vec<Tag> {
    tags(&[
        ("Environment", "staging"),
        ("Elb-Type", "api"),
        ("Path-Name", "notifications"),
        ("Release", release),
    ])
}

fn tagged(name: &str, tags: Vec<Tag>) -> TaggedGroup {
    TaggedGroup {
        group: TargetGroup::new(format!("arn:{name}"), name),
        tags,
    }
}

// ---------------------------------------------------------------------------
// GroupFilter::evaluate
// ---------------------------------------------------------------------------

#[test]
fn release_yes_is_found_release() {
    assert_eq!(filter().evaluate(&full_tags("yes")), Classification::FoundRelease);
}

#[test]
fn release_other_values_are_non_release() {
    for value in ["no", "No", "YES", "", "pending"] {
        assert_eq!(
            filter().evaluate(&full_tags(value)),
            Classification::FoundNonRelease,
            "Release={value:?}"
        );
    }
}

#[test]
fn missing_any_recognized_key_is_not_found() {
    let all = full_tags("yes");
    for skip in 0..all.len() {
        let partial: Vec<Tag> = all
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, t)| t.clone())
            .collect();
        assert_eq!(
            filter().evaluate(&partial),
            Classification::NotFound,
            "missing {}",
            all[skip].key
        );
    }
}

#[test]
fn missing_key_not_rescued_by_extra_tags() {
    let mut partial = tags(&[
        ("Environment", "staging"),
        ("Elb-Type", "api"),
        ("Release", "yes"),
    ]);
    partial.push(Tag::new("Owner", "platform"));
    partial.push(Tag::new("path-name", "notifications"));
    assert_eq!(filter().evaluate(&partial), Classification::NotFound);
}

#[test]
fn wrong_environment_is_not_found() {
    let mut t = full_tags("yes");
    t[0].value = "production".into();
    assert_eq!(filter().evaluate(&t), Classification::NotFound);
}

#[test]
fn wrong_path_is_not_found() {
    let mut t = full_tags("no");
    t[2].value = "reports".into();
    assert_eq!(filter().evaluate(&t), Classification::NotFound);
}

#[test]
fn wrong_elb_type_is_not_found() {
    let f = GroupFilter::new("staging", "app", "notifications");
    assert_eq!(f.evaluate(&full_tags("yes")), Classification::NotFound);
}

#[test]
fn tag_order_does_not_matter() {
    let mut t = full_tags("yes");
    t.reverse();
    assert_eq!(filter().evaluate(&t), Classification::FoundRelease);
}

#[test]
fn duplicate_keys_last_value_wins() {
    let mut t = full_tags("no");
    t.push(Tag::new("Release", "yes"));
    assert_eq!(filter().evaluate(&t), Classification::FoundRelease);

    let mut t = full_tags("yes");
    t.push(Tag::new("Environment", "production"));
    assert_eq!(filter().evaluate(&t), Classification::NotFound);
}

// ---------------------------------------------------------------------------
// classify_inventory
// ---------------------------------------------------------------------------

#[test]
fn buckets_are_not_swapped() {
    let result = classify_inventory(
        &filter(),
        vec![
            tagged("blue", full_tags("yes")),
            tagged("green", full_tags("no")),
            tagged("other", tags(&[("Environment", "staging")])),
        ],
    );
    assert_eq!(result.sources().len(), 1);
    assert_eq!(result.sources()[0].name, "blue");
    assert_eq!(result.destinations().len(), 1);
    assert_eq!(result.destinations()[0].name, "green");
    assert_eq!(result.unmatched(), 1);
}

#[test]
fn multiple_sources_are_reported_not_rejected() {
    let result = classify_inventory(
        &filter(),
        vec![
            tagged("blue-a", full_tags("yes")),
            tagged("blue-b", full_tags("yes")),
            tagged("green", full_tags("no")),
        ],
    );
    assert_eq!(result.sources().len(), 2);

    let err = result.into_plan().unwrap_err();
    assert!(err.to_string().contains("configuration error"), "{err}");
}

#[test]
fn destination_order_follows_inventory() {
    let result = classify_inventory(
        &filter(),
        vec![
            tagged("green-2", full_tags("no")),
            tagged("blue", full_tags("yes")),
            tagged("green-1", full_tags("no")),
        ],
    );
    let names = result.group_names();
    assert_eq!(names["source"], vec!["blue"]);
    assert_eq!(names["destination"], vec!["green-2", "green-1"]);
}

#[test]
fn empty_inventory_finds_nothing() {
    let result = classify_inventory(&filter(), Vec::new());
    assert!(result.sources().is_empty());
    assert!(result.destinations().is_empty());
    assert!(result.into_plan().is_err());
}

// ---------------------------------------------------------------------------
// classify (through a gateway)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn classify_reads_inventory_from_gateway() {
    let gw = MemoryGateway::new()
        .with_group(
            "blue",
            &[
                ("Environment", "staging"),
                ("Elb-Type", "api"),
                ("Path-Name", "notifications"),
                ("Release", "yes"),
            ],
        )
        .with_group(
            "green",
            &[
                ("Environment", "staging"),
                ("Elb-Type", "api"),
                ("Path-Name", "notifications"),
                ("Release", "no"),
            ],
        );

    let result = classify(&gw, &filter()).await.unwrap();
    let plan = result.into_plan().unwrap();
    assert_eq!(plan.source().name, "blue");
    assert_eq!(plan.destinations()[0].name, "green");
}

#[tokio::test]
async fn inventory_failure_aborts_classification() {
    let gw = MemoryGateway::new()
        .with_group("blue", &[("Release", "yes")])
        .fail_on(CallKind::ListGroups, None);

    let err = classify(&gw, &filter()).await.unwrap_err();
    assert!(err.to_string().contains("inventory fetch failed"), "{err}");
}
