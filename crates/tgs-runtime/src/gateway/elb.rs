use anyhow::Result;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_elasticloadbalancingv2::Client;
use aws_sdk_elasticloadbalancingv2::config::Region;
use aws_sdk_elasticloadbalancingv2::error::DisplayErrorContext;
use aws_sdk_elasticloadbalancingv2::types as elb;

use tgs_config::AwsConfig;
use tgs_core::{
    HealthState, LoadBalancerGateway, Tag, TaggedGroup, TargetGroup, TargetHealth, TargetIdentity,
};

/// `DescribeTags` accepts at most this many resource ARNs per call.
const TAG_BATCH: usize = 20;

const FALLBACK_REGION: &str = "us-east-1";

/// [`LoadBalancerGateway`] backed by the AWS Elastic Load Balancing v2 API.
pub struct ElbGateway {
    client: Client,
}

impl ElbGateway {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard credential chain and the `[aws]`
    /// section. Region resolution: configured value, then the default
    /// region chain, then `us-east-1`.
    pub async fn from_config(config: &AwsConfig) -> Self {
        let region = RegionProviderChain::first_try(config.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(FALLBACK_REGION);

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;
        tgs_debug!(
            lb,
            region = ?sdk_config.region().map(|r| r.as_ref().to_string()),
            profile = ?config.profile,
            endpoint = ?config.endpoint_url,
            "elbv2 client configured"
        );
        Self::new(Client::new(&sdk_config))
    }

    async fn list_groups(&self) -> Result<Vec<TargetGroup>> {
        let mut groups = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let out = self
                .client
                .describe_target_groups()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("DescribeTargetGroups: {}", DisplayErrorContext(e)))?;
            for tg in out.target_groups() {
                let (Some(arn), Some(name)) = (tg.target_group_arn(), tg.target_group_name()) else {
                    tgs_warn!(lb, "skipping target group without arn or name");
                    continue;
                };
                groups.push(TargetGroup::new(arn, name));
            }
            match out.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }
        Ok(groups)
    }

    async fn describe_tags(&self, arns: Vec<String>) -> Result<Vec<elb::TagDescription>> {
        let count = arns.len();
        let out = self
            .client
            .describe_tags()
            .set_resource_arns(Some(arns))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("DescribeTags ({count} groups): {}", DisplayErrorContext(e)))?;
        Ok(out.tag_descriptions().to_vec())
    }
}

#[async_trait]
impl LoadBalancerGateway for ElbGateway {
    async fn list_groups_with_tags(&self) -> Result<Vec<TaggedGroup>> {
        let groups = self.list_groups().await?;
        tgs_debug!(lb, groups = groups.len(), "listed target groups");

        let mut tagged = Vec::with_capacity(groups.len());
        for batch in groups.chunks(TAG_BATCH) {
            let arns = batch.iter().map(|g| g.arn.clone()).collect();
            let descriptions = self.describe_tags(arns).await?;
            tagged.extend(pair_tags(batch, &descriptions)?);
        }
        Ok(tagged)
    }

    async fn list_health(
        &self,
        group: &TargetGroup,
        targets: Option<&[TargetIdentity]>,
    ) -> Result<Vec<TargetHealth>> {
        let filter = targets
            .map(|t| t.iter().map(target_description).collect::<Result<Vec<_>>>())
            .transpose()?;
        let out = self
            .client
            .describe_target_health()
            .target_group_arn(&group.arn)
            .set_targets(filter)
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!("DescribeTargetHealth {}: {}", group.name, DisplayErrorContext(e))
            })?;

        let mut health = Vec::new();
        for desc in out.target_health_descriptions() {
            let Some(target) = desc.target() else {
                continue;
            };
            let state = desc
                .target_health()
                .and_then(|h| h.state())
                .map(|s| health_state_from_wire(s.as_str()))
                .unwrap_or(HealthState::Unavailable);
            health.push(TargetHealth::new(
                TargetIdentity {
                    id: target.id().to_string(),
                    port: target.port(),
                },
                state,
            ));
        }
        Ok(health)
    }

    async fn register(&self, group: &TargetGroup, targets: &[TargetIdentity]) -> Result<()> {
        if targets.is_empty() {
            return Ok(());
        }
        let descriptions = targets.iter().map(target_description).collect::<Result<Vec<_>>>()?;
        self.client
            .register_targets()
            .target_group_arn(&group.arn)
            .set_targets(Some(descriptions))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("RegisterTargets {}: {}", group.name, DisplayErrorContext(e)))?;
        tgs_debug!(lb, group = %group, targets = targets.len(), "registered targets");
        Ok(())
    }

    async fn deregister(&self, group: &TargetGroup, targets: &[TargetIdentity]) -> Result<()> {
        if targets.is_empty() {
            return Ok(());
        }
        let descriptions = targets.iter().map(target_description).collect::<Result<Vec<_>>>()?;
        self.client
            .deregister_targets()
            .target_group_arn(&group.arn)
            .set_targets(Some(descriptions))
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!("DeregisterTargets {}: {}", group.name, DisplayErrorContext(e))
            })?;
        tgs_debug!(lb, group = %group, targets = targets.len(), "deregistered targets");
        Ok(())
    }
}

fn target_description(target: &TargetIdentity) -> Result<elb::TargetDescription> {
    Ok(elb::TargetDescription::builder()
        .id(&target.id)
        .set_port(target.port)
        .build())
}

/// Attach each group in `batch` to its tag description. A group missing from
/// the response fails the whole batch: classifying it as untagged could
/// hide a second live group.
fn pair_tags(batch: &[TargetGroup], descriptions: &[elb::TagDescription]) -> Result<Vec<TaggedGroup>> {
    batch
        .iter()
        .map(|group| {
            let Some(desc) = descriptions
                .iter()
                .find(|d| d.resource_arn() == Some(group.arn.as_str()))
            else {
                anyhow::bail!("DescribeTags returned no tags for {} ({})", group.name, group.arn);
            };
            Ok(TaggedGroup {
                group: group.clone(),
                tags: convert_tags(desc.tags()),
            })
        })
        .collect()
}

fn convert_tags(tags: &[elb::Tag]) -> Vec<Tag> {
    tags.iter()
        .map(|t| Tag::new(t.key(), t.value().unwrap_or_default()))
        .collect()
}

/// ELBv2 reports `unhealthy.draining` for targets failing checks while
/// draining; anything unrecognised is treated as not routable.
fn health_state_from_wire(state: &str) -> HealthState {
    match state {
        "unhealthy.draining" => HealthState::Draining,
        other => other.parse().unwrap_or(HealthState::Unavailable),
    }
}
