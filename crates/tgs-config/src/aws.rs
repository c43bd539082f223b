use serde::Deserialize;

/// `[aws]` section. Credentials always come from the standard provider
/// chain; only the session shape is configured here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AwsConfig {
    /// Region override. Unset means the default region chain, falling back
    /// to `us-east-1`.
    pub region: Option<String>,
    /// Named profile from the shared config files.
    pub profile: Option<String>,
    /// Custom endpoint, e.g. LocalStack.
    pub endpoint_url: Option<String>,
}
