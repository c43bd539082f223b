use serde::Deserialize;

/// `[filter]` section: the tag values identifying the groups to switch.
///
/// Every field may also come from the command line, so each is optional
/// here and checked by [`FilterConfig::require`] once overrides are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    pub environment: Option<String>,
    pub elb_type: Option<String>,
    pub path_name: Option<String>,
}

impl FilterConfig {
    /// Replace each field for which an override is given.
    pub fn apply_overrides(
        &mut self,
        environment: Option<String>,
        elb_type: Option<String>,
        path_name: Option<String>,
    ) {
        if environment.is_some() {
            self.environment = environment;
        }
        if elb_type.is_some() {
            self.elb_type = elb_type;
        }
        if path_name.is_some() {
            self.path_name = path_name;
        }
    }

    /// `(environment, elb_type, path_name)`, all present and non-blank.
    pub fn require(&self) -> anyhow::Result<(&str, &str, &str)> {
        Ok((
            required("filter.environment", &self.environment)?,
            required("filter.elb_type", &self.elb_type)?,
            required("filter.path_name", &self.path_name)?,
        ))
    }
}

fn required<'a>(name: &str, value: &'a Option<String>) -> anyhow::Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        Some(_) => anyhow::bail!("{name} must not be empty"),
        None => anyhow::bail!("{name} is required (set it in [filter] or on the command line)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_fields() {
        let mut f = FilterConfig {
            environment: Some("staging".into()),
            elb_type: Some("api".into()),
            path_name: None,
        };
        f.apply_overrides(Some("production".into()), None, Some("reports".into()));
        assert_eq!(f.require().unwrap(), ("production", "api", "reports"));
    }

    #[test]
    fn require_reports_missing_field() {
        let f = FilterConfig {
            environment: Some("staging".into()),
            elb_type: None,
            path_name: Some("reports".into()),
        };
        let err = f.require().unwrap_err();
        assert!(err.to_string().contains("filter.elb_type"), "{err}");
    }

    #[test]
    fn require_rejects_blank_value() {
        let f = FilterConfig {
            environment: Some("  ".into()),
            elb_type: Some("api".into()),
            path_name: Some("reports".into()),
        };
        assert!(f.require().is_err());
    }
}
