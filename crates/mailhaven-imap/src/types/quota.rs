//! QUOTA extension types (RFC 2087).

/// One resource line of a QUOTA response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaResource {
    /// Resource name, e.g. `STORAGE` or `MESSAGE`.
    pub name: String,
    /// Current usage in resource units.
    pub usage: u64,
    /// Limit in resource units.
    pub limit: u64,
}

/// A quota root and its resource limits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Quota {
    /// Quota root name; often empty for the account-wide root.
    pub root: String,
    /// Resource usage/limit pairs.
    pub resources: Vec<QuotaResource>,
}

impl Quota {
    /// Looks up a resource by name, case-insensitively.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&QuotaResource> {
        self.resources
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_lookup_is_case_insensitive() {
        let quota = Quota {
            root: String::new(),
            resources: vec![QuotaResource {
                name: "STORAGE".to_string(),
                usage: 10,
                limit: 512,
            }],
        };
        assert_eq!(quota.resource("storage").map(|r| r.limit), Some(512));
        assert!(quota.resource("MESSAGE").is_none());
    }
}
