//! Usage accounting policy applied by key validation

use serde::Deserialize;

/// How validation treats the usage limit and counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsagePolicy {
    /// A present, positive limit admits the key. The counter is never read or
    /// written and `last_used` is left alone.
    #[default]
    Advisory,
    /// Each successful validation atomically increments the counter and stamps
    /// `last_used`; keys whose counter has reached the limit are refused.
    Enforced,
}

impl UsagePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Advisory => "advisory",
            Self::Enforced => "enforced",
        }
    }
}

impl std::fmt::Display for UsagePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
