use crate::artifacts::refs::INVALID_REF_NAME_REGEX;
use anyhow::Context;

/// A validated tag or branch name, relative to its namespace
///
/// Hierarchical names (`release/v1`) are allowed and map to sub-directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefName(String);

impl RefName {
    pub fn try_parse(name: impl Into<String>) -> anyhow::Result<Self> {
        let name = name.into();
        if name.is_empty() {
            anyhow::bail!("ref name cannot be empty");
        }

        let re = regex::Regex::new(INVALID_REF_NAME_REGEX)
            .with_context(|| format!("invalid ref name regex: {INVALID_REF_NAME_REGEX}"))?;

        if re.is_match(&name) {
            anyhow::bail!("invalid ref name: {name}");
        }

        Ok(Self(name))
    }

    /// Path components of the name, in order
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
