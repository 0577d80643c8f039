//! Versioned partition names.
//!
//! All three names are derived from one `(prefix, version)` pair, and the
//! activation allow-list is computed from the same pair, so the live tag and
//! the purge filter cannot drift apart.

/// Default name prefix for every partition.
pub const DEFAULT_PREFIX: &str = "erica-meal";

/// Live version tag.
pub const DEFAULT_VERSION: &str = "v3.4.4";

/// The partition names for one version of the layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    prefix: String,
    version: String,
}

impl Default for CacheNames {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_VERSION)
    }
}

impl CacheNames {
    pub fn new(prefix: impl Into<String>, version: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), version: version.into() }
    }

    /// Aggregate version tag. Never written to.
    pub fn current(&self) -> String {
        format!("{}-{}", self.prefix, self.version)
    }

    /// Partition holding the precached manifest.
    pub fn static_assets(&self) -> String {
        format!("{}-static-{}", self.prefix, self.version)
    }

    /// Partition holding API responses and opportunistically cached assets.
    pub fn dynamic(&self) -> String {
        format!("{}-dynamic-{}", self.prefix, self.version)
    }

    /// Partitions that survive activation.
    pub fn allow_list(&self) -> [String; 2] {
        [self.static_assets(), self.dynamic()]
    }

    pub fn is_live(&self, name: &str) -> bool {
        self.allow_list().iter().any(|n| n == name)
    }

    /// Version tag as reported to clients, parsed back out of the live name.
    pub fn version(&self) -> String {
        let current = self.current();
        parse_version(&current).unwrap_or(&self.version).to_string()
    }
}

/// Extract the version tag (text after the last `-`) from a partition name.
pub fn parse_version(name: &str) -> Option<&str> {
    name.rsplit_once('-')
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let names = CacheNames::default();
        assert_eq!(names.current(), "erica-meal-v3.4.4");
        assert_eq!(names.static_assets(), "erica-meal-static-v3.4.4");
        assert_eq!(names.dynamic(), "erica-meal-dynamic-v3.4.4");
    }

    #[test]
    fn test_allow_list_tracks_version() {
        let names = CacheNames::new("erica-meal", "v3.4.2");
        assert!(names.is_live("erica-meal-static-v3.4.2"));
        assert!(names.is_live("erica-meal-dynamic-v3.4.2"));
        assert!(!names.is_live("erica-meal-static-v3.4.4"));
        assert!(!names.is_live("erica-meal-v3.4.2"));
    }

    #[test]
    fn test_version_parsed_from_live_name() {
        assert_eq!(CacheNames::default().version(), "v3.4.4");
        assert_eq!(parse_version("erica-meal-dynamic-v1"), Some("v1"));
        assert_eq!(parse_version("nodash"), None);
        assert_eq!(parse_version("trailing-"), None);
    }
}
