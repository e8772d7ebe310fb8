/// Known-safe and known-unsafe version prefixes for one product.
#[derive(Debug, Clone)]
pub struct VersionPattern {
    /// Substring matched against the lowercased service name.
    pub product: &'static str,
    pub safe: &'static [&'static str],
    pub unsafe_: &'static [&'static str],
}

/// Version pattern catalog for recognized products.
#[derive(Debug, Clone)]
pub struct VersionPatternTable {
    patterns: Vec<VersionPattern>,
}

impl VersionPatternTable {
    pub fn new() -> Self {
        let patterns = vec![
            VersionPattern {
                product: "openssh",
                safe: &["8.", "7.9"],
                unsafe_: &["6.", "5."],
            },
            VersionPattern {
                product: "apache",
                safe: &["2.4."],
                unsafe_: &["2.2.", "2.0."],
            },
            VersionPattern {
                product: "nginx",
                safe: &["1.20.", "1.18."],
                unsafe_: &["1.16.", "1.14."],
            },
            VersionPattern {
                product: "windows",
                safe: &["10.", "2019"],
                unsafe_: &["7", "xp", "2003"],
            },
        ];
        Self { patterns }
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionPattern> {
        self.patterns.iter()
    }

    /// Find the pattern whose product name occurs in the given service name.
    pub fn for_service(&self, service_name: &str) -> Option<&VersionPattern> {
        self.patterns
            .iter()
            .find(|p| service_name.contains(p.product))
    }
}

impl Default for VersionPatternTable {
    fn default() -> Self {
        Self::new()
    }
}
