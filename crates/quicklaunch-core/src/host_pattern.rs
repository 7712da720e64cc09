use glob::Pattern;

/// A hostname predicate used by page URL rules
#[derive(Debug, Clone)]
pub enum HostPattern {
    /// Exact hostname match (case-insensitive)
    Exact(String),
    /// Glob pattern match (e.g., security-center*.game.daum.net)
    Glob(Pattern),
}

impl HostPattern {
    /// Parse a host pattern string into a HostPattern
    ///
    /// If the pattern contains '*' or '?', it's treated as a glob pattern.
    /// Otherwise, it's treated as an exact match (case-insensitive).
    pub fn parse(pattern: &str) -> crate::Result<Self> {
        if pattern.contains('*') || pattern.contains('?') {
            let pattern_lower = pattern.to_lowercase();
            let glob_pattern = Pattern::new(&pattern_lower).map_err(|e| {
                crate::Error::InvalidPattern(format!("Invalid glob pattern '{}': {}", pattern, e))
            })?;
            Ok(HostPattern::Glob(glob_pattern))
        } else if pattern.is_empty() {
            Err(crate::Error::InvalidPattern(
                "Host pattern must not be empty".to_string(),
            ))
        } else {
            Ok(HostPattern::Exact(pattern.to_lowercase()))
        }
    }

    /// Check if a hostname matches this pattern
    pub fn matches(&self, hostname: &str) -> bool {
        let hostname_lower = hostname.to_lowercase();
        match self {
            HostPattern::Exact(pattern) => &hostname_lower == pattern,
            HostPattern::Glob(pattern) => pattern.matches(&hostname_lower),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HostPattern::Exact(host) => host,
            HostPattern::Glob(pattern) => pattern.as_str(),
        }
    }
}
