use crate::HostPattern;
use url::Url;

/// How the path component of a page URL is matched
#[derive(Debug, Clone)]
pub enum PathRule {
    /// Any path
    Any,
    /// Exact path (e.g., "/gamestart/complete.html")
    Exact(String),
    /// Path prefix (e.g., "/gamestart/")
    Prefix(String),
}

impl PathRule {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathRule::Any => true,
            PathRule::Exact(expected) => path == expected,
            PathRule::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

/// Query parameter requirement attached to a URL rule
#[derive(Debug, Clone)]
pub enum QueryRule {
    /// Parameter must be present and equal one of the listed values
    OneOf { name: String, values: Vec<String> },
    /// Parameter must hold a URL (percent-encoded) that satisfies any of the nested rules
    EmbeddedUrl { name: String, rules: Vec<UrlRule> },
}

impl QueryRule {
    fn matches(&self, url: &Url) -> bool {
        match self {
            QueryRule::OneOf { name, values } => query_param(url, name)
                .map(|value| values.iter().any(|v| *v == value))
                .unwrap_or(false),
            QueryRule::EmbeddedUrl { name, rules } => {
                let Some(raw) = query_param(url, name) else {
                    return false;
                };
                match Url::parse(&raw) {
                    Ok(target) => rules.iter().any(|rule| rule.matches(&target)),
                    Err(e) => {
                        tracing::debug!("Embedded '{}' parameter is not a URL ({}): {}", name, e, raw);
                        false
                    }
                }
            }
        }
    }
}

/// Structural predicate over a page URL
///
/// All parts are combined with AND logic. Only http and https URLs can match.
#[derive(Debug, Clone)]
pub struct UrlRule {
    pub host: HostPattern,
    pub path: PathRule,
    pub query: Vec<QueryRule>,
}

impl UrlRule {
    /// Create a rule matching any path on the given host pattern
    pub fn new(host: &str) -> crate::Result<Self> {
        Ok(Self {
            host: HostPattern::parse(host)?,
            path: PathRule::Any,
            query: Vec::new(),
        })
    }

    pub fn with_path(mut self, path: PathRule) -> Self {
        self.path = path;
        self
    }

    /// Require a query parameter to equal one of `values`
    pub fn require_param(mut self, name: &str, values: &[&str]) -> Self {
        self.query.push(QueryRule::OneOf {
            name: name.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    /// Require a query parameter carrying a URL that satisfies one of `rules`
    pub fn require_embedded_url(mut self, name: &str, rules: Vec<UrlRule>) -> Self {
        self.query.push(QueryRule::EmbeddedUrl {
            name: name.to_string(),
            rules,
        });
        self
    }

    pub fn matches(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        let Some(hostname) = url.host_str() else {
            return false;
        };

        self.host.matches(hostname)
            && self.path.matches(url.path())
            && self.query.iter().all(|rule| rule.matches(url))
    }
}

/// First decoded value of a query parameter
pub fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
