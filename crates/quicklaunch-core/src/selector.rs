use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref COMPOUND_PATTERN: Regex =
        Regex::new(r"^([A-Za-z][A-Za-z0-9-]*)?((?:[#.][A-Za-z0-9_-]+)*)$").unwrap();
    static ref PART_PATTERN: Regex = Regex::new(r"([#.])([A-Za-z0-9_-]+)").unwrap();
}

/// One compound selector: optional tag name plus id and class constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

impl Compound {
    fn parse(source: &str) -> crate::Result<Self> {
        let caps = COMPOUND_PATTERN.captures(source).ok_or_else(|| {
            crate::Error::InvalidSelector(format!("Unsupported selector '{}'", source))
        })?;

        let tag = caps.get(1).map(|m| m.as_str().to_lowercase());
        let mut id = None;
        let mut classes = Vec::new();

        let parts = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        for part in PART_PATTERN.captures_iter(parts) {
            let name = part[2].to_string();
            if &part[1] == "#" {
                if id.is_some() {
                    return Err(crate::Error::InvalidSelector(format!(
                        "Selector '{}' names more than one id",
                        source
                    )));
                }
                id = Some(name);
            } else {
                classes.push(name);
            }
        }

        Ok(Self { tag, id, classes })
    }

    fn matches(&self, tag: &str, id: Option<&str>, classes: &[String]) -> bool {
        if let Some(expected) = &self.tag {
            if !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(expected) = &self.id {
            if id != Some(expected.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| classes.contains(c))
    }
}

/// A parsed CSS selector list
///
/// Supports the subset used by the portal pages: comma-separated compound
/// selectors made of an optional tag name followed by `#id` and `.class`
/// parts (`a`, `span.btn_g`, `#gameStart`, `.modal__button-x`).
/// Combinators and attribute selectors are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Selector {
    source: String,
    alternatives: Vec<Compound>,
}

impl Selector {
    pub fn parse(source: &str) -> crate::Result<Self> {
        let alternatives = source
            .split(',')
            .map(str::trim)
            .map(|part| {
                if part.is_empty() {
                    Err(crate::Error::InvalidSelector(format!(
                        "Empty selector in '{}'",
                        source
                    )))
                } else {
                    Compound::parse(part)
                }
            })
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(Self {
            source: source.trim().to_string(),
            alternatives,
        })
    }

    /// Check whether an element with the given tag, id and classes is selected
    pub fn matches(&self, tag: &str, id: Option<&str>, classes: &[String]) -> bool {
        self.alternatives
            .iter()
            .any(|compound| compound.matches(tag, id, classes))
    }

    pub fn alternatives(&self) -> &[Compound] {
        &self.alternatives
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for Selector {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Selector {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::parse(&value)
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.source
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
