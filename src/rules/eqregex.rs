use std::hash::{Hash, Hasher};
use std::ops::Deref;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer};

/// A regex object that can be tested for equality and used as a HashMap key.
#[derive(Debug, Clone)]
pub struct EqRegex(pub Regex);

impl EqRegex {
    /// Compile a pattern that ignores letter case, the way bank descriptions
    /// are matched.
    pub fn case_insensitive(pattern: &str) -> Result<Self, regex::Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(EqRegex)
    }
}

impl Hash for EqRegex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_str().hash(state);
    }
}

impl PartialEq for EqRegex {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Eq for EqRegex {}

impl From<Regex> for EqRegex {
    fn from(regex: Regex) -> Self {
        Self(regex)
    }
}

impl Deref for EqRegex {
    type Target = Regex;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Instructions on how to deserialize a case-insensitive regex object.
pub fn deserialize_regex<'de, D>(deserializer: D) -> Result<EqRegex, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    EqRegex::case_insensitive(&s).map_err(serde::de::Error::custom)
}
