use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("{kind} id cannot be empty")]
    Empty { kind: &'static str },
}

/// Identifier of a learning module (a sequence of cards).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleId(String);

impl ModuleId {
    /// Creates a `ModuleId`, rejecting blank input.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` if the trimmed id is empty.
    pub fn try_new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(IdError::Empty { kind: "module" });
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a topic; the primary key of queue entries.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TopicId(String);

impl TopicId {
    /// Creates a `TopicId`, rejecting blank input.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` if the trimmed id is empty.
    pub fn try_new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(IdError::Empty { kind: "topic" });
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({:?})", self.0)
    }
}

impl fmt::Debug for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopicId({:?})", self.0)
    }
}

impl TryFrom<String> for ModuleId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<ModuleId> for String {
    fn from(id: ModuleId) -> Self {
        id.0
    }
}

impl TryFrom<String> for TopicId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<TopicId> for String {
    fn from(id: TopicId) -> Self {
        id.0
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ids_are_rejected() {
        assert_eq!(
            ModuleId::try_new("  ").unwrap_err(),
            IdError::Empty { kind: "module" }
        );
        assert!(TopicId::try_new("").is_err());
    }

    #[test]
    fn ids_display_raw_value() {
        let id = ModuleId::try_new("m1").unwrap();
        assert_eq!(id.to_string(), "m1");
        assert_eq!(format!("{id:?}"), "ModuleId(\"m1\")");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = TopicId::try_new("topic-x").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"topic-x\"");
        assert!(serde_json::from_str::<TopicId>("\"\"").is_err());
    }
}
