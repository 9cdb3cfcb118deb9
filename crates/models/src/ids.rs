use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

pub const MAX_ID_LEN: usize = 128;

fn normalize(kind: &str, raw: &str) -> Result<String, ModelError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ModelError::Validation(format!("{kind} must not be empty")));
    }
    if trimmed.len() > MAX_ID_LEN {
        return Err(ModelError::Validation(format!("{kind} longer than {MAX_ID_LEN} bytes")));
    }
    if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ModelError::Validation(format!("{kind} contains whitespace or control characters")));
    }
    Ok(trimmed.to_string())
}

/// Opaque reference to a campsite. The only thing a favorites set stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        normalize("entity id", raw).map(Self)
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for EntityId {
    type Error = ModelError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(&value) }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self { value.0 }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Identity a favorites set belongs to, as handed over by the (trusted) caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        normalize("owner id", raw).map(Self)
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for OwnerId {
    type Error = ModelError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(&value) }
}

impl From<OwnerId> for String {
    fn from(value: OwnerId) -> Self { value.0 }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}
