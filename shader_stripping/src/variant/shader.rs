/// Shader identity as seen by the host asset store.
///
/// Two `Shader` values are the same shader iff their ids match; the name is
/// carried for diagnostics only.

use std::fmt;
use std::hash::{Hash, Hasher};
use serde::{Deserialize, Serialize};

/// Stable shader identifier (asset guid or equivalent)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShaderId(String);

impl ShaderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shader reference: identity plus display name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shader {
    id: ShaderId,
    name: String,
}

impl Shader {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ShaderId::new(id),
            name: name.into(),
        }
    }

    pub fn id(&self) -> &ShaderId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Shader {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Shader {}

impl Hash for Shader {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Shader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
