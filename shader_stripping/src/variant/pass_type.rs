/// Rendering pass categories a shader snippet can belong to.
///
/// Integer values follow the host's persisted encoding; gaps are values the
/// host retired and must not be reused.

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum PassType {
    Normal,
    Vertex,
    VertexLM,
    ForwardBase,
    ForwardAdd,
    ShadowCaster,
    Deferred,
    Meta,
    MotionVectors,
    ScriptableRenderPipeline,
    ScriptableRenderPipelineDefaultUnlit,
    GrabPass,
}

impl PassType {
    /// Every pass type, in encoding order
    pub const ALL: [PassType; 12] = [
        PassType::Normal,
        PassType::Vertex,
        PassType::VertexLM,
        PassType::ForwardBase,
        PassType::ForwardAdd,
        PassType::ShadowCaster,
        PassType::Deferred,
        PassType::Meta,
        PassType::MotionVectors,
        PassType::ScriptableRenderPipeline,
        PassType::ScriptableRenderPipelineDefaultUnlit,
        PassType::GrabPass,
    ];

    /// Persisted integer value
    pub fn to_raw(self) -> i32 {
        match self {
            PassType::Normal => 0,
            PassType::Vertex => 1,
            PassType::VertexLM => 2,
            PassType::ForwardBase => 4,
            PassType::ForwardAdd => 5,
            PassType::ShadowCaster => 8,
            PassType::Deferred => 10,
            PassType::Meta => 11,
            PassType::MotionVectors => 12,
            PassType::ScriptableRenderPipeline => 13,
            PassType::ScriptableRenderPipelineDefaultUnlit => 14,
            PassType::GrabPass => 15,
        }
    }

    /// Decode a persisted integer value
    pub fn from_raw(raw: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|pass_type| pass_type.to_raw() == raw)
    }
}

impl TryFrom<i32> for PassType {
    type Error = Error;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Self::from_raw(raw)
            .ok_or_else(|| Error::FormatIncompatible(format!("unknown pass type value {}", raw)))
    }
}

impl From<PassType> for i32 {
    fn from(pass_type: PassType) -> i32 {
        pass_type.to_raw()
    }
}

impl fmt::Display for PassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
