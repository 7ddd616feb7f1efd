/// Stripping settings: an ordered list of stripping passes.
///
/// Settings are stored as documents in the asset database and found by type.
/// `StrippingSettingsDesc` is the persisted form; collections are referenced
/// by asset path and resolved when the settings are built.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::strip::stripping_pass::ShaderStrippingPass;
use crate::variant::{PassType, Shader, VariantCollection};

const SOURCE: &str = "stripping::Settings";

// ===== SETTINGS =====

pub struct StrippingSettings {
    name: String,
    stripping_passes: Vec<ShaderStrippingPass>,
}

// ===== DESCRIPTORS =====

/// Persisted settings document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrippingSettingsDesc {
    pub name: String,
    pub stripping_passes: Vec<StrippingPassDesc>,
}

/// Persisted stripping pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrippingPassDesc {
    /// Optional label used in diagnostics
    pub name: Option<String>,
    pub shaders: Vec<Shader>,
    pub pass_types: Vec<PassType>,
    pub extra_keywords_allowed: Vec<String>,
    /// Asset paths of the collections queried by this pass
    pub collections: Vec<PathBuf>,
}

// ===== SETTINGS IMPLEMENTATION =====

impl StrippingSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stripping_passes: Vec::new(),
        }
    }

    pub fn with_pass(mut self, pass: ShaderStrippingPass) -> Self {
        self.stripping_passes.push(pass);
        self
    }

    /// Build settings from a descriptor, resolving collection paths
    pub fn from_desc(
        desc: StrippingSettingsDesc,
        resolve: &mut dyn FnMut(&Path) -> Result<Arc<VariantCollection>>,
    ) -> Result<Self> {
        let mut seen_names = FxHashSet::default();
        let mut stripping_passes = Vec::with_capacity(desc.stripping_passes.len());

        for (index, pass_desc) in desc.stripping_passes.into_iter().enumerate() {
            let name = pass_desc.name.unwrap_or_else(|| format!("Pass {}", index));
            if !seen_names.insert(name.clone()) {
                crate::strip_bail!(
                    SOURCE,
                    InvalidSettings,
                    "Duplicate stripping pass name '{}' in '{}'",
                    name,
                    desc.name
                );
            }

            let mut pass = ShaderStrippingPass::new(name);
            for shader in &pass_desc.shaders {
                pass = pass.with_shader(shader);
            }
            for pass_type in pass_desc.pass_types {
                pass = pass.with_pass_type(pass_type);
            }
            for keyword in pass_desc.extra_keywords_allowed {
                pass = pass.with_extra_keyword(keyword);
            }
            for path in &pass_desc.collections {
                pass = pass.with_collection(resolve(path)?);
            }
            stripping_passes.push(pass);
        }

        Ok(Self {
            name: desc.name,
            stripping_passes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stripping_passes(&self) -> &[ShaderStrippingPass] {
        &self.stripping_passes
    }

    pub fn is_empty(&self) -> bool {
        self.stripping_passes.is_empty()
    }

    /// Whether any pass targets `shader`
    pub fn references(&self, shader: &Shader) -> bool {
        self.stripping_passes.iter().any(|pass| pass.applies_to(shader))
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
