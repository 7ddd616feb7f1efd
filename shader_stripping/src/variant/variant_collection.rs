/// Named, persisted set of shader variants.
///
/// Variants are grouped by shader (insertion order kept) with a per-shader,
/// per-pass keyword lookup, so `contains` probes by reference and duplicates
/// are rejected.
///
/// The persisted form is a JSON document owned by the host:
///
/// ```text
/// { "format_version": 1, "name": "...",
///   "shaders": [ { "shader": { "id": "...", "name": "..." },
///                  "variants": [ { "pass_type": 4, "keywords": "A B" } ] } ] }
/// ```
///
/// Reading goes through `variant::extract`, which validates that layout.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use serde_json::Value;
use crate::error::{Error, Result};
use crate::variant::extract::{extract_records, ShaderFilter};
use crate::variant::{KeywordSet, PassType, Shader, ShaderId, ShaderVariant};

/// Layout version written by `to_document` and accepted by the extractor
pub const COLLECTION_FORMAT_VERSION: u64 = 1;

// ===== COLLECTION =====

pub struct VariantCollection {
    name: String,
    shaders: Vec<ShaderEntry>,
    shader_indices: FxHashMap<ShaderId, usize>,
    dirty: bool,
}

/// All variants recorded for one shader
struct ShaderEntry {
    shader: Shader,
    variants: Vec<(PassType, KeywordSet)>,
    lookup: FxHashMap<PassType, FxHashSet<KeywordSet>>,
}

// ===== DOCUMENT LAYOUT =====

#[derive(Serialize)]
struct CollectionDocument<'a> {
    format_version: u64,
    name: &'a str,
    shaders: Vec<ShaderEntryDocument<'a>>,
}

#[derive(Serialize)]
struct ShaderEntryDocument<'a> {
    shader: &'a Shader,
    variants: Vec<VariantDocument>,
}

#[derive(Serialize)]
struct VariantDocument {
    pass_type: PassType,
    keywords: String,
}

// ===== COLLECTION IMPLEMENTATION =====

impl VariantCollection {
    /// Create an empty collection
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shaders: Vec::new(),
            shader_indices: FxHashMap::default(),
            dirty: false,
        }
    }

    /// Rebuild a collection from its persisted document
    pub fn from_document(document: &Value) -> Result<Self> {
        let name = document
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::FormatIncompatible("missing string field 'name'".to_string()))?;

        let mut collection = Self::new(name);
        for record in extract_records(document, &ShaderFilter::All)? {
            collection.add(record.into_variant());
        }
        Ok(collection)
    }

    /// Serialize into the persisted document layout
    pub fn to_document(&self) -> Result<Value> {
        let document = CollectionDocument {
            format_version: COLLECTION_FORMAT_VERSION,
            name: &self.name,
            shaders: self
                .shaders
                .iter()
                .map(|entry| ShaderEntryDocument {
                    shader: &entry.shader,
                    variants: entry
                        .variants
                        .iter()
                        .map(|(pass_type, keywords)| VariantDocument {
                            pass_type: *pass_type,
                            keywords: keywords.to_joined(),
                        })
                        .collect(),
                })
                .collect(),
        };

        serde_json::to_value(document).map_err(|e| {
            Error::AssetError(format!("cannot serialize collection '{}': {}", self.name, e))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ===== QUERY =====

    /// Membership test (keyword order is irrelevant)
    pub fn contains(&self, variant: &ShaderVariant) -> bool {
        self.entry(variant.shader().id())
            .and_then(|entry| entry.lookup.get(&variant.pass_type()))
            .is_some_and(|keywords| keywords.contains(variant.keywords()))
    }

    /// Total number of variants across all shaders
    pub fn len(&self) -> usize {
        self.shaders.iter().map(|entry| entry.variants.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of shaders with at least one recorded variant
    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    /// All variants, grouped by shader in insertion order
    pub fn variants(&self) -> impl Iterator<Item = ShaderVariant> + '_ {
        self.shaders.iter().flat_map(|entry| {
            entry.variants.iter().map(move |(pass_type, keywords)| {
                ShaderVariant::new(entry.shader.clone(), *pass_type, keywords.clone())
            })
        })
    }

    // ===== MODIFICATION =====

    /// Add a variant, returns false if it was already present
    pub fn add(&mut self, variant: ShaderVariant) -> bool {
        let index = match self.shader_indices.get(variant.shader().id()) {
            Some(&index) => index,
            None => {
                let index = self.shaders.len();
                self.shader_indices.insert(variant.shader().id().clone(), index);
                self.shaders.push(ShaderEntry {
                    shader: variant.shader().clone(),
                    variants: Vec::new(),
                    lookup: FxHashMap::default(),
                });
                index
            }
        };

        let entry = &mut self.shaders[index];
        let known = entry.lookup.entry(variant.pass_type()).or_default();
        if known.contains(variant.keywords()) {
            return false;
        }
        known.insert(variant.keywords().clone());
        entry.variants.push((variant.pass_type(), variant.keywords().clone()));
        true
    }

    /// Remove every variant
    pub fn clear(&mut self) {
        self.shaders.clear();
        self.shader_indices.clear();
    }

    // ===== PERSISTENCE STATE =====

    /// Flag the collection as needing a save
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Called by the asset store after a successful save
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    fn entry(&self, shader: &ShaderId) -> Option<&ShaderEntry> {
        let index = self.shader_indices.get(shader)?;
        self.shaders.get(*index)
    }
}

#[cfg(test)]
#[path = "variant_collection_tests.rs"]
mod tests;
