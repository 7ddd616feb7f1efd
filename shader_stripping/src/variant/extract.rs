/// Variant-record extraction from a persisted collection document.
///
/// The document layout belongs to the host and is not a stable contract, so
/// every field is checked and any mismatch aborts the whole extraction with
/// `Error::FormatIncompatible` instead of yielding partial records.

use rustc_hash::FxHashSet;
use serde_json::{Map, Value};
use crate::error::{Error, Result};
use crate::variant::variant_collection::COLLECTION_FORMAT_VERSION;
use crate::variant::{PassType, Shader, ShaderId, ShaderVariant};

/// One {shader, pass type, keyword list} entry of a collection document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub shader: Shader,
    pub pass_type: PassType,
    /// Keyword tokens in document order, trimmed, empties removed
    pub keywords: Vec<String>,
}

impl VariantRecord {
    pub fn into_variant(self) -> ShaderVariant {
        ShaderVariant::new(self.shader, self.pass_type, self.keywords.into_iter().collect())
    }
}

/// Which shader entries to extract
#[derive(Debug, Clone)]
pub enum ShaderFilter {
    All,
    Only(FxHashSet<ShaderId>),
}

impl ShaderFilter {
    pub fn from_shaders<'a>(shaders: impl IntoIterator<Item = &'a Shader>) -> Self {
        ShaderFilter::Only(shaders.into_iter().map(|shader| shader.id().clone()).collect())
    }

    pub fn accepts(&self, shader: &ShaderId) -> bool {
        match self {
            ShaderFilter::All => true,
            ShaderFilter::Only(ids) => ids.contains(shader),
        }
    }
}

/// Extract records for the shaders accepted by `filter`
///
/// Entries of other shaders are skipped without inspecting their variants.
pub fn extract_records(document: &Value, filter: &ShaderFilter) -> Result<Vec<VariantRecord>> {
    let root = as_object(document, "document")?;

    let version = field(root, "format_version", "document")?
        .as_u64()
        .ok_or_else(|| incompatible("document.format_version", "an unsigned integer"))?;
    if version != COLLECTION_FORMAT_VERSION {
        return Err(Error::FormatIncompatible(format!(
            "document.format_version is {}, expected {}",
            version, COLLECTION_FORMAT_VERSION
        )));
    }

    let shaders = as_array(field(root, "shaders", "document")?, "document.shaders")?;

    let mut records = Vec::new();
    for (shader_index, shader_entry) in shaders.iter().enumerate() {
        let entry_path = format!("shaders[{}]", shader_index);
        let entry = as_object(shader_entry, &entry_path)?;
        let shader = parse_shader(field(entry, "shader", &entry_path)?, &entry_path)?;

        if !filter.accepts(shader.id()) {
            continue;
        }

        let variants_path = format!("{}.variants", entry_path);
        let variants = as_array(field(entry, "variants", &entry_path)?, &variants_path)?;

        for (variant_index, variant_entry) in variants.iter().enumerate() {
            let variant_path = format!("{}[{}]", variants_path, variant_index);
            let variant = as_object(variant_entry, &variant_path)?;

            let raw_pass = field(variant, "pass_type", &variant_path)?
                .as_i64()
                .and_then(|raw| i32::try_from(raw).ok())
                .ok_or_else(|| incompatible(&format!("{}.pass_type", variant_path), "an integer"))?;
            let pass_type = PassType::from_raw(raw_pass).ok_or_else(|| {
                Error::FormatIncompatible(format!(
                    "{}.pass_type has unknown value {}",
                    variant_path, raw_pass
                ))
            })?;

            let keywords = field(variant, "keywords", &variant_path)?
                .as_str()
                .ok_or_else(|| incompatible(&format!("{}.keywords", variant_path), "a string"))?;

            records.push(VariantRecord {
                shader: shader.clone(),
                pass_type,
                keywords: split_keywords(keywords),
            });
        }
    }

    Ok(records)
}

/// Extract records, reporting incompatibility through the log
///
/// On failure the error detail and a separate hint that the host's
/// collection format likely changed are logged before the error is returned.
pub fn extract_reported(document: &Value, filter: &ShaderFilter) -> Result<Vec<VariantRecord>> {
    extract_records(document, filter).map_err(|error| {
        crate::strip_error!("stripping::Extract", "{}", error);
        crate::strip_error!(
            "stripping::Extract",
            "Parsing failed. The variant collection file format may have changed."
        );
        error
    })
}

/// Split a whitespace-separated keyword string into trimmed, non-empty tokens
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

// ===== LAYOUT HELPERS =====

fn parse_shader(value: &Value, entry_path: &str) -> Result<Shader> {
    let path = format!("{}.shader", entry_path);
    let object = as_object(value, &path)?;

    let id = field(object, "id", &path)?
        .as_str()
        .ok_or_else(|| incompatible(&format!("{}.id", path), "a string"))?;
    let name = field(object, "name", &path)?
        .as_str()
        .ok_or_else(|| incompatible(&format!("{}.name", path), "a string"))?;

    if id.is_empty() {
        return Err(Error::FormatIncompatible(format!("{}.id is empty (dangling shader reference)", path)));
    }

    Ok(Shader::new(id, name))
}

fn field<'a>(object: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a Value> {
    object
        .get(key)
        .ok_or_else(|| Error::FormatIncompatible(format!("{} has no field '{}'", path, key)))
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| incompatible(path, "an object"))
}

fn as_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>> {
    value.as_array().ok_or_else(|| incompatible(path, "an array"))
}

fn incompatible(path: &str, expected: &str) -> Error {
    Error::FormatIncompatible(format!("{} is not {}", path, expected))
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
