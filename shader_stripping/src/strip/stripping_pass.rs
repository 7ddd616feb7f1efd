/// Stripping pass: one keep/strip rule.
///
/// A pass applies to a set of shaders, optionally constrains a set of pass
/// types, and keeps a candidate when its keyword set (minus the extra
/// allowed keywords) is present in at least one of its collections.
///
/// Evaluation happens through a `PassBatch`, a per-compilation-batch snapshot
/// owning the extra-keyword lookup set. Each batch builds its own snapshot, so
/// concurrent batches never share lookup state.

use std::sync::Arc;
use rustc_hash::FxHashSet;
use crate::strip::preprocessor::ShaderSnippet;
use crate::variant::{
    KeywordSet, PassType, Shader, ShaderId, ShaderVariant, VariantCollection, VariantValidator,
};

const SOURCE: &str = "stripping::Preprocessor";

// ===== STRIPPING PASS =====

#[derive(Clone)]
pub struct ShaderStrippingPass {
    name: String,
    shaders: FxHashSet<ShaderId>,
    pass_types: Vec<PassType>,
    extra_keywords_allowed: Vec<String>,
    collections: Vec<Arc<VariantCollection>>,
}

impl ShaderStrippingPass {
    /// Create a pass applying to no shader
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shaders: FxHashSet::default(),
            pass_types: Vec::new(),
            extra_keywords_allowed: Vec::new(),
            collections: Vec::new(),
        }
    }

    pub fn with_shader(mut self, shader: &Shader) -> Self {
        self.shaders.insert(shader.id().clone());
        self
    }

    pub fn with_pass_type(mut self, pass_type: PassType) -> Self {
        if !self.pass_types.contains(&pass_type) {
            self.pass_types.push(pass_type);
        }
        self
    }

    pub fn with_extra_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.extra_keywords_allowed.push(keyword.into());
        self
    }

    /// Add a collection; the same collection is only queried once
    pub fn with_collection(mut self, collection: Arc<VariantCollection>) -> Self {
        if !self.collections.iter().any(|c| Arc::ptr_eq(c, &collection)) {
            self.collections.push(collection);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pass_types(&self) -> &[PassType] {
        &self.pass_types
    }

    pub fn extra_keywords_allowed(&self) -> &[String] {
        &self.extra_keywords_allowed
    }

    pub fn collections(&self) -> &[Arc<VariantCollection>] {
        &self.collections
    }

    /// Whether this pass has an opinion on `shader` at all
    pub fn applies_to(&self, shader: &Shader) -> bool {
        self.shaders.contains(shader.id())
    }

    /// Snapshot for one compilation batch
    pub fn begin_batch(&self) -> PassBatch<'_> {
        PassBatch {
            pass: self,
            extra_keywords: self.extra_keywords_allowed.iter().cloned().collect(),
        }
    }
}

// ===== BATCH SNAPSHOT =====

/// A stripping pass prepared for one (shader, snippet) compilation batch
pub struct PassBatch<'a> {
    pass: &'a ShaderStrippingPass,
    extra_keywords: FxHashSet<String>,
}

impl<'a> PassBatch<'a> {
    pub fn pass(&self) -> &'a ShaderStrippingPass {
        self.pass
    }

    /// Drop the extra allowed keywords from a candidate keyword set
    pub fn filter_keywords(&self, keywords: &KeywordSet) -> KeywordSet {
        keywords.without(&self.extra_keywords)
    }

    /// Vote on a candidate variant
    ///
    /// - shader not targeted: reject
    /// - pass types given and snippet pass not among them: keep
    /// - invalid keyword combination after filtering: reject, logged
    /// - otherwise keep iff a collection contains the filtered variant
    pub fn should_compile_variant(
        &self,
        shader: &Shader,
        snippet: &ShaderSnippet,
        keywords: &KeywordSet,
        validator: &dyn VariantValidator,
    ) -> bool {
        if !self.pass.applies_to(shader) {
            return false;
        }

        if !self.pass.pass_types.is_empty() && !self.pass.pass_types.contains(&snippet.pass_type) {
            return true;
        }

        let filtered = self.filter_keywords(keywords);
        if let Err(e) = validator.validate(shader, snippet.pass_type, &filtered) {
            crate::strip_error!(
                SOURCE,
                "{}/{} [{}]:\n{}",
                shader.name(),
                snippet.pass_name,
                filtered.to_joined(),
                e
            );
            return false;
        }
        let variant = ShaderVariant::new(shader.clone(), snippet.pass_type, filtered);

        self.pass.collections.iter().any(|collection| collection.contains(&variant))
    }
}

#[cfg(test)]
#[path = "stripping_pass_tests.rs"]
mod tests;
