/// Shader variant identity: {shader, pass type, keyword set}.
///
/// Equality ignores keyword order. Construction through `validated` asks the
/// host whether the keyword combination exists for that shader/pass; a
/// rejection is a recoverable `Error::InvalidVariant`.

use std::fmt;
use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::{Error, Result};
use crate::variant::{KeywordSet, PassType, Shader, ShaderId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderVariant {
    shader: Shader,
    pass_type: PassType,
    keywords: KeywordSet,
}

impl ShaderVariant {
    /// Build a variant from a trusted source (host-saved registry, collection file)
    pub fn new(shader: Shader, pass_type: PassType, keywords: KeywordSet) -> Self {
        Self { shader, pass_type, keywords }
    }

    /// Build a variant, letting the host reject invalid keyword combinations
    pub fn validated(
        shader: Shader,
        pass_type: PassType,
        keywords: KeywordSet,
        validator: &dyn VariantValidator,
    ) -> Result<Self> {
        validator.validate(&shader, pass_type, &keywords)?;
        Ok(Self::new(shader, pass_type, keywords))
    }

    pub fn shader(&self) -> &Shader {
        &self.shader
    }

    pub fn pass_type(&self) -> PassType {
        self.pass_type
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }
}

impl fmt::Display for ShaderVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.shader, self.pass_type, self.keywords)
    }
}

// ===== VALIDATION =====

/// Host-side check that a keyword combination exists for a shader/pass
pub trait VariantValidator: Send + Sync {
    fn validate(&self, shader: &Shader, pass_type: PassType, keywords: &KeywordSet) -> Result<()>;
}

/// Validator accepting every combination (hosts without keyword metadata)
pub struct AcceptAllValidator;

impl VariantValidator for AcceptAllValidator {
    fn validate(&self, _shader: &Shader, _pass_type: PassType, _keywords: &KeywordSet) -> Result<()> {
        Ok(())
    }
}

/// Validator backed by per-shader, per-pass keyword declarations
///
/// A combination is valid when the shader declares the pass and every
/// keyword is declared for that pass.
#[derive(Default)]
pub struct DeclaredKeywords {
    shaders: FxHashMap<ShaderId, FxHashMap<PassType, FxHashSet<String>>>,
}

impl DeclaredKeywords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a pass of a shader with the keywords it understands
    pub fn declare<I, S>(&mut self, shader: &Shader, pass_type: PassType, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shaders
            .entry(shader.id().clone())
            .or_default()
            .entry(pass_type)
            .or_default()
            .extend(keywords.into_iter().map(Into::into));
    }
}

impl VariantValidator for DeclaredKeywords {
    fn validate(&self, shader: &Shader, pass_type: PassType, keywords: &KeywordSet) -> Result<()> {
        let passes = self.shaders.get(shader.id()).ok_or_else(|| {
            Error::InvalidVariant(format!("shader '{}' has no declared passes", shader.name()))
        })?;

        let declared = passes.get(&pass_type).ok_or_else(|| {
            Error::InvalidVariant(format!(
                "shader '{}' has no pass of type {}",
                shader.name(),
                pass_type
            ))
        })?;

        let unknown: Vec<&str> = keywords.iter().filter(|kw| !declared.contains(*kw)).collect();
        if !unknown.is_empty() {
            return Err(Error::InvalidVariant(format!(
                "keywords [{}] are not declared by shader '{}' for pass {}",
                unknown.join(" "),
                shader.name(),
                pass_type
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "shader_variant_tests.rs"]
mod tests;
