/// Build-time shader preprocessing hook.
///
/// The host calls `on_process_shader` once per (shader, snippet) with the
/// mutable list of candidate compiler jobs; removing a job strips that
/// variant. `ShaderVariantPreprocessor` implements the hook on top of every
/// stripping settings asset a `SettingsProvider` returns.
///
/// A job is kept when at least one stripping pass targeting the shader, in
/// any applicable settings asset, votes to keep it. The hook never fails the
/// compilation: errors are logged and the job list is left untouched.

use std::sync::Arc;
use crate::error::Result;
use crate::strip::provider::SettingsProvider;
use crate::strip::stripping_pass::PassBatch;
use crate::variant::{KeywordSet, PassType, Shader, VariantValidator};

const SOURCE: &str = "stripping::Preprocessor";

// ===== COMPILER DATA =====

/// Pass being compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSnippet {
    pub pass_type: PassType,
    pub pass_name: String,
}

impl ShaderSnippet {
    pub fn new(pass_type: PassType, pass_name: impl Into<String>) -> Self {
        Self {
            pass_type,
            pass_name: pass_name.into(),
        }
    }
}

/// One candidate variant proposed by the compiler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerJob {
    pub keywords: KeywordSet,
}

impl CompilerJob {
    pub fn new(keywords: KeywordSet) -> Self {
        Self { keywords }
    }
}

/// Counters for one processed batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripStats {
    /// Jobs received
    pub candidates: usize,
    /// Jobs removed
    pub stripped: usize,
    /// Settings assets that targeted the shader
    pub settings_applied: usize,
}

// ===== HOOK TRAIT =====

/// Host hook invoked before variants of a snippet are compiled
pub trait ShaderPreprocessor: Send + Sync {
    /// Position relative to other hooks (lower runs first)
    fn callback_order(&self) -> i32;

    fn on_process_shader(&self, shader: &Shader, snippet: &ShaderSnippet, jobs: &mut Vec<CompilerJob>);
}

// ===== VARIANT PREPROCESSOR =====

pub struct ShaderVariantPreprocessor {
    provider: Arc<dyn SettingsProvider>,
    validator: Arc<dyn VariantValidator>,
    callback_order: i32,
}

impl ShaderVariantPreprocessor {
    pub fn new(provider: Arc<dyn SettingsProvider>, validator: Arc<dyn VariantValidator>) -> Self {
        Self {
            provider,
            validator,
            callback_order: 0,
        }
    }

    pub fn with_callback_order(mut self, order: i32) -> Self {
        self.callback_order = order;
        self
    }

    /// Strip the jobs no applicable stripping pass wants to keep
    pub fn process(&self, shader: &Shader, snippet: &ShaderSnippet, jobs: &mut Vec<CompilerJob>) -> Result<StripStats> {
        let all_settings = self.provider.stripping_settings()?;

        let mut stats = StripStats {
            candidates: jobs.len(),
            ..StripStats::default()
        };

        let applicable: Vec<_> = all_settings
            .iter()
            .filter(|settings| !settings.is_empty() && settings.references(shader))
            .collect();
        if applicable.is_empty() {
            return Ok(stats);
        }
        stats.settings_applied = applicable.len();

        let batches: Vec<PassBatch<'_>> = applicable
            .iter()
            .flat_map(|settings| settings.stripping_passes())
            .map(|pass| pass.begin_batch())
            .collect();

        for index in (0..jobs.len()).rev() {
            let keep = batches.iter().any(|batch| {
                batch.should_compile_variant(shader, snippet, &jobs[index].keywords, self.validator.as_ref())
            });
            if !keep {
                let job = jobs.remove(index);
                crate::strip_trace!(
                    SOURCE,
                    "Stripped {}/{} {}",
                    shader.name(),
                    snippet.pass_name,
                    job.keywords
                );
                stats.stripped += 1;
            }
        }

        crate::strip_debug!(
            SOURCE,
            "{}/{}: {} of {} variant(s) stripped ({} settings)",
            shader.name(),
            snippet.pass_name,
            stats.stripped,
            stats.candidates,
            stats.settings_applied
        );
        Ok(stats)
    }
}

impl ShaderPreprocessor for ShaderVariantPreprocessor {
    fn callback_order(&self) -> i32 {
        self.callback_order
    }

    fn on_process_shader(&self, shader: &Shader, snippet: &ShaderSnippet, jobs: &mut Vec<CompilerJob>) {
        if let Err(e) = self.process(shader, snippet, jobs) {
            crate::strip_error!(
                SOURCE,
                "Variant stripping skipped for {}/{}: {}",
                shader.name(),
                snippet.pass_name,
                e
            );
        }
    }
}

// ===== CHAIN =====

/// Ordered set of preprocessing hooks
#[derive(Default)]
pub struct PreprocessorChain {
    hooks: Vec<Arc<dyn ShaderPreprocessor>>,
}

impl PreprocessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook; hooks with equal order run in registration order
    pub fn register(&mut self, hook: Arc<dyn ShaderPreprocessor>) {
        self.hooks.push(hook);
        self.hooks.sort_by_key(|hook| hook.callback_order());
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook over the job list
    pub fn on_process_shader(&self, shader: &Shader, snippet: &ShaderSnippet, jobs: &mut Vec<CompilerJob>) {
        for hook in &self.hooks {
            hook.on_process_shader(shader, snippet, jobs);
        }
    }
}

#[cfg(test)]
#[path = "preprocessor_tests.rs"]
mod tests;
