/// Tests for ShaderVariantPreprocessor and PreprocessorChain

use super::*;
use crate::error::Error;
use crate::strip::provider::StaticSettingsProvider;
use crate::strip::settings::StrippingSettings;
use crate::strip::stripping_pass::ShaderStrippingPass;
use crate::stripping::Diagnostics;
use crate::stripping::log::{LogEntry, LogSeverity, Logger};
use crate::variant::{
    AcceptAllValidator, DeclaredKeywords, ShaderVariant, VariantCollection,
};
use serial_test::serial;
use std::sync::Mutex;

// ============================================================================
// Helper Functions
// ============================================================================

fn shader_x() -> Shader {
    Shader::new("guid-x", "Custom/X")
}

fn shader_y() -> Shader {
    Shader::new("guid-y", "Custom/Y")
}

fn forward_base() -> ShaderSnippet {
    ShaderSnippet::new(PassType::ForwardBase, "ForwardLit")
}

fn jobs(raw: &[&str]) -> Vec<CompilerJob> {
    raw.iter().map(|k| CompilerJob::new(KeywordSet::parse(k))).collect()
}

fn job_keywords(jobs: &[CompilerJob]) -> Vec<String> {
    jobs.iter().map(|job| job.keywords.to_joined()).collect()
}

fn collection(shader: &Shader, pass_type: PassType, variants: &[&str]) -> Arc<VariantCollection> {
    let mut collection = VariantCollection::new("Test");
    for keywords in variants {
        collection.add(ShaderVariant::new(shader.clone(), pass_type, KeywordSet::parse(keywords)));
    }
    Arc::new(collection)
}

/// Rule R: shaders={X}, passTypes={}, extra={C}, collection={(X, ForwardBase, {A,B})}
fn rule_r() -> ShaderStrippingPass {
    ShaderStrippingPass::new("R")
        .with_shader(&shader_x())
        .with_extra_keyword("C")
        .with_collection(collection(&shader_x(), PassType::ForwardBase, &["A B"]))
}

fn preprocessor(settings: Vec<StrippingSettings>) -> ShaderVariantPreprocessor {
    let provider = StaticSettingsProvider::new(settings.into_iter().map(Arc::new).collect());
    ShaderVariantPreprocessor::new(Arc::new(provider), Arc::new(AcceptAllValidator))
}

struct FailingProvider;

impl SettingsProvider for FailingProvider {
    fn stripping_settings(&self) -> Result<Vec<Arc<crate::strip::StrippingSettings>>> {
        Err(Error::AssetError("settings scan failed".to_string()))
    }
}

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.source == SOURCE && entry.severity == LogSeverity::Error {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }
}

// ============================================================================
// Stripping
// ============================================================================

#[test]
fn test_end_to_end_scenario() {
    let preprocessor = preprocessor(vec![StrippingSettings::new("Project").with_pass(rule_r())]);
    let mut candidates = jobs(&["A B C", "A", "A B"]);

    let stats = preprocessor.process(&shader_x(), &forward_base(), &mut candidates).unwrap();

    assert_eq!(job_keywords(&candidates), vec!["A B C", "A B"]);
    assert_eq!(
        stats,
        StripStats {
            candidates: 3,
            stripped: 1,
            settings_applied: 1,
        }
    );
}

#[test]
fn test_any_rule_keeps_variant_within_settings() {
    let rejecting = ShaderStrippingPass::new("R1")
        .with_shader(&shader_x())
        .with_collection(collection(&shader_x(), PassType::ForwardBase, &[]));
    let accepting = ShaderStrippingPass::new("R2")
        .with_shader(&shader_x())
        .with_collection(collection(&shader_x(), PassType::ForwardBase, &["FOG"]));

    let preprocessor = preprocessor(vec![StrippingSettings::new("Project")
        .with_pass(rejecting)
        .with_pass(accepting)]);
    let mut candidates = jobs(&["FOG", "NOPE"]);

    preprocessor.process(&shader_x(), &forward_base(), &mut candidates).unwrap();

    assert_eq!(job_keywords(&candidates), vec!["FOG"]);
}

#[test]
fn test_any_rule_keeps_variant_across_settings() {
    let rejecting = StrippingSettings::new("Strict").with_pass(
        ShaderStrippingPass::new("R1")
            .with_shader(&shader_x())
            .with_collection(collection(&shader_x(), PassType::ForwardBase, &[])),
    );
    let accepting = StrippingSettings::new("Lenient").with_pass(
        ShaderStrippingPass::new("R2")
            .with_shader(&shader_x())
            .with_collection(collection(&shader_x(), PassType::ForwardBase, &["FOG"])),
    );

    let preprocessor = preprocessor(vec![rejecting, accepting]);
    let mut candidates = jobs(&["FOG", "NOPE"]);

    let stats = preprocessor.process(&shader_x(), &forward_base(), &mut candidates).unwrap();

    assert_eq!(job_keywords(&candidates), vec!["FOG"]);
    assert_eq!(stats.settings_applied, 2);
}

#[test]
fn test_untargeted_shader_is_untouched() {
    let preprocessor = preprocessor(vec![StrippingSettings::new("Project").with_pass(rule_r())]);
    let mut candidates = jobs(&["A", "B", ""]);

    let stats = preprocessor.process(&shader_y(), &forward_base(), &mut candidates).unwrap();

    assert_eq!(candidates.len(), 3);
    assert_eq!(stats.settings_applied, 0);
    assert_eq!(stats.stripped, 0);
}

#[test]
fn test_rules_for_other_shaders_do_not_vote() {
    // Y rule would keep everything for X's unconstrained passes if it applied
    let other = ShaderStrippingPass::new("Y").with_shader(&shader_y()).with_pass_type(PassType::Meta);
    let preprocessor = preprocessor(vec![StrippingSettings::new("Project")
        .with_pass(rule_r())
        .with_pass(other)]);
    let mut candidates = jobs(&["A"]);

    preprocessor.process(&shader_x(), &forward_base(), &mut candidates).unwrap();

    assert!(candidates.is_empty());
}

#[test]
fn test_empty_settings_and_no_settings_strip_nothing() {
    let empty = preprocessor(vec![StrippingSettings::new("Empty")]);
    let mut candidates = jobs(&["A", "Z"]);
    let stats = empty.process(&shader_x(), &forward_base(), &mut candidates).unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(stats.settings_applied, 0);

    let none = preprocessor(Vec::new());
    let stats = none.process(&shader_x(), &forward_base(), &mut candidates).unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(stats.candidates, 2);
}

#[test]
fn test_all_candidates_stripped() {
    let preprocessor = preprocessor(vec![StrippingSettings::new("Project").with_pass(rule_r())]);
    let mut candidates = jobs(&["A", "B", "C", "A C"]);

    let stats = preprocessor.process(&shader_x(), &forward_base(), &mut candidates).unwrap();

    assert!(candidates.is_empty());
    assert_eq!(stats.stripped, 4);
}

#[test]
fn test_unconstrained_pass_keeps_everything() {
    let rule = rule_r().with_pass_type(PassType::ShadowCaster);
    let preprocessor = preprocessor(vec![StrippingSettings::new("Project").with_pass(rule)]);
    let mut candidates = jobs(&["A", "Z", ""]);

    preprocessor.process(&shader_x(), &forward_base(), &mut candidates).unwrap();

    assert_eq!(candidates.len(), 3);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
#[serial]
fn test_invalid_candidate_stripped_batch_continues() {
    let mut declared = DeclaredKeywords::new();
    declared.declare(&shader_x(), PassType::ForwardBase, ["A", "B", "C"]);

    let provider = StaticSettingsProvider::default()
        .with_settings(StrippingSettings::new("Project").with_pass(rule_r()));
    let preprocessor = ShaderVariantPreprocessor::new(Arc::new(provider), Arc::new(declared));
    let mut candidates = jobs(&["A B", "A B Q", "A B C"]);

    let entries = Arc::new(Mutex::new(Vec::new()));
    Diagnostics::set_logger(CaptureLogger { entries: entries.clone() });

    let stats = preprocessor.process(&shader_x(), &forward_base(), &mut candidates);

    Diagnostics::reset_logger();

    assert_eq!(stats.unwrap().stripped, 1);
    assert_eq!(job_keywords(&candidates), vec!["A B", "A B C"]);
    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert!(captured[0].message.starts_with("Custom/X/ForwardLit [A B Q]"));
}

#[test]
#[serial]
fn test_provider_failure_leaves_jobs_and_logs() {
    let preprocessor = ShaderVariantPreprocessor::new(Arc::new(FailingProvider), Arc::new(AcceptAllValidator));
    let mut candidates = jobs(&["A", "B"]);

    assert!(preprocessor.process(&shader_x(), &forward_base(), &mut candidates).is_err());

    let entries = Arc::new(Mutex::new(Vec::new()));
    Diagnostics::set_logger(CaptureLogger { entries: entries.clone() });

    preprocessor.on_process_shader(&shader_x(), &forward_base(), &mut candidates);

    Diagnostics::reset_logger();

    assert_eq!(candidates.len(), 2);
    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert!(captured[0].message.contains("settings scan failed"));
}

// ============================================================================
// Hook ordering
// ============================================================================

struct RecordingHook {
    label: &'static str,
    order: i32,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl ShaderPreprocessor for RecordingHook {
    fn callback_order(&self) -> i32 {
        self.order
    }

    fn on_process_shader(&self, _shader: &Shader, _snippet: &ShaderSnippet, _jobs: &mut Vec<CompilerJob>) {
        self.calls.lock().unwrap().push(self.label);
    }
}

#[test]
fn test_callback_order_default_and_override() {
    let default = preprocessor(Vec::new());
    assert_eq!(default.callback_order(), 0);
    assert_eq!(preprocessor(Vec::new()).with_callback_order(-3).callback_order(), -3);
}

#[test]
fn test_chain_runs_hooks_by_order() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let hook = |label, order| -> Arc<dyn ShaderPreprocessor> {
        Arc::new(RecordingHook { label, order, calls: calls.clone() })
    };

    let mut chain = PreprocessorChain::new();
    chain.register(hook("late", 5));
    chain.register(hook("first-zero", 0));
    chain.register(hook("early", -1));
    chain.register(hook("second-zero", 0));
    assert_eq!(chain.len(), 4);

    chain.on_process_shader(&shader_x(), &forward_base(), &mut Vec::new());

    assert_eq!(*calls.lock().unwrap(), vec!["early", "first-zero", "second-zero", "late"]);
}

#[test]
fn test_chain_applies_variant_preprocessor() {
    let mut chain = PreprocessorChain::new();
    assert!(chain.is_empty());
    chain.register(Arc::new(preprocessor(vec![
        StrippingSettings::new("Project").with_pass(rule_r()),
    ])));

    let mut candidates = jobs(&["A B", "A"]);
    chain.on_process_shader(&shader_x(), &forward_base(), &mut candidates);

    assert_eq!(job_keywords(&candidates), vec!["A B"]);
}
