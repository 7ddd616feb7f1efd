/// Tests for ShaderStrippingPass and PassBatch

use super::*;
use crate::stripping::Diagnostics;
use crate::stripping::log::{LogEntry, LogSeverity, Logger};
use crate::variant::DeclaredKeywords;
use crate::variant::AcceptAllValidator;
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

fn shadow_caster() -> ShaderSnippet {
    ShaderSnippet::new(PassType::ShadowCaster, "ShadowCaster")
}

fn keywords(raw: &str) -> KeywordSet {
    KeywordSet::parse(raw)
}

/// Collection holding (X, ForwardBase, {A, B})
fn collection_ab() -> Arc<VariantCollection> {
    let mut collection = VariantCollection::new("Harvested");
    collection.add(ShaderVariant::new(shader_x(), PassType::ForwardBase, keywords("A B")));
    Arc::new(collection)
}

/// Rule targeting X with extra keyword C over `collection_ab`
fn rule_x() -> ShaderStrippingPass {
    ShaderStrippingPass::new("X rule")
        .with_shader(&shader_x())
        .with_extra_keyword("C")
        .with_collection(collection_ab())
}

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.source == "stripping::Preprocessor" && entry.severity == LogSeverity::Error {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }
}

// ============================================================================
// Rule evaluation
// ============================================================================

#[test]
fn test_untargeted_shader_always_rejected() {
    let pass = rule_x().with_shader(&shader_x());
    let batch = pass.begin_batch();

    for pass_type in PassType::ALL {
        let snippet = ShaderSnippet::new(pass_type, "Any");
        for raw in ["", "A B", "A B C", "Z"] {
            assert!(!batch.should_compile_variant(&shader_y(), &snippet, &keywords(raw), &AcceptAllValidator));
        }
    }
}

#[test]
fn test_end_to_end_extra_keyword_filtering() {
    let pass = rule_x();
    let batch = pass.begin_batch();

    // {A, B, C} -> {A, B}: found
    assert!(batch.should_compile_variant(&shader_x(), &forward_base(), &keywords("A B C"), &AcceptAllValidator));
    // {A}: set mismatch
    assert!(!batch.should_compile_variant(&shader_x(), &forward_base(), &keywords("A"), &AcceptAllValidator));
    assert!(batch.should_compile_variant(&shader_x(), &forward_base(), &keywords("A B"), &AcceptAllValidator));
    assert!(!batch.should_compile_variant(&shader_x(), &forward_base(), &keywords("A B D"), &AcceptAllValidator));
}

#[test]
fn test_membership_is_order_insensitive() {
    let pass = rule_x();
    let batch = pass.begin_batch();
    let ab: KeywordSet = ["A", "B"].into_iter().collect();
    let ba: KeywordSet = ["B", "A"].into_iter().collect();

    assert_eq!(
        batch.should_compile_variant(&shader_x(), &forward_base(), &ab, &AcceptAllValidator),
        batch.should_compile_variant(&shader_x(), &forward_base(), &ba, &AcceptAllValidator)
    );
}

#[test]
fn test_empty_pass_types_consults_collections_for_every_pass() {
    let pass = rule_x();
    let batch = pass.begin_batch();

    // Only ForwardBase {A, B} is recorded
    assert!(!batch.should_compile_variant(&shader_x(), &shadow_caster(), &keywords("A B"), &AcceptAllValidator));
    assert!(batch.should_compile_variant(&shader_x(), &forward_base(), &keywords("A B"), &AcceptAllValidator));
}

#[test]
fn test_unconstrained_pass_type_is_kept() {
    let pass = rule_x().with_pass_type(PassType::ForwardBase);
    let batch = pass.begin_batch();

    // ShadowCaster is not constrained by this rule: keep regardless of collections
    assert!(batch.should_compile_variant(&shader_x(), &shadow_caster(), &keywords("Z"), &AcceptAllValidator));
    assert!(batch.should_compile_variant(&shader_x(), &shadow_caster(), &keywords(""), &AcceptAllValidator));
    // ForwardBase is constrained
    assert!(!batch.should_compile_variant(&shader_x(), &forward_base(), &keywords("Z"), &AcceptAllValidator));
}

#[test]
fn test_no_collections_rejects_constrained_variants() {
    let pass = ShaderStrippingPass::new("empty").with_shader(&shader_x());
    let batch = pass.begin_batch();
    assert!(!batch.should_compile_variant(&shader_x(), &forward_base(), &keywords("A B"), &AcceptAllValidator));
}

#[test]
fn test_any_collection_may_match() {
    let mut other = VariantCollection::new("Manual");
    other.add(ShaderVariant::new(shader_x(), PassType::ForwardBase, keywords("FOG")));

    let pass = rule_x().with_collection(Arc::new(other));
    let batch = pass.begin_batch();

    assert!(batch.should_compile_variant(&shader_x(), &forward_base(), &keywords("FOG"), &AcceptAllValidator));
    assert!(batch.should_compile_variant(&shader_x(), &forward_base(), &keywords("FOG C"), &AcceptAllValidator));
    assert!(batch.should_compile_variant(&shader_x(), &forward_base(), &keywords("A B"), &AcceptAllValidator));
}

// ============================================================================
// Keyword filtering
// ============================================================================

#[test]
fn test_filter_keywords_is_idempotent() {
    let pass = rule_x().with_extra_keyword("D");
    let batch = pass.begin_batch();

    let once = batch.filter_keywords(&keywords("A C D E"));
    let twice = batch.filter_keywords(&once);

    assert_eq!(once, keywords("A E"));
    assert_eq!(once, twice);
}

#[test]
fn test_each_batch_snapshots_extra_keywords() {
    let pass = rule_x();
    let first = pass.begin_batch();

    let edited = pass.clone().with_extra_keyword("D");
    let second = edited.begin_batch();

    assert_eq!(first.filter_keywords(&keywords("C D")), keywords("D"));
    assert_eq!(second.filter_keywords(&keywords("C D")), KeywordSet::new());
    assert_eq!(first.pass().extra_keywords_allowed(), ["C".to_string()]);
}

// ============================================================================
// Builders
// ============================================================================

#[test]
fn test_builders_deduplicate() {
    let shared = collection_ab();
    let pass = ShaderStrippingPass::new("dedup")
        .with_shader(&shader_x())
        .with_pass_type(PassType::Meta)
        .with_pass_type(PassType::Meta)
        .with_collection(shared.clone())
        .with_collection(shared);

    assert_eq!(pass.name(), "dedup");
    assert_eq!(pass.pass_types(), [PassType::Meta]);
    assert_eq!(pass.collections().len(), 1);
    assert!(pass.applies_to(&shader_x()));
    assert!(!pass.applies_to(&shader_y()));
}

// ============================================================================
// Invalid variants
// ============================================================================

#[test]
#[serial]
fn test_invalid_combination_rejected_and_logged() {
    let mut declared = DeclaredKeywords::new();
    declared.declare(&shader_x(), PassType::ForwardBase, ["A", "B", "C"]);

    let pass = rule_x();
    let batch = pass.begin_batch();

    let entries = Arc::new(Mutex::new(Vec::new()));
    Diagnostics::set_logger(CaptureLogger { entries: entries.clone() });

    // C is filtered out before validation, Z is not declared
    let valid = batch.should_compile_variant(&shader_x(), &forward_base(), &keywords("A B C"), &declared);
    let invalid = batch.should_compile_variant(&shader_x(), &forward_base(), &keywords("A Z C"), &declared);

    Diagnostics::reset_logger();

    assert!(valid);
    assert!(!invalid);
    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert!(captured[0].message.starts_with("Custom/X/ForwardLit [A Z]:\n"));
    assert!(captured[0].message.contains("not declared"));
}

#[test]
#[serial]
fn test_invalid_pass_for_shader_rejected() {
    let mut declared = DeclaredKeywords::new();
    declared.declare(&shader_x(), PassType::ForwardBase, ["A", "B"]);

    let pass = rule_x();
    let batch = pass.begin_batch();

    let entries = Arc::new(Mutex::new(Vec::new()));
    Diagnostics::set_logger(CaptureLogger { entries: entries.clone() });

    let kept = batch.should_compile_variant(&shader_x(), &shadow_caster(), &keywords(""), &declared);

    Diagnostics::reset_logger();

    assert!(!kept);
    assert_eq!(entries.lock().unwrap().len(), 1);
}
