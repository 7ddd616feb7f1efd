//! Variant data model
//!
//! Shader identities, keyword sets, variants, the persisted variant
//! collection and the extractor reading its document form.

mod pass_type;
mod shader;
mod keyword_set;
mod shader_variant;
pub mod variant_collection;
pub mod extract;

pub use pass_type::PassType;
pub use shader::{Shader, ShaderId};
pub use keyword_set::KeywordSet;
pub use shader_variant::{
    ShaderVariant, VariantValidator,
    AcceptAllValidator, DeclaredKeywords,
};
pub use variant_collection::{VariantCollection, COLLECTION_FORMAT_VERSION};
pub use extract::{
    VariantRecord, ShaderFilter,
    extract_records, extract_reported, split_keywords,
};
