//! Strip-decision engine
//!
//! Decides at shader compile time which candidate variants are compiled,
//! from stripping passes that compare candidates against variant collections.

pub mod stripping_pass;
pub mod settings;
pub mod provider;
pub mod preprocessor;

pub use stripping_pass::{ShaderStrippingPass, PassBatch};
pub use settings::{StrippingSettings, StrippingSettingsDesc, StrippingPassDesc};
pub use provider::{SettingsProvider, StaticSettingsProvider, AssetSettingsProvider};
pub use preprocessor::{
    ShaderSnippet, CompilerJob, StripStats,
    ShaderPreprocessor, ShaderVariantPreprocessor, PreprocessorChain,
};
