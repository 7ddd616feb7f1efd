//! Variant harvesting
//!
//! Rebuilds a variant collection from what the host registers while
//! rendering the project's materials in an isolated context.

pub mod quiescence;
pub mod harvester;

pub use quiescence::{QuiescencePoll, PollState};
pub use harvester::{
    Harvester, HarvestConfig, HarvestReport, HarvestStep,
    ROOT_TEMPLATE_FILE, INSTANCE_TEMPLATE_FILE, SCRATCH_COLLECTION_FILE,
};
