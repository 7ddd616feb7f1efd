/// Variant harvester.
///
/// Rebuilds a destination collection with exactly the variants the host
/// registers while rendering every material that uses one of the shaders of
/// interest, inside an isolated staging context.
///
/// Protocol:
/// 1. Create the scratch directory.
/// 2. Persist two templates: an empty container and a renderable primitive.
/// 3. Open the isolated context rooted at the container template.
/// 4. Instantiate the primitive once per matching material.
/// 5. Clear the live registry and poll its count until it settles.
/// 6. Save the registry to a scratch collection and load it back.
/// 7. Extract the records of the shaders of interest.
/// 8. Replace the destination contents, mark dirty, save.
/// 9. Close the context, delete scratch assets and the scratch directory.
///
/// Step 9 runs whether or not the earlier steps succeeded. The destination is
/// only cleared once step 7 has produced the complete record set.
///
/// The live registry is process-wide, so only one harvest may run at a time
/// regardless of scratch directory; a second call fails with
/// `Error::HarvestInProgress` until the first returns.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::harvest::quiescence::QuiescencePoll;
use crate::host::{
    lock, save_collection_if_dirty, CollectionAsset, SharedAssetDatabase, SharedRegistry,
    SharedStaging, Sleeper, TemplateKind,
};
use crate::variant::{extract_reported, Shader, ShaderFilter};

const SOURCE: &str = "stripping::Harvester";

/// File name of the empty container template
pub const ROOT_TEMPLATE_FILE: &str = "ShaderVariantCollectionBuilder.prefab";

/// File name of the renderable primitive template
pub const INSTANCE_TEMPLATE_FILE: &str = "ShaderVariantCollectionBuilderInstance.prefab";

/// File name of the scratch copy of the live registry
pub const SCRATCH_COLLECTION_FILE: &str = "ShaderVariantCollectionBuilder.shadervariants";

// ===== CONFIGURATION =====

/// Harvester settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Scratch directory for templates and the registry copy (deleted after each run)
    pub scratch_dir: PathBuf,
    /// Delay between registry count reads
    pub poll_interval_ms: u64,
    /// Delay between saving the registry and loading it back
    pub save_settle_delay_ms: u64,
    /// Abort if the registry has not settled after this many reads
    pub max_polls: Option<u32>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from("ShaderStripping/Temp"),
            poll_interval_ms: 500,
            save_settle_delay_ms: 200,
            max_polls: None,
        }
    }
}

impl HarvestConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn save_settle_delay(&self) -> Duration {
        Duration::from_millis(self.save_settle_delay_ms)
    }

    fn root_template_path(&self) -> PathBuf {
        self.scratch_dir.join(ROOT_TEMPLATE_FILE)
    }

    fn instance_template_path(&self) -> PathBuf {
        self.scratch_dir.join(INSTANCE_TEMPLATE_FILE)
    }

    fn scratch_collection_path(&self) -> PathBuf {
        self.scratch_dir.join(SCRATCH_COLLECTION_FILE)
    }
}

// ===== REPORT =====

/// Outcome of a successful harvest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    /// Materials instantiated in the staging context
    pub materials_staged: usize,
    /// Registry count reads until it settled
    pub registry_reads: u32,
    /// Settled registry count (all shaders)
    pub registry_count: usize,
    /// Variants written to the destination
    pub variants_harvested: usize,
    /// Scratch assets and directory all removed
    pub cleanup_complete: bool,
}

/// Protocol step, used in failure diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestStep {
    PrepareScratch,
    CreateTemplates,
    OpenStage,
    StageMaterials,
    AwaitRegistry,
    SaveRegistry,
    ExtractVariants,
    SaveDestination,
}

impl fmt::Display for HarvestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HarvestStep::PrepareScratch => "prepare scratch directory",
            HarvestStep::CreateTemplates => "create templates",
            HarvestStep::OpenStage => "open isolated context",
            HarvestStep::StageMaterials => "stage materials",
            HarvestStep::AwaitRegistry => "await variant registry",
            HarvestStep::SaveRegistry => "save variant registry",
            HarvestStep::ExtractVariants => "extract variants",
            HarvestStep::SaveDestination => "save destination collection",
        };
        f.write_str(name)
    }
}

// ===== SINGLE-FLIGHT GUARD =====

static HARVEST_IN_FLIGHT: AtomicBool = AtomicBool::new(false);

/// Exclusive ownership of the live variant registry for one harvest
struct FlightGuard;

impl FlightGuard {
    fn acquire(scratch_dir: &Path) -> Result<Self> {
        if HARVEST_IN_FLIGHT
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(crate::strip_err!(
                SOURCE,
                HarvestInProgress,
                "cannot harvest into '{}': another harvest owns the variant registry",
                scratch_dir.display()
            ));
        }
        Ok(Self)
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        HARVEST_IN_FLIGHT.store(false, Ordering::Release);
    }
}

// ===== HARVESTER =====

pub struct Harvester {
    assets: SharedAssetDatabase,
    staging: SharedStaging,
    registry: SharedRegistry,
    sleeper: Box<dyn Sleeper>,
    config: HarvestConfig,
}

impl Harvester {
    /// Create a harvester over explicit host handles
    ///
    /// `registry` is the process-wide live variant registry; it must not be
    /// read or cleared by anything else while `harvest` runs.
    pub fn new(
        assets: SharedAssetDatabase,
        staging: SharedStaging,
        registry: SharedRegistry,
        sleeper: Box<dyn Sleeper>,
        config: HarvestConfig,
    ) -> Self {
        Self {
            assets,
            staging,
            registry,
            sleeper,
            config,
        }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Rebuild `destination` from the variants used by materials of `shaders`
    pub fn harvest(&mut self, destination: &mut CollectionAsset, shaders: &[Shader]) -> Result<HarvestReport> {
        let _flight = FlightGuard::acquire(&self.config.scratch_dir)?;

        if !lock(&self.assets, "AssetDatabase")?.asset_exists(&destination.path) {
            crate::strip_bail!(
                SOURCE,
                HarvestFailed,
                "destination collection '{}' does not exist",
                destination.path.display()
            );
        }

        crate::strip_info!(
            SOURCE,
            "Harvesting variants of {} shader(s) into '{}'",
            shaders.len(),
            destination.path.display()
        );

        let mut report = HarvestReport::default();
        let mut scratch_created = false;
        let result = self.run_protocol(destination, shaders, &mut report, &mut scratch_created);
        report.cleanup_complete = self.cleanup(scratch_created);

        match result {
            Ok(()) => {
                crate::strip_info!(
                    SOURCE,
                    "Collection '{}' rebuilt: {} variant(s) from {} material(s), registry settled at {} after {} read(s)",
                    destination.collection.name(),
                    report.variants_harvested,
                    report.materials_staged,
                    report.registry_count,
                    report.registry_reads
                );
                if !report.cleanup_complete {
                    crate::strip_warn!(
                        SOURCE,
                        "Scratch assets may remain under '{}'",
                        self.config.scratch_dir.display()
                    );
                }
                Ok(report)
            }
            Err((step, error)) => {
                crate::strip_error!(SOURCE, "Harvest aborted during '{}': {}", step, error);
                if !report.cleanup_complete {
                    crate::strip_error!(
                        SOURCE,
                        "Inspect '{}' for leftover scratch assets",
                        self.config.scratch_dir.display()
                    );
                }
                Err(error)
            }
        }
    }

    /// Steps 1-8; the first failure is returned with its step
    fn run_protocol(
        &mut self,
        destination: &mut CollectionAsset,
        shaders: &[Shader],
        report: &mut HarvestReport,
        scratch_created: &mut bool,
    ) -> std::result::Result<(), (HarvestStep, Error)> {
        let root_template = self.config.root_template_path();
        let instance_template = self.config.instance_template_path();
        let scratch_collection = self.config.scratch_collection_path();
        let interest: FxHashSet<_> = shaders.iter().map(|shader| shader.id().clone()).collect();

        // 1) Scratch directory
        self.with_assets(HarvestStep::PrepareScratch, |assets| {
            assets.ensure_directory(&self.config.scratch_dir)
        })?;
        *scratch_created = true;
        self.with_assets(HarvestStep::PrepareScratch, |assets| assets.refresh())?;

        // 2) Templates
        self.with_assets(HarvestStep::CreateTemplates, |assets| {
            assets.save_template(&root_template, TemplateKind::EmptyContainer)?;
            assets.save_template(&instance_template, TemplateKind::RenderablePrimitive)
        })?;

        // 3) Isolated context
        at(HarvestStep::OpenStage, || {
            lock(&self.staging, "Staging")?.open_isolated(&root_template)
        })?;

        // 4) One instance per material of interest
        let materials = self.with_assets(HarvestStep::StageMaterials, |assets| assets.find_materials())?;
        at(HarvestStep::StageMaterials, || {
            let mut staging = lock(&self.staging, "Staging")?;
            for material in materials.iter().filter(|m| interest.contains(m.shader.id())) {
                staging.instantiate(&instance_template, material, &material.name)?;
                report.materials_staged += 1;
            }
            staging.request_render()
        })?;
        crate::strip_debug!(SOURCE, "Staged {} material(s)", report.materials_staged);

        // 5) Clear registry, wait for it to settle
        let mut poll = QuiescencePoll::new(self.config.poll_interval(), self.config.max_polls);
        report.registry_count = at(HarvestStep::AwaitRegistry, || {
            let mut registry = lock(&self.registry, "VariantRegistry")?;
            poll.run(&mut *registry, self.sleeper.as_mut())
        })?;
        report.registry_reads = poll.reads();

        // 6) Round-trip through a persisted copy; the live registry holds
        //    references that dangle once loaded into another collection
        at(HarvestStep::SaveRegistry, || {
            lock(&self.registry, "VariantRegistry")?.save_to(&scratch_collection)
        })?;
        self.sleeper.sleep(self.config.save_settle_delay());
        let document = self.with_assets(HarvestStep::SaveRegistry, |assets| {
            assets.refresh()?;
            assets.load_document(&scratch_collection)
        })?;

        // 7) Keep only the shaders of interest
        let filter = ShaderFilter::Only(interest);
        let records = at(HarvestStep::ExtractVariants, || extract_reported(&document, &filter))?;

        // 8) Replace destination contents and persist
        destination.collection.clear();
        for record in records {
            if destination.collection.add(record.into_variant()) {
                report.variants_harvested += 1;
            }
        }
        destination.collection.mark_dirty();
        self.with_assets(HarvestStep::SaveDestination, |assets| {
            save_collection_if_dirty(assets, destination).map(|_| ())
        })?;

        Ok(())
    }

    /// Step 9, best effort; returns whether everything was removed
    fn cleanup(&mut self, scratch_created: bool) -> bool {
        let mut complete = true;

        match lock(&self.staging, "Staging") {
            Ok(mut staging) => {
                if staging.is_open() {
                    if let Err(e) = staging.close() {
                        crate::strip_warn!(SOURCE, "Could not close isolated context: {}", e);
                        complete = false;
                    }
                }
            }
            Err(e) => {
                crate::strip_warn!(SOURCE, "{}", e);
                complete = false;
            }
        }

        let mut assets = match lock(&self.assets, "AssetDatabase") {
            Ok(assets) => assets,
            Err(e) => {
                crate::strip_warn!(SOURCE, "{}", e);
                return false;
            }
        };

        let scratch_assets = [
            self.config.root_template_path(),
            self.config.instance_template_path(),
            self.config.scratch_collection_path(),
        ];
        for path in &scratch_assets {
            if !assets.asset_exists(path) {
                continue;
            }
            if let Err(e) = assets.delete_asset(path) {
                crate::strip_warn!(SOURCE, "Could not delete scratch asset '{}': {}", path.display(), e);
                complete = false;
            }
        }

        if !scratch_created {
            return complete;
        }
        if let Err(e) = assets.delete_directory(&self.config.scratch_dir) {
            crate::strip_warn!(
                SOURCE,
                "Could not delete scratch directory '{}': {}",
                self.config.scratch_dir.display(),
                e
            );
            complete = false;
        }

        complete
    }

    fn with_assets<T>(
        &self,
        step: HarvestStep,
        f: impl FnOnce(&mut dyn crate::host::AssetDatabase) -> Result<T>,
    ) -> std::result::Result<T, (HarvestStep, Error)> {
        at(step, || {
            let mut assets = lock(&self.assets, "AssetDatabase")?;
            f(&mut *assets)
        })
    }
}

/// Tag a step's failure with the step
fn at<T>(step: HarvestStep, f: impl FnOnce() -> Result<T>) -> std::result::Result<T, (HarvestStep, Error)> {
    f().map_err(|error| (step, error))
}

#[cfg(test)]
#[path = "harvester_tests.rs"]
mod tests;
