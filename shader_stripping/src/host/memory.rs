/// In-memory host (no engine required)
///
/// `MemoryProject` holds the whole simulated project: assets, materials,
/// the staging context and the live variant registry. The adapters
/// (`MemoryAssetDatabase`, `MemoryStaging`, `MemoryRegistry`) are cheap
/// handles onto that shared state, so the registry can observe what the
/// staging context instantiated.
///
/// Registration is asynchronous like a real host: after `clear`, each call
/// to `count` registers at most `registration_batch` pending variants.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use rustc_hash::FxHashMap;
use serde_json::Value;
use crate::error::{Error, Result};
use crate::host::{
    AssetDatabase, MaterialAsset, Sleeper, Staging, TemplateKind, VariantRegistry,
    COLLECTION_ASSET_TYPE,
};
use crate::variant::{PassType, Shader, ShaderId, ShaderVariant, VariantCollection};

// ============================================================================
// Project state
// ============================================================================

/// Host operation that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    EnsureDirectory,
    SaveTemplate,
    OpenStage,
    Instantiate,
    RegistryClear,
    RegistryCount,
    RegistrySave,
    LoadDocument,
    SaveDocument,
    DeleteAsset,
    CloseStage,
}

/// A stored asset
#[derive(Debug, Clone, PartialEq)]
pub enum StoredAsset {
    Template(TemplateKind),
    Document { type_name: String, body: Value },
}

#[derive(Default)]
struct ProjectState {
    directories: BTreeSet<PathBuf>,
    assets: BTreeMap<PathBuf, StoredAsset>,
    materials: Vec<MaterialAsset>,
    shader_passes: FxHashMap<ShaderId, Vec<PassType>>,
    stage_root: Option<PathBuf>,
    staged: Vec<(String, MaterialAsset)>,
    render_requests: u32,
    registered: Vec<ShaderVariant>,
    pending: VecDeque<ShaderVariant>,
    background: Vec<ShaderVariant>,
    registration_batch: usize,
    refresh_count: u32,
    failures: Vec<FailPoint>,
}

impl ProjectState {
    fn check(&self, point: FailPoint) -> Result<()> {
        if self.failures.contains(&point) {
            return Err(Error::BackendError(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }

    fn register(&mut self, variant: ShaderVariant) {
        if !self.registered.contains(&variant) {
            self.registered.push(variant);
        }
    }
}

/// Shared in-memory project
#[derive(Clone)]
pub struct MemoryProject {
    state: Arc<Mutex<ProjectState>>,
}

impl MemoryProject {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ProjectState {
                registration_batch: usize::MAX,
                ..ProjectState::default()
            })),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, ProjectState>> {
        self.state
            .lock()
            .map_err(|_| Error::BackendError("MemoryProject lock poisoned".to_string()))
    }

    fn state_unchecked(&self) -> MutexGuard<'_, ProjectState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // ===== SETUP =====

    /// Add a material asset to the project
    pub fn add_material(&self, material: MaterialAsset) {
        self.state_unchecked().materials.push(material);
    }

    /// Declare which pass types a shader has (registered per staged material)
    pub fn declare_shader_passes(&self, shader: &Shader, passes: &[PassType]) {
        self.state_unchecked()
            .shader_passes
            .insert(shader.id().clone(), passes.to_vec());
    }

    /// Variant the host registers on every clear regardless of staging
    /// (editor UI shaders and similar)
    pub fn add_background_variant(&self, variant: ShaderVariant) {
        self.state_unchecked().background.push(variant);
    }

    /// Maximum variants registered per `count` call
    pub fn set_registration_batch(&self, batch: usize) {
        self.state_unchecked().registration_batch = batch.max(1);
    }

    pub fn fail_at(&self, point: FailPoint) {
        self.state_unchecked().failures.push(point);
    }

    pub fn clear_failures(&self) {
        self.state_unchecked().failures.clear();
    }

    /// Store a document asset directly
    pub fn insert_document(&self, path: impl Into<PathBuf>, type_name: &str, body: Value) {
        self.state_unchecked().assets.insert(
            path.into(),
            StoredAsset::Document {
                type_name: type_name.to_string(),
                body,
            },
        );
    }

    // ===== INSPECTION =====

    pub fn asset(&self, path: &Path) -> Option<StoredAsset> {
        self.state_unchecked().assets.get(path).cloned()
    }

    pub fn asset_paths(&self) -> Vec<PathBuf> {
        self.state_unchecked().assets.keys().cloned().collect()
    }

    pub fn has_directory(&self, path: &Path) -> bool {
        self.state_unchecked().directories.contains(path)
    }

    pub fn stage_is_open(&self) -> bool {
        self.state_unchecked().stage_root.is_some()
    }

    /// Names of the instances created in the staging context
    pub fn staged_instances(&self) -> Vec<String> {
        self.state_unchecked().staged.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn render_requests(&self) -> u32 {
        self.state_unchecked().render_requests
    }

    pub fn refresh_count(&self) -> u32 {
        self.state_unchecked().refresh_count
    }

    // ===== ADAPTERS =====

    pub fn asset_database(&self) -> MemoryAssetDatabase {
        MemoryAssetDatabase { project: self.clone() }
    }

    pub fn staging(&self) -> MemoryStaging {
        MemoryStaging { project: self.clone() }
    }

    pub fn registry(&self) -> MemoryRegistry {
        MemoryRegistry { project: self.clone() }
    }
}

impl Default for MemoryProject {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Asset database
// ============================================================================

pub struct MemoryAssetDatabase {
    project: MemoryProject,
}

impl AssetDatabase for MemoryAssetDatabase {
    fn ensure_directory(&mut self, path: &Path) -> Result<()> {
        let mut state = self.project.state()?;
        state.check(FailPoint::EnsureDirectory)?;
        for ancestor in path.ancestors().filter(|p| !p.as_os_str().is_empty()) {
            state.directories.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn delete_directory(&mut self, path: &Path) -> Result<()> {
        let mut state = self.project.state()?;
        if state.assets.keys().any(|asset| asset.starts_with(path)) {
            return Err(Error::AssetError(format!(
                "directory '{}' is not empty",
                path.display()
            )));
        }
        if !state.directories.remove(path) {
            return Err(Error::AssetError(format!(
                "directory '{}' does not exist",
                path.display()
            )));
        }
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        self.project.state()?.refresh_count += 1;
        Ok(())
    }

    fn asset_exists(&self, path: &Path) -> bool {
        self.project.state_unchecked().assets.contains_key(path)
    }

    fn save_template(&mut self, path: &Path, kind: TemplateKind) -> Result<()> {
        let mut state = self.project.state()?;
        state.check(FailPoint::SaveTemplate)?;
        state.assets.insert(path.to_path_buf(), StoredAsset::Template(kind));
        Ok(())
    }

    fn find_materials(&self) -> Result<Vec<MaterialAsset>> {
        Ok(self.project.state()?.materials.clone())
    }

    fn find_assets_of_type(&self, type_name: &str) -> Result<Vec<PathBuf>> {
        let state = self.project.state()?;
        Ok(state
            .assets
            .iter()
            .filter(|(_, asset)| {
                matches!(asset, StoredAsset::Document { type_name: t, .. } if t == type_name)
            })
            .map(|(path, _)| path.clone())
            .collect())
    }

    fn load_document(&self, path: &Path) -> Result<Value> {
        let state = self.project.state()?;
        state.check(FailPoint::LoadDocument)?;
        match state.assets.get(path) {
            Some(StoredAsset::Document { body, .. }) => Ok(body.clone()),
            Some(StoredAsset::Template(_)) => Err(Error::AssetError(format!(
                "'{}' is a template, not a document",
                path.display()
            ))),
            None => Err(Error::AssetError(format!("no asset at '{}'", path.display()))),
        }
    }

    fn save_document(&mut self, path: &Path, type_name: &str, document: Value) -> Result<()> {
        let mut state = self.project.state()?;
        state.check(FailPoint::SaveDocument)?;
        state.assets.insert(
            path.to_path_buf(),
            StoredAsset::Document {
                type_name: type_name.to_string(),
                body: document,
            },
        );
        Ok(())
    }

    fn delete_asset(&mut self, path: &Path) -> Result<()> {
        let mut state = self.project.state()?;
        state.check(FailPoint::DeleteAsset)?;
        state
            .assets
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| Error::AssetError(format!("no asset at '{}'", path.display())))
    }
}

// ============================================================================
// Staging
// ============================================================================

pub struct MemoryStaging {
    project: MemoryProject,
}

impl Staging for MemoryStaging {
    fn open_isolated(&mut self, root_template: &Path) -> Result<()> {
        let mut state = self.project.state()?;
        state.check(FailPoint::OpenStage)?;
        if state.stage_root.is_some() {
            return Err(Error::StagingError("a staging context is already open".to_string()));
        }
        match state.assets.get(root_template) {
            Some(StoredAsset::Template(TemplateKind::EmptyContainer)) => {}
            _ => {
                return Err(Error::StagingError(format!(
                    "'{}' is not an empty container template",
                    root_template.display()
                )))
            }
        }
        state.stage_root = Some(root_template.to_path_buf());
        state.staged.clear();
        Ok(())
    }

    fn instantiate(&mut self, template: &Path, material: &MaterialAsset, instance_name: &str) -> Result<()> {
        let mut state = self.project.state()?;
        state.check(FailPoint::Instantiate)?;
        if state.stage_root.is_none() {
            return Err(Error::StagingError("no staging context is open".to_string()));
        }
        match state.assets.get(template) {
            Some(StoredAsset::Template(TemplateKind::RenderablePrimitive)) => {}
            _ => {
                return Err(Error::StagingError(format!(
                    "'{}' is not a renderable template",
                    template.display()
                )))
            }
        }
        state.staged.push((instance_name.to_string(), material.clone()));
        Ok(())
    }

    fn request_render(&mut self) -> Result<()> {
        self.project.state()?.render_requests += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut state = self.project.state()?;
        state.check(FailPoint::CloseStage)?;
        state.stage_root = None;
        state.staged.clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.project.state_unchecked().stage_root.is_some()
    }
}

// ============================================================================
// Live variant registry
// ============================================================================

pub struct MemoryRegistry {
    project: MemoryProject,
}

impl VariantRegistry for MemoryRegistry {
    fn clear(&mut self) -> Result<()> {
        let mut state = self.project.state()?;
        state.check(FailPoint::RegistryClear)?;

        state.registered.clear();

        let mut pending = VecDeque::new();
        for (_, material) in &state.staged {
            let passes = state
                .shader_passes
                .get(material.shader.id())
                .cloned()
                .unwrap_or_default();
            for pass_type in passes {
                pending.push_back(ShaderVariant::new(
                    material.shader.clone(),
                    pass_type,
                    material.keywords.clone(),
                ));
            }
        }
        pending.extend(state.background.iter().cloned());
        state.pending = pending;
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        let mut state = self.project.state()?;
        state.check(FailPoint::RegistryCount)?;

        let batch = state.registration_batch;
        for _ in 0..batch {
            let next = state.pending.pop_front();
            match next {
                Some(variant) => state.register(variant),
                None => break,
            }
        }
        Ok(state.registered.len())
    }

    fn save_to(&mut self, path: &Path) -> Result<()> {
        let mut state = self.project.state()?;
        state.check(FailPoint::RegistrySave)?;

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("Registry")
            .to_string();
        let mut collection = VariantCollection::new(name);
        for variant in &state.registered {
            collection.add(variant.clone());
        }

        let body = collection.to_document()?;
        state.assets.insert(
            path.to_path_buf(),
            StoredAsset::Document {
                type_name: COLLECTION_ASSET_TYPE.to_string(),
                body,
            },
        );
        Ok(())
    }
}

// ============================================================================
// Sleeper
// ============================================================================

/// Sleeper recording requested delays instead of waiting
#[derive(Clone, Default)]
pub struct ManualSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl ManualSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in order
    pub fn delays(&self) -> Vec<Duration> {
        match self.slept.lock() {
            Ok(slept) => slept.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Sleeper for ManualSleeper {
    fn sleep(&mut self, duration: Duration) {
        if let Ok(mut slept) = self.slept.lock() {
            slept.push(duration);
        }
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
