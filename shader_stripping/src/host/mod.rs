//! Host capabilities consumed by the harvester and the strip engine
//!
//! The host engine (asset store, scene staging, live variant registry) is
//! reached only through these traits. Adapters are shared as
//! `Arc<Mutex<dyn Trait>>`, the same way the rest of the crate shares
//! backends. `memory` provides a complete in-memory host.

pub mod memory;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use serde_json::Value;
use crate::error::{Error, Result};
use crate::variant::{KeywordSet, Shader, VariantCollection};

/// Asset type name of persisted variant collections
pub const COLLECTION_ASSET_TYPE: &str = "VariantCollection";

/// Asset type name of persisted stripping settings
pub const SETTINGS_ASSET_TYPE: &str = "StrippingSettings";

// ===== ASSET TYPES =====

/// A material asset as enumerated by the host
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialAsset {
    pub path: PathBuf,
    pub name: String,
    pub shader: Shader,
    /// Keywords enabled on the material
    pub keywords: KeywordSet,
}

/// Template assets persisted by the harvester
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Empty container used as the isolated staging root
    EmptyContainer,
    /// Renderable primitive (quad, collider removed) that receives materials
    RenderablePrimitive,
}

/// A persisted collection together with its asset path
pub struct CollectionAsset {
    pub path: PathBuf,
    pub collection: VariantCollection,
}

impl CollectionAsset {
    pub fn new(path: impl Into<PathBuf>, collection: VariantCollection) -> Self {
        Self {
            path: path.into(),
            collection,
        }
    }
}

// ===== CAPABILITY TRAITS =====

/// Project asset store
pub trait AssetDatabase: Send {
    /// Create a directory (and parents) if missing
    fn ensure_directory(&mut self, path: &Path) -> Result<()>;

    /// Delete an empty directory
    fn delete_directory(&mut self, path: &Path) -> Result<()>;

    /// Re-scan storage so newly written files become assets
    fn refresh(&mut self) -> Result<()>;

    fn asset_exists(&self, path: &Path) -> bool;

    /// Persist a template asset; transient instances used to build it are discarded
    fn save_template(&mut self, path: &Path, kind: TemplateKind) -> Result<()>;

    /// Enumerate every material asset in the project
    fn find_materials(&self) -> Result<Vec<MaterialAsset>>;

    /// Paths of every document asset of the given type
    fn find_assets_of_type(&self, type_name: &str) -> Result<Vec<PathBuf>>;

    fn load_document(&self, path: &Path) -> Result<Value>;

    fn save_document(&mut self, path: &Path, type_name: &str, document: Value) -> Result<()>;

    fn delete_asset(&mut self, path: &Path) -> Result<()>;
}

/// Isolated instantiation context (prefab stage or equivalent)
pub trait Staging: Send {
    /// Open a context rooted at an instance of `root_template`
    fn open_isolated(&mut self, root_template: &Path) -> Result<()>;

    /// Instantiate `template` under the context root with `material` assigned
    fn instantiate(&mut self, template: &Path, material: &MaterialAsset, instance_name: &str) -> Result<()>;

    /// Ask the host to render/refresh the context so variant usage gets registered
    fn request_render(&mut self) -> Result<()>;

    /// Leave the context and restore the previous one
    fn close(&mut self) -> Result<()>;

    fn is_open(&self) -> bool;
}

/// Process-wide registry of variants the host has seen in use
///
/// There is no completion signal: callers poll `count` until it stops moving.
pub trait VariantRegistry: Send {
    fn clear(&mut self) -> Result<()>;

    fn count(&self) -> Result<usize>;

    /// Persist the registry as a collection document at `path`
    fn save_to(&mut self, path: &Path) -> Result<()>;
}

/// Suspension point used between registry polls
pub trait Sleeper: Send {
    fn sleep(&mut self, duration: Duration);
}

/// Sleeper blocking the current thread
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

// ===== SHARED HANDLES =====

pub type SharedAssetDatabase = Arc<Mutex<dyn AssetDatabase>>;
pub type SharedStaging = Arc<Mutex<dyn Staging>>;
pub type SharedRegistry = Arc<Mutex<dyn VariantRegistry>>;

/// Lock a shared host adapter, mapping poisoning to `Error::BackendError`
pub fn lock<'a, T: ?Sized>(handle: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>> {
    handle
        .lock()
        .map_err(|_| Error::BackendError(format!("{} lock poisoned", what)))
}

// ===== COLLECTION PERSISTENCE =====

/// Load a persisted collection
pub fn load_collection(assets: &dyn AssetDatabase, path: &Path) -> Result<VariantCollection> {
    VariantCollection::from_document(&assets.load_document(path)?)
}

/// Save a collection if it was marked dirty, clearing the flag on success
///
/// Returns whether a save happened.
pub fn save_collection_if_dirty(assets: &mut dyn AssetDatabase, asset: &mut CollectionAsset) -> Result<bool> {
    if !asset.collection.is_dirty() {
        return Ok(false);
    }
    let document = asset.collection.to_document()?;
    assets.save_document(&asset.path, COLLECTION_ASSET_TYPE, document)?;
    asset.collection.clear_dirty();
    Ok(true)
}

/// Create an empty persisted collection asset
pub fn create_collection(assets: &mut dyn AssetDatabase, path: &Path) -> Result<CollectionAsset> {
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("VariantCollection")
        .to_string();

    let mut asset = CollectionAsset::new(path, VariantCollection::new(name));
    asset.collection.mark_dirty();
    save_collection_if_dirty(assets, &mut asset)?;
    Ok(asset)
}
