use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use ngine_base::{HashMap, HashSet, Name};

use crate::{
    Asset, AssetError, AssetFactory, AssetLocation, AssetPackage, AssetReader, AssetResult,
    NamedAsset, PackageHandle, PackageStore,
};

/// Splits `<package-path>.<entry-name>` on the last `.`
pub fn split_asset_path(path: &str) -> AssetResult<(&str, &str)> {
    match path.rsplit_once('.') {
        Some((package_path, entry_name)) if !package_path.is_empty() && !entry_name.is_empty() => {
            Ok((package_path, entry_name))
        }
        _ => Err(AssetError::InvalidAssetPath),
    }
}

// Clears a path's in-progress marker when dropped, including when a load hook unwinds
struct LoadInProgress<'a> {
    registry: &'a AssetRegistry,
    path: &'a str,
}

impl Drop for LoadInProgress<'_> {
    fn drop(&mut self) {
        self.registry.lock().loads_in_progress.remove(self.path);
    }
}

struct PackageSlot {
    generation: u32,
    package: Option<Arc<AssetPackage>>,
}

struct AssetRegistryInner {
    // Resident packages. A slot's generation is bumped when its package is unloaded so that
    // outstanding handles stop resolving.
    slots: Vec<PackageSlot>,
    free_slots: Vec<u32>,
    package_handles: HashMap<String, PackageHandle>,

    // Never keeps an asset alive, expired entries are replaced by the next load of the same path
    cache: HashMap<String, Weak<dyn Asset>>,

    // Paths currently being loaded, used to detect assets that reference each other in a cycle
    loads_in_progress: HashSet<String>,
}

impl AssetRegistryInner {
    fn package(
        &self,
        handle: PackageHandle,
    ) -> Option<&Arc<AssetPackage>> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }

        slot.package.as_ref()
    }

    fn insert_package(
        &mut self,
        package: Arc<AssetPackage>,
    ) -> PackageHandle {
        if let Some(index) = self.free_slots.pop() {
            let slot = &mut self.slots[index as usize];
            slot.package = Some(package);
            PackageHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(PackageSlot {
                generation: 0,
                package: Some(package),
            });
            PackageHandle {
                index,
                generation: 0,
            }
        }
    }
}

/// Loads assets by logical path (`<package-path>.<entry-name>`) and keeps at most one live
/// instance per path.
///
/// Packages are read from the [`PackageStore`] on first use and stay resident until unloaded.
/// Loaded assets are shared as `Arc<dyn Asset>`; the registry only keeps weak references to them,
/// so an asset is freed as soon as its last user drops it and the next load builds a new one.
///
/// Asset load hooks may load other assets through the same registry. The registry is meant to be
/// driven from one thread at a time.
pub struct AssetRegistry {
    factory: AssetFactory,
    store: Box<dyn PackageStore>,
    inner: Mutex<AssetRegistryInner>,
}

impl AssetRegistry {
    pub fn new(store: Box<dyn PackageStore>) -> Self {
        let inner = AssetRegistryInner {
            slots: Vec::default(),
            free_slots: Vec::default(),
            package_handles: Default::default(),
            cache: Default::default(),
            loads_in_progress: Default::default(),
        };

        AssetRegistry {
            factory: AssetFactory::new(),
            store,
            inner: Mutex::new(inner),
        }
    }

    // The lock is only held for bookkeeping, never while calling into a store or an asset
    fn lock(&self) -> MutexGuard<'_, AssetRegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn factory(&self) -> &AssetFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut AssetFactory {
        &mut self.factory
    }

    pub fn register<T: NamedAsset>(&mut self) -> AssetResult<()> {
        self.factory.register::<T>()
    }

    pub fn store(&self) -> &dyn PackageStore {
        &*self.store
    }

    /// Returns the asset at `path`, or `None` if it could not be loaded. The failure is logged.
    pub fn load(
        &self,
        path: &str,
    ) -> Option<Arc<dyn Asset>> {
        match self.try_load(path) {
            Ok(asset) => Some(asset),
            Err(e) => {
                log::warn!("Failed to load asset {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn try_load(
        &self,
        path: &str,
    ) -> AssetResult<Arc<dyn Asset>> {
        profiling::scope!("AssetRegistry::try_load");
        let (package_path, entry_name) = split_asset_path(path)?;

        {
            let mut inner = self.lock();
            if let Some(asset) = inner.cache.get(path).and_then(Weak::upgrade) {
                log::trace!("Asset {:?} is already loaded", path);
                return Ok(asset);
            }

            if !inner.loads_in_progress.insert(path.to_string()) {
                log::warn!("Asset {:?} references itself through a cycle", path);
                return Err(AssetError::CyclicReference);
            }
        }

        let in_progress = LoadInProgress {
            registry: self,
            path,
        };
        let result = self.load_uncached(package_path, entry_name);
        drop(in_progress);

        let mut inner = self.lock();
        // Failures are not cached, the next request tries again
        if let Ok(asset) = &result {
            log::debug!("Loaded asset {:?}", path);
            inner.cache.insert(path.to_string(), Arc::downgrade(asset));
        }

        result
    }

    fn load_uncached(
        &self,
        package_path: &str,
        entry_name: &str,
    ) -> AssetResult<Arc<dyn Asset>> {
        let handle = self.load_package(package_path)?;
        let package = self.package(handle).ok_or(AssetError::PackageNotFound)?;

        let index = package.index_of(&Name::new(entry_name));
        let view = package.at(index).map_err(|_| AssetError::EntryNotFound)?;

        let mut asset = self.factory.make(view.asset_type()).map_err(|e| {
            log::warn!(
                "Entry {:?} of package {:?} has unregistered type {:?}",
                entry_name,
                package_path,
                view.asset_type()
            );
            e
        })?;
        *asset.location_mut() = AssetLocation::new(handle, index);

        let mut reader = AssetReader::new(view, self);
        asset.on_load(&mut reader)?;

        Ok(Arc::from(asset))
    }

    /// Returns the asset at `path` if it can be loaded and is a `T`
    pub fn load_checked<T: Asset>(
        &self,
        path: &str,
    ) -> Option<Arc<T>> {
        match self.try_load_checked::<T>(path) {
            Ok(asset) => Some(asset),
            Err(e) => {
                log::warn!("Failed to load asset {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn try_load_checked<T: Asset>(
        &self,
        path: &str,
    ) -> AssetResult<Arc<T>> {
        self.try_load(path)?
            .downcast_arc::<T>()
            .map_err(|_| AssetError::AssetTypeMismatch)
    }

    /// Makes the package at `package_path` resident, reading it from the store if needed
    pub fn load_package(
        &self,
        package_path: &str,
    ) -> AssetResult<PackageHandle> {
        if let Some(handle) = self.lock().package_handles.get(package_path) {
            return Ok(*handle);
        }

        let mut package = self.store.load_package(package_path)?;
        package.set_path(package_path);

        let mut inner = self.lock();
        let handle = inner.insert_package(Arc::new(package));
        inner
            .package_handles
            .insert(package_path.to_string(), handle);
        log::debug!("Package {:?} is now resident", package_path);
        Ok(handle)
    }

    pub fn is_package_resident(
        &self,
        package_path: &str,
    ) -> bool {
        self.lock().package_handles.contains_key(package_path)
    }

    pub fn resident_package_count(&self) -> usize {
        self.lock().package_handles.len()
    }

    /// Resolves a handle, `None` if the package was unloaded since the handle was issued
    pub fn package(
        &self,
        handle: PackageHandle,
    ) -> Option<Arc<AssetPackage>> {
        self.lock().package(handle).cloned()
    }

    pub fn package_handle(
        &self,
        package_path: &str,
    ) -> Option<PackageHandle> {
        self.lock().package_handles.get(package_path).copied()
    }

    /// Drops the registry's reference to a resident package. Handles to it become stale and its
    /// assets are forgotten by the cache, so the next load reads the package again. Returns false
    /// if the package was not resident.
    pub fn unload_package(
        &self,
        package_path: &str,
    ) -> bool {
        let mut inner = self.lock();
        let handle = match inner.package_handles.remove(package_path) {
            Some(handle) => handle,
            None => return false,
        };

        let slot = &mut inner.slots[handle.index as usize];
        slot.package = None;
        slot.generation = slot.generation.wrapping_add(1);
        inner.free_slots.push(handle.index);

        inner
            .cache
            .retain(|path, _| path.rsplit_once('.').map(|x| x.0) != Some(package_path));

        log::debug!("Unloaded package {:?}", package_path);
        true
    }

    /// Number of cached paths whose asset is still alive
    pub fn live_asset_count(&self) -> usize {
        self.lock()
            .cache
            .values()
            .filter(|x| x.strong_count() > 0)
            .count()
    }

    /// Removes cache entries whose asset has been dropped, returns how many were removed
    pub fn prune_expired(&self) -> usize {
        let mut inner = self.lock();
        let before = inner.cache.len();
        inner.cache.retain(|_, x| x.strong_count() > 0);
        before - inner.cache.len()
    }

    /// Logical path of a loaded asset. Assets that are detached, or whose package was unloaded,
    /// have an empty path.
    pub fn asset_path(
        &self,
        asset: &dyn Asset,
    ) -> String {
        let location = asset.location();
        let package = match location.package.and_then(|x| self.package(x)) {
            Some(package) => package,
            None => return String::default(),
        };

        match location.entry_index {
            Some(index) => match package.entries().get(index) {
                Some(entry) => format!("{}.{}", package.path(), entry.name),
                None => String::default(),
            },
            None => package.path().to_string(),
        }
    }
}
