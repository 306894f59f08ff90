use downcast_rs::DowncastSync;

use crate::archive::{AssetReader, AssetWriter};
use crate::AssetResult;

/// Identifies a package resident in an [`crate::AssetRegistry`]. Unloading the package bumps the
/// slot's generation, after which the handle no longer resolves.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PackageHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl PackageHandle {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Where an asset was loaded from: a resident package and the index of its entry. Assets created
/// in code are detached.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct AssetLocation {
    pub package: Option<PackageHandle>,
    pub entry_index: Option<usize>,
}

impl AssetLocation {
    pub fn new(
        package: PackageHandle,
        entry_index: usize,
    ) -> Self {
        AssetLocation {
            package: Some(package),
            entry_index: Some(entry_index),
        }
    }

    pub fn detached() -> Self {
        AssetLocation::default()
    }

    pub fn is_detached(&self) -> bool {
        self.package.is_none()
    }
}

/// Implemented by every loadable asset type. The registry constructs an empty instance through the
/// factory, fills it with `on_load` and then shares it as `Arc<dyn Asset>`. Supports checked
/// downcasting of the shared instance.
pub trait Asset: DowncastSync {
    fn on_load(
        &mut self,
        reader: &mut AssetReader<'_>,
    ) -> AssetResult<()>;

    fn on_save(
        &self,
        writer: &mut AssetWriter<'_>,
    ) -> AssetResult<()>;

    fn location(&self) -> &AssetLocation;

    fn location_mut(&mut self) -> &mut AssetLocation;
}

downcast_rs::impl_downcast!(sync Asset);

/// An asset type with a fixed type name, used to register it with the factory without spelling out
/// the name and constructor
pub trait NamedAsset: Asset + Default {
    const TYPE_NAME: &'static str;
}
