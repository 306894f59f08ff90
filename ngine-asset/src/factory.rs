use ngine_base::Name;

use crate::{Asset, AssetError, AssetResult, NamedAsset};

/// Creates an empty instance of one asset type
pub type AssetFactoryFn = fn() -> Box<dyn Asset>;

fn make_default<T: NamedAsset>() -> Box<dyn Asset> {
    Box::new(T::default())
}

/// Maps asset type names to constructors of empty instances
#[derive(Default)]
pub struct AssetFactory {
    // Parallel lists, index i of one belongs to index i of the other
    names: Vec<Name>,
    functions: Vec<AssetFactoryFn>,
}

impl AssetFactory {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(
        &self,
        asset_type: &Name,
    ) -> bool {
        self.names.contains(asset_type)
    }

    pub fn register_asset(
        &mut self,
        asset_type: &Name,
        function: AssetFactoryFn,
    ) -> AssetResult<()> {
        if self.contains(asset_type) {
            log::warn!("Asset type {:?} is already registered", asset_type);
            return Err(AssetError::AssetTypeAlreadyRegistered);
        }

        log::debug!("Registered asset type {:?}", asset_type);
        self.names.push(asset_type.clone());
        self.functions.push(function);
        Ok(())
    }

    pub fn register<T: NamedAsset>(&mut self) -> AssetResult<()> {
        self.register_asset(&Name::new(T::TYPE_NAME), make_default::<T>)
    }

    /// Removes the type if it is registered. The order of the remaining types is not preserved.
    pub fn unregister_asset(
        &mut self,
        asset_type: &Name,
    ) {
        if let Some(index) = self.names.iter().position(|x| x == asset_type) {
            log::debug!("Unregistered asset type {:?}", asset_type);
            self.names.swap_remove(index);
            self.functions.swap_remove(index);
        }
    }

    pub fn make(
        &self,
        asset_type: &Name,
    ) -> AssetResult<Box<dyn Asset>> {
        self.try_make(asset_type)
            .ok_or(AssetError::UnknownAssetType)
    }

    pub fn try_make(
        &self,
        asset_type: &Name,
    ) -> Option<Box<dyn Asset>> {
        self.names
            .iter()
            .position(|x| x == asset_type)
            .map(|index| (self.functions[index])())
    }

    pub fn asset_types(&self) -> impl Iterator<Item = &Name> {
        self.names.iter()
    }
}
