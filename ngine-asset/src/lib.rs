mod error;
pub use error::AssetError;
pub use error::AssetResult;

pub mod stream;
pub use stream::PackageReader;
pub use stream::PackageWriter;

pub mod package;
pub use package::AssetEntry;
pub use package::AssetPackage;
pub use package::AssetPackageBuilder;
pub use package::CURRENT_PACKAGE_VERSION;

mod view;
pub use view::AssetView;

mod asset;
pub use asset::Asset;
pub use asset::AssetLocation;
pub use asset::NamedAsset;
pub use asset::PackageHandle;

mod factory;
pub use factory::AssetFactory;
pub use factory::AssetFactoryFn;

mod archive;
pub use archive::AssetReader;
pub use archive::AssetWriter;

mod object_deserializer;
pub use object_deserializer::JsonObjectDeserializer;
pub use object_deserializer::ObjectDeserializer;

pub mod package_store;
pub use package_store::DirectoryPackageStore;
pub use package_store::MemoryPackageStore;
pub use package_store::PackageStore;
pub use package_store::PackageStoreConfiguration;

mod registry;
pub use registry::split_asset_path;
pub use registry::AssetRegistry;

#[cfg(test)]
mod test_assets;
