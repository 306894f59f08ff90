use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use ngine_base::HashMap;
use serde::{Deserialize, Serialize};

use crate::{AssetError, AssetPackage, AssetResult};

pub const DEFAULT_PACKAGE_EXTENSION: &str = "ngpkg";
pub const PACKAGE_STORE_CONFIGURATION_FILE_NAME: &str = "ngine_packages.json";

/// Locates packages by logical path and reads them from durable storage
pub trait PackageStore {
    /// Returns [`AssetError::PackageNotFound`] if no package exists at `package_path`
    fn load_package(
        &self,
        package_path: &str,
    ) -> AssetResult<AssetPackage>;
}

#[derive(Serialize, Deserialize)]
pub struct PackageStoreConfigurationJson {
    pub package_roots: Vec<String>,
    #[serde(default)]
    pub package_extension: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PackageStoreConfiguration {
    // Searched in order, the first root holding the package wins
    pub package_roots: Vec<PathBuf>,
    pub package_extension: String,
}

impl Default for PackageStoreConfiguration {
    fn default() -> Self {
        PackageStoreConfiguration {
            package_roots: Vec::default(),
            package_extension: DEFAULT_PACKAGE_EXTENSION.to_string(),
        }
    }
}

impl PackageStoreConfiguration {
    pub fn unverified_absolute_path(
        root_path: &Path,
        json_path: &str,
    ) -> PathBuf {
        if Path::new(json_path).is_absolute() {
            PathBuf::from(json_path)
        } else {
            root_path.join(json_path)
        }
    }

    // Relative roots are resolved against the directory holding the configuration file
    pub fn read_from_path(path: &Path) -> AssetResult<Self> {
        let root_path = path.parent().ok_or_else(|| {
            format!(
                "Parent of configuration file path {:?} could not be found",
                path
            )
        })?;
        let file_contents = std::fs::read_to_string(path)?;
        let configuration_file: PackageStoreConfigurationJson =
            serde_json::from_str(&file_contents)?;

        let package_roots = configuration_file
            .package_roots
            .iter()
            .map(|x| Self::unverified_absolute_path(root_path, x))
            .collect();

        Ok(PackageStoreConfiguration {
            package_roots,
            package_extension: configuration_file
                .package_extension
                .unwrap_or_else(|| DEFAULT_PACKAGE_EXTENSION.to_string()),
        })
    }

    /// Looks for the configuration file in `search_location` and then in each of its parents
    pub fn locate_configuration_file(search_location: &Path) -> AssetResult<Self> {
        let mut path = Some(search_location.to_path_buf());
        while let Some(p) = path {
            let joined_path = p.join(PACKAGE_STORE_CONFIGURATION_FILE_NAME);
            if joined_path.exists() {
                log::info!("Using package store configuration at {:?}", joined_path);
                return Self::read_from_path(&joined_path);
            }

            path = p.parent().map(|x| x.to_path_buf());
        }

        Err(format!(
            "{} could not be located at {:?} or in any of its parent directories",
            PACKAGE_STORE_CONFIGURATION_FILE_NAME, search_location
        ))?
    }
}

/// Reads packages from `<root>/<package_path>.<extension>` files
pub struct DirectoryPackageStore {
    configuration: PackageStoreConfiguration,
}

impl DirectoryPackageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryPackageStore {
            configuration: PackageStoreConfiguration {
                package_roots: vec![root.into()],
                ..Default::default()
            },
        }
    }

    pub fn from_configuration(configuration: PackageStoreConfiguration) -> Self {
        DirectoryPackageStore { configuration }
    }

    pub fn configuration(&self) -> &PackageStoreConfiguration {
        &self.configuration
    }

    /// The file a package would be read from under `root`. Package paths that could escape the
    /// root are rejected.
    pub fn package_file_path(
        &self,
        root: &Path,
        package_path: &str,
    ) -> AssetResult<PathBuf> {
        let relative = Path::new(package_path);
        let escapes_root = relative
            .components()
            .any(|x| !matches!(x, Component::Normal(_)));
        if package_path.is_empty() || escapes_root {
            return Err(AssetError::InvalidAssetPath);
        }

        Ok(root.join(format!(
            "{}.{}",
            package_path, self.configuration.package_extension
        )))
    }
}

impl PackageStore for DirectoryPackageStore {
    fn load_package(
        &self,
        package_path: &str,
    ) -> AssetResult<AssetPackage> {
        profiling::scope!("DirectoryPackageStore::load_package");

        for root in &self.configuration.package_roots {
            let file_path = self.package_file_path(root, package_path)?;
            if !file_path.is_file() {
                log::trace!("Package {:?} not found at {:?}", package_path, file_path);
                continue;
            }

            log::debug!("Reading package {:?} from {:?}", package_path, file_path);
            let file = std::fs::File::open(&file_path)?;
            let mut package = AssetPackage::read_from(BufReader::new(file))?;
            package.set_path(package_path);
            return Ok(package);
        }

        Err(AssetError::PackageNotFound)
    }
}

/// Keeps serialized packages in memory, keyed by package path
#[derive(Default)]
pub struct MemoryPackageStore {
    packages: HashMap<String, Vec<u8>>,
}

impl MemoryPackageStore {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert_bytes(
        &mut self,
        package_path: impl Into<String>,
        bytes: Vec<u8>,
    ) {
        self.packages.insert(package_path.into(), bytes);
    }

    pub fn insert_package(
        &mut self,
        package_path: impl Into<String>,
        package: &AssetPackage,
    ) -> AssetResult<()> {
        let mut bytes = Vec::default();
        package.write_to(&mut bytes)?;
        self.insert_bytes(package_path, bytes);
        Ok(())
    }

    pub fn remove(
        &mut self,
        package_path: &str,
    ) -> bool {
        self.packages.remove(package_path).is_some()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl PackageStore for MemoryPackageStore {
    fn load_package(
        &self,
        package_path: &str,
    ) -> AssetResult<AssetPackage> {
        let bytes = self
            .packages
            .get(package_path)
            .ok_or(AssetError::PackageNotFound)?;

        let mut package = AssetPackage::read_from(&bytes[..])?;
        package.set_path(package_path);
        Ok(package)
    }
}
