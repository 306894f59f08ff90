use std::io::{Read, Write};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::stream::{PackageReader, PackageWriter};
use crate::{Asset, AssetRegistry, AssetResult, AssetView, JsonObjectDeserializer};

/// Input side of an asset's load hook: the payload of one package entry plus the registry that is
/// loading it, so that references to other assets can be resolved.
pub struct AssetReader<'a> {
    view: AssetView<'a>,
    registry: &'a AssetRegistry,
    remaining: &'a [u8],
}

impl<'a> AssetReader<'a> {
    pub fn new(
        view: AssetView<'a>,
        registry: &'a AssetRegistry,
    ) -> Self {
        AssetReader {
            view,
            registry,
            remaining: view.bytes(),
        }
    }

    /// Serialization version the entry was written with
    pub fn version(&self) -> u8 {
        self.view.version()
    }

    pub fn view(&self) -> &AssetView<'a> {
        &self.view
    }

    pub fn registry(&self) -> &'a AssetRegistry {
        self.registry
    }

    /// Bytes not consumed yet
    pub fn remaining(&self) -> &'a [u8] {
        self.remaining
    }

    pub fn read_bincode<T: DeserializeOwned>(&mut self) -> AssetResult<T> {
        Ok(bincode::deserialize_from(&mut self.remaining)?)
    }

    /// Parses the rest of the payload as a JSON object archive. The archive's root version
    /// defaults to the entry version.
    pub fn object_deserializer(&mut self) -> AssetResult<JsonObjectDeserializer> {
        let bytes = std::mem::take(&mut self.remaining);
        JsonObjectDeserializer::from_slice(bytes, self.version())
    }

    /// Reads a reference written by [`AssetWriter::write_asset_ref`] and loads the referenced
    /// asset through the registry. An empty reference reads as `None`.
    pub fn read_asset_ref(&mut self) -> AssetResult<Option<Arc<dyn Asset>>> {
        let path = self.read_asset_path()?;
        if path.is_empty() {
            return Ok(None);
        }

        self.registry.try_load(&path).map(Some)
    }

    pub fn read_asset_ref_checked<T: Asset>(&mut self) -> AssetResult<Option<Arc<T>>> {
        let path = self.read_asset_path()?;
        if path.is_empty() {
            return Ok(None);
        }

        self.registry.try_load_checked::<T>(&path).map(Some)
    }

    fn read_asset_path(&mut self) -> AssetResult<String> {
        PackageReader::new(&mut self.remaining).read_string("asset reference")
    }
}

impl Read for AssetReader<'_> {
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> std::io::Result<usize> {
        self.remaining.read(buf)
    }
}

/// Output side of an asset's save hook. Collects the payload and the serialization version the
/// asset chooses to record for it.
pub struct AssetWriter<'a> {
    registry: Option<&'a AssetRegistry>,
    version: u8,
    bytes: Vec<u8>,
}

impl<'a> AssetWriter<'a> {
    pub fn new(registry: Option<&'a AssetRegistry>) -> Self {
        AssetWriter {
            registry,
            version: 0,
            bytes: Vec::default(),
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn set_version(
        &mut self,
        version: u8,
    ) {
        self.version = version;
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn write_bincode<T: Serialize>(
        &mut self,
        value: &T,
    ) -> AssetResult<()> {
        Ok(bincode::serialize_into(&mut self.bytes, value)?)
    }

    /// Writes the logical path of `asset`. Assets without a resolvable path (no registry, detached
    /// or `None`) are written as an empty reference.
    pub fn write_asset_ref(
        &mut self,
        asset: Option<&dyn Asset>,
    ) -> AssetResult<()> {
        let path = match (asset, self.registry) {
            (Some(asset), Some(registry)) => registry.asset_path(asset),
            _ => String::default(),
        };

        PackageWriter::new(&mut self.bytes).write_string(&path)
    }
}

impl Write for AssetWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> std::io::Result<usize> {
        self.bytes.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
