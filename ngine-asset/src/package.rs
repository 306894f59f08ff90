use std::io::{Read, Write};

use ngine_base::Name;

use crate::archive::AssetWriter;
use crate::stream::{PackageReader, PackageWriter};
use crate::{Asset, AssetError, AssetRegistry, AssetResult, AssetView};

pub const PACKAGE_MAGIC: &[u8; 5] = b"NGPKG";
pub const CURRENT_PACKAGE_VERSION: u8 = 0;

/// Metadata of one asset stored in a package. The payload lives in the package blob at
/// `offset..offset + size`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssetEntry {
    pub name: Name,
    pub asset_type: Name,
    // Serialization version the payload was written with
    pub version: u8,
    pub size: u64,
    pub offset: u64,
}

impl AssetEntry {
    fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.size)
    }
}

/// A loaded package: a table of entries and the blob holding all of their payloads back to back.
///
/// Wire format, all integers little-endian:
///
/// ```text
/// magic "NGPKG" | format_version u8 | entry_count u64
/// entry_count * (name: u64 len + bytes | type: u64 len + bytes | version u8 | size u64 | offset u64)
/// blob_length u64 | blob bytes
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPackage {
    path: String,
    format_version: u8,
    entries: Vec<AssetEntry>,
    blob: Vec<u8>,
}

impl Default for AssetPackage {
    fn default() -> Self {
        AssetPackage::new()
    }
}

impl AssetPackage {
    pub fn new() -> Self {
        AssetPackage {
            path: String::default(),
            format_version: CURRENT_PACKAGE_VERSION,
            entries: Vec::default(),
            blob: Vec::default(),
        }
    }

    /// Logical path the package was resolved from, empty if it was loaded standalone
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(
        &mut self,
        path: impl Into<String>,
    ) {
        self.path = path.into();
    }

    pub fn format_version(&self) -> u8 {
        self.format_version
    }

    pub fn entries(&self) -> &[AssetEntry] {
        &self.entries
    }

    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the first entry named `name`, or `len()` if there is none
    pub fn index_of(
        &self,
        name: &Name,
    ) -> usize {
        self.entries
            .iter()
            .position(|x| x.name == *name)
            .unwrap_or(self.entries.len())
    }

    pub fn contains(
        &self,
        name: &Name,
    ) -> bool {
        self.index_of(name) < self.entries.len()
    }

    /// Unchecked-by-contract access for hot paths where the index is already known to be valid.
    /// Asserts in debug builds; release builds return an empty view for an out of range index.
    pub fn view(
        &self,
        index: usize,
    ) -> AssetView<'_> {
        debug_assert!(
            index < self.entries.len(),
            "entry index {} out of range for package with {} entries",
            index,
            self.entries.len()
        );

        match self.entries.get(index) {
            Some(entry) => AssetView::new(self, index, entry),
            None => AssetView::empty(self),
        }
    }

    pub fn view_by_name(
        &self,
        name: &Name,
    ) -> AssetView<'_> {
        self.view(self.index_of(name))
    }

    pub fn at(
        &self,
        index: usize,
    ) -> AssetResult<AssetView<'_>> {
        self.entries
            .get(index)
            .map(|entry| AssetView::new(self, index, entry))
            .ok_or(AssetError::EntryIndexOutOfRange)
    }

    pub fn at_name(
        &self,
        name: &Name,
    ) -> AssetResult<AssetView<'_>> {
        let index = self.index_of(name);
        self.at(index).map_err(|_| AssetError::EntryNotFound)
    }

    pub(crate) fn entry_bytes(
        &self,
        entry: &AssetEntry,
    ) -> &[u8] {
        // Bounds are validated when the package is loaded or built
        let start = entry.offset as usize;
        let end = start + entry.size as usize;
        self.blob.get(start..end).unwrap_or_default()
    }

    /// Writes the package. A failed write stops at the failing step, the output is left partial.
    pub fn save<W: Write>(
        &self,
        writer: &mut PackageWriter<W>,
    ) -> AssetResult<()> {
        profiling::scope!("AssetPackage::save");

        writer.write_bytes(PACKAGE_MAGIC)?;
        writer.write_u8(self.format_version)?;
        writer.write_u64(self.entries.len() as u64)?;
        for entry in &self.entries {
            writer.write_string(entry.name.as_str())?;
            writer.write_string(entry.asset_type.as_str())?;
            writer.write_u8(entry.version)?;
            writer.write_u64(entry.size)?;
            writer.write_u64(entry.offset)?;
        }

        writer.write_u64(self.blob.len() as u64)?;
        writer.write_bytes(&self.blob)?;

        log::debug!(
            "Saved package {:?} with {} entries and {} blob bytes",
            self.path,
            self.entries.len(),
            self.blob.len()
        );
        Ok(())
    }

    /// Replaces the contents of this package with the package read from `reader`. On failure the
    /// package is left empty and the reader is marked failed.
    pub fn load<R: Read>(
        &mut self,
        reader: &mut PackageReader<R>,
    ) -> AssetResult<()> {
        profiling::scope!("AssetPackage::load");

        match Self::read_contents(reader) {
            Ok((format_version, entries, blob)) => {
                self.format_version = format_version;
                self.entries = entries;
                self.blob = blob;
                log::debug!(
                    "Loaded package {:?} with {} entries and {} blob bytes",
                    self.path,
                    self.entries.len(),
                    self.blob.len()
                );
                Ok(())
            }
            Err(e) => {
                self.format_version = CURRENT_PACKAGE_VERSION;
                self.entries.clear();
                self.blob.clear();
                reader.mark_failed();
                Err(e)
            }
        }
    }

    pub fn try_load<R: Read>(
        &mut self,
        reader: &mut PackageReader<R>,
    ) -> bool {
        match self.load(reader) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Failed to load package {:?}: {}", self.path, e);
                false
            }
        }
    }

    pub fn read_from<R: Read>(reader: R) -> AssetResult<AssetPackage> {
        let mut package = AssetPackage::new();
        package.load(&mut PackageReader::new(reader))?;
        Ok(package)
    }

    pub fn write_to<W: Write>(
        &self,
        writer: W,
    ) -> AssetResult<()> {
        let mut writer = PackageWriter::new(writer);
        self.save(&mut writer)?;
        writer.flush()
    }

    fn read_contents<R: Read>(
        reader: &mut PackageReader<R>,
    ) -> AssetResult<(u8, Vec<AssetEntry>, Vec<u8>)> {
        let magic = reader.read_bytes(PACKAGE_MAGIC.len() as u64, "magic header")?;
        if magic != PACKAGE_MAGIC {
            return Err(AssetError::InvalidMagicHeader);
        }

        let format_version = reader.read_u8("format version")?;
        let entry_count = reader.read_u64("entry count")?;

        // Not reserved up front, the count is untrusted until the entries are actually read
        let mut entries = Vec::default();
        for _ in 0..entry_count {
            let name = reader.read_string("entry name")?;
            let asset_type = reader.read_string("entry type")?;
            entries.push(AssetEntry {
                name: Name::new(&name),
                asset_type: Name::new(&asset_type),
                version: reader.read_u8("entry version")?,
                size: reader.read_u64("entry size")?,
                offset: reader.read_u64("entry offset")?,
            });
        }

        let blob_length = reader.read_u64("blob length")?;
        let blob = reader.read_bytes(blob_length, "blob")?;

        for entry in &entries {
            match entry.end() {
                Some(end) if end <= blob.len() as u64 => {}
                _ => {
                    log::warn!(
                        "Package entry {:?} at {}+{} exceeds blob of {} bytes",
                        entry.name,
                        entry.offset,
                        entry.size,
                        blob.len()
                    );
                    return Err(AssetError::EntryOutOfBounds);
                }
            }
        }

        Ok((format_version, entries, blob))
    }
}

/// Produces a package whole, laying payloads out back to back in insertion order
#[derive(Default)]
pub struct AssetPackageBuilder {
    entries: Vec<AssetEntry>,
    blob: Vec<u8>,
}

impl AssetPackageBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add_entry(
        &mut self,
        name: impl Into<Name>,
        asset_type: impl Into<Name>,
        version: u8,
        bytes: &[u8],
    ) -> &mut Self {
        self.entries.push(AssetEntry {
            name: name.into(),
            asset_type: asset_type.into(),
            version,
            size: bytes.len() as u64,
            offset: self.blob.len() as u64,
        });
        self.blob.extend_from_slice(bytes);
        self
    }

    /// Serializes `asset` with its save hook and adds it under the version the hook selected.
    /// Asset references resolve their paths through `registry` when one is given.
    pub fn add_asset(
        &mut self,
        name: impl Into<Name>,
        asset_type: impl Into<Name>,
        asset: &dyn Asset,
        registry: Option<&AssetRegistry>,
    ) -> AssetResult<&mut Self> {
        let mut writer = AssetWriter::new(registry);
        asset.on_save(&mut writer)?;
        let version = writer.version();
        let bytes = writer.into_bytes();
        Ok(self.add_entry(name, asset_type, version, &bytes))
    }

    pub fn build(self) -> AssetPackage {
        AssetPackage {
            path: String::default(),
            format_version: CURRENT_PACKAGE_VERSION,
            entries: self.entries,
            blob: self.blob,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn mock_package_bytes(magic: &[u8; 5]) -> Vec<u8> {
        let mut bytes = magic.to_vec();
        bytes.push(0);
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.extend_from_slice(&9u64.to_le_bytes());
        bytes.extend_from_slice(b"mockasset");
        bytes.extend_from_slice(&7u64.to_le_bytes());
        bytes.extend_from_slice(b"ng.mock");
        bytes.push(0);
        bytes.extend_from_slice(&10u64.to_le_bytes());
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.extend_from_slice(&11u64.to_le_bytes());
        bytes.extend_from_slice(b"\0abcdefghij");
        bytes
    }

    #[test]
    fn load_mock_package() {
        let bytes = mock_package_bytes(b"NGPKG");
        let mut reader = PackageReader::new(&bytes[..]);
        let mut package = AssetPackage::new();
        assert!(package.try_load(&mut reader));
        assert!(!reader.is_failed());

        assert_eq!(package.len(), 1);
        assert_eq!(package.view(0).len(), 10);
        assert_eq!(package.view(0).bytes(), b"abcdefghij");
        assert!(package.contains(&Name::new("mockasset")));
        assert_eq!(package.index_of(&Name::new("mockasset")), 0);
        assert_eq!(package.view(0).asset_type(), &Name::new("ng.mock"));
        assert_eq!(package.view(0).version(), 0);
    }

    #[test]
    fn reject_bad_magic() {
        let bytes = mock_package_bytes(b"NZPSG");
        let mut reader = PackageReader::new(&bytes[..]);
        let mut package = AssetPackage::new();
        assert!(!package.try_load(&mut reader));
        assert!(reader.is_failed());
        assert!(package.is_empty());

        assert!(matches!(
            AssetPackage::read_from(&bytes[..]),
            Err(AssetError::InvalidMagicHeader)
        ));
    }

    #[test]
    fn reject_truncated_blob() {
        let mut bytes = mock_package_bytes(b"NGPKG");
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(
            AssetPackage::read_from(&bytes[..]),
            Err(AssetError::Truncated("blob"))
        ));
    }

    #[test]
    fn reject_missing_entry_records() {
        // Promise two entries but end the stream right after the first record
        let mut bytes = mock_package_bytes(b"NGPKG");
        bytes[6..14].copy_from_slice(&2u64.to_le_bytes());
        bytes.truncate(14 + 8 + 9 + 8 + 7 + 1 + 8 + 8);

        let good = mock_package_bytes(b"NGPKG");
        let mut package = AssetPackage::read_from(&good[..]).unwrap();

        let mut reader = PackageReader::new(&bytes[..]);
        assert!(matches!(
            package.load(&mut reader),
            Err(AssetError::Truncated("entry name"))
        ));
        assert!(reader.is_failed());
        assert!(package.is_empty());
        assert!(package.blob().is_empty());
        assert!(!package.contains(&Name::new("mockasset")));
    }

    #[test]
    fn reject_entry_outside_blob() {
        let mut builder = AssetPackageBuilder::new();
        builder.add_entry("a", "ng.raw", 0, b"1234");
        let mut package = builder.build();
        package.entries[0].size = 5;

        let mut bytes = Vec::default();
        package.write_to(&mut bytes).unwrap();

        let mut reader = PackageReader::new(&bytes[..]);
        let mut loaded = AssetPackage::new();
        assert!(matches!(
            loaded.load(&mut reader),
            Err(AssetError::EntryOutOfBounds)
        ));
        assert!(reader.is_failed());
        assert!(loaded.is_empty());

        // Overflowing offset + size must not wrap around
        package.entries[0].size = u64::MAX;
        bytes.clear();
        package.write_to(&mut bytes).unwrap();
        assert!(matches!(
            AssetPackage::read_from(&bytes[..]),
            Err(AssetError::EntryOutOfBounds)
        ));
    }

    #[test]
    fn failed_load_discards_previous_contents() {
        let good = mock_package_bytes(b"NGPKG");
        let mut package = AssetPackage::read_from(&good[..]).unwrap();
        assert_eq!(package.len(), 1);

        let bad = mock_package_bytes(b"NZPSG");
        assert!(!package.try_load(&mut PackageReader::new(&bad[..])));
        assert!(package.is_empty());
        assert!(package.blob().is_empty());
    }

    #[test]
    fn round_trip() {
        let mut builder = AssetPackageBuilder::new();
        builder
            .add_entry("texture", "ng.texture", 2, &[1, 2, 3, 4])
            .add_entry("empty", "ng.raw", 0, &[])
            .add_entry("mesh", "ng.mesh", 1, &[9; 100]);
        let package = builder.build();

        let mut bytes = Vec::default();
        package.write_to(&mut bytes).unwrap();
        assert_eq!(&bytes[0..5], b"NGPKG");

        let loaded = AssetPackage::read_from(&bytes[..]).unwrap();
        assert_eq!(loaded, package);
        assert_eq!(loaded.entries()[2].offset, 4);
        assert!(loaded.view(1).is_empty());
        assert_eq!(loaded.view_by_name(&Name::new("mesh")).len(), 100);
    }

    #[test]
    fn checked_access() {
        let mut builder = AssetPackageBuilder::new();
        builder.add_entry("a", "ng.raw", 0, b"a");
        let package = builder.build();

        assert_eq!(package.at(0).unwrap().bytes(), b"a");
        assert!(matches!(package.at(1), Err(AssetError::EntryIndexOutOfRange)));
        assert!(matches!(
            package.at_name(&Name::new("b")),
            Err(AssetError::EntryNotFound)
        ));
        assert_eq!(package.index_of(&Name::new("b")), package.len());
    }

    #[test]
    fn empty_package_round_trip() {
        let package = AssetPackage::new();
        let mut bytes = Vec::default();
        package.write_to(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 5 + 1 + 8 + 8);
        assert_eq!(AssetPackage::read_from(&bytes[..]).unwrap(), package);
    }
}
