use std::fmt::{Debug, Formatter};

use ngine_base::Name;

use crate::package::AssetEntry;
use crate::AssetPackage;

lazy_static::lazy_static! {
    static ref EMPTY_ENTRY: AssetEntry = AssetEntry::default();
}

/// Read-only window onto one entry's payload inside a resident package. Borrows the package, so
/// the view cannot outlive it.
#[derive(Clone, Copy)]
pub struct AssetView<'a> {
    package: &'a AssetPackage,
    entry: &'a AssetEntry,
    index: usize,
    bytes: &'a [u8],
}

impl<'a> AssetView<'a> {
    pub(crate) fn new(
        package: &'a AssetPackage,
        index: usize,
        entry: &'a AssetEntry,
    ) -> Self {
        AssetView {
            package,
            entry,
            index,
            bytes: package.entry_bytes(entry),
        }
    }

    // Returned by the unchecked accessors for an out of range index
    pub(crate) fn empty(package: &'a AssetPackage) -> Self {
        AssetView {
            package,
            entry: &EMPTY_ENTRY,
            index: package.len(),
            bytes: &[],
        }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn name(&self) -> &'a Name {
        &self.entry.name
    }

    pub fn asset_type(&self) -> &'a Name {
        &self.entry.asset_type
    }

    pub fn version(&self) -> u8 {
        self.entry.version
    }

    /// Index of the entry in its package, `package().len()` for an empty view
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn package(&self) -> &'a AssetPackage {
        self.package
    }
}

impl AsRef<[u8]> for AssetView<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

impl<'a> IntoIterator for AssetView<'a> {
    type Item = &'a u8;
    type IntoIter = std::slice::Iter<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.bytes.iter()
    }
}

impl Debug for AssetView<'_> {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("AssetView")
            .field("package", &self.package.path())
            .field("index", &self.index)
            .field("name", self.name())
            .field("asset_type", self.asset_type())
            .field("version", &self.version())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use crate::AssetPackageBuilder;

    #[test]
    fn view_exposes_entry_metadata() {
        let mut builder = AssetPackageBuilder::new();
        builder
            .add_entry("first", "ng.raw", 0, b"xy")
            .add_entry("second", "ng.text", 3, b"hello");
        let mut package = builder.build();
        package.set_path("packages/common");

        let view = package.view(1);
        assert_eq!(view.name(), "second");
        assert_eq!(view.asset_type(), "ng.text");
        assert_eq!(view.version(), 3);
        assert_eq!(view.index(), 1);
        assert_eq!(view.package().path(), "packages/common");
        assert_eq!(view.as_ref(), b"hello");
        assert_eq!(view.into_iter().copied().collect::<Vec<u8>>(), b"hello".to_vec());
    }

    // Release builds hand out an empty view, debug builds assert
    #[cfg(not(debug_assertions))]
    #[test]
    fn out_of_range_view_is_empty() {
        let package = AssetPackageBuilder::new().build();
        let view = package.view(3);
        assert!(view.is_empty());
        assert!(view.name().is_empty());
        assert_eq!(view.index(), package.len());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic]
    fn out_of_range_view_asserts() {
        let package = AssetPackageBuilder::new().build();
        package.view(3);
    }
}
