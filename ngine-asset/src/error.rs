use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum AssetError {
    StringError(String),
    IoError(Arc<std::io::Error>),
    BincodeError(Arc<bincode::Error>),
    JsonError(Arc<serde_json::Error>),
    // Package bytes did not start with "NGPKG"
    InvalidMagicHeader,
    // The stream ended while reading the named part of a package
    Truncated(&'static str),
    InvalidString(&'static str),
    // An entry's offset + size lies outside the package blob
    EntryOutOfBounds,
    // An earlier read or write on the stream already failed
    StreamFailed,
    EntryIndexOutOfRange,
    EntryNotFound,
    PackageNotFound,
    InvalidAssetPath,
    AssetTypeAlreadyRegistered,
    UnknownAssetType,
    AssetTypeMismatch,
    // A nested load requested an asset whose own load is still in progress
    CyclicReference,
    InvalidArchive,
}

pub type AssetResult<T> = Result<T, AssetError>;

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            AssetError::IoError(ref e) => Some(&**e),
            AssetError::BincodeError(ref e) => Some(&**e),
            AssetError::JsonError(ref e) => Some(&**e),
            _ => None,
        }
    }
}

impl core::fmt::Display for AssetError {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter,
    ) -> core::fmt::Result {
        match *self {
            AssetError::StringError(ref e) => e.fmt(fmt),
            AssetError::IoError(ref e) => e.fmt(fmt),
            AssetError::BincodeError(ref e) => e.fmt(fmt),
            AssetError::JsonError(ref e) => e.fmt(fmt),
            AssetError::InvalidMagicHeader => "InvalidMagicHeader".fmt(fmt),
            AssetError::Truncated(context) => write!(fmt, "Truncated while reading {}", context),
            AssetError::InvalidString(context) => {
                write!(fmt, "InvalidString while reading {}", context)
            }
            AssetError::EntryOutOfBounds => "EntryOutOfBounds".fmt(fmt),
            AssetError::StreamFailed => "StreamFailed".fmt(fmt),
            AssetError::EntryIndexOutOfRange => "EntryIndexOutOfRange".fmt(fmt),
            AssetError::EntryNotFound => "EntryNotFound".fmt(fmt),
            AssetError::PackageNotFound => "PackageNotFound".fmt(fmt),
            AssetError::InvalidAssetPath => "InvalidAssetPath".fmt(fmt),
            AssetError::AssetTypeAlreadyRegistered => "AssetTypeAlreadyRegistered".fmt(fmt),
            AssetError::UnknownAssetType => "UnknownAssetType".fmt(fmt),
            AssetError::AssetTypeMismatch => "AssetTypeMismatch".fmt(fmt),
            AssetError::CyclicReference => "CyclicReference".fmt(fmt),
            AssetError::InvalidArchive => "InvalidArchive".fmt(fmt),
        }
    }
}

impl From<&str> for AssetError {
    fn from(str: &str) -> Self {
        AssetError::StringError(str.to_string())
    }
}

impl From<String> for AssetError {
    fn from(string: String) -> Self {
        AssetError::StringError(string)
    }
}

impl From<std::io::Error> for AssetError {
    fn from(error: std::io::Error) -> Self {
        AssetError::IoError(Arc::new(error))
    }
}

impl From<bincode::Error> for AssetError {
    fn from(error: bincode::Error) -> Self {
        AssetError::BincodeError(Arc::new(error))
    }
}

impl From<serde_json::Error> for AssetError {
    fn from(error: serde_json::Error) -> Self {
        AssetError::JsonError(Arc::new(error))
    }
}
