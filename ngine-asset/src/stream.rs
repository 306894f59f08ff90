use std::io::{Read, Write};

use crate::{AssetError, AssetResult};

// Every integer in a package is stored little-endian, converted to host order at the edges

/// Reads package primitives from a byte source. Any failed read leaves the reader failed, and every
/// later read returns [`AssetError::StreamFailed`] without touching the source.
pub struct PackageReader<R: Read> {
    inner: R,
    failed: bool,
}

impl<R: Read> PackageReader<R> {
    pub fn new(inner: R) -> Self {
        PackageReader {
            inner,
            failed: false,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fail<T>(
        &mut self,
        error: AssetError,
    ) -> AssetResult<T> {
        self.failed = true;
        Err(error)
    }

    fn read_exact(
        &mut self,
        buf: &mut [u8],
        context: &'static str,
    ) -> AssetResult<()> {
        if self.failed {
            return Err(AssetError::StreamFailed);
        }

        match self.inner.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.fail(AssetError::Truncated(context))
            }
            Err(e) => self.fail(e.into()),
        }
    }

    pub fn read_u8(
        &mut self,
        context: &'static str,
    ) -> AssetResult<u8> {
        let mut buf = [0; 1];
        self.read_exact(&mut buf, context)?;
        Ok(buf[0])
    }

    pub fn read_u64(
        &mut self,
        context: &'static str,
    ) -> AssetResult<u64> {
        let mut buf = [0; 8];
        self.read_exact(&mut buf, context)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Reads exactly `len` bytes. The declared length is not trusted for allocation, the buffer
    /// only grows as far as the source actually yields.
    pub fn read_bytes(
        &mut self,
        len: u64,
        context: &'static str,
    ) -> AssetResult<Vec<u8>> {
        if self.failed {
            return Err(AssetError::StreamFailed);
        }

        let mut bytes = Vec::default();
        match (&mut self.inner).take(len).read_to_end(&mut bytes) {
            Ok(read) if read as u64 == len => Ok(bytes),
            Ok(_) => self.fail(AssetError::Truncated(context)),
            Err(e) => self.fail(e.into()),
        }
    }

    /// Reads a u64 length prefix followed by that many bytes of UTF-8
    pub fn read_string(
        &mut self,
        context: &'static str,
    ) -> AssetResult<String> {
        let len = self.read_u64(context)?;
        let bytes = self.read_bytes(len, context)?;
        match String::from_utf8(bytes) {
            Ok(string) => Ok(string),
            Err(_) => self.fail(AssetError::InvalidString(context)),
        }
    }
}

/// Writes package primitives to a byte sink, with the same sticky failure behavior as
/// [`PackageReader`]
pub struct PackageWriter<W: Write> {
    inner: W,
    failed: bool,
}

impl<W: Write> PackageWriter<W> {
    pub fn new(inner: W) -> Self {
        PackageWriter {
            inner,
            failed: false,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_bytes(
        &mut self,
        bytes: &[u8],
    ) -> AssetResult<()> {
        if self.failed {
            return Err(AssetError::StreamFailed);
        }

        self.inner.write_all(bytes).map_err(|e| {
            self.failed = true;
            e.into()
        })
    }

    pub fn write_u8(
        &mut self,
        value: u8,
    ) -> AssetResult<()> {
        self.write_bytes(&[value])
    }

    pub fn write_u64(
        &mut self,
        value: u64,
    ) -> AssetResult<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_string(
        &mut self,
        value: &str,
    ) -> AssetResult<()> {
        self.write_u64(value.len() as u64)?;
        self.write_bytes(value.as_bytes())
    }

    pub fn flush(&mut self) -> AssetResult<()> {
        if self.failed {
            return Err(AssetError::StreamFailed);
        }

        self.inner.flush().map_err(|e| {
            self.failed = true;
            e.into()
        })
    }
}
