// src/compression/mod.rs
//! Compression helpers for the Debian sub-archives and the Arch output
//!
//! A `.deb` may carry its control and data tarballs uncompressed or
//! compressed with gzip, xz, zstd or bzip2, selected by member name suffix.
//! Old packages may also carry a legacy `.lzma` data tarball.
//! The Arch side needs gzip (for `.MTREE`) and zstd (for the package itself).

use std::io::{self, Read, Write};
use thiserror::Error;

/// Compression-related errors
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Failed to create {format} decoder: {source}")]
    DecoderCreation {
        format: &'static str,
        source: io::Error,
    },

    #[error("Failed to decompress {format} data: {source}")]
    Decompression {
        format: &'static str,
        source: io::Error,
    },

    #[error("Failed to compress {format} data: {source}")]
    Compression {
        format: &'static str,
        source: io::Error,
    },
}

/// Supported compression formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// No compression (raw data)
    None,
    /// Gzip compression (.gz)
    Gzip,
    /// XZ/LZMA compression (.xz)
    Xz,
    /// Zstandard compression (.zst)
    Zstd,
    /// Bzip2 compression (.bz2)
    Bzip2,
    /// Legacy LZMA-alone compression (.lzma), data tarballs only
    Lzma,
}

impl CompressionFormat {
    /// Probe order used when a container could carry more than one candidate
    /// member: the compressed formats first, then the plain tarball.
    pub const PROBE_ORDER: [CompressionFormat; 5] = [
        Self::Gzip,
        Self::Xz,
        Self::Zstd,
        Self::Bzip2,
        Self::None,
    ];

    /// Probe order for the data tarball, which may also be `.lzma`
    pub const DATA_PROBE_ORDER: [CompressionFormat; 6] = [
        Self::Gzip,
        Self::Xz,
        Self::Zstd,
        Self::Bzip2,
        Self::Lzma,
        Self::None,
    ];

    /// Detect compression format from file extension
    ///
    /// # Examples
    /// ```
    /// use deb2arch::compression::CompressionFormat;
    ///
    /// assert_eq!(CompressionFormat::from_extension("data.tar.gz"), CompressionFormat::Gzip);
    /// assert_eq!(CompressionFormat::from_extension("data.tar.bz2"), CompressionFormat::Bzip2);
    /// assert_eq!(CompressionFormat::from_extension("data.tar"), CompressionFormat::None);
    /// ```
    pub fn from_extension(path: &str) -> Self {
        if path.ends_with(".gz") || path.ends_with(".tgz") {
            Self::Gzip
        } else if path.ends_with(".xz") {
            Self::Xz
        } else if path.ends_with(".zst") || path.ends_with(".zstd") {
            Self::Zstd
        } else if path.ends_with(".bz2") {
            Self::Bzip2
        } else if path.ends_with(".lzma") {
            Self::Lzma
        } else {
            Self::None
        }
    }

    /// Detect compression format from magic bytes
    ///
    /// Magic bytes:
    /// - Gzip: `1f 8b`
    /// - XZ: `fd 37 7a 58 5a 00`
    /// - Zstd: `28 b5 2f fd`
    /// - Bzip2: `42 5a 68` ("BZh")
    /// - LZMA-alone: `5d 00 00` (default properties)
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(&[0x1f, 0x8b]) {
            Self::Gzip
        } else if data.starts_with(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00]) {
            Self::Xz
        } else if data.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Self::Zstd
        } else if data.starts_with(b"BZh") {
            Self::Bzip2
        } else if data.starts_with(&[0x5d, 0x00, 0x00]) {
            Self::Lzma
        } else {
            Self::None
        }
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Gzip => ".gz",
            Self::Xz => ".xz",
            Self::Zstd => ".zst",
            Self::Bzip2 => ".bz2",
            Self::Lzma => ".lzma",
        }
    }

    /// Get a human-readable name for this format
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
            Self::Bzip2 => "bzip2",
            Self::Lzma => "lzma",
        }
    }
}

impl std::fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Create a decompressing reader for the given format
///
/// For `CompressionFormat::None`, returns the reader unchanged.
pub fn create_decoder<'a, R: Read + 'a>(
    reader: R,
    format: CompressionFormat,
) -> Result<Box<dyn Read + 'a>, CompressionError> {
    match format {
        CompressionFormat::None => Ok(Box::new(reader)),
        CompressionFormat::Gzip => Ok(Box::new(flate2::read::GzDecoder::new(reader))),
        CompressionFormat::Xz => Ok(Box::new(xz2::read::XzDecoder::new(reader))),
        CompressionFormat::Bzip2 => Ok(Box::new(bzip2::read::BzDecoder::new(reader))),
        CompressionFormat::Lzma => {
            let stream = xz2::stream::Stream::new_lzma_decoder(u64::MAX).map_err(|e| {
                CompressionError::DecoderCreation {
                    format: "lzma",
                    source: e.into(),
                }
            })?;
            Ok(Box::new(xz2::read::XzDecoder::new_stream(reader, stream)))
        }
        CompressionFormat::Zstd => {
            let decoder = zstd::Decoder::new(reader).map_err(|e| CompressionError::DecoderCreation {
                format: "zstd",
                source: e,
            })?;
            Ok(Box::new(decoder))
        }
    }
}

/// Decompress a byte slice using the specified format
pub fn decompress(data: &[u8], format: CompressionFormat) -> Result<Vec<u8>, CompressionError> {
    let mut decoder = create_decoder(data, format)?;
    let mut output = Vec::new();
    decoder
        .read_to_end(&mut output)
        .map_err(|e| CompressionError::Decompression {
            format: format.name(),
            source: e,
        })?;
    Ok(output)
}

/// Compress a byte slice using the specified format
pub fn compress(data: &[u8], format: CompressionFormat) -> Result<Vec<u8>, CompressionError> {
    let wrap = |source: io::Error| CompressionError::Compression {
        format: format.name(),
        source,
    };

    match format {
        CompressionFormat::None => Ok(data.to_vec()),
        CompressionFormat::Gzip => {
            let mut encoder =
                flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data).map_err(wrap)?;
            encoder.finish().map_err(wrap)
        }
        CompressionFormat::Xz => {
            let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
            encoder.write_all(data).map_err(wrap)?;
            encoder.finish().map_err(wrap)
        }
        CompressionFormat::Zstd => zstd::encode_all(data, ZSTD_LEVEL).map_err(wrap),
        CompressionFormat::Bzip2 => {
            let mut encoder =
                bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
            encoder.write_all(data).map_err(wrap)?;
            encoder.finish().map_err(wrap)
        }
        CompressionFormat::Lzma => {
            let options = xz2::stream::LzmaOptions::new_preset(6).map_err(|e| wrap(e.into()))?;
            let stream =
                xz2::stream::Stream::new_lzma_encoder(&options).map_err(|e| wrap(e.into()))?;
            let mut encoder = xz2::write::XzEncoder::new_stream(Vec::new(), stream);
            encoder.write_all(data).map_err(wrap)?;
            encoder.finish().map_err(wrap)
        }
    }
}

/// Zstd level used for Arch packages (matches makepkg's default)
pub const ZSTD_LEVEL: i32 = 19;
