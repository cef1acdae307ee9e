//! Compression codec infrastructure for page archive entries.
//!
//! Entries are either stored verbatim or compressed with raw deflate, the
//! two methods every ZIP consumer understands. Already-compressed media is
//! always stored (see [`crate::archiver::NO_COMPRESSION_EXTENSIONS`]).

#[cfg(feature = "deflate")]
pub mod deflate;

mod copy;

use crate::{Error, Result};
use std::io::{self, Read, Write};

/// A decoder that reads compressed data and produces uncompressed output.
pub trait Decoder: Read {
    /// Returns the ZIP method identifier for this decoder.
    fn method_id(&self) -> u16;
}

/// An encoder that takes uncompressed data and produces compressed output.
pub trait Encoder: Write {
    /// Returns the ZIP method identifier for this encoder.
    fn method_id(&self) -> u16;

    /// Finishes encoding and flushes any remaining data.
    fn finish(self: Box<Self>) -> io::Result<()>;
}

pub use copy::{CopyDecoder, CopyEncoder};

#[cfg(feature = "deflate")]
pub use deflate::{DeflateDecoder, DeflateEncoder, DeflateEncoderOptions};

/// ZIP compression method identifiers.
pub mod method {
    /// Stored (no compression).
    pub const STORED: u16 = 0;
    /// Raw deflate.
    pub const DEFLATE: u16 = 8;
}

/// Compression method applied to an entry payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMethod {
    /// Payload stored verbatim.
    Stored,
    /// Raw deflate.
    #[default]
    Deflate,
}

impl CompressionMethod {
    /// Returns the ZIP method identifier.
    pub fn id(self) -> u16 {
        match self {
            Self::Stored => method::STORED,
            Self::Deflate => method::DEFLATE,
        }
    }

    /// Maps a ZIP method identifier to a method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] for any other identifier.
    pub fn from_id(id: u16) -> Result<Self> {
        match id {
            method::STORED => Ok(Self::Stored),
            method::DEFLATE => Ok(Self::Deflate),
            other => Err(Error::UnsupportedMethod { method: other }),
        }
    }

    /// Returns a short human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::Deflate => "deflate",
        }
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds an encoder writing compressed bytes into `output`.
///
/// Deflate at level 0 is still emitted as deflate; callers that want no
/// compression choose [`CompressionMethod::Stored`].
pub fn build_encoder<'a, W: Write + 'a>(
    method: CompressionMethod,
    level: u32,
    output: W,
) -> Result<Box<dyn Encoder + 'a>> {
    match method {
        CompressionMethod::Stored => Ok(Box::new(CopyEncoder::new(output))),
        #[cfg(feature = "deflate")]
        CompressionMethod::Deflate => {
            let options = DeflateEncoderOptions::with_level(level);
            Ok(Box::new(DeflateEncoder::new(output, &options)))
        }
        #[cfg(not(feature = "deflate"))]
        CompressionMethod::Deflate => {
            let _ = (level, output);
            Err(Error::UnsupportedMethod {
                method: method::DEFLATE,
            })
        }
    }
}

/// Builds a decoder producing at most `size` uncompressed bytes from `input`.
pub fn build_decoder<'a, R: io::BufRead + 'a>(
    method: CompressionMethod,
    input: R,
    size: u64,
) -> Result<Box<dyn Decoder + 'a>> {
    match method {
        CompressionMethod::Stored => Ok(Box::new(CopyDecoder::new(input, size))),
        #[cfg(feature = "deflate")]
        CompressionMethod::Deflate => Ok(Box::new(DeflateDecoder::new(input))),
        #[cfg(not(feature = "deflate"))]
        CompressionMethod::Deflate => {
            let _ = (input, size);
            Err(Error::UnsupportedMethod {
                method: method::DEFLATE,
            })
        }
    }
}

/// Compresses `data` in one call.
pub fn compress(method: CompressionMethod, level: u32, data: &[u8]) -> Result<Vec<u8>> {
    let mut compressed = Vec::with_capacity(data.len() / 2 + 64);
    {
        let mut encoder = build_encoder(method, level, &mut compressed)?;
        encoder.write_all(data).map_err(Error::Io)?;
        encoder.finish().map_err(Error::Io)?;
    }
    Ok(compressed)
}

/// Decompresses `data` in one call, expecting `size` output bytes.
///
/// # Errors
///
/// Returns [`Error::CorruptHeader`] when the decoded length differs from
/// `size`, so a truncated or padded payload is never accepted silently.
pub fn decompress(method: CompressionMethod, data: &[u8], size: u64) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut decoder = build_decoder(method, data, size)?;
    // Read one byte past the declared size so oversize payloads are detected.
    decoder
        .by_ref()
        .take(size.saturating_add(1))
        .read_to_end(&mut output)
        .map_err(Error::Io)?;
    if output.len() as u64 != size {
        return Err(Error::CorruptHeader {
            offset: 0,
            reason: format!(
                "decoded {} bytes, expected {} ({})",
                output.len(),
                size,
                method
            ),
        });
    }
    Ok(output)
}
