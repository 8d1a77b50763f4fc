use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // BGZF wire format errors
    #[error("Invalid BGZF magic bytes: expected 0x1f8b, got 0x{0:04x}")]
    InvalidMagic(u16),

    #[error("Unsupported compression method: {0} (only DEFLATE/8 supported)")]
    UnsupportedCompressionMethod(u8),

    #[error("Invalid BGZF extra field: {field} = {found}, expected {expected}")]
    InvalidExtraField { field: &'static str, found: u32, expected: u32 },

    #[error("Truncated input: needed {expected} bytes of {context}, got {found}")]
    TruncatedInput { context: &'static str, expected: usize, found: usize },

    #[error("BGZF member too large: {size} bytes exceeds maximum {max}")]
    BlockTooLarge { size: usize, max: usize },

    // Decompressor internal errors
    #[error("DEFLATE decompression failed: {0}")]
    Decompress(String),

    // Checksum / size verification errors
    #[error("CRC32 mismatch: expected 0x{expected:08x}, got 0x{found:08x}")]
    Crc32Mismatch { expected: u32, found: u32 },

    #[error("Uncompressed size mismatch: expected {expected} bytes, got {found}")]
    SizeMismatch { expected: u32, found: u32 },

    // Internal errors
    #[error("Worker thread panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, Error>;
