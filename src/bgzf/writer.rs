//! BGZF member encoder.

use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::Compression;

use super::constants::*;
use crate::error::{Error, Result};

/// Writes a byte stream as a sequence of BGZF members.
///
/// Each `write_block` call produces one self-delimiting member; `finish`
/// appends the canonical empty terminator. Members are capped at
/// [`BGZF_BLOCK_SIZE`] uncompressed bytes so the compressed member always
/// fits the 16-bit BSIZE field.
pub struct BgzfWriter<W: Write> {
    writer: W,
    level: Compression,
}

impl<W: Write> BgzfWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, level: Compression::default() }
    }

    pub fn with_level(writer: W, level: Compression) -> Self {
        Self { writer, level }
    }

    /// Compress and write one member holding `uncompressed`.
    pub fn write_block(&mut self, uncompressed: &[u8]) -> Result<()> {
        assert!(
            uncompressed.len() <= BGZF_BLOCK_SIZE,
            "BGZF member payload limited to {} bytes",
            BGZF_BLOCK_SIZE
        );

        let mut encoder = DeflateEncoder::new(Vec::new(), self.level);
        encoder.write_all(uncompressed)?;
        let cdata = encoder.finish()?;

        let block_size = BGZF_HEADER_SIZE + cdata.len() + BGZF_FOOTER_SIZE;
        if block_size > MAX_BGZF_BLOCK_SIZE {
            return Err(Error::BlockTooLarge { size: block_size, max: MAX_BGZF_BLOCK_SIZE });
        }

        let crc = crc32fast::hash(uncompressed);

        self.write_header(block_size - 1)?; // BSIZE stores size - 1
        self.writer.write_all(&cdata)?;
        self.writer.write_all(&crc.to_le_bytes())?;
        self.writer.write_all(&(uncompressed.len() as u32).to_le_bytes())?;

        Ok(())
    }

    /// Write the 18-byte member header.
    fn write_header(&mut self, bsize: usize) -> Result<()> {
        let header = [
            GZIP_ID1,
            GZIP_ID2,
            GZIP_CM_DEFLATE,
            GZIP_FLG_FEXTRA,
            0x00,
            0x00,
            0x00,
            0x00, // mtime
            0x00, // extra flags
            0xff, // OS (unknown)
            0x06,
            0x00, // xlen = 6
            BGZF_SI1,
            BGZF_SI2,
            0x02,
            0x00,                        // subfield length = 2
            (bsize & 0xFF) as u8,        // BSIZE low byte
            ((bsize >> 8) & 0xFF) as u8, // BSIZE high byte
        ];
        self.writer.write_all(&header)?;
        Ok(())
    }

    /// Write the empty terminator member.
    pub fn write_eof(&mut self) -> Result<()> {
        self.writer.write_all(&BGZF_EOF)?;
        Ok(())
    }

    /// Terminate the stream and flush, returning the inner writer.
    pub fn finish(mut self) -> Result<W> {
        self.write_eof()?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }
}
