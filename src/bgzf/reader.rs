//! Per-worker BGZF member loading and decompression.
//!
//! A [`BlockReader`] owns everything one worker needs to turn a compressed
//! member into uncompressed bytes: a fixed-capacity scratch buffer holding
//! the member's CDATA and footer, and a DEFLATE decompressor whose window
//! is allocated once at construction. Nothing allocates per block.

use std::io::Read;

use super::constants::*;
use super::header::{BlockFooter, BlockHeader};
use crate::error::{Error, Result};
use crate::util::BoundedVec;

/// Reads `buf.len()` bytes unless the stream ends first; returns the number
/// of bytes actually read. Unlike `read_exact`, a clean end of input is
/// distinguishable from a short read mid-record.
fn read_fully<R: Read>(input: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

pub struct BlockReader {
    /// CDATA + footer of the member most recently loaded.
    scratch: BoundedVec<u8, COMPRESSED_SCRATCH_SIZE>,
    inflater: libdeflater::Decompressor,
}

impl BlockReader {
    pub fn new() -> Self {
        Self { scratch: BoundedVec::new(), inflater: libdeflater::Decompressor::new() }
    }

    /// Loads the next member from `input` into the scratch buffer.
    ///
    /// Returns the member's uncompressed size (`ISIZE`), or `None` on a
    /// clean end of input. Empty terminator members come back as `Some(0)`;
    /// callers skip them. A stream that ends mid-member is `TruncatedInput`.
    pub fn read_block<R: Read>(&mut self, input: &mut R) -> Result<Option<u32>> {
        self.scratch.clear();

        let mut raw_header = [0u8; BGZF_HEADER_SIZE];
        let got = read_fully(input, &mut raw_header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < BGZF_HEADER_SIZE {
            return Err(Error::TruncatedInput {
                context: "BGZF member header",
                expected: BGZF_HEADER_SIZE,
                found: got,
            });
        }
        let header = BlockHeader::parse(&raw_header)?;

        let body_size = header.cdata_size() + BGZF_FOOTER_SIZE;
        self.scratch.resize(body_size, 0);
        let got = read_fully(input, &mut self.scratch[..])?;
        if got < body_size {
            return Err(Error::TruncatedInput {
                context: "BGZF member CDATA and footer",
                expected: body_size,
                found: got,
            });
        }

        let footer = BlockFooter::parse(&self.scratch[body_size - BGZF_FOOTER_SIZE..]);
        Ok(Some(footer.isize))
    }

    /// Decompresses the currently loaded member into `out`, which must be
    /// exactly `ISIZE` bytes.
    ///
    /// Verifies both the produced byte count and the footer CRC32, so every
    /// delivered block is known good before the caller ever parses it.
    pub fn decompress(&mut self, out: &mut [u8]) -> Result<()> {
        let body = self.scratch.as_slice();
        debug_assert!(body.len() >= BGZF_FOOTER_SIZE, "no member loaded");
        let (cdata, raw_footer) = body.split_at(body.len() - BGZF_FOOTER_SIZE);
        let footer = BlockFooter::parse(raw_footer);

        let produced = self
            .inflater
            .deflate_decompress(cdata, out)
            .map_err(|e| Error::Decompress(e.to_string()))?;
        if produced != out.len() {
            return Err(Error::SizeMismatch { expected: out.len() as u32, found: produced as u32 });
        }
        let crc = crc32fast::hash(out);
        if crc != footer.crc32 {
            return Err(Error::Crc32Mismatch { expected: footer.crc32, found: crc });
        }
        Ok(())
    }
}

impl Default for BlockReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bgzf::writer::BgzfWriter;
    use std::io::Cursor;

    fn single_member(payload: &[u8]) -> Vec<u8> {
        let mut encoded = Vec::new();
        let mut writer = BgzfWriter::new(&mut encoded);
        writer.write_block(payload).unwrap();
        writer.finish().unwrap();
        encoded
    }

    #[test]
    fn test_read_block_reports_isize() {
        let payload = b"the quick brown fox jumps over the lazy dog";
        let mut input = Cursor::new(single_member(payload));
        let mut reader = BlockReader::new();
        assert_eq!(reader.read_block(&mut input).unwrap(), Some(payload.len() as u32));
    }

    #[test]
    fn test_decompress_round_trip() {
        let payload = b"GATTACAGATTACAGATTACA".repeat(100);
        let mut input = Cursor::new(single_member(&payload));
        let mut reader = BlockReader::new();
        let size = reader.read_block(&mut input).unwrap().unwrap() as usize;
        let mut out = vec![0u8; size];
        reader.decompress(&mut out).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn test_empty_member_is_some_zero() {
        let mut input = Cursor::new(BGZF_EOF.to_vec());
        let mut reader = BlockReader::new();
        assert_eq!(reader.read_block(&mut input).unwrap(), Some(0));
        assert_eq!(reader.read_block(&mut input).unwrap(), None);
    }

    #[test]
    fn test_clean_eof_is_none() {
        let mut input = Cursor::new(Vec::<u8>::new());
        let mut reader = BlockReader::new();
        assert_eq!(reader.read_block(&mut input).unwrap(), None);
    }

    #[test]
    fn test_truncated_header_fails() {
        let member = single_member(b"payload");
        let mut input = Cursor::new(member[..10].to_vec());
        let mut reader = BlockReader::new();
        assert!(matches!(
            reader.read_block(&mut input),
            Err(Error::TruncatedInput { context: "BGZF member header", .. })
        ));
    }

    #[test]
    fn test_truncated_body_fails() {
        let member = single_member(b"payload");
        // Cut past the 28-byte terminator and into the data member's footer.
        let mut input = Cursor::new(member[..member.len() - 31].to_vec());
        let mut reader = BlockReader::new();
        assert!(matches!(
            reader.read_block(&mut input),
            Err(Error::TruncatedInput { context: "BGZF member CDATA and footer", .. })
        ));
    }

    #[test]
    fn test_corrupt_crc_fails() {
        let payload = b"corruption target";
        let mut member = single_member(payload);
        // Flip a bit in the stored CRC32 (footer starts 8 bytes from the
        // member end; the trailing 28 bytes are the EOF terminator).
        let crc_pos = member.len() - 28 - 8;
        member[crc_pos] ^= 0x01;
        let mut input = Cursor::new(member);
        let mut reader = BlockReader::new();
        let size = reader.read_block(&mut input).unwrap().unwrap() as usize;
        let mut out = vec![0u8; size];
        assert!(matches!(reader.decompress(&mut out), Err(Error::Crc32Mismatch { .. })));
    }
}
