//! BGZF member header and footer decoding.
//!
//! Every field is hand-decoded with explicit little-endian extraction; the
//! 18-byte header layout is never reinterpreted in place, so parsing is
//! byte-order portable.

use super::constants::*;
use crate::error::{Error, Result};
use crate::util::extract_little_endian;

/// Decoded fields of interest from one 18-byte BGZF member header.
#[derive(Clone, Copy, Debug)]
pub struct BlockHeader {
    /// Total member size minus one, from the BC subfield.
    pub bsize: u16,
}

impl BlockHeader {
    /// Validates and decodes a raw 18-byte header.
    ///
    /// The validation chain is strict: BGZF readers must reject anything
    /// that is not the exact gzip-with-BC-subfield shape, because a
    /// mis-framed member desynchronizes every member after it.
    pub fn parse(raw: &[u8; BGZF_HEADER_SIZE]) -> Result<Self> {
        if raw[0] != GZIP_ID1 || raw[1] != GZIP_ID2 {
            return Err(Error::InvalidMagic(u16::from(raw[0]) << 8 | u16::from(raw[1])));
        }
        if raw[2] != GZIP_CM_DEFLATE {
            return Err(Error::UnsupportedCompressionMethod(raw[2]));
        }
        if raw[3] & GZIP_FLG_FEXTRA == 0 {
            return Err(Error::InvalidExtraField {
                field: "FLG.FEXTRA",
                found: u32::from(raw[3]),
                expected: u32::from(GZIP_FLG_FEXTRA),
            });
        }
        let xlen = extract_little_endian::<u16>(&raw[10..]);
        if xlen != BGZF_XLEN {
            return Err(Error::InvalidExtraField {
                field: "XLEN",
                found: u32::from(xlen),
                expected: u32::from(BGZF_XLEN),
            });
        }
        if raw[12] != BGZF_SI1 || raw[13] != BGZF_SI2 {
            return Err(Error::InvalidExtraField {
                field: "SI1/SI2",
                found: u32::from(raw[12]) << 8 | u32::from(raw[13]),
                expected: u32::from(BGZF_SI1) << 8 | u32::from(BGZF_SI2),
            });
        }
        let slen = extract_little_endian::<u16>(&raw[14..]);
        if slen != BGZF_SLEN {
            return Err(Error::InvalidExtraField {
                field: "SLEN",
                found: u32::from(slen),
                expected: u32::from(BGZF_SLEN),
            });
        }
        let bsize = extract_little_endian::<u16>(&raw[16..]);
        // A member can never be smaller than its fixed framing.
        if usize::from(bsize) + 1 < BGZF_HEADER_SIZE + BGZF_FOOTER_SIZE {
            return Err(Error::InvalidExtraField {
                field: "BSIZE",
                found: u32::from(bsize),
                expected: (BGZF_HEADER_SIZE + BGZF_FOOTER_SIZE - 1) as u32,
            });
        }
        Ok(Self { bsize })
    }

    /// Size of the compressed payload: BSIZE - XLEN - 19.
    #[inline]
    pub fn cdata_size(&self) -> usize {
        usize::from(self.bsize) - usize::from(BGZF_XLEN) - usize::from(BGZF_NON_DATA_SIZE)
    }
}

/// Decoded 8-byte member footer.
#[derive(Clone, Copy, Debug)]
pub struct BlockFooter {
    pub crc32: u32,
    /// Uncompressed length of this member.
    pub isize: u32,
}

impl BlockFooter {
    pub fn parse(raw: &[u8]) -> Self {
        debug_assert!(raw.len() >= BGZF_FOOTER_SIZE);
        Self {
            crc32: extract_little_endian::<u32>(raw),
            isize: extract_little_endian::<u32>(&raw[4..]),
        }
    }
}
