/// BGZF header size (gzip header with the BC extra field)
pub const BGZF_HEADER_SIZE: usize = 18;

/// BGZF footer size (CRC32 + ISIZE)
pub const BGZF_FOOTER_SIZE: usize = 8;

/// Maximum total size of one BGZF member (BSIZE is a u16 storing size - 1)
pub const MAX_BGZF_BLOCK_SIZE: usize = 65536;

/// Default/recommended uncompressed payload size per member
pub const BGZF_BLOCK_SIZE: usize = 65280;

/// Per-worker scratch capacity: CDATA + footer of one member
pub const COMPRESSED_SCRATCH_SIZE: usize = 0xFFFF;

pub const GZIP_ID1: u8 = 0x1f;
pub const GZIP_ID2: u8 = 0x8b;
pub const GZIP_CM_DEFLATE: u8 = 8;
pub const GZIP_FLG_FEXTRA: u8 = 0x04;

pub const BGZF_XLEN: u16 = 6;
pub const BGZF_SI1: u8 = b'B';
pub const BGZF_SI2: u8 = b'C';
pub const BGZF_SLEN: u16 = 2;

/// The fixed non-CDATA byte count of a member minus the extra field:
/// CDATA_size = BSIZE - XLEN - 19.
pub const BGZF_NON_DATA_SIZE: u16 = 19;

/// BGZF EOF member (28 bytes): an empty terminator block
pub const BGZF_EOF: [u8; 28] = [
    0x1f, 0x8b, 0x08, 0x04, // gzip magic, method, flags (FEXTRA)
    0x00, 0x00, 0x00, 0x00, // mtime
    0x00, 0xff, // xfl, os
    0x06, 0x00, // xlen = 6
    0x42, 0x43, // subfield ID "BC"
    0x02, 0x00, // subfield length = 2
    0x1b, 0x00, // BSIZE = 27 (28 - 1)
    0x03, 0x00, // empty deflate block
    0x00, 0x00, 0x00, 0x00, // CRC32 = 0
    0x00, 0x00, 0x00, 0x00, // ISIZE = 0
];
