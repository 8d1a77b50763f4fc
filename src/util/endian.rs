//! Little-endian integer extraction from byte buffers.
//!
//! Wire formats handled by this crate store all multi-byte fields
//! little-endian. Fields are always decoded explicitly, never reinterpreted
//! from a packed layout, so the code is byte-order portable.

/// Fixed-width unsigned integers that can be assembled from little-endian
/// bytes.
pub trait LeBytes: Copy {
    const SIZE: usize;

    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_le_bytes {
    ($($t:ty),*) => {
        $(impl LeBytes for $t {
            const SIZE: usize = std::mem::size_of::<$t>();

            #[inline]
            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$t>()];
                buf.copy_from_slice(&bytes[..std::mem::size_of::<$t>()]);
                <$t>::from_le_bytes(buf)
            }
        })*
    };
}

impl_le_bytes!(u16, u32, u64);

/// Reads a `T` from the front of `bytes`.
///
/// Panics if `bytes` is shorter than `T`; callers are expected to have
/// length-checked the enclosing record.
#[inline]
pub fn extract_little_endian<T: LeBytes>(bytes: &[u8]) -> T {
    assert!(bytes.len() >= T::SIZE, "buffer too short for little-endian read");
    T::from_le_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_u16() {
        assert_eq!(extract_little_endian::<u16>(&[0x1b, 0x00]), 27);
        assert_eq!(extract_little_endian::<u16>(&[0xff, 0xff]), 0xffff);
    }

    #[test]
    fn test_extract_u32() {
        assert_eq!(extract_little_endian::<u32>(&[0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
    }

    #[test]
    fn test_extract_ignores_trailing_bytes() {
        assert_eq!(extract_little_endian::<u16>(&[0x02, 0x00, 0xde, 0xad]), 2);
    }

    #[test]
    #[should_panic]
    fn test_extract_short_buffer_panics() {
        extract_little_endian::<u32>(&[0x01, 0x02]);
    }
}
