pub mod bounded;
pub mod endian;

pub use bounded::BoundedVec;
pub use endian::{extract_little_endian, LeBytes};
