//! Alignment records and per-template post-processing.

pub mod cigar;
pub mod clipper;
pub mod fragment;
pub mod read;
pub mod template;

pub use cigar::{Cigar, CigarOp};
pub use clipper::clip_overlapping_ends;
pub use fragment::Fragment;
pub use read::Read;
pub use template::Template;
