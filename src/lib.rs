//! Core components of a short-read DNA aligner.
//!
//! Three independent subsystems, sharing only small numeric utilities:
//!
//! - [`bgzf`]: a parallel BGZF stream reader that decompresses
//!   concatenated members into caller-supplied buffers with back-pressure,
//!   plus the matching member writer.
//! - [`kmer`]: packed 2-bit k-mers and the block permutation engine used
//!   to enumerate Hamming-ball seeding layouts for a bounded error budget.
//! - [`alignment`]: mate-pair alignment records and the overlapping-ends
//!   soft-clipper that trims double-sequenced insert middles.
//!
//! # Examples
//!
//! ```no_run
//! use readalign::ParallelBgzfReader;
//!
//! fn main() -> readalign::Result<()> {
//!     let mut reader = ParallelBgzfReader::open("alignments.bam", 4)?;
//!     let mut buffer = Vec::with_capacity(1 << 20);
//!     while reader.read_more(&mut buffer)? {
//!         // parse `buffer`, then drain it before the next call
//!         buffer.clear();
//!     }
//!     Ok(())
//! }
//! ```

pub mod alignment;
pub mod bgzf;
pub mod error;
pub mod kmer;
pub mod reference;
pub mod util;

pub use alignment::{clip_overlapping_ends, Cigar, CigarOp, Fragment, Read, Template};
pub use bgzf::{BgzfWriter, BlockReader, ParallelBgzfReader};
pub use error::{Error, Result};
pub use kmer::{permutation_list, Kmer, LongKmer, Permutate, ShortKmer, StandardKmer};
pub use reference::Contig;
