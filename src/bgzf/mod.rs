//! Block-gzip (BGZF) wire format: member framing, a parallel stream
//! reader, and a member writer.

pub mod constants;
pub mod header;
pub mod parallel;
pub mod reader;
pub mod writer;

pub use constants::*;
pub use header::{BlockFooter, BlockHeader};
pub use parallel::ParallelBgzfReader;
pub use reader::BlockReader;
pub use writer::BgzfWriter;
