//! A mate pair and its shared CIGAR buffer.

use super::cigar::{Cigar, CigarOp};
use super::fragment::Fragment;
use super::read::Read;

/// The unit the aligner scores and emits: a fixed pair of reads, their
/// alignment records, and one growable CIGAR buffer all records point into.
#[derive(Clone, Debug)]
pub struct Template {
    pub reads: [Read; 2],
    pub fragments: [Fragment; 2],
    pub cigar: Cigar,
}

impl Template {
    pub fn new(read_one: Read, read_two: Read) -> Self {
        Self {
            reads: [read_one, read_two],
            fragments: [Fragment::default(), Fragment::default()],
            cigar: Cigar::new(),
        }
    }

    /// Records an alignment for one fragment: appends `ops` to the shared
    /// buffer, points the fragment at them and derives the observed
    /// reference length from the run lengths.
    pub fn init_alignment(
        &mut self,
        index: usize,
        contig_id: u32,
        position: i64,
        reverse: bool,
        ops: &[u32],
    ) {
        let offset = self.cigar.len();
        let mut observed_length = 0u32;
        for &packed in ops {
            let (run, op) = Cigar::decode(packed);
            if matches!(op, CigarOp::Align | CigarOp::Delete) {
                observed_length += run;
            }
            self.cigar.push(packed);
        }
        let fragment = &mut self.fragments[index];
        fragment.contig_id = contig_id;
        fragment.position = position;
        fragment.reverse = reverse;
        fragment.observed_length = observed_length;
        fragment.cigar_offset = offset;
        fragment.cigar_length = ops.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_alignment_derives_observed_length() {
        let mut template =
            Template::new(Read::new(b"ACGTACGT", b"IIIIIIII"), Read::new(b"ACGT", b"IIII"));
        template.init_alignment(
            0,
            2,
            50,
            false,
            &[
                Cigar::encode(2, CigarOp::SoftClip),
                Cigar::encode(4, CigarOp::Align),
                Cigar::encode(3, CigarOp::Delete),
                Cigar::encode(2, CigarOp::Align),
            ],
        );
        let fragment = &template.fragments[0];
        assert_eq!(fragment.contig_id, 2);
        assert_eq!(fragment.position, 50);
        // 4M + 3D + 2M cover the reference; the soft clip does not.
        assert_eq!(fragment.observed_length, 9);
        assert_eq!(fragment.cigar_string(&template.cigar), "2S4M3D2M");
    }

    #[test]
    fn test_alignments_share_one_buffer() {
        let mut template =
            Template::new(Read::new(b"ACGT", b"IIII"), Read::new(b"ACGT", b"IIII"));
        template.init_alignment(0, 0, 0, false, &[Cigar::encode(4, CigarOp::Align)]);
        template.init_alignment(1, 0, 6, true, &[Cigar::encode(4, CigarOp::Align)]);
        assert_eq!(template.fragments[0].cigar_offset, 0);
        assert_eq!(template.fragments[1].cigar_offset, 1);
        assert_eq!(template.cigar.len(), 2);
    }
}
