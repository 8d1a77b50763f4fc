//! Soft-clipping of overlapping mate-pair ends.
//!
//! When the insert is shorter than the sum of the read lengths, the two
//! reads sequence the same stretch of reference twice. The clipper detects
//! the overlap, decides per summed base quality which copy to keep, and
//! soft-clips the inferior copy, patching the losing fragment's CIGAR,
//! observed length, edit distance and clip counters.

use super::cigar::{Cigar, CigarOp};
use super::template::Template;
use crate::reference::Contig;

/// Sum of positional quality differences over two equal-length runs.
fn diff_base_qualities(left: &[u8], right: &[u8]) -> i64 {
    debug_assert_eq!(left.len(), right.len());
    left.iter().zip(right).map(|(&l, &r)| i64::from(l) - i64::from(r)).sum()
}

fn count_mismatches(read: &[u8], reference: &[u8]) -> u32 {
    debug_assert_eq!(read.len(), reference.len());
    read.iter().zip(reference).filter(|(a, b)| a != b).count() as u32
}

/// Clips the overlapping ends of a short-insert template.
///
/// No-op unless both fragments are aligned to the same contig on opposite
/// strands with the forward fragment leftmost and a positive reference
/// overlap that stays inside the adjacent align runs on both sides (an
/// overlap reaching an indel, or one that would fully soft-clip a read, is
/// left alone). Clipping twice is idempotent: the first pass removes the
/// overlap, so the second finds none.
pub fn clip_overlapping_ends(contig_list: &[Contig], template: &mut Template) {
    if !template.fragments[0].is_aligned() || !template.fragments[1].is_aligned() {
        return;
    }
    if template.fragments[0].contig_id != template.fragments[1].contig_id {
        // ignore chimeric pairs
        return;
    }
    if template.fragments[0].reverse == template.fragments[1].reverse {
        return;
    }

    let (left_index, right_index) =
        if template.fragments[0].position <= template.fragments[1].position {
            (0, 1)
        } else {
            (1, 0)
        };
    let left = template.fragments[left_index];
    let right = template.fragments[right_index];

    if left.reverse {
        // If the leftmost one is not facing forward, it's either a
        // mate-pair or we've sequenced through the adapter. Dealt with
        // elsewhere.
        return;
    }

    let overlap = left.position + i64::from(left.observed_length) - right.position;
    if overlap <= 0 {
        // no overlap
        return;
    }
    let overlap = overlap as u32;

    // The trailing end of the left read, stepping over an existing
    // soft clip.
    let left_ops = left.cigar(&template.cigar);
    let mut left_end_offset = template.reads[left_index].len() as u32;
    let mut left_end_soft_clip = 0u32;
    let mut left_last_align_index = left_ops.len() - 1;
    let (mut left_last_len, mut left_last_op) = Cigar::decode(left_ops[left_last_align_index]);
    if left_last_op == CigarOp::SoftClip {
        assert!(left_last_align_index > 0, "fully soft-clipped reads are not allowed");
        left_end_offset -= left_last_len;
        left_end_soft_clip = left_last_len;
        left_last_align_index -= 1;
        (left_last_len, left_last_op) = Cigar::decode(left_ops[left_last_align_index]);
    }
    assert_eq!(
        left_last_op,
        CigarOp::Align,
        "apart from soft-clipping, CIGAR must end with align operations"
    );
    if overlap >= left_last_len {
        // Overlap contains or borders an indel, or the read would get
        // fully soft-clipped. Don't mess with those.
        return;
    }

    // The leading end of the right read.
    let right_ops = right.cigar(&template.cigar);
    let mut right_start_offset = 0u32;
    let mut right_first_align_index = 0usize;
    let (mut right_first_len, mut right_first_op) = Cigar::decode(right_ops[0]);
    if right_first_op == CigarOp::SoftClip {
        right_start_offset += right_first_len;
        right_first_align_index += 1;
        assert!(right_first_align_index < right_ops.len(), "fully soft-clipped reads are not allowed");
        (right_first_len, right_first_op) = Cigar::decode(right_ops[right_first_align_index]);
    }
    assert_eq!(
        right_first_op,
        CigarOp::Align,
        "apart from soft-clipping, CIGAR must begin with align operations"
    );
    if overlap >= right_first_len {
        return;
    }

    // Find which of the overlapping copies is better.
    let left_quality = &template.reads[left_index].forward_quality()
        [(left_end_offset - overlap) as usize..left_end_offset as usize];
    let right_quality = &template.reads[right_index].reverse_quality()
        [right_start_offset as usize..(right_start_offset + overlap) as usize];

    if diff_base_qualities(left_quality, right_quality) > 0 {
        // The left copy is better: soft-clip the right fragment's prefix.
        let contig = &contig_list[right.contig_id as usize];
        let reference_start = right.position as usize;
        let clipped_bases = &template.reads[right_index].reverse_sequence()
            [right_start_offset as usize..(right_start_offset + overlap) as usize];
        let mismatches = count_mismatches(
            clipped_bases,
            &contig.forward[reference_start..reference_start + overlap as usize],
        );

        let new_offset = template.cigar.len();
        template.cigar.push(Cigar::encode(right_start_offset + overlap, CigarOp::SoftClip));
        template.cigar.push(Cigar::encode(right_first_len - overlap, CigarOp::Align));
        template.cigar.extend_from_within(
            right.cigar_offset + right_first_align_index + 1
                ..right.cigar_offset + right.cigar_length,
        );
        let new_length = template.cigar.len() - new_offset;

        let right = &mut template.fragments[right_index];
        right.cigar_offset = new_offset;
        right.cigar_length = new_length;
        right.increment_clip_left(overlap);
        right.observed_length -= overlap;
        right.edit_distance -= mismatches;
    } else {
        // The right copy is better: soft-clip the left fragment's suffix.
        let contig = &contig_list[left.contig_id as usize];
        let reference_start = (left.position + i64::from(left.observed_length)
            - i64::from(left_end_soft_clip)
            - i64::from(overlap)) as usize;
        let clipped_bases = &template.reads[left_index].forward_sequence()
            [(left_end_offset - overlap) as usize..left_end_offset as usize];
        let mismatches = count_mismatches(
            clipped_bases,
            &contig.forward[reference_start..reference_start + overlap as usize],
        );

        let new_offset = template.cigar.len();
        template
            .cigar
            .extend_from_within(left.cigar_offset..left.cigar_offset + left_last_align_index);
        template.cigar.push(Cigar::encode(left_last_len - overlap, CigarOp::Align));
        template.cigar.push(Cigar::encode(left_end_soft_clip + overlap, CigarOp::SoftClip));
        let new_length = template.cigar.len() - new_offset;

        let left = &mut template.fragments[left_index];
        left.cigar_offset = new_offset;
        left.cigar_length = new_length;
        left.increment_clip_right(overlap);
        left.observed_length -= overlap;
        left.edit_distance -= mismatches;
    }
}
