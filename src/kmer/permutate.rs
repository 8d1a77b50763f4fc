//! Block reordering over packed k-mers.
//!
//! A k-mer is split into `count` (≤ 16) equal-length blocks; block 0
//! occupies the most significant bits. A [`Permutate`] maps one block
//! layout onto another, and [`permutation_list`] enumerates the chain of
//! layouts needed so that, for an error budget of `e` mismatches, every
//! choice of `e` out of `2e` blocks takes a turn as the lookup prefix.

use std::fmt;

use super::{Kmer, BITS_PER_BASE};

const ENCODING_BITS: u32 = 4;
const ENCODING_MASK: u64 = 0x0F;
const MAX_BLOCKS: usize = 16;

/// True when `labels` is a permutation of `0..labels.len()`.
fn is_permutation(labels: &[u32]) -> bool {
    let mut seen = [false; MAX_BLOCKS];
    labels.len() <= MAX_BLOCKS
        && labels.iter().all(|&label| {
            (label as usize) < labels.len() && !std::mem::replace(&mut seen[label as usize], true)
        })
}

/// Reorders the blocks of a k-mer from an origin layout to a target layout.
///
/// Both layouts are sequences of block labels; the un-permuted order is
/// `0, 1, 2, ...`. All preconditions are programming errors enforced by
/// assertions at construction.
#[derive(Clone, Debug)]
pub struct Permutate {
    /// Bases per block.
    block_length: u32,
    /// Number of blocks.
    count: u32,
    /// Encoded mapping from the `from` layout to the `to` layout, 4 bits
    /// per block, most significant first.
    order: u64,
    /// Encoded mapping from the `to` layout back to natural order.
    absolute_reverse_order: u64,
    from: Vec<u32>,
    to: Vec<u32>,
}

impl Permutate {
    pub fn new(block_length: u32, from: &[u32], to: &[u32]) -> Self {
        assert!(is_permutation(from), "'from' must be a permutation of 0..{}", from.len());
        assert!(is_permutation(to), "'to' must be a permutation of 0..{}", to.len());
        let natural: Vec<u32> = (0..to.len() as u32).collect();
        Self {
            block_length,
            count: from.len() as u32,
            order: Self::encode(from, to),
            absolute_reverse_order: Self::encode(to, &natural),
            from: from.to_vec(),
            to: to.to_vec(),
        }
    }

    /// Encodes the block moves taking the `from` layout to the `to` layout.
    ///
    /// Example: with blocks ABCD, `from` ABDC = [0, 1, 3, 2] and `to` ACBD =
    /// [0, 2, 1, 3] encode as 0x0231: the block at position 0 stays, position
    /// 1 moves to 2, position 2 to 3 and position 3 to 1.
    fn encode(from: &[u32], to: &[u32]) -> u64 {
        assert_eq!(from.len(), to.len(), "permutation sides must have equal length");
        assert!(from.len() <= MAX_BLOCKS, "at most {} blocks", MAX_BLOCKS);
        let mut encoded = 0u64;
        for &label in from {
            let target = to
                .iter()
                .position(|&candidate| candidate == label)
                .expect("'from' and 'to' must carry the same block labels");
            encoded = (encoded << ENCODING_BITS) | target as u64;
        }
        encoded
    }

    /// Rearranges `kmer` from the `from` layout into the `to` layout.
    pub fn apply<K: Kmer>(&self, kmer: K) -> K {
        self.transform(kmer, self.order)
    }

    /// Puts the blocks of an already-permuted `kmer` back in natural order.
    pub fn reorder<K: Kmer>(&self, kmer: K) -> K {
        self.transform(kmer, self.absolute_reverse_order)
    }

    fn transform<K: Kmer>(&self, kmer: K, order: u64) -> K {
        assert!(
            self.block_length * self.count <= K::BASES,
            "permutation of {} blocks of {} bases does not fit a {}-base k-mer",
            self.count,
            self.block_length,
            K::BASES
        );
        let block_bits = BITS_PER_BASE * self.block_length;
        let block_mask = if block_bits >= K::BITS {
            !K::ZERO
        } else {
            !((!K::ZERO) << block_bits)
        };
        let mut result = K::ZERO;
        for origin in 0..self.count {
            let order_shift = (self.count - origin - 1) * ENCODING_BITS;
            let target = ((order >> order_shift) & ENCODING_MASK) as u32;
            let origin_shift = (self.count - origin - 1) * block_bits;
            let target_shift = (self.count - target - 1) * block_bits;
            result |= ((kmer >> origin_shift) & block_mask) << target_shift;
        }
        result
    }
}

impl fmt::Display for Permutate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const LABELS: &[u8] = b"ABCDEFGHIJKLMNOP";
        let label = |v: u32| LABELS.get(v as usize).map_or('?', |&b| b as char);
        f.write_str("from ")?;
        for &v in &self.from {
            write!(f, "{}", label(v))?;
        }
        f.write_str(" to ")?;
        for &v in &self.to {
            write!(f, "{}", label(v))?;
        }
        Ok(())
    }
}

/// Emits every block order whose first `prefix_size` labels are an
/// increasing selection, followed by the unchosen labels in increasing
/// order. The recursion extends `prefix` with each still-larger suffix
/// label, which enumerates exactly the C(2e, e) prefix choices.
fn build_permutation_list(
    prefix: &[u32],
    suffix: &[u32],
    prefix_size: usize,
    orders: &mut Vec<Vec<u32>>,
) {
    debug_assert_eq!(2 * prefix_size, prefix.len() + suffix.len());
    if prefix.len() == prefix_size {
        let mut order = prefix.to_vec();
        order.extend_from_slice(suffix);
        orders.push(order);
    } else {
        for i in 0..suffix.len() {
            if prefix.last().map_or(true, |&last| suffix[i] > last) {
                let mut new_prefix = prefix.to_vec();
                new_prefix.push(suffix[i]);
                let mut new_suffix = suffix.to_vec();
                new_suffix.remove(i);
                build_permutation_list(&new_prefix, &new_suffix, prefix_size, orders);
            }
        }
    }
}

/// Generates the chained permutation list covering an error budget of
/// `error_count` mismatches over k-mers of width `K`.
///
/// The k-mer splits into `2 * error_count` equal blocks (the width must
/// divide evenly). Each returned permutation maps the previous entry's
/// layout to the next, so the list is applied successively starting from a
/// natural-order k-mer; the first entry is the identity. The list length is
/// C(2e, e): 6 for two errors, 70 for four.
pub fn permutation_list<K: Kmer>(error_count: u32) -> Vec<Permutate> {
    assert!(error_count > 0, "error budget must be positive");
    let blocks_count = 2 * error_count;
    assert!(blocks_count as usize <= MAX_BLOCKS, "at most {} blocks", MAX_BLOCKS);
    let block_length = K::BASES / blocks_count;
    assert_eq!(
        blocks_count * block_length,
        K::BASES,
        "{}-base k-mer does not split into {} equal blocks",
        K::BASES,
        blocks_count
    );

    let suffix: Vec<u32> = (0..blocks_count).collect();
    let mut orders = Vec::new();
    build_permutation_list(&[], &suffix, error_count as usize, &mut orders);

    let mut list = Vec::with_capacity(orders.len());
    let mut from: &[u32] = &orders[0];
    for to in &orders {
        list.push(Permutate::new(block_length, from, to));
        from = to;
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmer::{LongKmer, ShortKmer, StandardKmer};

    #[test]
    fn test_four_blocks() {
        let kmer: u64 = 0xFEDCBA9876543210;
        let abcd: u64 = 0xFEDCBA9876543210;
        let adbc: u64 = 0xFEDC3210BA987654;
        let dbca: u64 = 0x3210BA987654FEDC;
        let block_length = 8;
        let order_abcd = [0, 1, 2, 3];
        let order_adbc = [0, 3, 1, 2];
        let order_dbca = [3, 1, 2, 0];
        let abcd_abcd = Permutate::new(block_length, &order_abcd, &order_abcd);
        let abcd_adbc = Permutate::new(block_length, &order_abcd, &order_adbc);
        let abcd_dbca = Permutate::new(block_length, &order_abcd, &order_dbca);
        let adbc_dbca = Permutate::new(block_length, &order_adbc, &order_dbca);
        assert_eq!(abcd_abcd.apply(kmer), kmer);
        assert_eq!(abcd_adbc.apply(kmer), 0xFEDC3210BA987654);
        assert_eq!(abcd_dbca.apply(kmer), 0x3210BA987654FEDC);
        assert_eq!(adbc_dbca.apply(kmer), 0xBA9876543210FEDC);
        assert_eq!(abcd_abcd.apply(abcd), abcd);
        assert_eq!(abcd_adbc.apply(abcd), adbc);
        assert_eq!(abcd_dbca.apply(abcd), dbca);
        assert_eq!(adbc_dbca.apply(adbc), dbca);
        assert_eq!(abcd_abcd.reorder(abcd), abcd);
        assert_eq!(abcd_adbc.reorder(adbc), abcd);
        assert_eq!(abcd_dbca.reorder(dbca), abcd);
        assert_eq!(adbc_dbca.reorder(dbca), abcd);
    }

    #[test]
    fn test_eight_blocks() {
        // A  B  C  D  E  F  G  H
        // FE DC BA 98 76 54 32 10
        let kmer: u64 = 0xFEDCBA9876543210;
        let abcdefgh: u64 = 0xFEDCBA9876543210;
        let adbcefgh: u64 = 0xFE98DCBA76543210;
        let dghbcafe: u64 = 0x983210DCBAFE5476;
        let block_length = 4;
        let order_abcdefgh = [0, 1, 2, 3, 4, 5, 6, 7];
        let order_adbcefgh = [0, 3, 1, 2, 4, 5, 6, 7];
        let order_dghbcafe = [3, 6, 7, 1, 2, 0, 5, 4];
        let identity = Permutate::new(block_length, &order_abcdefgh, &order_abcdefgh);
        let to_adbcefgh = Permutate::new(block_length, &order_abcdefgh, &order_adbcefgh);
        let to_dghbcafe = Permutate::new(block_length, &order_abcdefgh, &order_dghbcafe);
        let adbcefgh_dghbcafe = Permutate::new(block_length, &order_adbcefgh, &order_dghbcafe);
        assert_eq!(identity.apply(kmer), kmer);
        assert_eq!(to_adbcefgh.apply(kmer), 0xFE98DCBA76543210);
        assert_eq!(to_dghbcafe.apply(kmer), 0x983210DCBAFE5476);
        assert_eq!(adbcefgh_dghbcafe.apply(kmer), 0xDC3210BA98FE5476);
        assert_eq!(to_adbcefgh.apply(abcdefgh), adbcefgh);
        assert_eq!(to_dghbcafe.apply(abcdefgh), dghbcafe);
        assert_eq!(adbcefgh_dghbcafe.apply(adbcefgh), dghbcafe);
        assert_eq!(identity.reorder(abcdefgh), abcdefgh);
        assert_eq!(to_adbcefgh.reorder(adbcefgh), abcdefgh);
        assert_eq!(to_dghbcafe.reorder(dghbcafe), abcdefgh);
        assert_eq!(adbcefgh_dghbcafe.reorder(dghbcafe), abcdefgh);
    }

    /// Applies the whole chain, checking reorder against the original at
    /// every link.
    fn assert_chain<K: Kmer>(original: K, expected: K, list: &[Permutate]) {
        assert_eq!(list[0].apply(original), original);
        assert_eq!(list[0].reorder(original), original);
        let mut permuted = original;
        for permutate in list {
            permuted = permutate.apply(permuted);
            assert_eq!(permutate.reorder(permuted), original);
        }
        assert_eq!(permuted, expected);
        assert_eq!(list.last().unwrap().reorder(permuted), original);
    }

    const ORIGINAL16: ShortKmer = 0x76543210;
    const EXPECTED16: ShortKmer = 0x32107654;
    const ORIGINAL32: StandardKmer = 0xFEDCBA9876543210;
    const EXPECTED32: StandardKmer = 0x76543210FEDCBA98;
    const ORIGINAL64: LongKmer = (0x1111222233334444 as LongKmer) << 64 | 0x5555666677778888;
    const EXPECTED64: LongKmer = (0x5555666677778888 as LongKmer) << 64 | 0x1111222233334444;

    #[test]
    fn test_two_errors() {
        let list = permutation_list::<ShortKmer>(2);
        assert_eq!(list.len(), 6);
        assert_chain(ORIGINAL16, EXPECTED16, &list);

        let list = permutation_list::<StandardKmer>(2);
        assert_eq!(list.len(), 6);
        assert_chain(ORIGINAL32, EXPECTED32, &list);

        let list = permutation_list::<LongKmer>(2);
        assert_eq!(list.len(), 6);
        assert_chain(ORIGINAL64, EXPECTED64, &list);
    }

    #[test]
    fn test_four_errors() {
        let list = permutation_list::<ShortKmer>(4);
        assert_eq!(list.len(), 70);
        assert_chain(ORIGINAL16, EXPECTED16, &list);

        let list = permutation_list::<StandardKmer>(4);
        assert_eq!(list.len(), 70);
        assert_chain(ORIGINAL32, EXPECTED32, &list);

        let list = permutation_list::<LongKmer>(4);
        assert_eq!(list.len(), 70);
        assert_chain(ORIGINAL64, EXPECTED64, &list);
    }

    #[test]
    fn test_display() {
        let permutate = Permutate::new(8, &[0, 1, 2, 3], &[0, 3, 1, 2]);
        assert_eq!(permutate.to_string(), "from ABCD to ADBC");
    }

    #[test]
    #[should_panic(expected = "permutation")]
    fn test_rejects_repeated_labels() {
        Permutate::new(8, &[0, 1, 1, 3], &[0, 1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_rejects_too_narrow_kmer() {
        // 8 blocks of 8 bases need 64 bases; a ShortKmer holds 16.
        let permutate =
            Permutate::new(8, &[0, 1, 2, 3, 4, 5, 6, 7], &[0, 1, 2, 3, 4, 5, 6, 7]);
        permutate.apply(0u32);
    }
}
