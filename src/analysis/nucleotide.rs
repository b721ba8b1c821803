//! Nucleotide alphabet helpers

use bio::alphabets::dna;

/// Standard DNA bases
pub const STANDARD_BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Alignment gap symbol
pub const GAP: u8 = b'-';

/// Check if a byte is a standard (uppercase) DNA base
#[inline]
pub fn is_standard_base(b: u8) -> bool {
    matches!(b, b'A' | b'C' | b'G' | b'T')
}

/// Check if a byte is allowed in an alignment cell
#[inline]
pub fn is_alignment_symbol(b: u8) -> bool {
    is_standard_base(b) || b == GAP
}

/// Index of a base in `STANDARD_BASES`, `None` for anything else.
#[inline]
pub fn base_index(b: u8) -> Option<usize> {
    match b {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// True when `a` pairs with `b` on the opposite strand.
#[inline]
pub fn is_complement(a: u8, b: u8) -> bool {
    is_standard_base(a) && dna::complement(a) == b
}

/// Compute the reverse complement of a DNA sequence
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    dna::revcomp(seq)
}

/// GC percentage of a sequence, 0.0 for an empty one.
pub fn gc_content(seq: &[u8]) -> f64 {
    if seq.is_empty() {
        return 0.0;
    }
    let gc = seq
        .iter()
        .filter(|&&b| matches!(b.to_ascii_uppercase(), b'G' | b'C'))
        .count();
    gc as f64 / seq.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement(b"AACGTT"), b"AACGTT".to_vec());
        assert_eq!(reverse_complement(b"ATGC"), b"GCAT".to_vec());
    }

    #[test]
    fn test_is_complement() {
        assert!(is_complement(b'A', b'T'));
        assert!(is_complement(b'G', b'C'));
        assert!(!is_complement(b'A', b'A'));
        assert!(!is_complement(b'-', b'-'));
    }

    #[test]
    fn test_gc_content() {
        assert_eq!(gc_content(b""), 0.0);
        assert_eq!(gc_content(b"GGCC"), 100.0);
        assert_eq!(gc_content(b"ATGC"), 50.0);
    }

    #[test]
    fn test_base_index() {
        for (i, &b) in STANDARD_BASES.iter().enumerate() {
            assert_eq!(base_index(b), Some(i));
        }
        assert_eq!(base_index(GAP), None);
    }
}
