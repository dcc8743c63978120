// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Two bit encoding of nucleotide sequences.
//!
//! Bases are stored as A=0, C=1, G=2, T=3, 32 bases per `u64` word with the first base in the
//! most significant bits. Symbols other than A, C, G and T (case insensitive) cannot be
//! represented. They are stored as code 0 and recorded in an ambiguity mask, decode as `N`
//! and never count as a match in [`PackedSequence::overlap_matches`].

use anyhow::Result;
use bv::BitVec;

use crate::errors::Error;

const BASES_PER_WORD: usize = 32;
const DECODE: [u8; 4] = *b"ACGT";
/// Low bit of every two bit base slot.
const LOW_BITS: u64 = 0x5555_5555_5555_5555;

fn encode(base: u8) -> Option<u64> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

#[inline]
fn shift(i: usize) -> usize {
    62 - 2 * (i % BASES_PER_WORD)
}

/// Immutable packed representation of a base sequence.
#[derive(Debug, Clone)]
pub struct PackedSequence {
    words: Vec<u64>,
    len: usize,
    ambiguous: Option<BitVec<u64>>,
    reversed: bool,
    complemented: bool,
}

impl PackedSequence {
    /// Pack the given bases, optionally reversing and/or complementing them first.
    pub fn new(bases: &[u8], reverse: bool, complement: bool) -> Self {
        let len = bases.len();
        let mut words = vec![0u64; (len + BASES_PER_WORD - 1) / BASES_PER_WORD];
        let mut ambiguous: Option<BitVec<u64>> = None;

        for i in 0..len {
            let base = if reverse { bases[len - 1 - i] } else { bases[i] };
            let code = match encode(base) {
                Some(code) if complement => code ^ 0b11,
                Some(code) => code,
                None => {
                    ambiguous
                        .get_or_insert_with(|| BitVec::new_fill(false, len as u64))
                        .set(i as u64, true);
                    0
                }
            };
            words[i / BASES_PER_WORD] |= code << shift(i);
        }

        PackedSequence {
            words,
            len,
            ambiguous,
            reversed: reverse,
            complemented: complement,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn is_complemented(&self) -> bool {
        self.complemented
    }

    /// Whether the base at `i` was not one of A, C, G, T when packed.
    pub fn is_ambiguous(&self, i: usize) -> bool {
        self.ambiguous
            .as_ref()
            .map_or(false, |mask| mask.get(i as u64))
    }

    #[inline]
    fn code(&self, i: usize) -> u64 {
        (self.words[i / BASES_PER_WORD] >> shift(i)) & 0b11
    }

    #[inline]
    fn decode(&self, i: usize) -> u8 {
        if self.is_ambiguous(i) {
            b'N'
        } else {
            DECODE[self.code(i) as usize]
        }
    }

    /// Base at the given 0-based offset.
    pub fn get(&self, i: usize) -> Result<u8> {
        if i >= self.len {
            return Err(Error::IndexOutOfBounds {
                index: i,
                len: self.len,
            }
            .into());
        }
        Ok(self.decode(i))
    }

    /// Decode `len` bases starting at `start`.
    pub fn get_bytes(&self, start: usize, len: usize) -> Result<Vec<u8>> {
        self.check_range(start, len)?;
        Ok((start..start + len).map(|i| self.decode(i)).collect())
    }

    /// Pack `k` bases starting at `start` into the low `2k` bits of an integer, first base
    /// most significant.
    pub fn kmer(&self, start: usize, k: usize) -> Result<u64> {
        if k == 0 || k > BASES_PER_WORD {
            return Err(Error::InvalidKmerLength { k }.into());
        }
        self.check_range(start, k)?;
        Ok(self.kmer_unchecked(start, k))
    }

    fn check_range(&self, start: usize, len: usize) -> Result<()> {
        match start.checked_add(len) {
            Some(end) if end <= self.len => Ok(()),
            _ => Err(Error::IndexOutOfBounds {
                index: start.saturating_add(len),
                len: self.len,
            }
            .into()),
        }
    }

    /// Requires 1 <= k <= 32 and `start + k <= len`.
    #[inline]
    fn kmer_unchecked(&self, start: usize, k: usize) -> u64 {
        let word = start / BASES_PER_WORD;
        let offset = start % BASES_PER_WORD;
        let mut bits = self.words[word] << (2 * offset);
        if offset > 0 && word + 1 < self.words.len() {
            bits |= self.words[word + 1] >> (64 - 2 * offset);
        }
        bits >> (64 - 2 * k)
    }

    /// Whether base `i` of `a` equals base `j` of `b`. Out of range and ambiguous bases
    /// match nothing.
    pub fn base_matches(a: &PackedSequence, i: usize, b: &PackedSequence, j: usize) -> bool {
        i < a.len
            && j < b.len
            && !a.is_ambiguous(i)
            && !b.is_ambiguous(j)
            && a.code(i) == b.code(j)
    }

    /// Number of matching bases when `b` is placed `offset` bases to the right of `a`
    /// (to the left if negative). Sequences that do not overlap have no matches.
    pub fn overlap_matches(a: &PackedSequence, b: &PackedSequence, offset: i64) -> usize {
        let start = offset.max(0);
        let end = (a.len as i64).min(b.len as i64 + offset);
        if start >= end {
            return 0;
        }
        let (start, end) = (start as usize, end as usize);
        let b_pos = |i: usize| (i as i64 - offset) as usize;

        let mut matches = 0;
        let mut i = start;
        while i < end {
            let n = (end - i).min(BASES_PER_WORD);
            let diff = a.kmer_unchecked(i, n) ^ b.kmer_unchecked(b_pos(i), n);
            // a slot mismatches if either of its two bits differ
            let mismatches = ((diff | (diff >> 1)) & LOW_BITS).count_ones() as usize;
            matches += n - mismatches;
            i += n;
        }

        if a.ambiguous.is_some() || b.ambiguous.is_some() {
            for i in start..end {
                let j = b_pos(i);
                if (a.is_ambiguous(i) || b.is_ambiguous(j)) && a.code(i) == b.code(j) {
                    matches -= 1;
                }
            }
        }

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANDOM: &[u8] = b"CATTAATCGCAAGAGCGGGTTGTATTCGACGCCAAGTCAGCTGAAGCACCATTACCCGATCAAAACATATCAGAAATGATTGACGTATCACAAGCCGGATTTTGTTTACAGCCTGTCTTATATCCTGAATAACGCACCGCCTATTCGAACGGGCGAATCTACCTAGGTCGCTCAGAACCGGCACCCTTAACCATCCATAT";

    fn reference_packing(bases: &[u8]) -> u64 {
        bases
            .iter()
            .fold(0, |acc, base| (acc << 2) | encode(*base).unwrap())
    }

    #[test]
    fn test_round_trip() {
        let twomers = b"ACGT"
            .iter()
            .flat_map(|a| b"ACGT".iter().map(move |b| vec![*a, *b]));
        for s in twomers {
            let seq = PackedSequence::new(&s, false, false);
            assert_eq!(seq.get_bytes(0, 2).unwrap(), s);
            assert_eq!(seq.get(0).unwrap(), s[0]);
            assert_eq!(seq.get(1).unwrap(), s[1]);
        }

        let poly_a = vec![b'A'; 1000];
        let poly_acgt = b"ACGT".repeat(250);
        let cases = [
            &b"A"[..],
            &b"C"[..],
            &b"G"[..],
            &b"T"[..],
            &poly_a[..],
            &poly_acgt[..],
            RANDOM,
        ];
        for s in cases {
            let seq = PackedSequence::new(s, false, false);
            assert_eq!(seq.len(), s.len());
            assert_eq!(seq.get_bytes(0, s.len()).unwrap(), s.to_vec());
            assert_eq!(seq.get_bytes(1, s.len() - 1).unwrap(), s[1..].to_vec());
        }
    }

    #[test]
    fn test_sub_ranges() {
        let seq = PackedSequence::new(RANDOM, false, false);
        for start in [0, 5, 31, 32, 33, 63, 64, 100].iter() {
            for len in [0, 1, 30, 32, 33, 65].iter() {
                assert_eq!(
                    seq.get_bytes(*start, *len).unwrap(),
                    RANDOM[*start..*start + *len].to_vec()
                );
            }
        }
    }

    #[test]
    fn test_empty() {
        let seq = PackedSequence::new(b"", false, false);
        assert!(seq.is_empty());
        assert_eq!(seq.get_bytes(0, 0).unwrap(), Vec::<u8>::new());
        assert!(seq.get(0).is_err());
    }

    #[test]
    fn test_kmers_of_all_lengths() {
        let seq = PackedSequence::new(RANDOM, false, false);
        for k in 1..=32 {
            for i in 0..RANDOM.len() - (k - 1) {
                assert_eq!(
                    seq.kmer(i, k).unwrap(),
                    reference_packing(&RANDOM[i..i + k]),
                    "k={} i={}",
                    k,
                    i
                );
            }
        }
    }

    #[test]
    fn test_invalid_kmer() {
        let seq = PackedSequence::new(RANDOM, false, false);
        let err = seq.kmer(0, 33).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::InvalidKmerLength { k: 33 })
        );
        assert!(seq.kmer(0, 0).is_err());
        assert!(seq.kmer(RANDOM.len() - 3, 4).is_err());
    }

    #[test]
    fn test_out_of_bounds() {
        let seq = PackedSequence::new(b"ACGT", false, false);
        let err = seq.get(4).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::IndexOutOfBounds { index: 4, len: 4 })
        );
        assert!(seq.get_bytes(2, 3).is_err());
    }

    #[test]
    fn test_reverse() {
        let seq = PackedSequence::new(b"AACGT", true, false);
        assert_eq!(seq.get_bytes(0, 5).unwrap(), b"TGCAA".to_vec());
        assert!(seq.is_reversed());
    }

    #[test]
    fn test_complement() {
        let seq = PackedSequence::new(b"AACGT", false, true);
        assert_eq!(seq.get_bytes(0, 5).unwrap(), b"TTGCA".to_vec());
        assert!(seq.is_complemented());
    }

    #[test]
    fn test_reverse_complement() {
        let seq = PackedSequence::new(b"AACGT", true, true);
        assert_eq!(seq.get_bytes(0, 5).unwrap(), b"ACGTT".to_vec());
    }

    #[test]
    fn test_more_than_one_word() {
        let s = b"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAC";
        let seq = PackedSequence::new(s, false, false);
        assert_eq!(seq.get_bytes(0, 33).unwrap(), s.to_vec());
    }

    #[test]
    fn test_ambiguous_bases() {
        let seq = PackedSequence::new(b"ACNGTr", false, false);
        assert_eq!(seq.get_bytes(0, 6).unwrap(), b"ACNGTN".to_vec());
        assert!(seq.is_ambiguous(2));
        assert!(!seq.is_ambiguous(3));

        let seq = PackedSequence::new(b"acgt", false, false);
        assert_eq!(seq.get_bytes(0, 4).unwrap(), b"ACGT".to_vec());

        let seq = PackedSequence::new(b"NAC", true, true);
        assert_eq!(seq.get_bytes(0, 3).unwrap(), b"GTN".to_vec());
    }

    #[test]
    fn test_overlap_matches() {
        let seq = PackedSequence::new(b"ACGT", false, false);
        assert_eq!(PackedSequence::overlap_matches(&seq, &seq, 0), 4);
        for offset in [-4, -3, -2, -1, 1, 2, 3, 4].iter() {
            assert_eq!(PackedSequence::overlap_matches(&seq, &seq, *offset), 0);
        }
    }

    #[test]
    fn test_overlap_matches_different_lengths() {
        let seq1 = PackedSequence::new(b"ACGT", false, false);
        let seq2 = PackedSequence::new(b"ACTTT", false, false);
        // ACGT
        // ACTTT
        assert_eq!(PackedSequence::overlap_matches(&seq1, &seq2, 0), 3);
        // ACGT
        // -ACTTT
        assert_eq!(PackedSequence::overlap_matches(&seq1, &seq2, 1), 1);
        // ACGT
        // --ACTTT
        assert_eq!(PackedSequence::overlap_matches(&seq1, &seq2, 2), 0);
        assert_eq!(PackedSequence::overlap_matches(&seq1, &seq2, 3), 0);
        assert_eq!(PackedSequence::overlap_matches(&seq1, &seq2, 4), 0);
        // -ACGT
        // ACTTT
        assert_eq!(PackedSequence::overlap_matches(&seq1, &seq2, -1), 1);
        // --ACGT
        // ACTTT
        for offset in -6..=-2 {
            assert_eq!(PackedSequence::overlap_matches(&seq1, &seq2, offset), 0);
        }
    }

    #[test]
    fn test_overlap_matches_spanning_words() {
        let seq1 = PackedSequence::new(RANDOM, false, false);
        let mut mutated = RANDOM.to_vec();
        for base in &mut mutated[99..103] {
            *base = b'A';
        }
        let seq2 = PackedSequence::new(&mutated, false, false);
        let differing = RANDOM[99..103].iter().filter(|b| **b != b'A').count();
        assert_eq!(differing, 4);

        assert_eq!(PackedSequence::overlap_matches(&seq1, &seq1, 0), seq1.len());
        assert_eq!(
            PackedSequence::overlap_matches(&seq1, &seq2, 0),
            seq1.len() - 4
        );
    }

    #[test]
    fn test_overlap_matches_shifted_across_words() {
        let seq1 = PackedSequence::new(RANDOM, false, false);
        let seq2 = PackedSequence::new(&RANDOM[7..], false, false);
        assert_eq!(
            PackedSequence::overlap_matches(&seq1, &seq2, 7),
            RANDOM.len() - 7
        );
        assert_eq!(
            PackedSequence::overlap_matches(&seq2, &seq1, -7),
            RANDOM.len() - 7
        );
    }

    #[test]
    fn test_overlap_matches_ignores_ambiguous() {
        let seq = PackedSequence::new(b"ANNA", false, false);
        assert_eq!(PackedSequence::overlap_matches(&seq, &seq, 0), 2);
        let seq2 = PackedSequence::new(b"AAAA", false, false);
        assert_eq!(PackedSequence::overlap_matches(&seq, &seq2, 0), 2);
    }

    #[test]
    fn test_base_matches() {
        let a = PackedSequence::new(b"ACNT", false, false);
        let b = PackedSequence::new(b"TCNA", false, false);
        assert!(PackedSequence::base_matches(&a, 1, &b, 1));
        assert!(PackedSequence::base_matches(&a, 0, &b, 3));
        assert!(!PackedSequence::base_matches(&a, 0, &b, 0));
        assert!(!PackedSequence::base_matches(&a, 2, &b, 2));
        assert!(!PackedSequence::base_matches(&a, 4, &b, 0));
    }
}
