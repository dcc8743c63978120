// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Placement of a chimeric alignment within its read and on the reference.
//!
//! Read offsets are always given in read (sequencing) orientation, i.e. offset 0 is the
//! first sequenced base regardless of the strand the alignment is on.

use std::cmp::Ordering;
use std::ops::Range;

use bio_types::strand::ReqStrand;
use rust_htslib::bam::record::Cigar;

use crate::alignment::{consumes_read, consumes_reference, is_aligned, ChimericAlignment, Clips};
use crate::evidence::breakend::Direction;

/// End of the aligned part of a read, in read orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadEnd {
    Start,
    End,
}

impl ChimericAlignment {
    /// Length of the read including clipped bases.
    pub fn read_length(&self) -> u32 {
        self.cigar()
            .iter()
            .filter(|op| consumes_read(op))
            .map(|op| op.len())
            .sum()
    }

    /// Number of read bases that are not clipped.
    pub fn aligned_read_length(&self) -> u32 {
        self.cigar()
            .iter()
            .filter(|op| {
                matches!(
                    op,
                    Cigar::Match(_) | Cigar::Ins(_) | Cigar::Equal(_) | Cigar::Diff(_)
                )
            })
            .map(|op| op.len())
            .sum()
    }

    /// Read offsets covered by the alignment.
    pub fn read_span(&self) -> Range<u32> {
        let start = match self.strand() {
            ReqStrand::Forward => Clips::leading(self.cigar()).both(),
            ReqStrand::Reverse => Clips::trailing(self.cigar()).both(),
        };
        start..start + self.aligned_read_length()
    }

    /// Number of reference bases spanned by the alignment.
    pub fn reference_length(&self) -> u64 {
        self.cigar()
            .iter()
            .filter(|op| consumes_reference(op))
            .map(|op| op.len() as u64)
            .sum()
    }

    /// 1-based position of the last reference base spanned by the alignment.
    pub fn reference_end(&self) -> u64 {
        self.pos() + self.reference_length().saturating_sub(1)
    }

    /// Whether any base is placed as a match. Alignments made of mismatches, skips and
    /// deletions only (e.g. `1X2N1X`) merely state that the bases belong somewhere within
    /// the spanned interval.
    pub fn is_anchored(&self) -> bool {
        self.cigar()
            .iter()
            .any(|op| matches!(op, Cigar::Match(_) | Cigar::Equal(_)))
    }

    /// Direction of a breakend at the given end of the alignment.
    pub fn breakend_direction(&self, end: ReadEnd) -> Direction {
        if self.junction_at_cigar_tail(end) {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }

    fn junction_at_cigar_tail(&self, end: ReadEnd) -> bool {
        (end == ReadEnd::End) == (self.strand() == ReqStrand::Forward)
    }

    /// Reference position of a breakend at the given end, after giving away `trimmed` read
    /// bases at that end. Deletions and skips left dangling by the trimming are given away
    /// as well. The result never leaves the spanned reference interval.
    pub fn breakend_position(&self, end: ReadEnd, trimmed: u32) -> u64 {
        let tail = self.junction_at_cigar_tail(end);
        let ops: Box<dyn Iterator<Item = &Cigar>> = if tail {
            Box::new(self.cigar().iter().rev())
        } else {
            Box::new(self.cigar().iter())
        };

        let mut remaining = trimmed;
        let mut consumed = 0;
        if trimmed > 0 {
            for op in ops {
                match op {
                    Cigar::SoftClip(_) | Cigar::HardClip(_) | Cigar::Pad(_) => (),
                    Cigar::Del(l) | Cigar::RefSkip(l) => consumed += *l as u64,
                    _ if remaining == 0 => break,
                    Cigar::Ins(l) => remaining -= remaining.min(*l),
                    op => {
                        let n = remaining.min(op.len());
                        consumed += n as u64;
                        remaining -= n;
                        if n < op.len() {
                            break;
                        }
                    }
                }
            }
        }
        let consumed = consumed.min(self.reference_length().saturating_sub(1));

        if tail {
            self.reference_end() - consumed
        } else {
            self.pos() + consumed
        }
    }

    /// 1-based reference position each read offset (read orientation) is aligned to.
    /// Clipped and inserted bases map to `None`.
    pub fn reference_positions(&self) -> Vec<Option<u64>> {
        let mut positions = Vec::with_capacity(self.read_length() as usize);
        let mut pos = self.pos();
        for op in self.cigar().iter() {
            if is_aligned(op) {
                for _ in 0..op.len() {
                    positions.push(Some(pos));
                    pos += 1;
                }
            } else if consumes_reference(op) {
                pos += op.len() as u64;
            } else if consumes_read(op) {
                positions.extend((0..op.len()).map(|_| None));
            }
        }
        if self.is_reverse() {
            positions.reverse();
        }
        positions
    }

    /// Total order of the alignments of a read: by offset within the read first, such that
    /// neighbours in this order are neighbours within the read.
    pub fn cmp_by_read_offset(&self, other: &ChimericAlignment) -> Ordering {
        let (a, b) = (self.read_span(), other.read_span());
        a.start
            .cmp(&b.start)
            .then(a.end.cmp(&b.end))
            .then_with(|| self.contig().cmp(other.contig()))
            .then(self.pos().cmp(&other.pos()))
            .then(self.is_reverse().cmp(&other.is_reverse()))
            .then_with(|| self.cigar().to_string().cmp(&other.cigar().to_string()))
    }
}

/// Neighbours of `local` in read order among `others`, together with their index in
/// `others`. Entries equal to `local` are ignored.
pub fn adjacent<'a>(
    local: &ChimericAlignment,
    others: &'a [ChimericAlignment],
) -> (
    Option<(usize, &'a ChimericAlignment)>,
    Option<(usize, &'a ChimericAlignment)>,
) {
    let pre = others
        .iter()
        .enumerate()
        .filter(|(_, other)| other.cmp_by_read_offset(local) == Ordering::Less)
        .max_by(|(_, a), (_, b)| a.cmp_by_read_offset(b));
    let post = others
        .iter()
        .enumerate()
        .filter(|(_, other)| other.cmp_by_read_offset(local) == Ordering::Greater)
        .min_by(|(_, a), (_, b)| a.cmp_by_read_offset(b));
    (pre, post)
}
