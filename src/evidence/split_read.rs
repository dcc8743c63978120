// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Breakpoints implied by the chimeric alignments of a single read.
//!
//! Every junction is resolved on the pair of alignments in read order. The alignment that
//! comes first in the read (`a`) has the junction at its read end, the later one (`b`) at
//! its read start. Evidence derived from either record of a junction therefore agrees on
//! positions, sequences and qualities.

use std::cmp;
use std::ops::Range;

use anyhow::Result;
use bio::alphabets::dna;
use itertools::{Itertools, MinMaxResult};
use rust_htslib::bam;

use crate::alignment::geometry::{adjacent, ReadEnd};
use crate::alignment::{is_hard_clipped, ChimericAlignment};
use crate::errors::Error;
use crate::evidence::breakend::{BreakendSummary, BreakpointSummary, Direction};
use crate::evidence::context::EvidenceContext;
use crate::evidence::{evidence_id, scoring};
use crate::sequence::{PackedSequence, Read};

/// A breakpoint between the alignment of a record and one of its chimeric alignments.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct SplitReadEvidence {
    #[getset(get = "pub")]
    evidence_id: String,
    /// Identifier of the same breakpoint derived from the record of the remote alignment.
    #[getset(get = "pub")]
    remote_evidence_id: String,
    #[getset(get = "pub")]
    breakend_summary: BreakpointSummary,
    #[getset(get = "pub")]
    local: ChimericAlignment,
    #[getset(get = "pub")]
    remote: ChimericAlignment,
    #[getset(get = "pub")]
    anchor_sequence: Vec<u8>,
    #[getset(get = "pub")]
    anchor_quality: Vec<u8>,
    #[getset(get = "pub")]
    breakend_sequence: Vec<u8>,
    #[getset(get = "pub")]
    breakend_quality: Vec<u8>,
    /// Read bases explained by neither alignment.
    #[getset(get = "pub")]
    untemplated_sequence: String,
    /// Read bases explained equally well by both alignments.
    #[getset(get = "pub")]
    homology_sequence: String,
    #[getset(get_copy = "pub")]
    homology_anchored_base_count: u32,
    #[getset(get_copy = "pub")]
    breakpoint_qual: f64,
    #[getset(get_copy = "pub")]
    breakend_qual: f64,
    #[getset(get_copy = "pub")]
    is_breakend_exact: bool,
    /// Whether moving one alignment next to the other explains the read without a breakpoint.
    #[getset(get_copy = "pub")]
    is_reference: bool,
    #[getset(get_copy = "pub")]
    involves_primary_read_alignment: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Interval {
    nominal: u64,
    start: u64,
    end: u64,
}

impl Interval {
    fn exact(pos: u64) -> Self {
        Interval {
            nominal: pos,
            start: pos,
            end: pos,
        }
    }

    fn between(x: u64, y: u64, nominal: u64) -> Self {
        Interval {
            nominal,
            start: x.min(y),
            end: x.max(y),
        }
    }

    /// Interval without preferred position; the nominal position is its (upper) midpoint.
    fn spanning(start: u64, end: u64) -> Self {
        Interval {
            nominal: (start + end + 1) / 2,
            start,
            end,
        }
    }
}

/// Resolution of the junction between the read end of `a` and the read start of `b`.
#[derive(Debug)]
struct Junction {
    /// Read bases `a` gives away at its read end.
    a_trim: u32,
    /// Read bases `b` gives away at its read start.
    b_trim: u32,
    a_breakend: Interval,
    b_breakend: Interval,
    /// Read offsets, read orientation.
    untemplated: Range<u32>,
    homology: Range<u32>,
    exact: bool,
}

fn span_len(span: &Range<u32>) -> u32 {
    span.end.saturating_sub(span.start)
}

fn empty_at(pos: u32) -> Range<u32> {
    pos..pos
}

impl SplitReadEvidence {
    /// Derive the evidence of the given record: the breakpoint with the alignment preceding it
    /// in the read first, then the one with the alignment succeeding it.
    ///
    /// Records with hard clips yield no evidence, because their clipped bases are missing.
    /// Aligners commonly hard clip supplementary records, and the breakpoints of such a read
    /// are then only seen from its primary record. Convert hard clips of supplementary
    /// records into soft clips (restoring bases and qualities from the primary record) before
    /// deriving evidence.
    pub fn create(ctx: &EvidenceContext, record: &bam::Record) -> Result<Vec<Self>> {
        if record.is_unmapped() {
            return Err(Error::UnmappedRecord {
                name: String::from_utf8_lossy(record.qname()).into_owned(),
            }
            .into());
        }
        let remotes = ChimericAlignment::from_sa_tag(record)?;
        if remotes.is_empty() {
            return Ok(Vec::new());
        }
        let read = Read::new(record)?;
        if is_hard_clipped(&record.cigar()) {
            warn!(
                "Skipping split read evidence of {}: hard clipped bases are unavailable.",
                read.identifier()
            );
            return Ok(Vec::new());
        }

        let local = ChimericAlignment::from_record(record, ctx)?;
        let read_len = read.len() as u32;
        for alignment in Some(&local).into_iter().chain(remotes.iter()) {
            let found = alignment.read_length();
            if found != read_len {
                return Err(Error::ReadLengthMismatch {
                    name: read.identifier().to_owned(),
                    entry: alignment.to_string(),
                    expected: read_len,
                    found,
                }
                .into());
            }
        }

        let (pre, post) = adjacent(&local, &remotes);
        let mut evidence = Vec::with_capacity(2);
        if let Some((index, remote)) = pre {
            evidence.push(Self::from_junction(
                ctx, record, &read, &local, remote, index, false,
            )?);
        }
        if let Some((index, remote)) = post {
            evidence.push(Self::from_junction(
                ctx, record, &read, &local, remote, index, true,
            )?);
        }
        debug!(
            "{} split read evidence for {}.",
            evidence.len(),
            read.identifier()
        );
        Ok(evidence)
    }

    #[allow(clippy::too_many_arguments)]
    fn from_junction(
        ctx: &EvidenceContext,
        record: &bam::Record,
        read: &Read,
        local: &ChimericAlignment,
        remote: &ChimericAlignment,
        remote_index: usize,
        local_first: bool,
    ) -> Result<Self> {
        let (a, b) = if local_first {
            (local, remote)
        } else {
            (remote, local)
        };
        let (a_span, b_span) = (a.read_span(), b.read_span());
        let junction = resolve(ctx, read, a, b);

        let a_direction = a.breakend_direction(ReadEnd::End);
        let b_direction = b.breakend_direction(ReadEnd::Start);
        let a_summary = summarise(ctx, a, a_direction, junction.a_breakend)?;
        let b_summary = summarise(ctx, b, b_direction, junction.b_breakend)?;

        let read_len = read.len() as u32;
        // local anchor and breakend, read orientation
        let (local_summary, remote_summary, local_direction, remote_direction, anchor, breakend) =
            if local_first {
                let boundary = a_span.end - junction.a_trim;
                let anchor = if a.is_anchored() {
                    a_span.start..boundary
                } else {
                    empty_at(boundary)
                };
                let stop = if b.is_anchored() {
                    read_len
                } else {
                    cmp::max(boundary, b_span.start + junction.b_trim)
                };
                (
                    a_summary,
                    b_summary,
                    a_direction,
                    b_direction,
                    anchor,
                    boundary..stop,
                )
            } else {
                let boundary = b_span.start + junction.b_trim;
                let anchor = if b.is_anchored() {
                    boundary..b_span.end
                } else {
                    empty_at(boundary)
                };
                let stop = if a.is_anchored() {
                    0
                } else {
                    cmp::min(boundary, a_span.end - junction.a_trim)
                };
                (
                    b_summary,
                    a_summary,
                    b_direction,
                    a_direction,
                    anchor,
                    stop..boundary,
                )
            };

        let stored = |range: &Range<u32>| -> Range<usize> {
            let (start, end) = if read.is_reverse() {
                (read_len - range.end, read_len - range.start)
            } else {
                (range.start, range.end)
            };
            start as usize..end as usize
        };
        let bases = |range: &Range<u32>| -> Result<Vec<u8>> {
            let range = stored(range);
            read.seq().get_bytes(range.start, range.len())
        };
        let quals = |range: &Range<u32>| -> Vec<u8> {
            read.qual().get(stored(range)).unwrap_or(&[]).to_vec()
        };

        // bases crossing the junction, read orientation
        let read_qual = read.read_qual();
        let from = cmp::min(a_span.end, b_span.start).saturating_sub(1) as usize;
        let to = cmp::min(cmp::max(a_span.end, b_span.start) + 1, read_len) as usize;
        let junction_quals = read_qual.get(from..to).unwrap_or(&[]);

        let homology = String::from_utf8_lossy(&bases(&junction.homology)?).into_owned();
        Ok(SplitReadEvidence {
            evidence_id: evidence_id(read.identifier(), local, local_direction),
            remote_evidence_id: evidence_id(read.identifier(), remote, remote_direction),
            breakend_summary: BreakpointSummary::new(local_summary, remote_summary),
            anchor_sequence: bases(&anchor)?,
            anchor_quality: quals(&anchor),
            breakend_sequence: bases(&breakend)?,
            breakend_quality: quals(&breakend),
            untemplated_sequence: String::from_utf8_lossy(&bases(&junction.untemplated)?)
                .into_owned(),
            homology_anchored_base_count: homology.len() as u32,
            homology_sequence: homology,
            breakpoint_qual: scoring::breakpoint_qual(
                a.mapq(),
                b.mapq(),
                junction_quals,
                ctx.min_mapq(),
            ),
            breakend_qual: scoring::breakend_qual(
                cmp::max(a.mapq(), b.mapq()),
                junction_quals,
                ctx.min_mapq(),
            ),
            is_breakend_exact: junction.exact,
            is_reference: is_reference(ctx, read, a, b),
            involves_primary_read_alignment: !record.is_supplementary() || remote_index == 0,
            local: local.clone(),
            remote: remote.clone(),
        })
    }

    pub fn local_mapq(&self) -> u8 {
        self.local.mapq()
    }

    pub fn remote_mapq(&self) -> u8 {
        self.remote.mapq()
    }
}

fn summarise(
    ctx: &EvidenceContext,
    alignment: &ChimericAlignment,
    direction: Direction,
    interval: Interval,
) -> Result<BreakendSummary> {
    let index = ctx.contig_index(alignment.contig())?;
    let len = ctx.contigs()[index].len();
    Ok(BreakendSummary::new(
        index,
        direction,
        interval.nominal,
        interval.start,
        interval.end,
    )
    .clamp(len))
}

fn resolve(
    ctx: &EvidenceContext,
    read: &Read,
    a: &ChimericAlignment,
    b: &ChimericAlignment,
) -> Junction {
    let (a_span, b_span) = (a.read_span(), b.read_span());
    let gap = b_span.start as i64 - a_span.end as i64;

    if !a.is_anchored() || !b.is_anchored() {
        return resolve_unanchored(a, b, gap);
    }
    if gap >= 0 {
        return Junction {
            a_trim: 0,
            b_trim: 0,
            a_breakend: Interval::exact(a.breakend_position(ReadEnd::End, 0)),
            b_breakend: Interval::exact(b.breakend_position(ReadEnd::Start, 0)),
            untemplated: a_span.end..b_span.start,
            homology: empty_at(a_span.end),
            exact: true,
        };
    }

    // read bases placed by both alignments; b may lie within a
    let overlap = cmp::max(a_span.start, b_span.start)..cmp::min(a_span.end, b_span.end);
    // a gives away at least the bases past the overlap, at most the overlap as well
    let (a_min_trim, a_max_trim) = (a_span.end - overlap.end, a_span.end - overlap.start);
    let k = span_len(&overlap);
    match (
        placement_matches(ctx, read, a, overlap.clone()),
        placement_matches(ctx, read, b, overlap.clone()),
    ) {
        (Some(left), Some(right)) if left != right => {
            split_overlap(a, b, &a_span, &b_span, &overlap, &left, &right)
        }
        _ => {
            // microhomology: every split is equally good
            let (a_untrimmed, a_trimmed) = (
                a.breakend_position(ReadEnd::End, a_min_trim),
                a.breakend_position(ReadEnd::End, a_max_trim),
            );
            let (b_untrimmed, b_trimmed) = (
                b.breakend_position(ReadEnd::Start, 0),
                b.breakend_position(ReadEnd::Start, k),
            );
            Junction {
                a_trim: a_min_trim,
                b_trim: 0,
                a_breakend: Interval::between(a_untrimmed, a_trimmed, a_untrimmed),
                b_breakend: Interval::between(b_untrimmed, b_trimmed, b_trimmed),
                untemplated: empty_at(overlap.end),
                homology: overlap,
                exact: true,
            }
        }
    }
}

/// Split a disputed overlap at the boundary with the fewest mismatches. `left` and `right`
/// tell whether each overlap base matches the reference under the placement of `a`
/// respectively `b`. Mismatching bases next to the boundary are explained by neither side.
fn split_overlap(
    a: &ChimericAlignment,
    b: &ChimericAlignment,
    a_span: &Range<u32>,
    b_span: &Range<u32>,
    overlap: &Range<u32>,
    left: &[bool],
    right: &[bool],
) -> Junction {
    let k = left.len();
    let mismatches = |s: usize| {
        left[..s].iter().filter(|m| !**m).count() + right[s..].iter().filter(|m| !**m).count()
    };
    // ties go to the largest split, i.e. to a
    let split = (0..=k).fold(0, |best, s| {
        if mismatches(s) <= mismatches(best) {
            s
        } else {
            best
        }
    });
    let left_run = left[..split].iter().rev().take_while(|m| !**m).count() as u32;
    let right_run = right[split..].iter().take_while(|m| !**m).count() as u32;

    let boundary = overlap.start + split as u32;
    let a_trim = a_span.end - boundary + left_run;
    let b_trim = boundary - b_span.start + right_run;
    let untemplated_start = boundary - left_run;
    Junction {
        a_trim,
        b_trim,
        a_breakend: Interval::exact(a.breakend_position(ReadEnd::End, a_trim)),
        b_breakend: Interval::exact(b.breakend_position(ReadEnd::Start, b_trim)),
        untemplated: untemplated_start..boundary + right_run,
        homology: empty_at(untemplated_start),
        exact: true,
    }
}

/// Junction involving an alignment that does not anchor its bases. Its breakend can be
/// anywhere within its reference span, and the anchored side gets an interval of the same
/// width extending away from its anchor.
fn resolve_unanchored(a: &ChimericAlignment, b: &ChimericAlignment, gap: i64) -> Junction {
    let (a_span, b_span) = (a.read_span(), b.read_span());
    let overlap = if gap < 0 { (-gap) as u32 } else { 0 };
    let (a_trim, b_trim) = if !a.is_anchored() {
        let trim = overlap.min(span_len(&a_span));
        (trim, (overlap - trim).min(span_len(&b_span)))
    } else {
        let trim = overlap.min(span_len(&b_span));
        ((overlap - trim).min(span_len(&a_span)), trim)
    };

    let span = |alignment: &ChimericAlignment| {
        Interval::spanning(alignment.pos(), alignment.reference_end())
    };
    let outward = |alignment: &ChimericAlignment, end: ReadEnd, trim: u32, width: u64| {
        let pos = alignment.breakend_position(end, trim);
        match alignment.breakend_direction(end) {
            Direction::Forward => Interval::spanning(pos, pos + width),
            Direction::Backward => Interval::spanning(pos.saturating_sub(width).max(1), pos),
        }
    };
    let width = |alignment: &ChimericAlignment| alignment.reference_end() - alignment.pos();

    let a_breakend = if a.is_anchored() {
        outward(a, ReadEnd::End, a_trim, width(b))
    } else {
        span(a)
    };
    let b_breakend = if b.is_anchored() {
        outward(b, ReadEnd::Start, b_trim, width(a))
    } else {
        span(b)
    };

    let untemplated_start = a_span.end - a_trim;
    Junction {
        a_trim,
        b_trim,
        a_breakend,
        b_breakend,
        untemplated: untemplated_start..cmp::max(untemplated_start, b_span.start + b_trim),
        homology: empty_at(untemplated_start),
        exact: false,
    }
}

/// Whether each read base in `range` (read orientation) matches the reference where the
/// alignment places it. `None` if the reference is unavailable.
fn placement_matches(
    ctx: &EvidenceContext,
    read: &Read,
    alignment: &ChimericAlignment,
    range: Range<u32>,
) -> Option<Vec<bool>> {
    let positions = alignment.reference_positions();
    let placed: Vec<Option<u64>> = range
        .clone()
        .map(|i| positions.get(i as usize).copied().flatten())
        .collect();
    let (first, last) = match placed.iter().flatten().minmax() {
        MinMaxResult::NoElements => return Some(vec![false; placed.len()]),
        MinMaxResult::OneElement(&pos) => (pos, pos),
        MinMaxResult::MinMax(&first, &last) => (first, last),
    };
    let window =
        ctx.reference_window(alignment.contig(), first, (last - first + 1) as usize, false)?;
    let expected: Vec<u8> = placed
        .iter()
        .map(|pos| match pos {
            Some(pos) => {
                let base = window[(pos - first) as usize];
                if alignment.is_reverse() {
                    dna::complement(base)
                } else {
                    base
                }
            }
            None => b'N',
        })
        .collect();
    let expected = PackedSequence::new(&expected, false, false);

    Some(
        range
            .enumerate()
            .map(|(j, i)| PackedSequence::base_matches(read.read_seq(), i as usize, &expected, j))
            .collect(),
    )
}

/// Whether the read bases `range` (read orientation) continue the alignment without a
/// mismatch past the given end.
fn extension_matches(
    ctx: &EvidenceContext,
    read: &Read,
    alignment: &ChimericAlignment,
    end: ReadEnd,
    range: Range<u32>,
) -> bool {
    let len = span_len(&range) as usize;
    if len == 0 {
        return true;
    }
    let start = match alignment.breakend_direction(end) {
        Direction::Forward => alignment.reference_end() + 1,
        Direction::Backward => match alignment.pos().checked_sub(len as u64) {
            Some(start) if start >= 1 => start,
            _ => return false,
        },
    };
    let window = match ctx.reference_window(alignment.contig(), start, len, alignment.is_reverse())
    {
        Some(window) => window,
        None => return false,
    };
    let bases = match read.read_seq().get_bytes(range.start as usize, len) {
        Ok(bases) => bases,
        Err(_) => return false,
    };
    PackedSequence::overlap_matches(
        &PackedSequence::new(&bases, false, false),
        &PackedSequence::new(&window, false, false),
        0,
    ) == len
}

/// Whether either alignment, extended over the read bases of the other, matches the reference.
fn is_reference(
    ctx: &EvidenceContext,
    read: &Read,
    a: &ChimericAlignment,
    b: &ChimericAlignment,
) -> bool {
    let (a_span, b_span) = (a.read_span(), b.read_span());
    extension_matches(
        ctx,
        read,
        a,
        ReadEnd::End,
        a_span.end..cmp::max(a_span.end, b_span.end),
    ) || extension_matches(
        ctx,
        read,
        b,
        ReadEnd::Start,
        cmp::min(a_span.start, b_span.start)..b_span.start,
    )
}
