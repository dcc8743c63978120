// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::Result;
use rust_htslib::bam;

use crate::alignment::{ChimericAlignment, Clips};
use crate::evidence::breakend::{BreakendSummary, Direction};
use crate::evidence::context::EvidenceContext;
use crate::evidence::{evidence_id, scoring};
use crate::sequence::Read;

/// A single sided breakend given by the soft clipped bases at one end of an alignment.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct SoftClipEvidence {
    #[getset(get = "pub")]
    evidence_id: String,
    #[getset(get = "pub")]
    breakend_summary: BreakendSummary,
    #[getset(get = "pub")]
    alignment: ChimericAlignment,
    #[getset(get = "pub")]
    anchor_sequence: Vec<u8>,
    #[getset(get = "pub")]
    anchor_quality: Vec<u8>,
    #[getset(get = "pub")]
    breakend_sequence: Vec<u8>,
    #[getset(get = "pub")]
    breakend_quality: Vec<u8>,
    #[getset(get_copy = "pub")]
    breakend_qual: f64,
    #[getset(get_copy = "pub")]
    is_breakend_exact: bool,
    #[getset(get_copy = "pub")]
    involves_primary_read_alignment: bool,
}

impl SoftClipEvidence {
    /// Evidence for the soft clip at the reference start (backward) or end (forward) of the
    /// record. `None` if the clip is shorter than the configured minimum.
    pub fn create(
        ctx: &EvidenceContext,
        record: &bam::Record,
        direction: Direction,
    ) -> Result<Option<Self>> {
        let alignment = ChimericAlignment::from_record(record, ctx)?;
        let read = Read::new(record)?;
        let (leading, trailing) = (
            Clips::leading(alignment.cigar()),
            Clips::trailing(alignment.cigar()),
        );
        let clip = match direction {
            Direction::Backward => leading.soft(),
            Direction::Forward => trailing.soft(),
        } as usize;
        if clip == 0 || clip < ctx.min_soft_clip_len() as usize || clip > read.len() {
            return Ok(None);
        }

        // soft clipped bases are stored in the record, hard clipped ones are not
        let len = read.len();
        let anchor_start = leading.soft() as usize;
        let anchor_end = len.saturating_sub(trailing.soft() as usize);
        let (breakend, scored) = match direction {
            Direction::Backward => (0..clip, 0..(clip + 1).min(len)),
            Direction::Forward => (len - clip..len, (len - clip).saturating_sub(1)..len),
        };

        let contig = ctx.contig_index(alignment.contig())?;
        let summary = if alignment.is_anchored() {
            let pos = match direction {
                Direction::Backward => alignment.pos(),
                Direction::Forward => alignment.reference_end(),
            };
            BreakendSummary::exact(contig, direction, pos)
        } else {
            let (start, end) = (alignment.pos(), alignment.reference_end());
            BreakendSummary::new(contig, direction, (start + end + 1) / 2, start, end)
        };
        let quals = read.qual();

        Ok(Some(SoftClipEvidence {
            evidence_id: evidence_id(read.identifier(), &alignment, direction),
            breakend_summary: summary,
            anchor_sequence: read
                .seq()
                .get_bytes(anchor_start, anchor_end.saturating_sub(anchor_start))?,
            anchor_quality: quals.get(anchor_start..anchor_end).unwrap_or(&[]).to_vec(),
            breakend_sequence: read.seq().get_bytes(breakend.start, breakend.len())?,
            breakend_quality: quals.get(breakend).unwrap_or(&[]).to_vec(),
            breakend_qual: scoring::breakend_qual(
                alignment.mapq(),
                quals.get(scored).unwrap_or(&[]),
                ctx.min_mapq(),
            ),
            is_breakend_exact: alignment.is_anchored(),
            involves_primary_read_alignment: !record.is_supplementary(),
            alignment,
        }))
    }
}
