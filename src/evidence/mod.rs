// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::Result;
use rayon::prelude::*;
use rust_htslib::bam;

use crate::alignment::chimeric::strand_symbol;
use crate::alignment::ChimericAlignment;

pub mod breakend;
pub mod context;
pub mod scoring;
pub mod soft_clip;
pub mod split_read;

pub use self::breakend::{BreakendSummary, BreakpointSummary, Direction};
pub use self::context::{Contig, EvidenceContext, EvidenceContextBuilder};
pub use self::soft_clip::SoftClipEvidence;
pub use self::split_read::SplitReadEvidence;

/// Identifier of the evidence for the breakend of the given alignment in the given direction.
pub(crate) fn evidence_id(
    read_identifier: &str,
    alignment: &ChimericAlignment,
    direction: Direction,
) -> String {
    format!(
        "{}#{}:{}:{}:{}#{}",
        read_identifier,
        alignment.contig(),
        alignment.pos(),
        strand_symbol(alignment.strand()),
        alignment.cigar(),
        direction
    )
}

/// Evidence for a rearrangement provided by a single read record.
#[derive(Debug, Clone)]
pub enum SingleReadEvidence {
    Breakend(SoftClipEvidence),
    Breakpoint(SplitReadEvidence),
}

impl SingleReadEvidence {
    /// All evidence of the record. Split read evidence comes first, followed by soft clips at
    /// alignment ends that are not already part of a breakpoint.
    pub fn create_evidence(ctx: &EvidenceContext, record: &bam::Record) -> Result<Vec<Self>> {
        let split_reads = SplitReadEvidence::create(ctx, record)?;
        let covered: Vec<Direction> = split_reads
            .iter()
            .map(|e| e.breakend_summary().local().direction())
            .collect();

        let mut evidence: Vec<_> = split_reads
            .into_iter()
            .map(SingleReadEvidence::Breakpoint)
            .collect();
        for &direction in &[Direction::Backward, Direction::Forward] {
            if covered.contains(&direction) {
                continue;
            }
            if let Some(e) = SoftClipEvidence::create(ctx, record, direction)? {
                evidence.push(SingleReadEvidence::Breakend(e));
            }
        }
        Ok(evidence)
    }

    pub fn evidence_id(&self) -> &str {
        match self {
            SingleReadEvidence::Breakend(e) => e.evidence_id(),
            SingleReadEvidence::Breakpoint(e) => e.evidence_id(),
        }
    }

    /// Local breakend.
    pub fn breakend_summary(&self) -> BreakendSummary {
        match self {
            SingleReadEvidence::Breakend(e) => *e.breakend_summary(),
            SingleReadEvidence::Breakpoint(e) => *e.breakend_summary().local(),
        }
    }

    pub fn anchor_sequence(&self) -> &[u8] {
        match self {
            SingleReadEvidence::Breakend(e) => e.anchor_sequence(),
            SingleReadEvidence::Breakpoint(e) => e.anchor_sequence(),
        }
    }

    pub fn breakend_sequence(&self) -> &[u8] {
        match self {
            SingleReadEvidence::Breakend(e) => e.breakend_sequence(),
            SingleReadEvidence::Breakpoint(e) => e.breakend_sequence(),
        }
    }

    pub fn breakend_qual(&self) -> f64 {
        match self {
            SingleReadEvidence::Breakend(e) => e.breakend_qual(),
            SingleReadEvidence::Breakpoint(e) => e.breakend_qual(),
        }
    }

    pub fn is_breakend_exact(&self) -> bool {
        match self {
            SingleReadEvidence::Breakend(e) => e.is_breakend_exact(),
            SingleReadEvidence::Breakpoint(e) => e.is_breakend_exact(),
        }
    }

    pub fn involves_primary_read_alignment(&self) -> bool {
        match self {
            SingleReadEvidence::Breakend(e) => e.involves_primary_read_alignment(),
            SingleReadEvidence::Breakpoint(e) => e.involves_primary_read_alignment(),
        }
    }
}

/// Derive the evidence of independent records in parallel. Results are in input order.
pub fn create_all(
    ctx: &EvidenceContext,
    records: &[bam::Record],
) -> Vec<Result<Vec<SingleReadEvidence>>> {
    records
        .par_iter()
        .map(|record| SingleReadEvidence::create_evidence(ctx, record))
        .collect()
}
