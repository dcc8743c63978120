// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::Result;
use rust_htslib::bam;
use rust_htslib::bam::record::{Aux, Cigar};

use crate::errors::Error;

pub mod chimeric;
pub mod geometry;

pub use self::chimeric::ChimericAlignment;

pub struct Clips {
    hard: u32,
    soft: u32,
}

impl Clips {
    fn new(cigar: &[Cigar], trailing: bool) -> Self {
        let ops = if trailing {
            let n = cigar.len();
            (
                cigar.last(),
                if n > 1 { cigar.get(n - 2) } else { None },
            )
        } else {
            (cigar.first(), cigar.get(1))
        };

        // first comes outer, second comes inner operation
        match ops {
            (Some(&Cigar::HardClip(j)), Some(&Cigar::SoftClip(i))) => Clips { hard: j, soft: i },
            (Some(&Cigar::SoftClip(i)), _) => Clips { hard: 0, soft: i },
            (Some(&Cigar::HardClip(j)), _) => Clips { hard: j, soft: 0 },
            _ => Clips { hard: 0, soft: 0 },
        }
    }

    /// Trailing clips in the cigar string.
    pub fn trailing(cigar: &[Cigar]) -> Self {
        Clips::new(cigar, true)
    }

    /// Leading clips in the cigar string.
    pub fn leading(cigar: &[Cigar]) -> Self {
        Clips::new(cigar, false)
    }

    /// Number of hard clipped bases.
    pub fn hard(&self) -> u32 {
        self.hard
    }

    /// Number of soft clipped bases.
    pub fn soft(&self) -> u32 {
        self.soft
    }

    /// Number of both hard and soft clipped bases.
    pub fn both(&self) -> u32 {
        self.hard + self.soft
    }
}

/// Whether the operation consumes read bases, clipped ones included.
pub(crate) fn consumes_read(op: &Cigar) -> bool {
    matches!(
        op,
        Cigar::Match(_)
            | Cigar::Ins(_)
            | Cigar::SoftClip(_)
            | Cigar::HardClip(_)
            | Cigar::Equal(_)
            | Cigar::Diff(_)
    )
}

/// Whether the operation places read bases on the reference.
pub(crate) fn is_aligned(op: &Cigar) -> bool {
    matches!(op, Cigar::Match(_) | Cigar::Equal(_) | Cigar::Diff(_))
}

pub(crate) fn consumes_reference(op: &Cigar) -> bool {
    matches!(
        op,
        Cigar::Match(_) | Cigar::Del(_) | Cigar::RefSkip(_) | Cigar::Equal(_) | Cigar::Diff(_)
    )
}

pub(crate) fn is_hard_clipped(cigar: &[Cigar]) -> bool {
    Clips::leading(cigar).hard() > 0 || Clips::trailing(cigar).hard() > 0
}

/// The SA tag of the record, if present.
pub(crate) fn aux_tag_sa(record: &bam::Record) -> Result<Option<&str>> {
    match record.aux(b"SA") {
        Ok(Aux::String(sa)) => Ok(Some(sa)),
        Ok(_) => Err(Error::InvalidSaTag {
            name: String::from_utf8_lossy(record.qname()).into_owned(),
        }
        .into()),
        Err(_) => Ok(None),
    }
}

/// Edit distance given by the NM tag, 0 if missing.
pub(crate) fn aux_tag_nm(record: &bam::Record) -> u32 {
    match record.aux(b"NM") {
        Ok(Aux::U8(v)) => v as u32,
        Ok(Aux::U16(v)) => v as u32,
        Ok(Aux::U32(v)) => v,
        Ok(Aux::I8(v)) => v.max(0) as u32,
        Ok(Aux::I16(v)) => v.max(0) as u32,
        Ok(Aux::I32(v)) => v.max(0) as u32,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_htslib::bam::record::CigarString;
    use std::convert::TryFrom;

    #[test]
    fn test_clips() {
        let cigar = CigarString::try_from("2H3S10M4S").unwrap();
        let leading = Clips::leading(&cigar);
        assert_eq!(leading.hard(), 2);
        assert_eq!(leading.soft(), 3);
        assert_eq!(Clips::trailing(&cigar).both(), 4);
        assert!(is_hard_clipped(&cigar));
        assert!(!is_hard_clipped(&CigarString::try_from("3S7M").unwrap()));
    }

    #[test]
    fn test_nm_tag() {
        let mut record = bam::Record::new();
        assert_eq!(aux_tag_nm(&record), 0);
        record.push_aux(b"NM", Aux::U8(3)).unwrap();
        assert_eq!(aux_tag_nm(&record), 3);
    }
}
