// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use bio_types::strand::ReqStrand;
use rust_htslib::bam;
use rust_htslib::bam::record::CigarString;

use crate::alignment::{aux_tag_nm, aux_tag_sa};
use crate::errors::{invalid_chimeric_alignment, Error};
use crate::evidence::context::EvidenceContext;

/// One alignment of a read, as listed in the SA tag:
/// `contig,pos,strand,CIGAR,mapq,NM`.
#[derive(new, Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct ChimericAlignment {
    #[getset(get = "pub")]
    contig: String,
    /// 1-based position of the first aligned reference base.
    #[getset(get_copy = "pub")]
    pos: u64,
    #[getset(get_copy = "pub")]
    strand: ReqStrand,
    #[getset(get = "pub")]
    cigar: CigarString,
    #[getset(get_copy = "pub")]
    mapq: u8,
    #[getset(get_copy = "pub")]
    nm: u32,
}

impl ChimericAlignment {
    /// Chimeric alignment describing the given mapped record.
    pub fn from_record(record: &bam::Record, ctx: &EvidenceContext) -> Result<Self> {
        if record.is_unmapped() {
            return Err(Error::UnmappedRecord {
                name: String::from_utf8_lossy(record.qname()).into_owned(),
            }
            .into());
        }
        let contig = ctx.contig(record.tid())?;
        Ok(ChimericAlignment {
            contig: contig.name().to_owned(),
            pos: record.pos() as u64 + 1,
            strand: if record.is_reverse() {
                ReqStrand::Reverse
            } else {
                ReqStrand::Forward
            },
            cigar: record.cigar().take(),
            mapq: record.mapq(),
            nm: aux_tag_nm(record),
        })
    }

    /// All alignments listed in the SA tag of the record. Empty entries are skipped.
    pub fn from_sa_tag(record: &bam::Record) -> Result<Vec<Self>> {
        match aux_tag_sa(record)? {
            Some(sa) => sa
                .split(';')
                .filter(|entry| !entry.is_empty())
                .map(ChimericAlignment::from_str)
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    pub fn is_reverse(&self) -> bool {
        self.strand == ReqStrand::Reverse
    }
}

pub(crate) fn strand_symbol(strand: ReqStrand) -> char {
    match strand {
        ReqStrand::Forward => '+',
        ReqStrand::Reverse => '-',
    }
}

impl FromStr for ChimericAlignment {
    type Err = anyhow::Error;

    fn from_str(entry: &str) -> Result<Self> {
        let fields: Vec<&str> = entry.split(',').collect();
        if fields.len() != 6 {
            return Err(invalid_chimeric_alignment(
                entry,
                &format!("expected 6 fields, found {}", fields.len()),
            )
            .into());
        }
        if fields[0].is_empty() {
            return Err(invalid_chimeric_alignment(entry, "empty contig name").into());
        }
        let pos: u64 = fields[1]
            .parse()
            .map_err(|_| invalid_chimeric_alignment(entry, "position is not an integer"))?;
        if pos < 1 {
            return Err(invalid_chimeric_alignment(entry, "position has to be at least 1").into());
        }
        let strand = match fields[2] {
            "+" => ReqStrand::Forward,
            "-" => ReqStrand::Reverse,
            _ => {
                return Err(invalid_chimeric_alignment(entry, "strand has to be + or -").into())
            }
        };
        if fields[3].is_empty() || fields[3] == "*" {
            return Err(Error::InvalidCigar {
                cigar: fields[3].to_owned(),
            }
            .into());
        }
        let cigar = CigarString::try_from(fields[3]).map_err(|_| Error::InvalidCigar {
            cigar: fields[3].to_owned(),
        })?;
        let mapq: u8 = fields[4]
            .parse()
            .map_err(|_| invalid_chimeric_alignment(entry, "mapping quality is not an integer"))?;
        let nm: u32 = fields[5]
            .parse()
            .map_err(|_| invalid_chimeric_alignment(entry, "edit distance is not an integer"))?;

        Ok(ChimericAlignment {
            contig: fields[0].to_owned(),
            pos,
            strand,
            cigar,
            mapq,
            nm,
        })
    }
}

impl fmt::Display for ChimericAlignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.contig,
            self.pos,
            strand_symbol(self.strand),
            self.cigar,
            self.mapq,
            self.nm
        )
    }
}
