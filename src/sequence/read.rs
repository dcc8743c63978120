// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::Result;
use rust_htslib::bam;

use crate::errors::Error;
use crate::sequence::PackedSequence;

/// Identifier of a read: the record name, suffixed with the segment for paired records.
pub fn read_identifier(record: &bam::Record) -> String {
    let name = String::from_utf8_lossy(record.qname());
    if record.is_paired() {
        if record.is_first_in_template() {
            return format!("{}/1", name);
        } else if record.is_last_in_template() {
            return format!("{}/2", name);
        }
    }
    name.into_owned()
}

/// A mapped read with its bases packed in alignment (SAM) orientation and in the
/// orientation they were sequenced in.
#[derive(Debug, Clone, Getters)]
pub struct Read {
    #[getset(get = "pub")]
    identifier: String,
    /// Bases as stored in the record.
    #[getset(get = "pub")]
    seq: PackedSequence,
    /// Bases in sequencing orientation, i.e. reverse complemented for reverse strand records.
    #[getset(get = "pub")]
    read_seq: PackedSequence,
    #[getset(get = "pub")]
    qual: Vec<u8>,
    /// Identifier of the mate, if this read was created as part of a pair.
    #[getset(get = "pub")]
    mate: Option<String>,
    reverse: bool,
}

impl Read {
    pub fn new(record: &bam::Record) -> Result<Self> {
        if record.is_unmapped() {
            return Err(Error::UnmappedRecord {
                name: String::from_utf8_lossy(record.qname()).into_owned(),
            }
            .into());
        }
        let bases = record.seq().as_bytes();
        let reverse = record.is_reverse();
        Ok(Read {
            identifier: read_identifier(record),
            seq: PackedSequence::new(&bases, false, false),
            read_seq: PackedSequence::new(&bases, reverse, reverse),
            qual: record.qual().to_vec(),
            mate: None,
            reverse,
        })
    }

    /// Create both reads of a pair, each referring to the other by identifier.
    pub fn pair(record: &bam::Record, mate: &bam::Record) -> Result<(Self, Self)> {
        let mut first = Read::new(record)?;
        let mut second = Read::new(mate)?;
        first.mate = Some(second.identifier.clone());
        second.mate = Some(first.identifier.clone());
        Ok((first, second))
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    /// Base qualities in sequencing orientation.
    pub fn read_qual(&self) -> Vec<u8> {
        if self.reverse {
            self.qual.iter().rev().cloned().collect()
        } else {
            self.qual.clone()
        }
    }
}
