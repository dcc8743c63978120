// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("invalid chimeric alignment '{entry}': {msg}")]
    InvalidChimericAlignment { entry: String, msg: String },
    #[error("invalid CIGAR string '{cigar}'")]
    InvalidCigar { cigar: String },
    #[error("SA tag of record {name} is not a string")]
    InvalidSaTag { name: String },
    #[error("chimeric alignment {entry} implies a read length of {found}, but record {name} has length {expected}")]
    ReadLengthMismatch {
        name: String,
        entry: String,
        expected: u32,
        found: u32,
    },
    #[error("contig {name} not found in sequence dictionary")]
    UnknownContig { name: String },
    #[error("reference index {tid} not found in sequence dictionary")]
    UnknownContigIndex { tid: i32 },
    #[error("orientation of unmapped read {name} unknown")]
    UnmappedRecord { name: String },
    #[error("position {index} out of bounds for sequence of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("invalid k-mer length {k}, must be between 1 and 32")]
    InvalidKmerLength { k: usize },
}

pub(crate) fn invalid_chimeric_alignment(entry: &str, msg: &str) -> Error {
    Error::InvalidChimericAlignment {
        entry: entry.to_owned(),
        msg: msg.to_owned(),
    }
}
