// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Split read evidence for structural variant calling.
//!
//! A read whose parts align to different places of the genome is split into its chimeric
//! alignments (primary and supplementary records, linked via the SA tag). Each pair of
//! alignments that are neighbours within the read yields a breakpoint, see
//! [`evidence::SplitReadEvidence`]. Read and contig bases are handled in two bit packed form,
//! see [`sequence::PackedSequence`].

#[macro_use]
extern crate log;
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate getset;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate serde_derive;
#[cfg(test)]
#[macro_use]
extern crate approx;

pub mod alignment;
pub mod errors;
pub mod evidence;
pub mod reference;
pub mod sequence;

pub use crate::alignment::ChimericAlignment;
pub use crate::evidence::{create_all, EvidenceContext, SingleReadEvidence, SplitReadEvidence};
pub use crate::sequence::{PackedSequence, Read};
