// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::sync::Arc;

use anyhow::Result;
use bio::alphabets::dna;
use rust_htslib::bam;

use crate::errors::Error;
use crate::reference;

/// A reference sequence of the sequence dictionary.
#[derive(new, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, CopyGetters)]
pub struct Contig {
    #[getset(get = "pub")]
    name: String,
    #[getset(get_copy = "pub")]
    len: u64,
}

/// Settings shared by all evidence derived from one alignment source.
#[derive(Builder, Clone, Getters, CopyGetters)]
#[builder(pattern = "owned")]
pub struct EvidenceContext {
    #[getset(get = "pub")]
    contigs: Vec<Contig>,
    /// Reference sequences. Without them, every comparison against the reference fails.
    #[builder(default)]
    #[getset(get = "pub")]
    reference: Option<Arc<reference::Buffer>>,
    /// Alignments below this mapping quality are not trusted when scoring.
    #[builder(default)]
    #[getset(get_copy = "pub")]
    min_mapq: u8,
    /// Minimum length of a soft clip to be reported as breakend evidence.
    #[builder(default = "1")]
    #[getset(get_copy = "pub")]
    min_soft_clip_len: u32,
}

impl EvidenceContext {
    /// Builder with the sequence dictionary taken from the given BAM header.
    pub fn builder_from_header(header: &bam::HeaderView) -> EvidenceContextBuilder {
        let contigs = header
            .target_names()
            .iter()
            .enumerate()
            .map(|(tid, name)| {
                Contig::new(
                    String::from_utf8_lossy(name).into_owned(),
                    header.target_len(tid as u32).unwrap_or(0),
                )
            })
            .collect();
        EvidenceContextBuilder::default().contigs(contigs)
    }

    pub fn contig(&self, tid: i32) -> Result<&Contig> {
        if tid < 0 {
            return Err(Error::UnknownContigIndex { tid }.into());
        }
        self.contigs
            .get(tid as usize)
            .ok_or_else(|| Error::UnknownContigIndex { tid }.into())
    }

    pub fn contig_index(&self, name: &str) -> Result<usize> {
        self.contigs
            .iter()
            .position(|contig| contig.name == name)
            .ok_or_else(|| {
                Error::UnknownContig {
                    name: name.to_owned(),
                }
                .into()
            })
    }

    /// Reference bases `start..start + len` (1-based) of the given contig, reverse
    /// complemented if requested. `None` if there is no reference or the window does not fit.
    pub(crate) fn reference_window(
        &self,
        contig: &str,
        start: u64,
        len: usize,
        revcomp: bool,
    ) -> Option<Vec<u8>> {
        let buffer = self.reference.as_ref()?;
        let seq = match buffer.seq(contig) {
            Ok(seq) => seq,
            Err(e) => {
                debug!("reference unavailable for {}: {}", contig, e);
                return None;
            }
        };
        if start < 1 {
            return None;
        }
        let from = (start - 1) as usize;
        let window = seq.get(from..from + len)?.to_ascii_uppercase();
        Some(if revcomp {
            dna::revcomp(&window)
        } else {
            window
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> EvidenceContext {
        EvidenceContextBuilder::default()
            .contigs(vec![
                Contig::new("chr1".to_owned(), 10),
                Contig::new("chr2".to_owned(), 20),
            ])
            .reference(Some(Arc::new(reference::Buffer::from_sequences(vec![(
                "chr1".to_owned(),
                b"ACGTtacgNN".to_vec(),
            )]))))
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let ctx = ctx();
        assert_eq!(ctx.min_mapq(), 0);
        assert_eq!(ctx.min_soft_clip_len(), 1);
    }

    #[test]
    fn test_contig_lookup() {
        let ctx = ctx();
        assert_eq!(ctx.contig(1).unwrap().name(), "chr2");
        assert_eq!(ctx.contig_index("chr2").unwrap(), 1);
        assert!(matches!(
            ctx.contig(2).unwrap_err().downcast_ref::<Error>(),
            Some(Error::UnknownContigIndex { tid: 2 })
        ));
        assert!(ctx.contig_index("chrX").is_err());
    }

    #[test]
    fn test_reference_window() {
        let ctx = ctx();
        assert_eq!(ctx.reference_window("chr1", 3, 4, false), Some(b"GTTA".to_vec()));
        assert_eq!(ctx.reference_window("chr1", 1, 3, true), Some(b"CGT".to_vec()));
        assert_eq!(ctx.reference_window("chr1", 9, 3, false), None);
        assert_eq!(ctx.reference_window("chr2", 1, 1, false), None);
    }

    #[test]
    fn test_builder_from_header() {
        let header = bam::HeaderView::from_bytes(b"@SQ\tSN:chr1\tLN:1000\n@SQ\tSN:chrM\tLN:16569\n");
        let ctx = EvidenceContext::builder_from_header(&header)
            .min_mapq(10)
            .build()
            .unwrap();
        assert_eq!(
            ctx.contigs(),
            &vec![
                Contig::new("chr1".to_owned(), 1000),
                Contig::new("chrM".to_owned(), 16569)
            ]
        );
        assert_eq!(ctx.min_mapq(), 10);
        assert_eq!(ctx.contig_index("chrM").unwrap(), 1);
    }
}
