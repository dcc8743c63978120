#![allow(dead_code)]

use std::convert::TryFrom;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_htslib::bam;
use rust_htslib::bam::record::{Aux, Cigar, CigarString};

use sv_evidence::evidence::{Contig, EvidenceContext, EvidenceContextBuilder};
use sv_evidence::reference::Buffer;
use sv_evidence::ChimericAlignment;

pub(crate) const CONTIG_LEN: usize = 10000;

/// Pseudo random bases, the same on every run.
fn random_bases(len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
}

/// Contigs `polyA` (0), `polyACGT` (1) and `random` (2).
pub(crate) fn reference_sequences() -> Vec<(String, Vec<u8>)> {
    vec![
        ("polyA".to_owned(), vec![b'A'; CONTIG_LEN]),
        ("polyACGT".to_owned(), b"ACGT".repeat(CONTIG_LEN / 4)),
        ("random".to_owned(), random_bases(CONTIG_LEN)),
    ]
}

fn builder() -> EvidenceContextBuilder {
    EvidenceContextBuilder::default().contigs(
        reference_sequences()
            .into_iter()
            .map(|(name, seq)| Contig::new(name, seq.len() as u64))
            .collect(),
    )
}

pub(crate) fn context() -> EvidenceContext {
    context_with(reference_sequences())
}

/// Context over the default contigs, with the given reference sequences.
pub(crate) fn context_with(sequences: Vec<(String, Vec<u8>)>) -> EvidenceContext {
    builder()
        .reference(Some(Arc::new(Buffer::from_sequences(sequences))))
        .build()
        .unwrap()
}

pub(crate) fn context_without_reference() -> EvidenceContext {
    builder().build().unwrap()
}

/// Forward strand record named `read` at the given 1-based position, with poly-A bases,
/// base qualities of 30 and a mapping quality of 60.
pub(crate) fn read(tid: i32, pos: u64, cigar: &str) -> bam::Record {
    let cigar = CigarString::try_from(cigar).unwrap();
    // bases stored in the record, i.e. without hard clips
    let len: u32 = cigar
        .iter()
        .filter(|op| {
            matches!(
                op,
                Cigar::Match(_) | Cigar::Ins(_) | Cigar::SoftClip(_) | Cigar::Equal(_) | Cigar::Diff(_)
            )
        })
        .map(|op| op.len())
        .sum();
    let len = len as usize;
    let mut record = bam::Record::new();
    record.set(b"read", Some(&cigar), &vec![b'A'; len], &vec![30; len]);
    record.set_tid(tid);
    record.set_pos(pos as i64 - 1);
    record.set_mapq(60);
    record
}

/// Record for a chimeric alignment given as SA tag entry.
pub(crate) fn read_from_entry(entry: &str) -> bam::Record {
    let alignment: ChimericAlignment = entry.parse().unwrap();
    let tid = context().contig_index(alignment.contig()).unwrap();
    let mut record = read(tid as i32, alignment.pos(), &alignment.cigar().to_string());
    record.set_mapq(alignment.mapq());
    if alignment.is_reverse() {
        record.set_reverse();
    }
    record
}

/// Replace bases and qualities. Drops all aux tags, so set the SA tag afterwards.
pub(crate) fn with_sequence(seq: &[u8], qual: &[u8], mut record: bam::Record) -> bam::Record {
    let cigar = record.cigar().take();
    let qname = record.qname().to_owned();
    record.set(&qname, Some(&cigar), seq, qual);
    record
}

pub(crate) fn with_bases(seq: &[u8], record: bam::Record) -> bam::Record {
    with_sequence(seq, &vec![30; seq.len()], record)
}

pub(crate) fn with_name(name: &[u8], mut record: bam::Record) -> bam::Record {
    let cigar = record.cigar().take();
    let seq = record.seq().as_bytes();
    let qual = record.qual().to_vec();
    record.set(name, Some(&cigar), &seq, &qual);
    record
}

pub(crate) fn with_mapq(mapq: u8, mut record: bam::Record) -> bam::Record {
    record.set_mapq(mapq);
    record
}

pub(crate) fn supplementary(mut record: bam::Record) -> bam::Record {
    record.set_supplementary();
    record
}

pub(crate) fn with_sa(sa: &str, mut record: bam::Record) -> bam::Record {
    record.push_aux(b"SA", Aux::String(sa)).unwrap();
    record
}

/// SA tag entry describing the given record.
pub(crate) fn sa_entry(record: &bam::Record) -> String {
    ChimericAlignment::from_record(record, &context())
        .unwrap()
        .to_string()
}

/// SA tag listing the given records.
pub(crate) fn sa_tag(records: &[&bam::Record]) -> String {
    records
        .iter()
        .map(|record| sa_entry(record))
        .collect::<Vec<_>>()
        .join(";")
}

pub(crate) fn s(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
