// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use bio::stats::{LogProb, PHREDProb};

/// Base quality value marking a missing quality.
const MISSING_QUAL: u8 = 0xff;

/// Convert MAPQ (from read mapper) to LogProb for the event that the read maps correctly.
pub fn prob_mapping(mapq: u8) -> LogProb {
    LogProb::from(PHREDProb(mapq as f64)).ln_one_minus_exp()
}

/// Mean probability that one of the given bases was miscalled. Missing qualities are ignored.
pub fn prob_miscall(quals: &[u8]) -> LogProb {
    let probs: Vec<LogProb> = quals
        .iter()
        .filter(|&&q| q != MISSING_QUAL)
        .map(|&q| LogProb::from(PHREDProb(q as f64)))
        .collect();
    if probs.is_empty() {
        return LogProb::ln_zero();
    }
    LogProb(*LogProb::ln_sum_exp(&probs) - (probs.len() as f64).ln())
}

/// PHRED scaled probability that not all of the given (correctness) events hold.
fn phred_of_any_failure(prob_correct: &[LogProb]) -> f64 {
    let prob_all_correct: LogProb = LogProb(prob_correct.iter().map(|p| **p).sum());
    *PHREDProb::from(prob_all_correct.ln_one_minus_exp())
}

/// Quality of a breakpoint supported by alignments with the given mapping qualities, whose
/// junction is covered by bases with the given qualities.
pub fn breakpoint_qual(mapq_a: u8, mapq_b: u8, junction_quals: &[u8], min_mapq: u8) -> f64 {
    if mapq_a.min(mapq_b) < min_mapq {
        return 0.0;
    }
    phred_of_any_failure(&[
        prob_mapping(mapq_a),
        prob_mapping(mapq_b),
        prob_miscall(junction_quals).ln_one_minus_exp(),
    ])
}

/// Quality of a breakend supported by an alignment with the given mapping quality.
pub fn breakend_qual(mapq: u8, quals: &[u8], min_mapq: u8) -> f64 {
    if mapq < min_mapq {
        return 0.0;
    }
    phred_of_any_failure(&[prob_mapping(mapq), prob_miscall(quals).ln_one_minus_exp()])
}
