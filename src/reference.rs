use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use anyhow::Result;
use bio::io::fasta;
use lru_time_cache::LruCache;

use crate::errors::Error;

enum Source {
    Fasta(RwLock<fasta::IndexedReader<fs::File>>),
    Memory(HashMap<String, Arc<Vec<u8>>>),
}

/// A lazy buffer for reference sequences.
pub struct Buffer {
    source: Source,
    sequences: Mutex<LruCache<String, Arc<Vec<u8>>>>,
}

impl Buffer {
    /// Buffer over an indexed FASTA file, keeping at most `capacity` contigs in memory.
    pub fn from_path<P: AsRef<Path> + std::fmt::Debug>(path: P, capacity: usize) -> Result<Self> {
        let fasta: fasta::IndexedReader<fs::File> = fasta::IndexedReader::from_file(&path)?;
        Ok(Buffer {
            source: Source::Fasta(RwLock::new(fasta)),
            sequences: Mutex::new(LruCache::with_capacity(capacity)),
        })
    }

    /// Buffer over sequences that are already in memory.
    pub fn from_sequences(sequences: Vec<(String, Vec<u8>)>) -> Self {
        Buffer {
            source: Source::Memory(
                sequences
                    .into_iter()
                    .map(|(name, seq)| (name, Arc::new(seq)))
                    .collect(),
            ),
            sequences: Mutex::new(LruCache::with_capacity(1)),
        }
    }

    /// Load given chromosome and return it as a slice. This is O(1) if chromosome was loaded before.
    pub fn seq(&self, chrom: &str) -> Result<Arc<Vec<u8>>> {
        let reader = match &self.source {
            Source::Memory(sequences) => {
                return sequences.get(chrom).cloned().ok_or_else(|| {
                    Error::UnknownContig {
                        name: chrom.to_owned(),
                    }
                    .into()
                })
            }
            Source::Fasta(reader) => reader,
        };

        let mut sequences = self.sequences.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(sequence) = sequences.get(chrom) {
            return Ok(Arc::clone(sequence));
        }

        let mut sequence = Vec::new();
        {
            let mut reader = reader.write().unwrap_or_else(|e| e.into_inner());
            reader.fetch_all(chrom)?;
            reader.read(&mut sequence)?;
        }
        let sequence = Arc::new(sequence);
        sequences.insert(chrom.to_owned(), Arc::clone(&sequence));
        Ok(sequence)
    }
}
