use std::{fmt, num::NonZeroUsize, str::FromStr};

use crate::{errors::Error, extract::ContactRecord};

/// Number of contacts per output file. Always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkSize(NonZeroUsize);

impl ChunkSize {
    pub fn new(n: usize) -> Option<Self> {
        NonZeroUsize::new(n).map(Self)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl FromStr for ChunkSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n = s
            .trim()
            .parse::<usize>()
            .map_err(|_| Error::InvalidChunkSize(s.to_string()))?;
        Self::new(n).ok_or_else(|| Error::InvalidChunkSize(s.to_string()))
    }
}

impl fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Split contacts into consecutive groups of at most `size`.
///
/// Only the last group may be shorter. An empty input yields no groups.
pub fn chunk(contacts: &[ContactRecord], size: ChunkSize) -> Vec<&[ContactRecord]> {
    contacts.chunks(size.get()).collect()
}
