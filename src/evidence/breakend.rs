// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;

/// Side of a breakend position on which the supporting sequence is anchored.
/// Forward breakends are anchored before (left of) their position, backward breakends after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn symbol(self) -> char {
        match self {
            Direction::Forward => 'f',
            Direction::Backward => 'b',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A breakend located somewhere in `start..=end` (1-based), most likely at `nominal`.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct BreakendSummary {
    reference_index: usize,
    direction: Direction,
    nominal: u64,
    start: u64,
    end: u64,
}

impl BreakendSummary {
    /// A breakend at a known position.
    pub fn exact(reference_index: usize, direction: Direction, pos: u64) -> Self {
        BreakendSummary::new(reference_index, direction, pos, pos, pos)
    }

    pub fn is_exact(&self) -> bool {
        self.start == self.end
    }

    pub fn width(&self) -> u64 {
        self.end - self.start
    }

    /// Restrict the interval to `1..=len`. The nominal position stays within the interval.
    pub fn clamp(self, len: u64) -> Self {
        let len = len.max(1);
        let start = self.start.max(1).min(len);
        let end = self.end.max(1).min(len).max(start);
        BreakendSummary {
            nominal: self.nominal.max(start).min(end),
            start,
            end,
            ..self
        }
    }
}

impl fmt::Display for BreakendSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_exact() {
            write!(f, "{}:{}{}", self.reference_index, self.nominal, self.direction)
        } else {
            write!(
                f,
                "{}:{}({}-{}){}",
                self.reference_index, self.nominal, self.start, self.end, self.direction
            )
        }
    }
}

/// A pair of breakends joined by a rearrangement, seen from the `local` side.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct BreakpointSummary {
    local: BreakendSummary,
    remote: BreakendSummary,
}

impl BreakpointSummary {
    /// The same breakpoint seen from the remote side.
    pub fn remote_breakpoint(&self) -> Self {
        BreakpointSummary {
            local: self.remote,
            remote: self.local,
        }
    }
}

impl fmt::Display for BreakpointSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}->{}", self.local, self.remote)
    }
}
