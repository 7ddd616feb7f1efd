/// Registry quiescence detection.
///
/// The host registers variants asynchronously and never signals completion.
/// `QuiescencePoll` clears the registry, then reads its count every
/// `interval` until two consecutive reads are equal.
///
/// States: `Clearing` -> `Polling` -> `Stabilized`.

use std::time::Duration;
use crate::error::{Error, Result};
use crate::host::{Sleeper, VariantRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Registry not cleared yet
    Clearing,
    /// Waiting for the count to stop changing
    Polling { last_count: usize, reads: u32 },
    /// Two consecutive reads matched
    Stabilized { count: usize, reads: u32 },
}

pub struct QuiescencePoll {
    state: PollState,
    interval: Duration,
    max_reads: Option<u32>,
}

impl QuiescencePoll {
    /// Create a poll; `max_reads = None` polls until the count settles
    pub fn new(interval: Duration, max_reads: Option<u32>) -> Self {
        Self {
            state: PollState::Clearing,
            interval,
            max_reads,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn is_stabilized(&self) -> bool {
        matches!(self.state, PollState::Stabilized { .. })
    }

    /// Advance one transition
    ///
    /// Each transition out of `Clearing` or `Polling` waits one interval and
    /// reads the count once. `Stabilized` is terminal.
    pub fn step(&mut self, registry: &mut dyn VariantRegistry, sleeper: &mut dyn Sleeper) -> Result<PollState> {
        self.state = match self.state {
            PollState::Clearing => {
                registry.clear()?;
                sleeper.sleep(self.interval);
                let count = registry.count()?;
                PollState::Polling { last_count: count, reads: 1 }
            }
            PollState::Polling { last_count, reads } => {
                if self.max_reads.is_some_and(|max| reads >= max) {
                    return Err(Error::HarvestFailed(format!(
                        "variant registry did not stabilize after {} reads (last count {})",
                        reads, last_count
                    )));
                }
                sleeper.sleep(self.interval);
                let count = registry.count()?;
                crate::strip_debug!(
                    "stripping::Quiescence",
                    "Registry count {} after read {} (previous {})",
                    count, reads + 1, last_count
                );
                if count == last_count {
                    PollState::Stabilized { count, reads: reads + 1 }
                } else {
                    PollState::Polling { last_count: count, reads: reads + 1 }
                }
            }
            stabilized @ PollState::Stabilized { .. } => stabilized,
        };
        Ok(self.state)
    }

    /// Step until stabilized, returning the settled count
    pub fn run(&mut self, registry: &mut dyn VariantRegistry, sleeper: &mut dyn Sleeper) -> Result<usize> {
        loop {
            if let PollState::Stabilized { count, .. } = self.step(registry, sleeper)? {
                return Ok(count);
            }
        }
    }

    /// Number of count reads performed so far
    pub fn reads(&self) -> u32 {
        match self.state {
            PollState::Clearing => 0,
            PollState::Polling { reads, .. } | PollState::Stabilized { reads, .. } => reads,
        }
    }
}

#[cfg(test)]
#[path = "quiescence_tests.rs"]
mod tests;
