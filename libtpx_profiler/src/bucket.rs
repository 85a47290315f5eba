use std::collections::BTreeMap;

use super::error::{BucketError, PartitionError};

/// A closed time interval `[start_time_s, end_time_s]` that divides into a
/// whole number of child units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSpan {
    start_time_s: i64,
    end_time_s: i64,
    n_subunits: u32,
}

impl BucketSpan {
    /// Validate an interval against the duration of its child unit.
    ///
    /// Fails if the interval is empty or has remainder seconds.
    pub fn new(start_time_s: i64, end_time_s: i64, unit_s: i64) -> Result<Self, PartitionError> {
        if end_time_s < start_time_s {
            return Err(PartitionError::EmptySpan(start_time_s, end_time_s));
        }
        let span = end_time_s - start_time_s + 1;
        let remainder = span % unit_s;
        if remainder != 0 {
            return Err(PartitionError::RemainderSeconds {
                span,
                unit: unit_s,
                remainder,
            });
        }
        Ok(Self {
            start_time_s,
            end_time_s,
            n_subunits: (span / unit_s) as u32,
        })
    }

    pub fn start_time_s(&self) -> i64 {
        self.start_time_s
    }

    pub fn end_time_s(&self) -> i64 {
        self.end_time_s
    }

    pub fn span_seconds(&self) -> i64 {
        self.end_time_s - self.start_time_s + 1
    }

    pub fn n_subunits(&self) -> u32 {
        self.n_subunits
    }

    pub fn contains(&self, time_s: i64) -> bool {
        (self.start_time_s..=self.end_time_s).contains(&time_s)
    }
}

/// Whether a bucket still accepts frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketState {
    #[default]
    Active,
    Sealed,
}

/// Frame counts per subunit plus the running total.
///
/// Every valid subunit index is present from construction, even with zero
/// frames, and the total always equals the sum of the subunit counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    counts: BTreeMap<u32, u64>,
    total: u64,
}

impl Tally {
    pub fn new(indices: impl IntoIterator<Item = u32>) -> Self {
        Self {
            counts: indices.into_iter().map(|index| (index, 0)).collect(),
            total: 0,
        }
    }

    pub fn contains(&self, index: u32) -> bool {
        self.counts.contains_key(&index)
    }

    /// Count a frame in the given subunit.
    ///
    /// Returns false, and changes nothing, if the subunit does not exist.
    pub fn increment(&mut self, index: u32) -> bool {
        match self.counts.get_mut(&index) {
            Some(count) => {
                *count += 1;
                self.total += 1;
                true
            }
            None => false,
        }
    }

    pub fn counts(&self) -> &BTreeMap<u32, u64> {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn max_count(&self) -> u64 {
        self.counts.values().copied().max().unwrap_or(0)
    }
}

/// Checks shared by every bucket level before a frame is counted
pub(crate) fn check_frame(
    name: &str,
    state: BucketState,
    span: &BucketSpan,
    start_time_s: i64,
) -> Result<(), BucketError> {
    if state == BucketState::Sealed {
        return Err(BucketError::Sealed(name.to_string()));
    }
    if !span.contains(start_time_s) {
        return Err(BucketError::OutsideSpan(start_time_s, name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{SECONDS_IN_AN_HOUR, SECONDS_IN_A_DAY};

    #[test]
    fn test_span_divides() {
        let span = BucketSpan::new(1325376000, 1325376000 + SECONDS_IN_A_DAY - 1, SECONDS_IN_AN_HOUR)
            .unwrap();
        assert_eq!(span.n_subunits(), 24);
        assert_eq!(span.span_seconds(), SECONDS_IN_A_DAY);
        assert!(span.contains(1325376000));
        assert!(span.contains(1325376000 + SECONDS_IN_A_DAY - 1));
        assert!(!span.contains(1325376000 + SECONDS_IN_A_DAY));
    }

    #[test]
    fn test_span_remainder() {
        // 30.5 days
        let end = 1325376000 + 30 * SECONDS_IN_A_DAY + SECONDS_IN_A_DAY / 2 - 1;
        match BucketSpan::new(1325376000, end, SECONDS_IN_A_DAY) {
            Err(PartitionError::RemainderSeconds { remainder, .. }) => {
                assert_eq!(remainder, SECONDS_IN_A_DAY / 2)
            }
            other => panic!("expected a remainder error, got {other:?}"),
        }
        assert!(matches!(
            BucketSpan::new(100, 99, 60),
            Err(PartitionError::EmptySpan(100, 99))
        ));
    }

    #[test]
    fn test_tally() {
        let mut tally = Tally::new(1..=3);
        assert_eq!(tally.counts().len(), 3);
        assert!(tally.increment(2));
        assert!(tally.increment(2));
        assert!(!tally.increment(4));
        assert_eq!(tally.total(), 2);
        assert_eq!(tally.max_count(), 2);
        assert_eq!(tally.counts().values().sum::<u64>(), tally.total());
    }
}
