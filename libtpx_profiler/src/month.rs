use std::collections::BTreeMap;

use super::bucket::{check_frame, BucketSpan, BucketState, Tally};
use super::calendar::{month_label, timestamp_label, utc};
use super::constants::SECONDS_IN_A_DAY;
use super::error::{BucketError, PartitionError};
use super::frame_record::FrameRecord;
use super::time_series::FrameSink;

/// DataMonth counts the frames of one calendar month, day by day.
///
/// Month lengths are not computed here: the caller hands over the boundaries
/// (see [`MonthBoundaryTable`](crate::month_table::MonthBoundaryTable)). Days
/// are keyed by their day-of-month, `1..=n_days`.
#[derive(Debug, Clone)]
pub struct DataMonth {
    name: String,
    span: BucketSpan,
    frames_per_day: Tally,
    state: BucketState,
}

impl DataMonth {
    pub fn new(start_time_s: i64, end_time_s: i64) -> Result<Self, PartitionError> {
        let span = BucketSpan::new(start_time_s, end_time_s, SECONDS_IN_A_DAY)?;
        let name = month_label(start_time_s)?;
        log::info!(
            "Initialised month {}: start {} ({}), end {} ({}), {} days",
            name,
            timestamp_label(start_time_s)?,
            start_time_s,
            timestamp_label(end_time_s)?,
            end_time_s,
            span.n_subunits()
        );
        Ok(Self {
            name,
            frames_per_day: Tally::new(1..=span.n_subunits()),
            span,
            state: BucketState::Active,
        })
    }

    /// Add a frame; its day is the UTC day-of-month of its start time
    pub fn add_frame(&mut self, frame: &FrameRecord) -> Result<(), BucketError> {
        let start_time_s = frame.start_time_s() as i64;
        check_frame(&self.name, self.state, &self.span, start_time_s)?;
        let day = utc(start_time_s)?.day() as u32;
        if !self.frames_per_day.increment(day) {
            return Err(BucketError::SubunitOutOfRange(
                start_time_s,
                day,
                self.name.clone(),
            ));
        }
        Ok(())
    }

    pub fn seal(&mut self) {
        self.state = BucketState::Sealed;
    }

    pub fn state(&self) -> BucketState {
        self.state
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> &BucketSpan {
        &self.span
    }

    pub fn start_time_s(&self) -> i64 {
        self.span.start_time_s()
    }

    pub fn n_days(&self) -> u32 {
        self.span.n_subunits()
    }

    pub fn n_frames(&self) -> u64 {
        self.frames_per_day.total()
    }

    pub fn frames_per_day(&self) -> &Tally {
        &self.frames_per_day
    }
}

impl FrameSink for DataMonth {
    fn accept(&mut self, frame: &FrameRecord) -> Result<bool, BucketError> {
        if !self.span.contains(frame.start_time_s() as i64) {
            return Ok(false);
        }
        self.add_frame(frame)?;
        Ok(true)
    }
}

/// A run of contiguous months, keyed by month name.
///
/// Frames are routed to the month whose span contains them; frames outside
/// every month are discarded.
#[derive(Debug, Clone, Default)]
pub struct MonthSet {
    months: BTreeMap<String, DataMonth>,
}

impl MonthSet {
    pub fn new(months: Vec<DataMonth>) -> Self {
        Self {
            months: months
                .into_iter()
                .map(|month| (month.name().to_string(), month))
                .collect(),
        }
    }

    pub fn seal(&mut self) {
        for month in self.months.values_mut() {
            month.seal();
        }
    }

    pub fn get(&self, name: &str) -> Option<&DataMonth> {
        self.months.get(name)
    }

    pub fn months(&self) -> impl Iterator<Item = &DataMonth> {
        self.months.values()
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn n_frames(&self) -> u64 {
        self.months.values().map(|month| month.n_frames()).sum()
    }
}

impl FrameSink for MonthSet {
    fn accept(&mut self, frame: &FrameRecord) -> Result<bool, BucketError> {
        let start_time_s = frame.start_time_s() as i64;
        match self
            .months
            .values_mut()
            .find(|month| month.span().contains(start_time_s))
        {
            Some(month) => {
                month.add_frame(frame)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
