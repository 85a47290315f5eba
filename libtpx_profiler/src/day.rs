use super::bucket::{check_frame, BucketSpan, BucketState, Tally};
use super::calendar::{day_label, parse_day, utc};
use super::constants::{SECONDS_IN_AN_HOUR, SECONDS_IN_A_DAY};
use super::error::{BucketError, PartitionError};
use super::frame_record::FrameRecord;
use super::hour::DataHour;
use super::time_series::FrameSink;

/// DataDay counts the frames of one day, hour by hour.
///
/// The day owns one DataHour per hour of its span, created up front and
/// indexed from 0. A frame is routed by the UTC hour-of-day of its start time.
#[derive(Debug, Clone)]
pub struct DataDay {
    name: String,
    span: BucketSpan,
    frames_per_hour: Tally,
    hours: Vec<DataHour>,
    state: BucketState,
}

impl DataDay {
    pub fn new(start_time_s: i64, end_time_s: i64) -> Result<Self, PartitionError> {
        let span = BucketSpan::new(start_time_s, end_time_s, SECONDS_IN_AN_HOUR)?;
        let name = day_label(start_time_s)?;

        let mut hours = Vec::with_capacity(span.n_subunits() as usize);
        for hour in 0..span.n_subunits() as i64 {
            let hour_start = start_time_s + hour * SECONDS_IN_AN_HOUR;
            hours.push(DataHour::new(hour_start, hour_start + SECONDS_IN_AN_HOUR - 1)?);
        }

        log::info!(
            "Initialised day {} ({} - {}) with {} hours",
            name,
            start_time_s,
            end_time_s,
            span.n_subunits()
        );
        Ok(Self {
            name,
            frames_per_hour: Tally::new(0..span.n_subunits()),
            span,
            hours,
            state: BucketState::Active,
        })
    }

    /// Create the UTC day given as `YYYY-MM-DD`
    pub fn for_date(day: &str) -> Result<Self, PartitionError> {
        let start_time_s = parse_day(day)?;
        Self::new(start_time_s, start_time_s + SECONDS_IN_A_DAY - 1)
    }

    pub fn add_frame(&mut self, frame: &FrameRecord) -> Result<(), BucketError> {
        let start_time_s = frame.start_time_s() as i64;
        check_frame(&self.name, self.state, &self.span, start_time_s)?;
        let hour = utc(start_time_s)?.hour() as u32;
        if !self.frames_per_hour.contains(hour) {
            return Err(BucketError::SubunitOutOfRange(
                start_time_s,
                hour,
                self.name.clone(),
            ));
        }
        self.hours[hour as usize].add_frame(frame)?;
        self.frames_per_hour.increment(hour);
        Ok(())
    }

    /// Stop accepting frames, for the day and all of its hours
    pub fn seal(&mut self) {
        self.state = BucketState::Sealed;
        for hour in self.hours.iter_mut() {
            hour.seal();
        }
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

    pub fn n_hours(&self) -> u32 {
        self.span.n_subunits()
    }

    pub fn n_frames(&self) -> u64 {
        self.frames_per_hour.total()
    }

    pub fn frames_per_hour(&self) -> &Tally {
        &self.frames_per_hour
    }

    pub fn hour(&self, hour: u32) -> Option<&DataHour> {
        self.hours.get(hour as usize)
    }

    pub fn hours(&self) -> &[DataHour] {
        &self.hours
    }
}

impl FrameSink for DataDay {
    fn accept(&mut self, frame: &FrameRecord) -> Result<bool, BucketError> {
        if !self.span.contains(frame.start_time_s() as i64) {
            return Ok(false);
        }
        self.add_frame(frame)?;
        Ok(true)
    }
}
