use super::bucket::{check_frame, BucketSpan, BucketState, Tally};
use super::calendar::{timestamp_label, utc};
use super::constants::SECONDS_IN_A_MINUTE;
use super::error::{BucketError, PartitionError};
use super::frame_record::FrameRecord;

/// DataHour collects every frame that started within one hour.
///
/// Besides the per-minute counts, the hour keeps the start time, decoded
/// acquisition time and pixel count of each frame in the order they were
/// added (which need not be time order).
#[derive(Debug, Clone)]
pub struct DataHour {
    name: String,
    span: BucketSpan,
    frames_per_minute: Tally,
    start_times: Vec<u32>,
    acq_times: Vec<f64>,
    n_pixels: Vec<u16>,
    state: BucketState,
}

impl DataHour {
    pub fn new(start_time_s: i64, end_time_s: i64) -> Result<Self, PartitionError> {
        let span = BucketSpan::new(start_time_s, end_time_s, SECONDS_IN_A_MINUTE)?;
        let name = timestamp_label(start_time_s)?;
        log::debug!(
            "Initialised hour {} ({} - {}) with {} minutes",
            name,
            start_time_s,
            end_time_s,
            span.n_subunits()
        );
        Ok(Self {
            name,
            frames_per_minute: Tally::new(0..span.n_subunits()),
            span,
            start_times: Vec::new(),
            acq_times: Vec::new(),
            n_pixels: Vec::new(),
            state: BucketState::Active,
        })
    }

    /// Add a frame; its minute is the UTC minute-of-hour of its start time
    pub fn add_frame(&mut self, frame: &FrameRecord) -> Result<(), BucketError> {
        let start_time_s = frame.start_time_s() as i64;
        check_frame(&self.name, self.state, &self.span, start_time_s)?;
        let minute = utc(start_time_s)?.minute() as u32;
        if !self.frames_per_minute.increment(minute) {
            return Err(BucketError::SubunitOutOfRange(
                start_time_s,
                minute,
                self.name.clone(),
            ));
        }
        self.start_times.push(frame.start_time_s());
        self.acq_times.push(frame.acq_time_s());
        self.n_pixels.push(frame.n_pixels());
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

    pub fn n_minutes(&self) -> u32 {
        self.span.n_subunits()
    }

    pub fn n_frames(&self) -> u64 {
        self.frames_per_minute.total()
    }

    pub fn frames_per_minute(&self) -> &Tally {
        &self.frames_per_minute
    }

    pub fn start_times(&self) -> &[u32] {
        &self.start_times
    }

    pub fn acq_times(&self) -> &[f64] {
        &self.acq_times
    }

    pub fn n_pixels(&self) -> &[u16] {
        &self.n_pixels
    }
}
