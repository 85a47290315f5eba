use std::path::PathBuf;
use thiserror::Error;

use super::constants::*;
use super::worker_status::WorkerStatus;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Timestamp is not representable as a UTC date: {0}")]
    OutOfRange(#[from] time::error::ComponentRange),
    #[error("Failed to format a UTC timestamp: {0}")]
    FormatError(#[from] time::error::Format),
    #[error("Failed to parse a calendar string: {0}")]
    ParsingError(#[from] time::error::Parse),
}

#[derive(Debug, Error)]
pub enum FrameRecordError {
    #[error("Frame start time {0} is outside the unsigned 32-bit range of a FrameRecord")]
    StartTimeOutOfRange(f64),
    #[error("Acquisition time {0} [s] falls outside every quantization rung (0 <= t < {max} s)", max=MAX_ACQ_TIME_S)]
    AcqTimeOutOfRange(f64),
    #[error("Pixel count {0} exceeds the {max} pixels of a full frame", max=PIXELS_IN_A_FRAME)]
    PixelCountOutOfRange(u32),
    #[error("Incorrect record length {0} found for FrameRecord; expected {size}", size=RECORD_SIZE)]
    BadRecordLength(usize),
    #[error("FrameRecord failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum TimeSeriesError {
    #[error("Could not open time series because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Time series file size {0} is not a multiple of the {size} byte record size", size=RECORD_SIZE)]
    SizeMismatch(u64),
    #[error("Start frame {0} is greater than the number of frames present ({1})")]
    StartFrameOutOfBounds(u64, u64),
    #[error("Time series contained a bad record: {0}")]
    BadRecord(#[from] FrameRecordError),
    #[error("Time series frame was rejected by its bucket: {0}")]
    BucketError(#[from] BucketError),
    #[error("Time series failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Time series failed to report progress: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
}

#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("Bucket end time {1} is before its start time {0}")]
    EmptySpan(i64, i64),
    #[error("Bucket of {span} seconds has {remainder} remainder seconds for a {unit} second child unit")]
    RemainderSeconds { span: i64, unit: i64, remainder: i64 },
    #[error("Bucket failed due to calendar error: {0}")]
    CalendarError(#[from] CalendarError),
}

#[derive(Debug, Error)]
pub enum BucketError {
    #[error("Bucket {0} is sealed and can not accept more frames")]
    Sealed(String),
    #[error("Frame with start time {0} lies outside bucket {1}")]
    OutsideSpan(i64, String),
    #[error("Frame with start time {0} maps to subunit {1}, which bucket {2} does not contain")]
    SubunitOutOfRange(i64, u32, String),
    #[error("Bucket failed due to calendar error: {0}")]
    CalendarError(#[from] CalendarError),
}

#[derive(Debug, Error)]
pub enum MonthTableError {
    #[error("Failed to load month boundary table as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Month boundary table failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Month boundary table failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Month boundary table needs at least two boundaries; found {0}")]
    TooFewBoundaries(usize),
    #[error("Month boundary {0} does not come after the previous boundary")]
    NotChronological(String),
    #[error("Month boundary {0} is {1} in UTC, but the table gives {2}")]
    LabelMismatch(String, i64, i64),
    #[error("Month boundary {0} is not midnight on the first day of a month")]
    NotMonthStart(String),
    #[error("Month boundary {1} is not the month after boundary {0}")]
    MonthGap(String, String),
    #[error("Month boundary table failed due to calendar error: {0}")]
    CalendarError(#[from] CalendarError),
    #[error("Month boundary table failed to build a month: {0}")]
    PartitionError(#[from] PartitionError),
}

#[derive(Debug, Error)]
pub enum FrameSourceError {
    #[error("Could not open frame source because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Frame source failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Frame source failed to parse an integer: {0}")]
    IntParsingError(#[from] std::num::ParseIntError),
    #[error("Frame source failed to parse a real number: {0}")]
    FloatParsingError(#[from] std::num::ParseFloatError),
    #[error("Frame source line {0} has the incorrect format; expected start_time_s,acq_time_s,n_pixels")]
    BadLineFormat(usize),
}

#[derive(Debug, Error)]
pub enum CondenseError {
    #[error("Start frame {0} is greater than the number of frames present ({1})")]
    StartFrameOutOfBounds(u64, u64),
    #[error("Condensing failed due to frame source error: {0}")]
    SourceError(#[from] FrameSourceError),
    #[error("Condensing failed to encode frame {0}: {1}")]
    BadFrame(u64, FrameRecordError),
    #[error("Condensing failed to write the time series: {0}")]
    TimeSeriesError(#[from] TimeSeriesError),
    #[error("Condensing failed to report progress: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
}

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("Plot option {0} must be a positive, finite number; found {1}")]
    BadOption(&'static str, f64),
    #[error("Plot writer failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Plot writer failed to convert to JSON: {0}")]
    ParsingError(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Could not summarize run as the time series contains no frames")]
    NoFrames,
    #[error("Could not infer a chip ID from file name {0}")]
    UnknownChipPrefix(String),
    #[error("Summary failed due to time series error: {0}")]
    TimeSeriesError(#[from] TimeSeriesError),
    #[error("Summary failed due to calendar error: {0}")]
    CalendarError(#[from] CalendarError),
    #[error("Summary failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Summary failed to convert JSON: {0}")]
    ParsingError(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Output directory {0:?} does not exist")]
    BadOutputDirectory(PathBuf),
    #[error("Configuration does not specify a day to profile")]
    MissingDay,
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config has an invalid plot option: {0}")]
    PlotError(#[from] PlotError),
    #[error("Config failed due to calendar error: {0}")]
    CalendarError(#[from] CalendarError),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to TimeSeries error: {0}")]
    TimeSeriesError(#[from] TimeSeriesError),
    #[error("Processor failed due to Condense error: {0}")]
    CondenseError(#[from] CondenseError),
    #[error("Processor failed due to FrameSource error: {0}")]
    FrameSourceError(#[from] FrameSourceError),
    #[error("Processor failed due to MonthTable error: {0}")]
    MonthTableError(#[from] MonthTableError),
    #[error("Processor failed due to Partition error: {0}")]
    PartitionError(#[from] PartitionError),
    #[error("Processor failed due to Bucket error: {0}")]
    BucketError(#[from] BucketError),
    #[error("Processor failed due to Plot error: {0}")]
    PlotError(#[from] PlotError),
    #[error("Processor failed due to Summary error: {0}")]
    SummaryError(#[from] SummaryError),
    #[error("Processor failed due to calendar error: {0}")]
    CalendarError(#[from] CalendarError),
    #[error("Processor failed: {0} frames were routed but the buckets hold {1}")]
    FrameCountMismatch(u64, u64),
    #[error("Processor failed to convert JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Processor failed due to IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
}
