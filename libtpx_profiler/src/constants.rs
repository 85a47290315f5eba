// Condensed record layout: u32 start time, i16 log10(acq time), u16 pixel count
pub const RECORD_SIZE: usize = 8;

// Timepix pixel matrix
pub const PIXELS_PER_ROW: u32 = 256;
pub const PIXELS_IN_A_FRAME: u32 = PIXELS_PER_ROW * PIXELS_PER_ROW;
pub const MAX_STORED_PIXELS: u16 = u16::MAX;

/// Upper bounds of the acquisition time quantization ladder and the exponent
/// assigned to each rung. A time belongs to the first rung it is below.
pub const ACQ_TIME_LADDER: [(f64, i16); 5] = [
    (0.001, -3),
    (0.01, -2),
    (0.1, -1),
    (1.0, 0),
    (10.0, 1),
];
pub const MAX_ACQ_TIME_S: f64 = 10.0;

pub const SECONDS_IN_A_MINUTE: i64 = 60;
pub const MINUTES_IN_AN_HOUR: i64 = 60;
pub const HOURS_IN_A_DAY: i64 = 24;
pub const SECONDS_IN_AN_HOUR: i64 = SECONDS_IN_A_MINUTE * MINUTES_IN_AN_HOUR;
pub const SECONDS_IN_A_DAY: i64 = SECONDS_IN_AN_HOUR * HOURS_IN_A_DAY;

/// Frames with more hit pixels than this are considered noisy
pub const NOISY_FRAME_PIXELS: u16 = 30_000;

pub const MAX_DAYS_IN_A_MONTH: u32 = 31;
