use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Write};

use super::constants::*;
use super::error::FrameRecordError;

/// Quantize an acquisition time [s] onto the logarithmic ladder.
///
/// Returns the exponent of the first rung the time is below, so that
/// `10^exponent` approximates the original time. Times of 10 s or more (and
/// negative or NaN times) have no rung and are rejected.
pub fn quantize_acq_time(acq_time_s: f64) -> Result<i16, FrameRecordError> {
    if acq_time_s.is_nan() || acq_time_s < 0.0 {
        return Err(FrameRecordError::AcqTimeOutOfRange(acq_time_s));
    }
    ACQ_TIME_LADDER
        .iter()
        .find(|(upper, _)| acq_time_s < *upper)
        .map(|(_, exponent)| *exponent)
        .ok_or(FrameRecordError::AcqTimeOutOfRange(acq_time_s))
}

/// The condensed metadata of a single detector frame.
///
/// A FrameRecord is the 8 byte unit of a condensed time series: the frame
/// start time to the nearest second, the log10 of the acquisition time and
/// the number of hit pixels. Fields are packed as (u32, i16, u16) in native
/// byte order with no padding, matching the archived data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRecord {
    start_time_s: u32,
    log_acq_time: i16,
    n_pixels: u16,
}

impl FrameRecord {
    /// Condense the metadata of a source frame
    pub fn condense(
        start_time_s: f64,
        acq_time_s: f64,
        n_pixels: u32,
    ) -> Result<Self, FrameRecordError> {
        let start_time_s = start_time_s.trunc();
        if !(0.0..=(u32::MAX as f64)).contains(&start_time_s) {
            return Err(FrameRecordError::StartTimeOutOfRange(start_time_s));
        }
        let log_acq_time = quantize_acq_time(acq_time_s)?;

        // A fully occupied frame is stored one below to fit in 2 bytes
        let n_pixels = if n_pixels == PIXELS_IN_A_FRAME {
            MAX_STORED_PIXELS
        } else if n_pixels > PIXELS_IN_A_FRAME {
            return Err(FrameRecordError::PixelCountOutOfRange(n_pixels));
        } else {
            n_pixels as u16
        };

        Ok(Self {
            start_time_s: start_time_s as u32,
            log_acq_time,
            n_pixels,
        })
    }

    /// Parse a record from exactly [`RECORD_SIZE`] bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameRecordError> {
        if bytes.len() != RECORD_SIZE {
            return Err(FrameRecordError::BadRecordLength(bytes.len()));
        }
        let mut cursor = Cursor::new(bytes);
        Ok(Self {
            start_time_s: cursor.read_u32::<NativeEndian>()?,
            log_acq_time: cursor.read_i16::<NativeEndian>()?,
            n_pixels: cursor.read_u16::<NativeEndian>()?,
        })
    }

    /// Write the packed record to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), FrameRecordError> {
        writer.write_u32::<NativeEndian>(self.start_time_s)?;
        writer.write_i16::<NativeEndian>(self.log_acq_time)?;
        writer.write_u16::<NativeEndian>(self.n_pixels)?;
        Ok(())
    }

    pub fn encode(&self) -> Result<[u8; RECORD_SIZE], FrameRecordError> {
        let mut cursor = Cursor::new([0u8; RECORD_SIZE]);
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    pub fn start_time_s(&self) -> u32 {
        self.start_time_s
    }

    pub fn log_acq_time(&self) -> i16 {
        self.log_acq_time
    }

    /// The acquisition time recovered from the ladder rung, `10^log_acq_time` [s].
    ///
    /// This is lossy: only the order of magnitude of the original time survives.
    pub fn acq_time_s(&self) -> f64 {
        10f64.powi(self.log_acq_time as i32)
    }

    pub fn n_pixels(&self) -> u16 {
        self.n_pixels
    }

    pub fn is_noisy(&self) -> bool {
        self.n_pixels > NOISY_FRAME_PIXELS
    }
}
