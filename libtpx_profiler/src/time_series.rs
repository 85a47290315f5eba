use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::constants::RECORD_SIZE;
use super::error::{BucketError, TimeSeriesError};
use super::frame_record::FrameRecord;
use super::worker_status::ProgressResult;

/// Range of frame indices `[start_frame, start_frame + num_frames)` to read.
///
/// A `num_frames` of None means every frame from `start_frame` to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameWindow {
    pub start_frame: u64,
    pub num_frames: Option<u64>,
}

impl FrameWindow {
    pub fn new(start_frame: u64, num_frames: Option<u64>) -> Self {
        Self {
            start_frame,
            num_frames,
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    /// Number of frames this window selects out of `total` frames
    pub fn frames_selected(&self, total: u64) -> u64 {
        let remaining = total.saturating_sub(self.start_frame);
        match self.num_frames {
            Some(n) => n.min(remaining),
            None => remaining,
        }
    }
}

/// A consumer of decoded frames, such as a time bucket.
pub trait FrameSink {
    /// Offer a frame to the sink.
    ///
    /// Returns Ok(false) if the frame is outside the sink's window of
    /// interest; such frames are dropped, not buffered.
    fn accept(&mut self, frame: &FrameRecord) -> Result<bool, BucketError>;
}

/// Frame counts from a single pass over a time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestSummary {
    pub n_read: u64,
    pub n_routed: u64,
    pub n_discarded: u64,
}

/// Sequential reader of a condensed time series file.
///
/// A time series is a headerless sequence of 8 byte FrameRecords, so the
/// number of frames follows from the file size. The reader seeks to the
/// first frame of its window and yields frames in file order.
#[derive(Debug)]
pub struct TimeSeriesReader {
    file_path: PathBuf,
    reader: BufReader<File>,
    size_bytes: u64,
    total_frames: u64,
    window: FrameWindow,
    next_index: u64,
    stop_index: u64,
}

impl TimeSeriesReader {
    pub fn new(path: &Path, window: FrameWindow) -> Result<Self, TimeSeriesError> {
        if !path.exists() {
            return Err(TimeSeriesError::BadFilePath(path.to_path_buf()));
        }
        let file = File::open(path)?;
        let size_bytes = file.metadata()?.len();
        if size_bytes % RECORD_SIZE as u64 != 0 {
            return Err(TimeSeriesError::SizeMismatch(size_bytes));
        }
        let total_frames = size_bytes / RECORD_SIZE as u64;
        if window.start_frame > total_frames {
            return Err(TimeSeriesError::StartFrameOutOfBounds(
                window.start_frame,
                total_frames,
            ));
        }

        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(window.start_frame * RECORD_SIZE as u64))?;

        Ok(Self {
            file_path: path.to_path_buf(),
            reader,
            size_bytes,
            total_frames,
            window,
            next_index: window.start_frame,
            stop_index: window.start_frame + window.frames_selected(total_frames),
        })
    }

    /// Read the next frame of the window.
    ///
    /// Returns the frame index alongside the frame, or None once the window
    /// or the file is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<(u64, FrameRecord)>, TimeSeriesError> {
        if self.next_index >= self.stop_index {
            return Ok(None);
        }
        let mut buffer = [0u8; RECORD_SIZE];
        match self.reader.read_exact(&mut buffer) {
            Ok(()) => (),
            // The file may have been cut short since it was opened
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.stop_index = self.next_index;
                return Ok(None);
            }
            Err(e) => return Err(TimeSeriesError::IOError(e)),
        }
        let index = self.next_index;
        self.next_index += 1;
        Ok(Some((index, FrameRecord::decode(&buffer)?)))
    }

    pub fn get_filename(&self) -> &Path {
        &self.file_path
    }

    pub fn get_size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn window(&self) -> FrameWindow {
        self.window
    }

    /// Number of frames the window will yield
    pub fn frames_in_window(&self) -> u64 {
        self.window.frames_selected(self.total_frames)
    }
}

/// Read every frame of the reader's window and offer it to the sink.
///
/// `progress` is called with the fraction of the window read so far; if it
/// fails the read stops.
pub fn ingest<S: FrameSink + ?Sized>(
    reader: &mut TimeSeriesReader,
    sink: &mut S,
    progress: &mut dyn FnMut(f32) -> ProgressResult,
) -> Result<IngestSummary, TimeSeriesError> {
    let mut summary = IngestSummary::default();
    let n_expected = reader.frames_in_window().max(1);
    let flush_val = (n_expected / 100).max(1);

    while let Some((index, frame)) = reader.next_frame()? {
        summary.n_read += 1;
        match sink.accept(&frame) {
            Ok(true) => summary.n_routed += 1,
            Ok(false) => summary.n_discarded += 1,
            Err(e) => {
                log::error!("Frame {} could not be added: {}", index, e);
                return Err(TimeSeriesError::BucketError(e));
            }
        }
        if summary.n_read % flush_val == 0 {
            progress(summary.n_read as f32 / n_expected as f32)?;
        }
    }
    progress(1.0)?;
    Ok(summary)
}

/// Buffered writer of a condensed time series.
#[derive(Debug)]
pub struct TimeSeriesWriter {
    file_path: PathBuf,
    writer: BufWriter<File>,
    n_frames: u64,
}

impl TimeSeriesWriter {
    pub fn new(path: &Path) -> Result<Self, TimeSeriesError> {
        let file = File::create(path)?;
        Ok(Self {
            file_path: path.to_path_buf(),
            writer: BufWriter::new(file),
            n_frames: 0,
        })
    }

    pub fn write_frame(&mut self, frame: &FrameRecord) -> Result<(), TimeSeriesError> {
        frame.write_to(&mut self.writer)?;
        self.n_frames += 1;
        Ok(())
    }

    pub fn n_frames(&self) -> u64 {
        self.n_frames
    }

    pub fn get_filename(&self) -> &Path {
        &self.file_path
    }

    /// Flush any buffered records and close the file
    pub fn close(mut self) -> Result<u64, TimeSeriesError> {
        self.writer.flush()?;
        Ok(self.n_frames)
    }
}
