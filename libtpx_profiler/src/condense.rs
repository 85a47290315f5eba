use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::error::{CondenseError, FrameSourceError};
use super::frame_record::FrameRecord;
use super::time_series::{FrameWindow, TimeSeriesWriter};
use super::worker_status::ProgressResult;

const ENTRIES_PER_LINE: usize = 3; //start time, acq. time, pixel count

/// Per-frame metadata as delivered by a detector data reader
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceFrame {
    pub start_time_s: f64,
    pub acq_time_s: f64,
    pub n_pixels: u32,
}

/// FrameSource is the interface to the upstream detector data, addressed by
/// sequential frame index.
pub trait FrameSource {
    fn n_frames(&self) -> u64;

    /// Fetch a frame by index. None means the source has no frame there.
    fn get_frame(&mut self, index: u64) -> Result<Option<SourceFrame>, FrameSourceError>;
}

/// CsvFrameSource reads frame metadata from a text file with one frame per
/// row in the order `start_time_s,acq_time_s,n_pixels`.
///
/// The first line is a header and is skipped. Blank lines are ignored.
#[derive(Debug, Clone, Default)]
pub struct CsvFrameSource {
    frames: Vec<SourceFrame>,
}

impl CsvFrameSource {
    pub fn new(path: &Path) -> Result<Self, FrameSourceError> {
        if !path.exists() {
            return Err(FrameSourceError::BadFilePath(path.to_path_buf()));
        }
        let mut contents = String::new();
        let mut file = File::open(path)?;
        file.read_to_string(&mut contents)?;
        Self::from_contents(&contents)
    }

    pub fn from_contents(contents: &str) -> Result<Self, FrameSourceError> {
        let mut source = Self::default();
        let mut lines = contents.lines().enumerate();
        lines.next(); // Skip the header
        for (line_number, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let entries: Vec<&str> = line.split_terminator(',').map(|e| e.trim()).collect();
            if entries.len() != ENTRIES_PER_LINE {
                return Err(FrameSourceError::BadLineFormat(line_number + 1));
            }
            source.frames.push(SourceFrame {
                start_time_s: entries[0].parse()?,
                acq_time_s: entries[1].parse()?,
                n_pixels: entries[2].parse()?,
            });
        }
        Ok(source)
    }
}

impl FrameSource for CsvFrameSource {
    fn n_frames(&self) -> u64 {
        self.frames.len() as u64
    }

    fn get_frame(&mut self, index: u64) -> Result<Option<SourceFrame>, FrameSourceError> {
        Ok(self.frames.get(index as usize).copied())
    }
}

/// The run ID is the file name up to its first '.'
pub fn run_id(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default()
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Condense the frames of a source window into a time series.
///
/// Frames are written in source order. Stops early, without error, if the
/// source runs out of frames. Returns the number of frames written.
pub fn condense<S: FrameSource + ?Sized>(
    source: &mut S,
    window: FrameWindow,
    writer: &mut TimeSeriesWriter,
    progress: &mut dyn FnMut(f32) -> ProgressResult,
) -> Result<u64, CondenseError> {
    let n_frames = source.n_frames();
    if window.start_frame > n_frames {
        return Err(CondenseError::StartFrameOutOfBounds(
            window.start_frame,
            n_frames,
        ));
    }
    let n_selected = window.frames_selected(n_frames);
    let flush_val = (n_selected / 100).max(1);
    let mut written = 0;

    for index in window.start_frame..(window.start_frame + n_selected) {
        let frame = match source.get_frame(index)? {
            Some(frame) => frame,
            None => break,
        };
        let record = FrameRecord::condense(frame.start_time_s, frame.acq_time_s, frame.n_pixels)
            .map_err(|e| CondenseError::BadFrame(index, e))?;
        log::trace!(
            "Frame {}: {} [s], {} [s] ({}), {} pixels",
            index,
            record.start_time_s(),
            frame.acq_time_s,
            record.log_acq_time(),
            record.n_pixels()
        );
        writer.write_frame(&record)?;
        written += 1;
        if written % flush_val == 0 {
            progress(written as f32 / n_selected as f32)?;
        }
    }
    progress(1.0)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FrameRecordError;
    use crate::time_series::TimeSeriesReader;

    const CSV: &str = "start_time_s,acq_time_s,n_pixels
1325376000.25,0.5,100
1325376100,0.001,65536

1325376150,0.02,12
1325376200,15.0,50
";

    #[test]
    fn test_csv_source() {
        let mut source = CsvFrameSource::from_contents(CSV).unwrap();
        assert_eq!(source.n_frames(), 4);
        let frame = source.get_frame(1).unwrap().unwrap();
        assert_eq!(frame.n_pixels, 65536);
        assert!(source.get_frame(4).unwrap().is_none());
        assert!(matches!(
            CsvFrameSource::from_contents("header\n1,2\n"),
            Err(FrameSourceError::BadLineFormat(2))
        ));
        assert!(CsvFrameSource::from_contents("header\n1,x,2\n").is_err());
    }

    #[test]
    fn test_run_id() {
        assert_eq!(run_id(Path::new("/data/tpx01_run42.csv")), "tpx01_run42");
        assert_eq!(run_id(Path::new("run.tar.gz")), "run");
    }

    #[test]
    fn test_condense_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.bin");
        let mut source = CsvFrameSource::from_contents(CSV).unwrap();
        let mut writer = TimeSeriesWriter::new(&path).unwrap();
        let written = condense(&mut source, FrameWindow::new(0, Some(3)), &mut writer, &mut |_| Ok(()))
            .unwrap();
        assert_eq!(written, 3);
        writer.close().unwrap();

        let mut reader = TimeSeriesReader::new(&path, FrameWindow::all()).unwrap();
        assert_eq!(reader.total_frames(), 3);
        let (_, first) = reader.next_frame().unwrap().unwrap();
        assert_eq!(first.start_time_s(), 1325376000);
        assert_eq!(first.log_acq_time(), 0);
        let (_, second) = reader.next_frame().unwrap().unwrap();
        assert_eq!(second.n_pixels(), 65535);
        assert_eq!(second.log_acq_time(), -2);
    }

    #[test]
    fn test_condense_rejects_long_acquisitions() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = CsvFrameSource::from_contents(CSV).unwrap();
        let mut writer = TimeSeriesWriter::new(&dir.path().join("run.bin")).unwrap();
        assert!(matches!(
            condense(&mut source, FrameWindow::all(), &mut writer, &mut |_| Ok(())),
            Err(CondenseError::BadFrame(3, FrameRecordError::AcqTimeOutOfRange(_)))
        ));
    }

    #[test]
    fn test_condense_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = CsvFrameSource::from_contents(CSV).unwrap();
        let mut writer = TimeSeriesWriter::new(&dir.path().join("run.bin")).unwrap();
        assert!(matches!(
            condense(&mut source, FrameWindow::new(5, None), &mut writer, &mut |_| Ok(())),
            Err(CondenseError::StartFrameOutOfBounds(5, 4))
        ));
    }
}
