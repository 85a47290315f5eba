use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::calendar::timestamp_label;
use super::error::SummaryError;
use super::time_series::{FrameWindow, TimeSeriesReader};

const CHIP_PREFIX_LENGTH: usize = 5;

/// The chip IDs of the MoEDAL Timepix detectors, keyed by file name prefix
pub fn default_chip_ids() -> BTreeMap<String, String> {
    BTreeMap::from([
        (String::from("tpx01"), String::from("F03-W0098")),
        (String::from("tpx02"), String::from("F04-W0098")),
    ])
}

/// Look up the chip ID from the first five characters of a file name
pub fn chip_id_for(
    file_name: &str,
    chip_ids: &BTreeMap<String, String>,
) -> Result<String, SummaryError> {
    file_name
        .get(..CHIP_PREFIX_LENGTH)
        .and_then(|prefix| chip_ids.get(prefix))
        .cloned()
        .ok_or_else(|| SummaryError::UnknownChipPrefix(file_name.to_string()))
}

/// Timing profile of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub chip_id: String,
    /// Earliest frame start time
    pub start_time_s: i64,
    /// Time between the first and last frame starts [s]
    #[serde(rename = "Delta_T")]
    pub run_length_s: f64,
    /// Mean time between frame starts [s]
    #[serde(rename = "Delta_t")]
    pub mean_interval_s: f64,
    /// Acquisition time of the last frame summarized [s]
    #[serde(rename = "delta_t")]
    pub acq_time_s: f64,
    pub file_name: String,
    pub n_frames: u64,
}

impl RunSummary {
    /// Size of the condensed time series this summary describes
    pub fn file_size_bytes(&self) -> u64 {
        self.n_frames * super::constants::RECORD_SIZE as u64
    }
}

/// Summarize a window of a condensed time series.
///
/// The timing comes from the frames in `window`; `n_frames` is always the
/// size of the whole file. Start times are sorted before the run length is
/// taken, so frames need not be stored in time order.
pub fn summarize(
    path: &Path,
    window: FrameWindow,
    chip_ids: &BTreeMap<String, String>,
) -> Result<RunSummary, SummaryError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let chip_id = chip_id_for(&file_name, chip_ids)?;

    let mut reader = TimeSeriesReader::new(path, window)?;
    log::info!(
        "Summarizing {} ({}, {} frames, {} in window)",
        file_name,
        human_bytes::human_bytes(reader.get_size_bytes() as f64),
        reader.total_frames(),
        reader.frames_in_window()
    );

    let mut start_times: Vec<i64> = Vec::with_capacity(reader.frames_in_window() as usize);
    let mut last_acq_time_s = 0.0;
    while let Some((_, frame)) = reader.next_frame()? {
        start_times.push(frame.start_time_s() as i64);
        last_acq_time_s = frame.acq_time_s();
    }
    start_times.sort_unstable();

    let (first, last) = match (start_times.first(), start_times.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(SummaryError::NoFrames),
    };
    let run_length_s = (last - first) as f64;
    let mean_interval_s = if start_times.len() > 1 {
        run_length_s / (start_times.len() - 1) as f64
    } else {
        0.0
    };

    log::info!("First start time: {} ({})", timestamp_label(first)?, first);
    log::info!("Last start time: {} ({})", timestamp_label(last)?, last);
    log::info!("Delta_T = {} [s], Delta_t = {} [s]", run_length_s, mean_interval_s);

    Ok(RunSummary {
        chip_id,
        start_time_s: first,
        run_length_s,
        mean_interval_s,
        acq_time_s: last_acq_time_s,
        file_name,
        n_frames: reader.total_frames(),
    })
}

/// Write the summary as `<chip_id>_<YYYY-MM-DD-HHMMSS>.json` in `output_path`
pub fn write_summary_file(
    summary: &RunSummary,
    output_path: &Path,
) -> Result<PathBuf, SummaryError> {
    let path = output_path.join(format!(
        "{}_{}.json",
        summary.chip_id,
        timestamp_label(summary.start_time_s)?
    ));
    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer(&mut writer, summary)?;
    writer.flush()?;
    log::info!("Wrote summary {}", path.to_string_lossy());
    Ok(path)
}

/// Read every summary file in a directory, keyed by run ID (file stem)
pub fn read_summaries(path: &Path) -> Result<BTreeMap<String, RunSummary>, SummaryError> {
    let mut summaries = BTreeMap::new();
    for entry in std::fs::read_dir(path)? {
        let entry_path = entry?.path();
        if entry_path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        let run_id = entry_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let reader = BufReader::new(File::open(&entry_path)?);
        let summary: RunSummary = serde_json::from_reader(reader)?;
        log::info!("Run ID: {}", run_id);
        summaries.insert(run_id, summary);
    }
    Ok(summaries)
}
