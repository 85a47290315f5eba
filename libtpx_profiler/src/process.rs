use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use serde::Serialize;

use super::calendar::timestamp_label;
use super::condense::{condense, run_id, CsvFrameSource, FrameSource};
use super::config::Config;
use super::constants::SECONDS_IN_A_DAY;
use super::day::DataDay;
use super::error::{BucketError, ProcessorError};
use super::frame_record::FrameRecord;
use super::month_table::MonthBoundaryTable;
use super::pages::{make_day_plot_page, make_plot_page, make_profile_page};
use super::plot::{HourTimeline, MonthHistogram, PlotRenderer};
use super::report::{day_report, hour_reports, month_reports, DayReport, HourReport, MonthReport};
use super::summary::{read_summaries, summarize, write_summary_file, RunSummary};
use super::time_series::{ingest, FrameSink, IngestSummary, TimeSeriesReader, TimeSeriesWriter};
use super::worker_status::{ProgressResult, Stage, WorkerStatus};

/// Progress callback that forwards to the status channel
fn progress_sender(tx: &Sender<WorkerStatus>, stage: Stage) -> impl FnMut(f32) -> ProgressResult + '_ {
    move |progress| tx.send(WorkerStatus::new(progress, stage))
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), ProcessorError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    log::info!("Wrote {}", path.to_string_lossy());
    Ok(())
}

fn write_page(page: &str, path: &Path) -> Result<(), ProcessorError> {
    std::fs::write(path, page)?;
    log::info!("Wrote page {}", path.to_string_lossy());
    Ok(())
}

fn open_time_series(config: &Config) -> Result<TimeSeriesReader, ProcessorError> {
    let reader = TimeSeriesReader::new(&config.input_path, config.window())?;
    log::info!("Reading time series {}", config.input_path.to_string_lossy());
    log::info!(
        "File size: {}",
        human_bytes::human_bytes(reader.get_size_bytes() as f64)
    );
    log::info!("Number of frames in the file: {}", reader.total_frames());
    log::info!("Starting frame: {}", config.start_frame);
    log::info!("Frames to be processed: {}", reader.frames_in_window());
    Ok(reader)
}

/// Every frame routed into a hierarchy must be counted by it
fn check_frame_count(routed: u64, held: u64) -> Result<(), ProcessorError> {
    if routed != held {
        return Err(ProcessorError::FrameCountMismatch(routed, held));
    }
    Ok(())
}

/// Condense the frame metadata at `input_path` into `<output_path>/<run_id>.bin`.
///
/// Returns the path of the time series.
pub fn condense_run(config: &Config, tx: &Sender<WorkerStatus>) -> Result<PathBuf, ProcessorError> {
    config.validate()?;
    let mut source = CsvFrameSource::new(&config.input_path)?;
    let output_file = config.get_output_file(&format!("{}.bin", run_id(&config.input_path)));
    log::info!(
        "Condensing {} ({} frames) to {}",
        config.input_path.to_string_lossy(),
        source.n_frames(),
        output_file.to_string_lossy()
    );

    let mut writer = TimeSeriesWriter::new(&output_file)?;
    tx.send(WorkerStatus::new(0.0, Stage::Condensing))?;
    let written = condense(
        &mut source,
        config.window(),
        &mut writer,
        &mut progress_sender(tx, Stage::Condensing),
    )?;
    let closed = writer.close()?;
    if written != closed {
        return Err(ProcessorError::FrameCountMismatch(written, closed));
    }
    tx.send(WorkerStatus::new(1.0, Stage::Condensing))?;

    let size = std::fs::metadata(&output_file)?.len();
    log::info!(
        "Wrote {} frames ({}).",
        written,
        human_bytes::human_bytes(size as f64)
    );
    Ok(output_file)
}

/// Frame statistics from a straight read of a time series
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanReport {
    pub n_frames: u64,
    pub first_start_time_s: Option<u32>,
    pub last_start_time_s: Option<u32>,
    /// Frames out of start time order
    pub n_out_of_order: u64,
    pub n_noisy: u64,
    /// Frame count for each log10(acquisition time) rung
    pub frames_per_acq_time: BTreeMap<i16, u64>,
}

impl FrameSink for ScanReport {
    fn accept(&mut self, frame: &FrameRecord) -> Result<bool, BucketError> {
        log::debug!(
            "{} [s], {} [s], {} pixels",
            frame.start_time_s(),
            frame.acq_time_s(),
            frame.n_pixels()
        );
        if self
            .last_start_time_s
            .is_some_and(|last| frame.start_time_s() < last)
        {
            self.n_out_of_order += 1;
        }
        if self.first_start_time_s.is_none() {
            self.first_start_time_s = Some(frame.start_time_s());
        }
        self.last_start_time_s = Some(frame.start_time_s());
        if frame.is_noisy() {
            self.n_noisy += 1;
        }
        *self
            .frames_per_acq_time
            .entry(frame.log_acq_time())
            .or_insert(0) += 1;
        self.n_frames += 1;
        Ok(true)
    }
}

/// Read the configured window of a time series and report what is in it
pub fn scan_time_series(config: &Config, tx: &Sender<WorkerStatus>) -> Result<ScanReport, ProcessorError> {
    config.validate()?;
    let mut reader = open_time_series(config)?;
    let mut scan = ScanReport::default();
    tx.send(WorkerStatus::new(0.0, Stage::Reading))?;
    let summary = ingest(&mut reader, &mut scan, &mut progress_sender(tx, Stage::Reading))?;
    tx.send(WorkerStatus::new(1.0, Stage::Reading))?;
    check_frame_count(summary.n_routed, scan.n_frames)?;

    if let (Some(first), Some(last)) = (scan.first_start_time_s, scan.last_start_time_s) {
        log::info!("First frame: {} ({})", timestamp_label(first as i64)?, first);
        log::info!("Last frame: {} ({})", timestamp_label(last as i64)?, last);
    }
    log::info!(
        "Scanned {} frames: {} noisy, {} out of order",
        scan.n_frames,
        scan.n_noisy,
        scan.n_out_of_order
    );
    write_json(&scan, &config.get_output_file("scan.json"))?;
    Ok(scan)
}

fn log_ingest(summary: &IngestSummary) {
    log::info!(
        "Read {} frames: {} binned, {} outside the profiled period",
        summary.n_read,
        summary.n_routed,
        summary.n_discarded
    );
}

/// Count the frames of a time series by month and day.
///
/// Writes `months.json` plus one plot per month, named by month ID.
pub fn profile_months(
    config: &Config,
    renderer: &mut dyn PlotRenderer,
    tx: &Sender<WorkerStatus>,
) -> Result<BTreeMap<String, MonthReport>, ProcessorError> {
    config.validate()?;
    let table = MonthBoundaryTable::load(config.month_table_path.as_deref())?;
    let mut months = table.month_set()?;
    let mut reader = open_time_series(config)?;

    tx.send(WorkerStatus::new(0.0, Stage::Reading))?;
    let summary = ingest(&mut reader, &mut months, &mut progress_sender(tx, Stage::Reading))?;
    months.seal();
    log_ingest(&summary);
    check_frame_count(summary.n_routed, months.n_frames())?;

    let reports = month_reports(&months);
    for (name, report) in reports.iter() {
        log::info!("{}: {} frames", name, report.n_frames);
    }
    write_json(&reports, &config.get_output_file("months.json"))?;

    tx.send(WorkerStatus::new(0.0, Stage::Rendering))?;
    let n_months = months.len().max(1) as f32;
    for (index, month) in months.months().enumerate() {
        let plot = MonthHistogram::new(month, &config.month_plot)?;
        renderer.render_month(&plot, month.name())?;
        tx.send(WorkerStatus::new((index + 1) as f32 / n_months, Stage::Rendering))?;
    }
    Ok(reports)
}

/// Everything known about a single profiled day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayProfile {
    pub day: DayReport,
    pub hours: BTreeMap<String, HourReport>,
}

/// Bin the frames of the configured day by hour and minute.
///
/// Writes `<YYYY-MM-DD>.json` plus one plot per hour, named by the two digit hour.
pub fn profile_day(
    config: &Config,
    renderer: &mut dyn PlotRenderer,
    tx: &Sender<WorkerStatus>,
) -> Result<DayProfile, ProcessorError> {
    config.validate()?;
    let day_start = config.day_start()?;
    let mut day = DataDay::new(day_start, day_start + SECONDS_IN_A_DAY - 1)?;
    let mut reader = open_time_series(config)?;

    tx.send(WorkerStatus::new(0.0, Stage::Reading))?;
    let summary = ingest(&mut reader, &mut day, &mut progress_sender(tx, Stage::Reading))?;
    day.seal();
    log_ingest(&summary);
    check_frame_count(summary.n_routed, day.n_frames())?;

    let profile = DayProfile {
        day: day_report(&day),
        hours: hour_reports(&day),
    };
    write_json(&profile, &config.get_output_file(&format!("{}.json", day.name())))?;

    tx.send(WorkerStatus::new(0.0, Stage::Rendering))?;
    let n_hours = day.n_hours().max(1) as f32;
    for (index, hour) in day.hours().iter().enumerate() {
        let plot = HourTimeline::new(hour, &config.hour_plot)?;
        if plot.n_noisy() > 0 {
            log::warn!("{} has {} noisy frames", hour.name(), plot.n_noisy());
        }
        renderer.render_hour(&plot, &format!("{index:02}"))?;
        tx.send(WorkerStatus::new((index + 1) as f32 / n_hours, Stage::Rendering))?;
    }
    Ok(profile)
}

/// Summarize the configured window of the time series at `input_path` into a
/// JSON file in `output_path`
pub fn summarize_run(config: &Config) -> Result<RunSummary, ProcessorError> {
    config.validate()?;
    let summary = summarize(&config.input_path, config.window(), &config.chip_ids)?;
    write_summary_file(&summary, &config.output_path)?;
    Ok(summary)
}

/// Build `profiles.html` from the summary files in `input_path`
pub fn make_profile_page_file(config: &Config) -> Result<PathBuf, ProcessorError> {
    config.validate()?;
    let summaries = read_summaries(&config.input_path)?;
    log::info!("Found {} run summaries", summaries.len());
    let path = config.get_output_file("profiles.html");
    write_page(&make_profile_page(&summaries)?, &path)?;
    Ok(path)
}

/// The images in `path` with the given extension, keyed by file stem
fn find_images(path: &Path, extension: &str) -> Result<BTreeMap<String, String>, ProcessorError> {
    let mut images = BTreeMap::new();
    for entry in std::fs::read_dir(path)? {
        let entry_path = entry?.path();
        if entry_path.extension().map_or(true, |ext| ext != extension) {
            continue;
        }
        if let (Some(stem), Some(name)) = (entry_path.file_stem(), entry_path.file_name()) {
            images.insert(
                stem.to_string_lossy().to_string(),
                name.to_string_lossy().to_string(),
            );
        }
    }
    Ok(images)
}

/// Build the plot pages from the `.png` images in `input_path`.
///
/// Month plots (`YYYY-MM.png`) go to `plots.html`, hour plots (`HH.png`) to
/// `day.html`. Returns the pages written.
pub fn make_plot_page_file(config: &Config) -> Result<Vec<PathBuf>, ProcessorError> {
    config.validate()?;
    let mut month_plots = BTreeMap::new();
    let mut hour_plots = BTreeMap::new();
    for (stem, name) in find_images(&config.input_path, "png")? {
        if let Ok(hour) = stem.parse::<u32>() {
            hour_plots.insert(hour, name);
        } else {
            month_plots.insert(stem, name);
        }
    }

    let mut pages = Vec::new();
    if !month_plots.is_empty() {
        let path = config.get_output_file("plots.html");
        write_page(&make_plot_page(&month_plots)?, &path)?;
        pages.push(path);
    }
    if !hour_plots.is_empty() {
        let path = config.get_output_file("day.html");
        write_page(&make_day_plot_page(&hour_plots), &path)?;
        pages.push(path);
    }
    if pages.is_empty() {
        log::warn!(
            "No plot images found in {}",
            config.input_path.to_string_lossy()
        );
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::JsonPlotWriter;
    use std::sync::mpsc::channel;

    const CSV: &str = "start_time_s,acq_time_s,n_pixels
1325376000,0.5,100
1325379661,0.001,65536
1325462400,0.02,12
1328054400,0.05,40000
1400000000,0.5,1
";

    fn make_config(dir: &Path) -> Config {
        let input = dir.join("tpx01_run7.csv");
        std::fs::write(&input, CSV).unwrap();
        Config {
            input_path: input,
            output_path: dir.to_path_buf(),
            day: Some(String::from("2012-01-01")),
            ..Default::default()
        }
    }

    fn condensed_config(dir: &Path) -> Config {
        let mut config = make_config(dir);
        let (tx, _rx) = channel();
        config.input_path = condense_run(&config, &tx).unwrap();
        config
    }

    #[test]
    fn test_condense_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = make_config(dir.path());
        let (tx, rx) = channel();
        let path = condense_run(&config, &tx).unwrap();
        assert_eq!(path, dir.path().join("tpx01_run7.bin"));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 40);
        let last = rx.try_iter().last().unwrap();
        assert_eq!(last, WorkerStatus::new(1.0, Stage::Condensing));
    }

    #[test]
    fn test_scan() {
        let dir = tempfile::tempdir().unwrap();
        let config = condensed_config(dir.path());
        let (tx, _rx) = channel();
        let scan = scan_time_series(&config, &tx).unwrap();
        assert_eq!(scan.n_frames, 5);
        assert_eq!(scan.n_noisy, 2);
        assert_eq!(scan.n_out_of_order, 0);
        assert_eq!(scan.first_start_time_s, Some(1325376000));
        assert_eq!(scan.frames_per_acq_time[&0], 2);
        assert!(dir.path().join("scan.json").exists());
    }

    #[test]
    fn test_profile_months() {
        let dir = tempfile::tempdir().unwrap();
        let config = condensed_config(dir.path());
        let plot_dir = tempfile::tempdir().unwrap();
        let mut renderer = JsonPlotWriter::new(plot_dir.path());
        let (tx, _rx) = channel();
        let reports = profile_months(&config, &mut renderer, &tx).unwrap();
        assert_eq!(reports.len(), 14);
        assert_eq!(reports["2012-01"].n_frames, 3);
        assert_eq!(reports["2012-01"].frames_per_day[&1], 2);
        assert_eq!(reports["2012-01"].frames_per_day[&2], 1);
        assert_eq!(reports["2012-02"].frames_per_day[&1], 1);
        // The 2014 frame is outside the table
        let total: u64 = reports.values().map(|r| r.n_frames).sum();
        assert_eq!(total, 4);
        assert!(plot_dir.path().join("2012-02.json").exists());
        assert!(dir.path().join("months.json").exists());
    }

    #[test]
    fn test_profile_day() {
        let dir = tempfile::tempdir().unwrap();
        let config = condensed_config(dir.path());
        let plot_dir = tempfile::tempdir().unwrap();
        let mut renderer = JsonPlotWriter::new(plot_dir.path());
        let (tx, _rx) = channel();
        let profile = profile_day(&config, &mut renderer, &tx).unwrap();
        assert_eq!(profile.day.n_frames, 2);
        assert_eq!(profile.day.frames_per_hour[&0], 1);
        assert_eq!(profile.day.frames_per_hour[&1], 1);
        let hour = &profile.hours["2012-01-01-010000"];
        assert_eq!(hour.frames_per_minute[&1], 1);
        assert_eq!(hour.n_pixels, vec![65535]);
        assert!(plot_dir.path().join("23.json").exists());
        assert!(dir.path().join("2012-01-01.json").exists());

        let mut config = config;
        config.day = None;
        assert!(profile_day(&config, &mut renderer, &tx).is_err());
    }

    #[test]
    fn test_summary_and_pages() {
        let dir = tempfile::tempdir().unwrap();
        let config = condensed_config(dir.path());
        let summary = summarize_run(&config).unwrap();
        assert_eq!(summary.chip_id, "F03-W0098");
        assert_eq!(summary.n_frames, 5);
        assert_eq!(summary.run_length_s, (1400000000 - 1325376000) as f64);

        let summary_dir = tempfile::tempdir().unwrap();
        std::fs::copy(
            dir.path().join("F03-W0098_2012-01-01-000000.json"),
            summary_dir.path().join("F03-W0098_2012-01-01-000000.json"),
        )
        .unwrap();
        std::fs::write(summary_dir.path().join("2012-01.png"), b"").unwrap();
        std::fs::write(summary_dir.path().join("07.png"), b"").unwrap();

        let mut page_config = config.clone();
        page_config.input_path = summary_dir.path().to_path_buf();
        let page = make_profile_page_file(&page_config).unwrap();
        let html = std::fs::read_to_string(page).unwrap();
        assert!(html.contains("tpx01_run7.bin"));

        let pages = make_plot_page_file(&page_config).unwrap();
        assert_eq!(pages.len(), 2);
        let plots = std::fs::read_to_string(&pages[0]).unwrap();
        assert!(plots.contains("January 2012"));
        let day = std::fs::read_to_string(&pages[1]).unwrap();
        assert!(day.contains(r#"<td class="number">07</td>"#));
    }

    #[test]
    fn test_summary_of_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = condensed_config(dir.path());
        config.start_frame = 1;
        config.num_frames = Some(3);
        let summary = summarize_run(&config).unwrap();
        assert_eq!(summary.start_time_s, 1325379661);
        assert_eq!(summary.run_length_s, (1328054400 - 1325379661) as f64);
        assert!((summary.acq_time_s - 0.1).abs() < 1e-12);
        assert_eq!(summary.n_frames, 5);
        assert!(dir
            .path()
            .join("F03-W0098_2012-01-01-010101.json")
            .exists());
    }

    #[test]
    fn test_bad_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = make_config(dir.path());
        config.output_path = dir.path().join("missing");
        let (tx, _rx) = channel();
        assert!(matches!(
            condense_run(&config, &tx),
            Err(ProcessorError::ConfigError(_))
        ));
    }
}
