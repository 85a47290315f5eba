//! Plot models for the month and hour profiles.
//!
//! The profiler does not draw images itself. It prepares the geometry of each
//! plot (bars, shaded regions, axis limits and ticks) and hands it to a
//! [`PlotRenderer`]. The bundled [`JsonPlotWriter`] serializes the model so an
//! external plotting tool can draw it.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::constants::{MAX_DAYS_IN_A_MONTH, NOISY_FRAME_PIXELS};
use super::error::PlotError;
use super::hour::DataHour;
use super::month::DataMonth;

const HOUR_TICK_SPACING_S: f64 = 100.0;
const MONTH_Y_ROUNDING: f64 = 1000.0;
const HOUR_Y_ROUNDING: f64 = 10.0;

/// Drawing options shared by every plot kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    pub x_label: String,
    pub y_label: String,
    pub x_max: f64,
    /// Fixed y axis limit. None means fit the data.
    pub y_max: Option<f64>,
    /// Figure width [inches]
    pub fig_width: f64,
    /// Figure height [inches]
    pub fig_height: f64,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self::month_default()
    }
}

impl PlotConfig {
    pub fn month_default() -> Self {
        Self {
            x_label: String::from("Day"),
            y_label: String::from("Frames"),
            x_max: 32.0,
            y_max: None,
            fig_width: 5.0,
            fig_height: 5.0,
        }
    }

    pub fn hour_default() -> Self {
        Self {
            x_label: String::from("Time [s]"),
            y_label: String::from("Pixels per second"),
            x_max: 3600.0,
            y_max: None,
            fig_width: 42.0,
            fig_height: 4.2,
        }
    }

    pub fn validate(&self) -> Result<(), PlotError> {
        check_positive("x_max", self.x_max)?;
        check_positive("fig_width", self.fig_width)?;
        check_positive("fig_height", self.fig_height)?;
        if let Some(y_max) = self.y_max {
            check_positive("y_max", y_max)?;
        }
        Ok(())
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), PlotError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PlotError::BadOption(name, value))
    }
}

/// Round up to the next multiple of `step`, always moving past an exact multiple
fn round_up(value: f64, step: f64) -> f64 {
    step * ((value / step).floor() + 1.0)
}

/// One bar of a plot. `x` is the left edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bar {
    pub x: f64,
    pub width: f64,
    pub height: f64,
}

/// Frames per day across one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthHistogram {
    pub name: String,
    pub config: PlotConfig,
    pub bars: Vec<Bar>,
    /// Greyed out region covering the days the month does not have
    pub unused_days: Option<Bar>,
    pub x_min: f64,
    pub y_max: f64,
}

impl MonthHistogram {
    pub fn new(month: &DataMonth, config: &PlotConfig) -> Result<Self, PlotError> {
        config.validate()?;
        let bars: Vec<Bar> = month
            .frames_per_day()
            .counts()
            .iter()
            .map(|(day, count)| Bar {
                x: *day as f64,
                width: 1.0,
                height: *count as f64,
            })
            .collect();

        let y_max = match config.y_max {
            Some(y_max) => y_max,
            None => round_up(month.frames_per_day().max_count() as f64, MONTH_Y_ROUNDING),
        };

        let unused_days = if month.n_days() < MAX_DAYS_IN_A_MONTH {
            Some(Bar {
                x: (month.n_days() + 1) as f64,
                width: (MAX_DAYS_IN_A_MONTH - month.n_days()) as f64,
                height: y_max,
            })
        } else {
            None
        };

        log::debug!(
            "Prepared histogram for {} with {} bars, y max {}",
            month.name(),
            bars.len(),
            y_max
        );

        Ok(Self {
            name: month.name().to_string(),
            config: config.clone(),
            bars,
            unused_days,
            x_min: 1.0,
            y_max,
        })
    }
}

/// A frame drawn on the hour timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameBar {
    pub bar: Bar,
    pub noisy: bool,
}

/// Each frame of an hour as a bar of pixels per second over its acquisition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourTimeline {
    pub name: String,
    pub config: PlotConfig,
    pub frames: Vec<FrameBar>,
    pub x_ticks: Vec<f64>,
    pub y_max: f64,
}

impl HourTimeline {
    pub fn new(hour: &DataHour, config: &PlotConfig) -> Result<Self, PlotError> {
        config.validate()?;
        let hour_start = hour.start_time_s();
        log::debug!("The hour's start time: {} [s]", hour_start);

        let mut data_y_max: f64 = 1.0;
        let frames: Vec<FrameBar> = hour
            .start_times()
            .iter()
            .zip(hour.acq_times())
            .zip(hour.n_pixels())
            .map(|((start_time, acq_time), n_pixels)| {
                let height = *n_pixels as f64 / acq_time;
                let noisy = *n_pixels > NOISY_FRAME_PIXELS;
                // Noisy frames would swamp the axis
                if !noisy {
                    data_y_max = data_y_max.max(height);
                }
                FrameBar {
                    bar: Bar {
                        x: (*start_time as i64 - hour_start) as f64,
                        width: *acq_time,
                        height,
                    },
                    noisy,
                }
            })
            .collect();

        let y_max = match config.y_max {
            Some(y_max) => y_max,
            None => round_up(data_y_max, HOUR_Y_ROUNDING),
        };

        let n_ticks = (config.x_max / HOUR_TICK_SPACING_S).floor() as usize + 1;
        let x_ticks = (0..n_ticks)
            .map(|i| i as f64 * HOUR_TICK_SPACING_S)
            .collect();

        Ok(Self {
            name: hour.name().to_string(),
            config: config.clone(),
            frames,
            x_ticks,
            y_max,
        })
    }

    pub fn n_noisy(&self) -> usize {
        self.frames.iter().filter(|frame| frame.noisy).count()
    }
}

/// Something that turns a prepared plot into a file.
///
/// Returns the path of the file written.
pub trait PlotRenderer {
    fn render_month(&mut self, plot: &MonthHistogram, name: &str) -> Result<PathBuf, PlotError>;
    fn render_hour(&mut self, plot: &HourTimeline, name: &str) -> Result<PathBuf, PlotError>;
}

/// Writes each plot model to `<output>/<name>.json`
#[derive(Debug, Clone)]
pub struct JsonPlotWriter {
    output_path: PathBuf,
}

impl JsonPlotWriter {
    pub fn new(output_path: &Path) -> Self {
        Self {
            output_path: output_path.to_path_buf(),
        }
    }

    fn write<T: Serialize>(&self, plot: &T, name: &str) -> Result<PathBuf, PlotError> {
        let path = self.output_path.join(format!("{name}.json"));
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, plot)?;
        writer.flush()?;
        log::info!("Saved plot {}", path.to_string_lossy());
        Ok(path)
    }
}

impl PlotRenderer for JsonPlotWriter {
    fn render_month(&mut self, plot: &MonthHistogram, name: &str) -> Result<PathBuf, PlotError> {
        self.write(plot, name)
    }

    fn render_hour(&mut self, plot: &HourTimeline, name: &str) -> Result<PathBuf, PlotError> {
        self.write(plot, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_record::FrameRecord;

    const FEB_START: i64 = 1328054400;
    const MAR_START: i64 = 1330560000;

    #[test]
    fn test_config_validation() {
        assert!(PlotConfig::month_default().validate().is_ok());
        assert!(PlotConfig::hour_default().validate().is_ok());
        let mut config = PlotConfig::hour_default();
        config.y_max = Some(-3.0);
        assert!(matches!(
            config.validate(),
            Err(PlotError::BadOption("y_max", _))
        ));
        config.y_max = None;
        config.fig_width = f64::NAN;
        assert!(config.validate().is_err());

        let yaml = serde_yaml::to_string(&PlotConfig::month_default()).unwrap();
        let parsed: PlotConfig =
            serde_yaml::from_str(&yaml.replace("y_max: null", "y_max: 16000.0")).unwrap();
        assert_eq!(parsed.y_max, Some(16000.0));
        assert_eq!(parsed.x_label, "Day");
    }

    #[test]
    fn test_month_histogram() {
        let mut month = DataMonth::new(FEB_START, MAR_START - 1).unwrap();
        for i in 0..1500 {
            let frame = FrameRecord::condense((FEB_START + i) as f64, 0.5, 1).unwrap();
            month.add_frame(&frame).unwrap();
        }
        let plot = MonthHistogram::new(&month, &PlotConfig::month_default()).unwrap();
        assert_eq!(plot.bars.len(), 29);
        assert_eq!(plot.bars[0].height, 1500.0);
        assert_eq!(plot.y_max, 2000.0);
        let unused = plot.unused_days.unwrap();
        assert_eq!(unused.x, 30.0);
        assert_eq!(unused.width, 2.0);

        let mut config = PlotConfig::month_default();
        config.y_max = Some(16000.0);
        let plot = MonthHistogram::new(&month, &config).unwrap();
        assert_eq!(plot.y_max, 16000.0);
        assert_eq!(plot.unused_days.unwrap().height, 16000.0);
    }

    #[test]
    fn test_hour_timeline() {
        let mut hour = DataHour::new(FEB_START, FEB_START + 3599).unwrap();
        hour.add_frame(&FrameRecord::condense((FEB_START + 10) as f64, 0.5, 25).unwrap())
            .unwrap();
        hour.add_frame(&FrameRecord::condense((FEB_START + 20) as f64, 0.5, 40000).unwrap())
            .unwrap();
        let plot = HourTimeline::new(&hour, &PlotConfig::hour_default()).unwrap();
        assert_eq!(plot.frames.len(), 2);
        assert_eq!(plot.frames[0].bar.x, 10.0);
        assert_eq!(plot.frames[0].bar.width, 1.0);
        assert_eq!(plot.frames[0].bar.height, 25.0);
        assert!(plot.frames[1].noisy);
        assert_eq!(plot.n_noisy(), 1);
        // The noisy frame does not set the axis
        assert_eq!(plot.y_max, 30.0);
        assert_eq!(plot.x_ticks.len(), 37);
        assert_eq!(plot.x_ticks[36], 3600.0);
    }

    #[test]
    fn test_json_writer() {
        let dir = tempfile::tempdir().unwrap();
        let hour = DataHour::new(FEB_START, FEB_START + 3599).unwrap();
        let plot = HourTimeline::new(&hour, &PlotConfig::hour_default()).unwrap();
        assert_eq!(plot.y_max, 10.0);
        let mut writer = JsonPlotWriter::new(dir.path());
        let path = writer.render_hour(&plot, "00").unwrap();
        assert_eq!(path, dir.path().join("00.json"));
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["name"], "2012-02-01-000000");
    }
}
