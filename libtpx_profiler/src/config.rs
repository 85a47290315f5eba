use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::calendar::parse_day;
use super::error::ConfigError;
use super::plot::PlotConfig;
use super::summary::default_chip_ids;
use super::time_series::FrameWindow;

/// Structure representing the profiler configuration. Contains pathing, frame window
/// and plotting information.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The input file or directory; what it holds depends on the command
    pub input_path: PathBuf,
    /// Directory for every output file and the log
    pub output_path: PathBuf,
    pub start_frame: u64,
    /// None means every frame after start_frame
    pub num_frames: Option<u64>,
    /// The day to profile hour by hour, as YYYY-MM-DD
    pub day: Option<String>,
    /// YAML table of month start times. None uses the bundled 2012 table
    pub month_table_path: Option<PathBuf>,
    #[serde(default = "default_chip_ids")]
    pub chip_ids: BTreeMap<String, String>,
    #[serde(default = "PlotConfig::month_default")]
    pub month_plot: PlotConfig,
    #[serde(default = "PlotConfig::hour_default")]
    pub hour_plot: PlotConfig,
}

impl Default for Config {
    /// Generate a new Config object. Paths will be empty/invalid
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("None"),
            output_path: PathBuf::from("None"),
            start_frame: 0,
            num_frames: None,
            day: None,
            month_table_path: None,
            chip_ids: default_chip_ids(),
            month_plot: PlotConfig::month_default(),
            hour_plot: PlotConfig::hour_default(),
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Check the output directory exists and the plot options make sense
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.output_path.is_dir() {
            return Err(ConfigError::BadOutputDirectory(self.output_path.clone()));
        }
        self.month_plot.validate()?;
        self.hour_plot.validate()?;
        Ok(())
    }

    pub fn window(&self) -> FrameWindow {
        FrameWindow::new(self.start_frame, self.num_frames)
    }

    /// UTC midnight of the configured day
    pub fn day_start(&self) -> Result<i64, ConfigError> {
        match &self.day {
            Some(day) => Ok(parse_day(day)?),
            None => Err(ConfigError::MissingDay),
        }
    }

    /// Get the path of a file in the output directory
    pub fn get_output_file(&self, file_name: &str) -> PathBuf {
        self.output_path.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_template_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        let mut config = Config::default();
        config.output_path = dir.path().to_path_buf();
        config.day = Some(String::from("2012-01-01"));
        std::fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();

        let config = Config::read_config_file(&path).unwrap();
        config.validate().unwrap();
        assert_eq!(config.window(), FrameWindow::all());
        assert_eq!(config.day_start().unwrap(), 1325376000);
        assert_eq!(config.chip_ids["tpx02"], "F04-W0098");
        assert_eq!(config.hour_plot.x_max, 3600.0);
    }

    #[test]
    fn test_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "input_path: data/run.bin").unwrap();
        writeln!(file, "output_path: out").unwrap();
        writeln!(file, "start_frame: 10").unwrap();
        writeln!(file, "num_frames: 5").unwrap();
        drop(file);

        let config = Config::read_config_file(&path).unwrap();
        assert_eq!(config.window(), FrameWindow::new(10, Some(5)));
        assert!(config.month_table_path.is_none());
        assert_eq!(config.month_plot, PlotConfig::month_default());
        assert!(matches!(config.day_start(), Err(ConfigError::MissingDay)));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadOutputDirectory(_))
        ));
    }

    #[test]
    fn test_bad_plot_option() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.output_path = dir.path().to_path_buf();
        config.month_plot.fig_height = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::PlotError(_))));
        assert!(matches!(
            Config::read_config_file(&dir.path().join("missing.yml")),
            Err(ConfigError::BadFilePath(_))
        ));
    }
}
