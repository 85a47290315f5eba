//! # tpx_profiler
//!
//! tpx_profiler profiles the timing of Timepix detector runs, written in Rust. It condenses
//! the metadata of every frame (start time, acquisition time and number of hit pixels) into
//! a compact binary time series, and then bins that series by month, day, hour and minute
//! so that the live time of a detector can be checked at a glance.
//!
//! ## Installation
//!
//! The only method of install is from source, which is laid out below.
//!
//! ### Rust
//!
//! If you have not used Rust before, you will most likely need to install the Rust tool
//! chain. See the [Rust docs](https://www.rust-lang.org/tools/install) for installation
//! instructions.
//!
//! ### Building & Install
//!
//! To build and install the CLI use `cargo install --path ./tpx_profiler_cli` from the
//! top level repository.
//!
//! ## Configuration
//!
//! Every command is driven by a YAML configuration file. A template can be generated with
//! `tpx_profiler_cli -p config.yml new`. The fields are
//!
//! - `input_path`: the input of the command (frame metadata, a time series, or a directory
//!   of summaries or plots)
//! - `output_path`: an existing directory where the results and the log are written
//! - `start_frame` and `num_frames`: the window of frames to process. A `num_frames` of
//!   null processes every frame after `start_frame`
//! - `day`: the day to profile by hour, as `YYYY-MM-DD`
//! - `month_table_path`: a YAML mapping of `YYYY-MM-01-000000` labels to the UTC start
//!   time of each month. Null uses the bundled table of the 2012 run
//! - `chip_ids`: file name prefixes (`tpx01`) and the chip IDs they belong to
//! - `month_plot` and `hour_plot`: axis labels, limits and figure sizes of the plots
//!
//! ## The condensed time series
//!
//! Each frame is stored as 8 bytes in native byte order: the start time in whole seconds
//! (`u32`), the base 10 logarithm of the acquisition time (`i16`, one of -3 to 1) and the
//! number of hit pixels (`u16`, a fully lit 256x256 frame is stored as 65535). The file has
//! no header, so the number of frames is the file size divided by 8.
//!
//! ## Commands
//!
//! - `condense`: frame metadata (`start_time_s,acq_time_s,n_pixels` per line) to a time series
//! - `scan`: read a time series and report what it holds
//! - `months`: frames per day for every month of the month table
//! - `day`: frames per hour and the frame by frame timeline of each hour of one day
//! - `summary`: the run length, frame spacing and chip ID of a run
//! - `profiles` and `pages`: HTML pages of the summaries and plots
//!
//! All times are handled in UTC.
pub mod bucket;
pub mod calendar;
pub mod condense;
pub mod config;
pub mod constants;
pub mod day;
pub mod error;
pub mod frame_record;
pub mod hour;
pub mod month;
pub mod month_table;
pub mod pages;
pub mod plot;
pub mod process;
pub mod report;
pub mod summary;
pub mod time_series;
pub mod worker_status;
