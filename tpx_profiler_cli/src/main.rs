use clap::{Arg, ArgAction, Command};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use simplelog::{ColorChoice, CombinedLogger, LevelFilter, SharedLogger, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::time::Duration;

use libtpx_profiler::config::Config;
use libtpx_profiler::error::{ConfigError, ProcessorError};
use libtpx_profiler::plot::JsonPlotWriter;
use libtpx_profiler::process::{
    condense_run, make_plot_page_file, make_profile_page_file, profile_day, profile_months,
    scan_time_series, summarize_run,
};
use libtpx_profiler::worker_status::WorkerStatus;

const LOG_FILE_NAME: &str = "tpx_profiler.log";

fn make_template_config(path: &Path) -> Result<(), ConfigError> {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config)?;
    let mut file = File::create(path)?;
    file.write_all(yaml_str.as_bytes())?;
    Ok(())
}

/// Run one profiler command to completion
fn run_command(
    command: &str,
    config: &Config,
    tx: &Sender<WorkerStatus>,
) -> Result<(), ProcessorError> {
    match command {
        "condense" => {
            let path = condense_run(config, tx)?;
            log::info!("Time series written to {}", path.to_string_lossy());
        }
        "scan" => {
            scan_time_series(config, tx)?;
        }
        "months" => {
            let mut renderer = JsonPlotWriter::new(&config.output_path);
            profile_months(config, &mut renderer, tx)?;
        }
        "day" => {
            let mut renderer = JsonPlotWriter::new(&config.output_path);
            profile_day(config, &mut renderer, tx)?;
        }
        "summary" => {
            let summary = summarize_run(config)?;
            log::info!(
                "Chip {}: {} frames over {} [s]",
                summary.chip_id,
                summary.n_frames,
                summary.run_length_s
            );
        }
        "profiles" => {
            make_profile_page_file(config)?;
        }
        "pages" => {
            make_plot_page_file(config)?;
        }
        _ => log::error!("Unrecognized command {command}"),
    }
    Ok(())
}

/// Set up terminal logging, plus a log file if the output directory is known
fn init_logging(
    pb_manager: &MultiProgress,
    level: LevelFilter,
    output_path: Option<&Path>,
) -> Result<(), String> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = output_path.filter(|p| p.is_dir()) {
        let log_file = File::create(path.join(LOG_FILE_NAME)).map_err(|e| e.to_string())?;
        loggers.push(WriteLogger::new(
            level,
            simplelog::Config::default(),
            log_file,
        ));
    }

    LogWrapper::new(pb_manager.clone(), CombinedLogger::new(loggers))
        .try_init()
        .map_err(|e| e.to_string())?;
    log::set_max_level(level);
    Ok(())
}

fn main() {
    // Create a cli
    let matches = Command::new("tpx_profiler_cli")
        .about("Condense and profile the frame timing of Timepix runs")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .subcommand(Command::new("condense").about("Condense frame metadata into a time series"))
        .subcommand(Command::new("scan").about("Read a time series and report its contents"))
        .subcommand(Command::new("months").about("Count the frames of each day of each month"))
        .subcommand(Command::new("day").about("Profile the hours of the configured day"))
        .subcommand(Command::new("summary").about("Summarize the timing of a run"))
        .subcommand(Command::new("profiles").about("Make the run profile page from summaries"))
        .subcommand(Command::new("pages").about("Make the plot pages from plot images"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .global(true)
                .help("Path to the configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Increase output verbosity"),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config_path = match matches.get_one::<String>("path") {
        Some(p) => PathBuf::from(p),
        None => {
            eprintln!("A configuration path is required");
            std::process::exit(1);
        }
    };
    let command = matches.subcommand_name().unwrap_or_default().to_string();

    // The config is needed to place the log file, so load it first
    let config = if command == "new" {
        None
    } else {
        Some(Config::read_config_file(&config_path))
    };
    let output_path = match &config {
        Some(Ok(c)) => Some(c.output_path.as_path()),
        _ => None,
    };

    // Initialize feedback
    let pb_manager = MultiProgress::new();
    if let Err(e) = init_logging(&pb_manager, level, output_path) {
        eprintln!("Could not create logging/progress: {e}");
        std::process::exit(1);
    }

    let config = match config {
        None => {
            log::info!(
                "Making a template config at {}...",
                config_path.to_string_lossy()
            );
            match make_template_config(&config_path) {
                Ok(()) => log::info!("Done."),
                Err(e) => {
                    log::error!("{e}");
                    std::process::exit(1);
                }
            }
            return;
        }
        Some(Ok(c)) => c,
        Some(Err(e)) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    log::info!("Config successfully loaded from {}.", config_path.to_string_lossy());
    log::info!("Input Path: {}", config.input_path.to_string_lossy());
    log::info!("Output Path: {}", config.output_path.to_string_lossy());
    log::info!(
        "Start Frame: {} Number of Frames: {}",
        config.start_frame,
        config
            .num_frames
            .map_or(String::from("all"), |n| n.to_string())
    );

    // Setup the progress bar
    let pb = pb_manager.add(ProgressBar::new(100));
    if let Ok(style) = ProgressStyle::with_template("{msg:>12} [{bar:40.cyan/blue}] {pos:>3}%") {
        pb.set_style(style);
    }

    // Spawn the task!
    let (tx, rx) = channel::<WorkerStatus>();
    let task = command.clone();
    let handle = std::thread::spawn(move || run_command(&task, &config, &tx));

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(status) => {
                pb.set_message(status.stage.to_string());
                pb.set_position((status.progress * 100.0) as u64);
            }
            Err(RecvTimeoutError::Timeout) => (),
            // The task dropped its sender, so it is done
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    pb.finish();

    let succeeded = match handle.join() {
        Ok(Ok(())) => {
            log::info!("Successfully finished {command}!");
            true
        }
        Ok(Err(e)) => {
            log::error!("{command} failed with error: {e}");
            false
        }
        Err(_) => {
            log::error!("Failed to join {command} task!");
            false
        }
    };

    log::info!("Done.");
    if !succeeded {
        std::process::exit(1);
    }
}
