use clap::{Parser, Subcommand};
use foot_thermal::analyze::{self, AnalyzeConfig};
use foot_thermal::compare::compare_feet;
use foot_thermal::roi::{CalibrationStore, DirBlobStore, RoiRect, RoiSet};
use foot_thermal::FootSide;
use serde::Serialize;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "foot-thermal")]
#[command(version, about = "Thermal foot segmentation and ROI analysis", long_about = None)]
struct Cli {
    /// Pipeline config (JSON); defaults are used when absent
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit JSON-formatted tracing events
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment a frame and report mask, bounding box and centroid
    Segment {
        /// Frame file (JSON)
        #[arg(value_name = "FRAME")]
        frame: PathBuf,

        /// Write the report here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Record the three anatomical regions on a frame
    Calibrate {
        #[arg(value_name = "FRAME")]
        frame: PathBuf,

        /// Foot side; falls back to the frame's `foot` field
        #[arg(long)]
        side: Option<FootSide>,

        /// Hallux rectangle in grid cells
        #[arg(long, value_name = "R0,R1,C0,C1")]
        hallux: RoiRect,

        /// First metatarsal head rectangle in grid cells
        #[arg(long, value_name = "R0,R1,C0,C1")]
        first_metatarsal: RoiRect,

        /// Heel rectangle in grid cells
        #[arg(long, value_name = "R0,R1,C0,C1")]
        heel: RoiRect,

        /// Calibration store directory
        #[arg(long, value_name = "DIR")]
        store: PathBuf,
    },

    /// Apply the stored calibration and report per-region statistics
    Analyze {
        #[arg(value_name = "FRAME")]
        frame: PathBuf,

        #[arg(long)]
        side: Option<FootSide>,

        #[arg(long, value_name = "DIR")]
        store: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Compare region averages of a left and a right frame
    Compare {
        #[arg(value_name = "LEFT")]
        left: PathBuf,

        #[arg(value_name = "RIGHT")]
        right: PathBuf,

        #[arg(long, value_name = "DIR")]
        store: PathBuf,

        /// Flag regions whose average differs by more than this, °C
        #[arg(long, value_name = "CELSIUS")]
        threshold: Option<f32>,

        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Generate frames from a grayscale foot image
    #[cfg(feature = "image")]
    Simulate {
        /// Grayscale foot picture; a missing file gives a uniform frame
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Separate picture used while simulating the right foot
        #[arg(long, value_name = "IMAGE")]
        right_image: Option<PathBuf>,

        #[arg(long, default_value = "left")]
        side: FootSide,

        /// low_difference or high_difference
        #[arg(long, default_value = "low_difference")]
        mode: foot_thermal::SimulationMode,

        #[arg(short = 'n', long, default_value_t = 1)]
        frames: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Output directory for `frame_NNNN.json`
        #[arg(long, value_name = "DIR")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = match &cli.config {
        Some(path) => AnalyzeConfig::load_json(path)?,
        None => AnalyzeConfig::default(),
    };

    match cli.command {
        Commands::Segment { frame, out } => {
            let (grid, _) = analyze::load_frame(&frame)?;
            let seg = analyze::segment_grid(&grid, &config.segment);
            emit(&seg, out.as_deref())?;
        }
        Commands::Calibrate {
            frame,
            side,
            hallux,
            first_metatarsal,
            heel,
            store,
        } => {
            let (grid, recorded) = analyze::load_frame(&frame)?;
            let side = resolve_side(side, recorded)?;
            let selections = RoiSet {
                hallux,
                first_metatarsal,
                heel,
            };
            let store = CalibrationStore::new(DirBlobStore::new(store));
            let calibration = analyze::calibrate_and_store(
                &grid,
                side,
                &selections,
                &config.segment,
                &store,
            )?;
            emit(&calibration, None)?;
        }
        Commands::Analyze {
            frame,
            side,
            store,
            out,
        } => {
            let (grid, recorded) = analyze::load_frame(&frame)?;
            let side = resolve_side(side, recorded)?;
            let store = CalibrationStore::new(DirBlobStore::new(store));
            let report = analyze::analyze_with_store(&grid, side, &store, &config.segment);
            emit(&report, out.as_deref())?;
        }
        Commands::Compare {
            left,
            right,
            store,
            threshold,
            out,
        } => {
            let store = CalibrationStore::new(DirBlobStore::new(store));
            let (left, _) = analyze::load_frame(&left)?;
            let (right, _) = analyze::load_frame(&right)?;
            let left = analyze::analyze_with_store(&left, FootSide::Left, &store, &config.segment);
            let right =
                analyze::analyze_with_store(&right, FootSide::Right, &store, &config.segment);
            let report = compare_feet(
                &left,
                &right,
                threshold.unwrap_or(config.asymmetry_threshold),
            );
            if !report.flagged.is_empty() {
                log::warn!("asymmetry above threshold in {:?}", report.flagged);
            }
            emit(&report, out.as_deref())?;
        }
        #[cfg(feature = "image")]
        Commands::Simulate {
            image,
            right_image,
            side,
            mode,
            frames,
            seed,
            out_dir,
        } => {
            use foot_thermal::simulate::{SensorConfig, SimulatedSensor};

            let sensor_config = SensorConfig {
                seed,
                ..SensorConfig::default()
            };
            let mut sensor = match right_image {
                Some(right) => SimulatedSensor::from_side_images(&image, &right, sensor_config)?,
                None => SimulatedSensor::from_image_path(&image, sensor_config)?,
            };
            sensor.set_side(side);
            sensor.set_mode(mode);
            fs::create_dir_all(&out_dir)?;
            for i in 0..frames {
                let path = out_dir.join(format!("frame_{i:04}.json"));
                sensor.next_frame().write_json(&path)?;
            }
            log::info!("wrote {frames} frames to {}", out_dir.display());
        }
    }

    Ok(())
}

/// Filter used when `RUST_LOG` is unset.
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

fn init_logging(cli: &Cli) {
    let level = default_filter(cli.verbose);

    #[cfg(feature = "tracing")]
    {
        use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr);
        let _ = if cli.json_logs {
            builder.json().flatten_event(true).try_init()
        } else {
            builder.try_init()
        };
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
            .format_timestamp_millis()
            .try_init();
    }
}

fn resolve_side(side: Option<FootSide>, recorded: Option<FootSide>) -> Result<FootSide, Box<dyn Error>> {
    side.or(recorded)
        .ok_or_else(|| "foot side unknown: pass --side or set `foot` in the frame".into())
}

fn emit<T: Serialize>(value: &T, out: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_default_filter() {
        assert_eq!(default_filter(0), "warn");
        assert_eq!(default_filter(1), "debug");
        assert_eq!(default_filter(4), "trace");
    }

    #[test]
    fn explicit_side_wins_over_recorded() {
        let side = resolve_side(Some(FootSide::Right), Some(FootSide::Left)).unwrap();
        assert_eq!(side, FootSide::Right);
        assert!(resolve_side(None, None).is_err());
    }
}
