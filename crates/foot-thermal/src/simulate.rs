//! Simulated thermal sensor.
//!
//! A grayscale foot picture is resized to the sensor resolution and mapped
//! linearly onto a temperature range. Every frame adds a slow sinusoidal
//! drift, gaussian noise and a per-side offset selected by
//! [`SimulationMode`]. Left and right captures may use separate pictures.

use crate::frame::{SimulationMode, ThermalFrame};
use foot_thermal_core::{FootSide, TemperatureGrid};
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageReader};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, NormalError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const TIME_STEP: f32 = 0.05;
const DRIFT_AMPLITUDE: f32 = 0.3;

#[derive(thiserror::Error, Debug)]
pub enum SimulateError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("noise standard deviation must be >= 0, got {0}")]
    InvalidNoise(f32),
    #[error("invalid noise level: {0}")]
    Noise(#[from] NormalError),
    #[error("left base is {left:?} but right base is {right:?}")]
    SideShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
}

/// Sensor geometry and signal model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub rows: usize,
    pub cols: usize,
    /// Temperature of the darkest pixel, °C.
    pub temp_min: f32,
    /// Temperature of the brightest pixel, °C.
    pub temp_max: f32,
    /// Standard deviation of per-cell noise, °C.
    pub noise_std: f32,
    pub seed: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            rows: 32,
            cols: 24,
            temp_min: 28.0,
            temp_max: 38.0,
            noise_std: 0.15,
            seed: 0,
        }
    }
}

pub struct SimulatedSensor {
    config: SensorConfig,
    left: TemperatureGrid,
    right: TemperatureGrid,
    mode: SimulationMode,
    side: FootSide,
    t: f32,
    rng: StdRng,
    noise: Normal<f32>,
}

impl SimulatedSensor {
    /// Sensor over an explicit base temperature map, shared by both sides.
    pub fn from_base(base: TemperatureGrid, config: SensorConfig) -> Result<Self, SimulateError> {
        Self::from_side_bases(base.clone(), base, config)
    }

    /// Sensor with one base map per foot side. Both maps must share a shape.
    pub fn from_side_bases(
        left: TemperatureGrid,
        right: TemperatureGrid,
        config: SensorConfig,
    ) -> Result<Self, SimulateError> {
        if !(config.noise_std >= 0.0) {
            return Err(SimulateError::InvalidNoise(config.noise_std));
        }
        let noise = Normal::new(0.0, config.noise_std)?;
        let (ls, rs) = ((left.rows(), left.cols()), (right.rows(), right.cols()));
        if ls != rs {
            return Err(SimulateError::SideShapeMismatch {
                left: ls,
                right: rs,
            });
        }
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            left,
            right,
            mode: SimulationMode::default(),
            side: FootSide::Left,
            t: 0.0,
            noise,
        })
    }

    /// Sensor whose base map comes from a grayscale image.
    pub fn from_luma(img: &GrayImage, config: SensorConfig) -> Result<Self, SimulateError> {
        let base = base_map(img, &config);
        Self::from_base(base, config)
    }

    /// Load the base map from an image file.
    ///
    /// A missing file yields a uniform map at the middle of the temperature
    /// range.
    pub fn from_image_path(
        path: impl AsRef<Path>,
        config: SensorConfig,
    ) -> Result<Self, SimulateError> {
        let base = load_base(path.as_ref(), &config)?;
        Self::from_base(base, config)
    }

    /// Load one picture per side; [`set_side`](Self::set_side) switches
    /// between them.
    pub fn from_side_images(
        left: impl AsRef<Path>,
        right: impl AsRef<Path>,
        config: SensorConfig,
    ) -> Result<Self, SimulateError> {
        let left = load_base(left.as_ref(), &config)?;
        let right = load_base(right.as_ref(), &config)?;
        Self::from_side_bases(left, right, config)
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Base map of the current side.
    pub fn base(&self) -> &TemperatureGrid {
        match self.side {
            FootSide::Left => &self.left,
            FootSide::Right => &self.right,
        }
    }

    pub fn mode(&self) -> SimulationMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SimulationMode) {
        self.mode = mode;
    }

    pub fn side(&self) -> FootSide {
        self.side
    }

    pub fn set_side(&mut self, side: FootSide) {
        self.side = side;
    }

    /// Offset added to every cell for the current mode and side, °C.
    pub fn side_offset(&self) -> f32 {
        match (self.mode, self.side) {
            (SimulationMode::LowDifference, FootSide::Left) => -0.3,
            (SimulationMode::LowDifference, FootSide::Right) => 0.3,
            (SimulationMode::HighDifference, FootSide::Left) => -1.5,
            (SimulationMode::HighDifference, FootSide::Right) => 0.0,
        }
    }

    /// Advance the clock and produce one frame.
    pub fn next_frame(&mut self) -> ThermalFrame {
        self.t += TIME_STEP;
        let shift = DRIFT_AMPLITUDE * self.t.sin() + self.side_offset();
        let base = match self.side {
            FootSide::Left => &self.left,
            FootSide::Right => &self.right,
        };
        let data = base
            .data()
            .iter()
            .map(|&v| v + shift + self.noise.sample(&mut self.rng))
            .collect();

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .ok();

        ThermalFrame {
            rows: base.rows(),
            cols: base.cols(),
            data,
            timestamp,
            foot: Some(self.side),
            simulation_mode: Some(self.mode),
        }
    }
}

fn load_base(path: &Path, config: &SensorConfig) -> Result<TemperatureGrid, SimulateError> {
    if !path.exists() {
        warn!("{} not found, simulating a uniform frame", path.display());
        let mid = 0.5 * (config.temp_min + config.temp_max);
        return Ok(TemperatureGrid::filled(config.rows, config.cols, mid));
    }
    let img = ImageReader::open(path)?.decode()?.to_luma8();
    debug!(
        "loaded {}x{} base image from {}",
        img.width(),
        img.height(),
        path.display()
    );
    Ok(base_map(&img, config))
}

/// Resize `img` to the sensor resolution and map intensity to temperature.
///
/// A flat image maps to `temp_min` everywhere.
fn base_map(img: &GrayImage, config: &SensorConfig) -> TemperatureGrid {
    let resized = imageops::resize(
        img,
        config.cols as u32,
        config.rows as u32,
        FilterType::Triangle,
    );
    let (lo, hi) = resized
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    let span = config.temp_max - config.temp_min;

    TemperatureGrid::from_fn(config.rows, config.cols, |r, c| {
        let v = resized.get_pixel(c as u32, r as u32)[0];
        if hi > lo {
            config.temp_min + (v - lo) as f32 / (hi - lo) as f32 * span
        } else {
            config.temp_min
        }
    })
}
