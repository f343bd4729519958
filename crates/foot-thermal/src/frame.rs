//! JSON frame payload exchanged with the acquisition side.

use foot_thermal_core::{FootSide, GridError, TemperatureGrid};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum FrameIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Synthetic temperature profile applied by the simulated sensor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Both feet within a few tenths of a degree.
    #[default]
    #[serde(alias = "baja_diferencia")]
    LowDifference,
    /// Left foot markedly colder than the right.
    #[serde(alias = "alta_diferencia")]
    HighDifference,
}

impl std::str::FromStr for SimulationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "low_difference" | "low" | "baja_diferencia" => Ok(Self::LowDifference),
            "high_difference" | "high" | "alta_diferencia" => Ok(Self::HighDifference),
            other => Err(format!("unknown simulation mode '{other}'")),
        }
    }
}

/// One captured (or simulated) frame: a row-major grid of temperatures in °C.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThermalFrame {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
    /// Seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foot: Option<FootSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_mode: Option<SimulationMode>,
}

impl ThermalFrame {
    pub fn from_grid(grid: &TemperatureGrid) -> Self {
        Self {
            rows: grid.rows(),
            cols: grid.cols(),
            data: grid.data().to_vec(),
            timestamp: None,
            foot: None,
            simulation_mode: None,
        }
    }

    /// Validated grid view of the payload.
    pub fn to_grid(&self) -> Result<TemperatureGrid, GridError> {
        TemperatureGrid::new(self.rows, self.cols, self.data.clone())
    }

    pub fn into_grid(self) -> Result<TemperatureGrid, GridError> {
        TemperatureGrid::new(self.rows, self.cols, self.data)
    }

    /// Load a frame from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, FrameIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this frame to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), FrameIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
