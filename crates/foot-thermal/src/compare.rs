//! Left/right asymmetry screening on top of two [`FootReport`]s.

use crate::analyze::FootReport;
use foot_thermal_roi::{RoiKind, RoiSet};
use serde::{Deserialize, Serialize};

/// Contralateral average difference, in °C, considered clinically relevant.
pub const DEFAULT_ASYMMETRY_THRESHOLD: f32 = 2.2;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionAsymmetry {
    pub left_avg: f32,
    pub right_avg: f32,
    /// `left_avg - right_avg`.
    pub delta: f32,
    pub exceeds: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AsymmetryReport {
    pub threshold: f32,
    /// `None` where either foot has no statistic for the region.
    pub regions: RoiSet<Option<RegionAsymmetry>>,
    /// Regions whose `|delta|` exceeds the threshold.
    pub flagged: Vec<RoiKind>,
}

impl AsymmetryReport {
    pub fn max_abs_delta(&self) -> Option<f32> {
        self.regions
            .iter()
            .filter_map(|(_, r)| r.map(|r| r.delta.abs()))
            .reduce(f32::max)
    }
}

/// Compare region averages of a left and a right capture.
pub fn compare_feet(left: &FootReport, right: &FootReport, threshold: f32) -> AsymmetryReport {
    let regions = left.stats.map(|kind, l| {
        let (l, r) = ((*l)?, (*right.stats.get(kind))?);
        let delta = l.avg - r.avg;
        Some(RegionAsymmetry {
            left_avg: l.avg,
            right_avg: r.avg,
            delta,
            exceeds: delta.abs() > threshold,
        })
    });
    let flagged = regions
        .iter()
        .filter(|(_, r)| r.is_some_and(|r| r.exceeds))
        .map(|(k, _)| k)
        .collect();

    AsymmetryReport {
        threshold,
        regions,
        flagged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use foot_thermal_core::FootSide;
    use foot_thermal_roi::RoiStatistics;

    fn report(side: FootSide, avgs: [Option<f32>; 3]) -> FootReport {
        let stat = |avg: Option<f32>| {
            avg.map(|avg| RoiStatistics {
                min: avg - 0.5,
                max: avg + 0.5,
                avg,
                count: 4,
            })
        };
        FootReport {
            side,
            foot_cells: 100,
            bbox: None,
            centroid: None,
            regions: None,
            correction: None,
            stats: RoiSet {
                hallux: stat(avgs[0]),
                first_metatarsal: stat(avgs[1]),
                heel: stat(avgs[2]),
            },
        }
    }

    #[test]
    fn flags_regions_over_threshold() {
        let left = report(FootSide::Left, [Some(31.0), Some(32.0), Some(30.0)]);
        let right = report(FootSide::Right, [Some(33.5), Some(32.5), None]);
        let cmp = compare_feet(&left, &right, DEFAULT_ASYMMETRY_THRESHOLD);

        let hallux = cmp.regions.hallux.unwrap();
        assert_relative_eq!(hallux.delta, -2.5);
        assert!(hallux.exceeds);
        assert!(!cmp.regions.first_metatarsal.unwrap().exceeds);
        assert!(cmp.regions.heel.is_none());
        assert_eq!(cmp.flagged, vec![RoiKind::Hallux]);
        assert_relative_eq!(cmp.max_abs_delta().unwrap(), 2.5);
    }

    #[test]
    fn no_stats_means_nothing_to_compare() {
        let left = report(FootSide::Left, [None; 3]);
        let right = report(FootSide::Right, [Some(30.0); 3]);
        let cmp = compare_feet(&left, &right, 1.0);
        assert!(cmp.flagged.is_empty());
        assert_eq!(cmp.max_abs_delta(), None);
    }
}
