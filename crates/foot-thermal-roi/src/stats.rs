use crate::codec::AppliedRoiSet;
use crate::region::RoiSet;
use foot_thermal_core::{FootMask, TemperatureGrid};
use serde::{Deserialize, Serialize};

/// Temperature summary of one region, in °C.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiStatistics {
    pub min: f32,
    pub max: f32,
    pub avg: f32,
    pub count: usize,
}

/// Reduce the temperatures of cells inside both `roi_mask` and `foot_mask`.
///
/// Returns `None` when no cell qualifies.
pub fn roi_stats(temperatures: &[f32], roi_mask: &[bool], foot_mask: &[bool]) -> Option<RoiStatistics> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut sum = 0f64;
    let mut count = 0usize;

    for ((&t, &in_roi), &on_foot) in temperatures.iter().zip(roi_mask).zip(foot_mask) {
        if !(in_roi && on_foot) {
            continue;
        }
        min = min.min(t);
        max = max.max(t);
        sum += t as f64;
        count += 1;
    }

    (count > 0).then(|| RoiStatistics {
        min,
        max,
        avg: (sum / count as f64) as f32,
        count,
    })
}

/// Statistics for all three applied regions of one capture.
pub fn region_stats(
    grid: &TemperatureGrid,
    applied: &AppliedRoiSet,
    foot: &FootMask,
) -> RoiSet<Option<RoiStatistics>> {
    applied
        .masks
        .map(|_, roi_mask| roi_stats(grid.data(), roi_mask, &foot.cells))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_intersection_is_none() {
        let temps = [30.0, 31.0, 32.0, 33.0];
        let roi = [true, true, false, false];
        let foot = [false, false, true, true];
        assert_eq!(roi_stats(&temps, &roi, &foot), None);
    }

    #[test]
    fn single_pixel_region() {
        let temps = [30.0, 33.25, 32.0];
        let roi = [false, true, true];
        let foot = [true, true, false];
        assert_eq!(
            roi_stats(&temps, &roi, &foot),
            Some(RoiStatistics {
                min: 33.25,
                max: 33.25,
                avg: 33.25,
                count: 1
            })
        );
    }

    #[test]
    fn background_inside_the_rectangle_is_excluded() {
        let temps = [29.0, 34.0, 35.0, 36.0];
        let roi = [true; 4];
        let foot = [false, true, true, true];
        let stats = roi_stats(&temps, &roi, &foot).unwrap();
        assert_eq!(stats.count, 3);
        assert_relative_eq!(stats.min, 34.0);
        assert_relative_eq!(stats.max, 36.0);
        assert_relative_eq!(stats.avg, 35.0);
    }
}
