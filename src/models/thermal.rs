//! Heatsink requirement and selection.
//!
//! Catalog heatsinks rarely declare a sink-to-ambient resistance, so one is
//! estimated from the footprint and fin height for natural convection.

use serde::Serialize;
use tracing::debug;

use crate::catalog::Heatsink;

/// Junction-to-case resistance when the FET record has none (°C/W).
pub const DEFAULT_R_JC: f64 = 0.5;

/// A heatsink qualifies when its estimate is within this factor of the requirement.
pub const ACCEPTANCE_MARGIN: f64 = 1.2;

/// Numerator of the natural-convection estimate `R ≈ k/√(area in cm²)`.
pub const CONVECTION_CONSTANT: f64 = 20.0;

/// Fins assumed along the heatsink length.
pub const ASSUMED_FINS: f64 = 5.0;

/// `R_ja = (T_j,max − T_amb)/P`; +∞ when `P ≤ 0`.
pub fn junction_to_ambient(tj_max: f64, t_amb: f64, p_total: f64) -> f64 {
    if p_total <= 0.0 {
        f64::INFINITY
    } else {
        (tj_max - t_amb) / p_total
    }
}

/// `R_sa = (T_max − T_amb)/P − R_jc`; +∞ when `P ≤ 0`.
pub fn required_sink_resistance(t_max: f64, t_amb: f64, p_total: f64, r_jc: f64) -> f64 {
    junction_to_ambient(t_max, t_amb, p_total) - r_jc
}

/// Declared `R_th_sa`, else `20/√((X·Y + 2·X·y_b·5)/100)`.
pub fn estimated_sink_resistance(heatsink: &Heatsink) -> f64 {
    if let Some(r) = heatsink.r_th_sa {
        return r;
    }
    let base_area = heatsink.x * heatsink.y;
    let fin_area = 2.0 * heatsink.x * heatsink.fin_height() * ASSUMED_FINS;
    CONVECTION_CONSTANT / ((base_area + fin_area) / 100.0).sqrt()
}

/// Base block plus fin block (mm³).
pub fn heatsink_volume(heatsink: &Heatsink) -> f64 {
    heatsink.base.iter().product::<f64>() + heatsink.fins.iter().product::<f64>()
}

pub fn junction_temperature(t_amb: f64, p_total: f64, r_jc: f64, r_sa: f64) -> f64 {
    t_amb + p_total * (r_jc + r_sa)
}

/// Fitted surface-area curve `a·R^b + c` (cm²).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatsinkAreaFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl HeatsinkAreaFit {
    /// +∞ when `R ≤ 0`.
    pub fn area(&self, r_sa: f64) -> f64 {
        if r_sa <= 0.0 {
            f64::INFINITY
        } else {
            self.a * r_sa.powf(self.b) + self.c
        }
    }
}

/// Largest footprint a heatsink may occupy (mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MountingArea {
    pub x_max: f64,
    pub y_max: f64,
}

impl MountingArea {
    pub fn fits(&self, heatsink: &Heatsink) -> bool {
        heatsink.x <= self.x_max && heatsink.y <= self.y_max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatsinkChoice<'a> {
    #[serde(skip)]
    pub heatsink: &'a Heatsink,
    pub r_sa_estimated: f64,
    pub r_sa_required: f64,
    pub volume_mm3: f64,
    pub junction_temperature: f64,
}

/// Smallest heatsink whose estimate meets `ACCEPTANCE_MARGIN·R_sa,required`.
pub fn select_heatsink<'a>(
    r_sa_required: f64,
    heatsinks: impl IntoIterator<Item = &'a Heatsink>,
    mounting: Option<&MountingArea>,
) -> Option<(&'a Heatsink, f64)> {
    heatsinks
        .into_iter()
        .filter(|hs| mounting.map_or(true, |area| area.fits(hs)))
        .map(|hs| (hs, estimated_sink_resistance(hs)))
        .filter(|&(_, r)| r <= r_sa_required * ACCEPTANCE_MARGIN)
        .fold(None, |best: Option<(&Heatsink, f64)>, candidate| match best {
            Some(b) if heatsink_volume(b.0) <= heatsink_volume(candidate.0) => Some(b),
            _ => Some(candidate),
        })
}

/// Size the heatsink for `p_total` watts dissipated through `r_jc`.
pub fn size_heatsink<'a>(
    p_total: f64,
    tj_max: f64,
    t_amb: f64,
    r_jc: f64,
    heatsinks: impl IntoIterator<Item = &'a Heatsink>,
    mounting: Option<&MountingArea>,
) -> Option<HeatsinkChoice<'a>> {
    let r_sa_required = required_sink_resistance(tj_max, t_amb, p_total, r_jc);
    debug!(p_total, r_sa_required, "sizing heatsink");
    let (heatsink, r_sa_estimated) = select_heatsink(r_sa_required, heatsinks, mounting)?;
    Some(HeatsinkChoice {
        heatsink,
        r_sa_estimated,
        r_sa_required,
        volume_mm3: heatsink_volume(heatsink),
        junction_temperature: junction_temperature(t_amb, p_total, r_jc, r_sa_estimated),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sinks() -> Vec<Heatsink> {
        vec![
            Heatsink::new("large", 100.0, 80.0, 40.0),
            Heatsink::new("medium", 60.0, 50.0, 25.0),
            Heatsink::new("tiny", 20.0, 15.0, 8.0),
        ]
    }

    #[test]
    fn test_requirements() {
        assert_relative_eq!(junction_to_ambient(150.0, 25.0, 10.0), 12.5);
        assert!(junction_to_ambient(150.0, 25.0, 0.0).is_infinite());
        assert_relative_eq!(required_sink_resistance(150.0, 25.0, 10.0, 0.5), 12.0);
        assert_relative_eq!(junction_temperature(25.0, 10.0, 0.5, 4.5), 75.0);
    }

    #[test]
    fn test_estimate() {
        let hs = Heatsink::new("m", 60.0, 50.0, 25.0);
        // (3000 + 15000)/100 = 180 cm²
        assert_relative_eq!(estimated_sink_resistance(&hs), 20.0 / 180f64.sqrt());
        assert_relative_eq!(estimated_sink_resistance(&hs.clone().with_r_th_sa(0.9)), 0.9);
        assert_relative_eq!(heatsink_volume(&hs), 60.0 * 25.0 * 50.0);
    }

    #[test]
    fn test_area_fit() {
        let fit = HeatsinkAreaFit { a: 100.0, b: -1.0, c: 5.0 };
        assert_relative_eq!(fit.area(2.0), 55.0);
        assert!(fit.area(0.0).is_infinite());
    }

    #[test]
    fn test_smallest_qualifying_heatsink() {
        let sinks = sinks();
        // tiny: (300 + 1600)/100 = 19 cm² → 4.59 °C/W
        let choice = size_heatsink(10.0, 150.0, 25.0, 0.5, &sinks, None).unwrap();
        assert_eq!(choice.heatsink.name, "tiny");
        assert!(choice.r_sa_estimated <= choice.r_sa_required * ACCEPTANCE_MARGIN);

        // 1.2·(125/90 − 0.5) = 1.07 °C/W rules out tiny and medium
        let hot = size_heatsink(90.0, 150.0, 25.0, 0.5, &sinks, None).unwrap();
        assert_eq!(hot.heatsink.name, "large");
        assert!(hot.junction_temperature > 25.0);
    }

    #[test]
    fn test_mounting_area_limit() {
        let sinks = sinks();
        let area = MountingArea { x_max: 70.0, y_max: 60.0 };
        assert!(size_heatsink(90.0, 150.0, 25.0, 0.5, &sinks, Some(&area)).is_none());
        assert!(select_heatsink(f64::INFINITY, &sinks, Some(&area)).is_some());
    }
}
