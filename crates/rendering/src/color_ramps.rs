//! Perceptually uniform colour ramps for scalar overlays.
//!
//! Control points are sRGB samples of the matplotlib originals at evenly
//! spaced `t`, interpolated linearly in between.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// A continuous colour ramp defined by evenly spaced sRGB control points.
pub struct ColorRamp {
    points: &'static [[f32; 3]],
}

impl ColorRamp {
    /// Sample at `t`, clamped to `[0, 1]`. NaN samples the low end.
    pub fn sample(&self, t: f32) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let n = self.points.len();
        match n {
            0 => Color::BLACK,
            1 => {
                let p = self.points[0];
                Color::srgb(p[0], p[1], p[2])
            }
            _ => {
                let scaled = t * (n - 1) as f32;
                let lo = (scaled as usize).min(n - 2);
                let frac = scaled - lo as f32;
                let a = self.points[lo];
                let b = self.points[lo + 1];
                Color::srgb(
                    a[0] + (b[0] - a[0]) * frac,
                    a[1] + (b[1] - a[1]) * frac,
                    a[2] + (b[2] - a[2]) * frac,
                )
            }
        }
    }
}

// Colourblind-safe default.
pub static VIRIDIS: ColorRamp = ColorRamp {
    points: &[
        [0.267, 0.005, 0.329],
        [0.283, 0.141, 0.458],
        [0.230, 0.322, 0.546],
        [0.164, 0.471, 0.558],
        [0.128, 0.567, 0.551],
        [0.134, 0.658, 0.518],
        [0.267, 0.749, 0.441],
        [0.647, 0.862, 0.208],
        [0.993, 0.906, 0.144],
    ],
};

// Black through red to pale yellow; reads well for "intensity" fields.
pub static INFERNO: ColorRamp = ColorRamp {
    points: &[
        [0.001, 0.000, 0.014],
        [0.134, 0.047, 0.329],
        [0.341, 0.062, 0.429],
        [0.533, 0.134, 0.416],
        [0.735, 0.216, 0.330],
        [0.865, 0.317, 0.226],
        [0.978, 0.557, 0.035],
        [0.973, 0.776, 0.176],
        [0.988, 0.998, 0.645],
    ],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RampKind {
    #[default]
    Viridis,
    Inferno,
}

impl RampKind {
    pub fn ramp(self) -> &'static ColorRamp {
        match self {
            RampKind::Viridis => &VIRIDIS,
            RampKind::Inferno => &INFERNO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(c: Color) -> [f32; 3] {
        let s = c.to_srgba();
        [s.red, s.green, s.blue]
    }

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_endpoints_match_control_points() {
        assert!(close(rgb(VIRIDIS.sample(0.0)), [0.267, 0.005, 0.329]));
        assert!(close(rgb(VIRIDIS.sample(1.0)), [0.993, 0.906, 0.144]));
        assert!(close(rgb(INFERNO.sample(0.0)), [0.001, 0.000, 0.014]));
        assert!(close(rgb(RampKind::Inferno.ramp().sample(1.0)), [0.988, 0.998, 0.645]));
    }

    #[test]
    fn test_out_of_range_clamps() {
        assert_eq!(rgb(VIRIDIS.sample(-3.0)), rgb(VIRIDIS.sample(0.0)));
        assert_eq!(rgb(VIRIDIS.sample(7.0)), rgb(VIRIDIS.sample(1.0)));
        assert_eq!(rgb(INFERNO.sample(f32::NAN)), rgb(INFERNO.sample(0.0)));
    }

    #[test]
    fn test_midpoint_interpolates() {
        // t = 1/16 sits halfway between the first two viridis points.
        let c = rgb(VIRIDIS.sample(1.0 / 16.0));
        assert!((c[0] - 0.275).abs() < 1e-4);
        assert!((c[1] - 0.073).abs() < 1e-4);
    }

    #[test]
    fn test_inferno_brightens_monotonically() {
        let mut last = -1.0;
        for i in 0..=20 {
            let [r, g, b] = rgb(INFERNO.sample(i as f32 / 20.0));
            let lum = 0.2126 * r + 0.7152 * g + 0.0722 * b;
            assert!(lum >= last, "luminance dropped at step {i}");
            last = lum;
        }
    }
}
