//! Slider descriptions for tuning a star's parameters from a debug panel.
//!
//! The table only describes the controls; drawing them is up to the host UI.
//! Range limits are enforced here rather than in [`ParameterSet`], which
//! stores whatever it is given.

use crate::params::{ParameterError, ParameterName, ParameterSet};

/// One scalar control bound to a parameter slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliderSpec {
    pub name: ParameterName,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Controls exposed for a star.
pub const STAR_SLIDERS: [SliderSpec; 3] = [
    SliderSpec {
        name: ParameterName::RatioStep1,
        label: "intensity",
        min: 0.0,
        max: 1.0,
        step: 0.01,
    },
    SliderSpec {
        name: ParameterName::Displacement,
        label: "displacement",
        min: 0.0,
        max: 1.0,
        step: 0.0001,
    },
    SliderSpec {
        name: ParameterName::TimeMultiplier,
        label: "time_multiplier",
        min: 0.0,
        max: 0.01,
        step: 0.00001,
    },
];

impl SliderSpec {
    /// Clamp `value` into range and round it to the nearest step from `min`.
    pub fn snap(&self, value: f64) -> f64 {
        let value = if value.is_nan() { self.min } else { value };
        let clamped = value.clamp(self.min, self.max);
        if self.step <= 0.0 {
            return clamped;
        }
        let steps = ((clamped - self.min) / self.step).round();
        (self.min + steps * self.step).clamp(self.min, self.max)
    }

    /// Write the snapped value into the slot and return what was stored.
    pub fn apply(&self, parameters: &ParameterSet, value: f64) -> Result<f64, ParameterError> {
        let value = self.snap(value);
        parameters.set_slot(self.name, value)?;
        Ok(value)
    }

    /// Current slot value, or `None` if the slot is not a scalar.
    pub fn read(&self, parameters: &ParameterSet) -> Option<f64> {
        parameters.get_slot(self.name).as_scalar()
    }

    /// Position of `value` within the range, in `[0, 1]`.
    pub fn fraction(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Look up the star slider bound to `name`.
pub fn star_slider(name: ParameterName) -> Option<&'static SliderSpec> {
    STAR_SLIDERS.iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorProfile;

    fn params() -> ParameterSet {
        ParameterSet::new(1.0, &ColorProfile::default(), 0.0005, 0.03)
    }

    #[test]
    fn test_star_table_matches_controls() {
        let names: Vec<&str> = STAR_SLIDERS.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["ratio_step_1", "displacement", "time_multiplier"]);
        assert_eq!(STAR_SLIDERS[0].label, "intensity");
        for slider in &STAR_SLIDERS {
            assert!(slider.min < slider.max && slider.step > 0.0);
        }
    }

    #[test]
    fn test_apply_clamps_out_of_range() {
        let params = params();
        let intensity = star_slider(ParameterName::RatioStep1).unwrap();
        assert_eq!(intensity.apply(&params, 3.0).unwrap(), 1.0);
        assert_eq!(params.ratio_step_1(), 1.0);
        assert_eq!(intensity.apply(&params, -2.0).unwrap(), 0.0);
        assert_eq!(params.ratio_step_1(), 0.0);
    }

    #[test]
    fn test_apply_snaps_to_step() {
        let params = params();
        let intensity = star_slider(ParameterName::RatioStep1).unwrap();
        let stored = intensity.apply(&params, 0.456).unwrap();
        assert!((stored - 0.46).abs() < 1e-9);
        assert!((params.ratio_step_1() - 0.46).abs() < 1e-9);

        let multiplier = star_slider(ParameterName::TimeMultiplier).unwrap();
        let stored = multiplier.apply(&params, 0.001234).unwrap();
        assert!((stored - 0.00123).abs() < 1e-9);
    }

    #[test]
    fn test_nan_falls_back_to_min() {
        let displacement = star_slider(ParameterName::Displacement).unwrap();
        assert_eq!(displacement.snap(f64::NAN), 0.0);
    }

    #[test]
    fn test_read_and_fraction() {
        let params = params();
        let displacement = star_slider(ParameterName::Displacement).unwrap();
        assert_eq!(displacement.read(&params), Some(0.03));
        assert!((displacement.fraction(0.25) - 0.25).abs() < 1e-12);
        assert!(star_slider(ParameterName::Time).is_none());
    }

    #[test]
    fn test_non_scalar_slot_is_rejected() {
        let bogus = SliderSpec {
            name: ParameterName::SpherePosition,
            label: "position",
            min: 0.0,
            max: 1.0,
            step: 0.1,
        };
        let params = params();
        assert!(matches!(
            bogus.apply(&params, 0.5),
            Err(ParameterError::TypeMismatch { .. })
        ));
        assert_eq!(bogus.read(&params), None);
    }
}
