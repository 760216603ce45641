//! The live, shader-facing parameter set of a star.
//!
//! A [`ParameterSet`] is created fully populated and then shared by identity
//! (`Rc<ParameterSet>`) between the star, its renderable parts, and any debug
//! adapter. Slots are interior-mutable so a write made after the parts were
//! bound is what the backend reads on the next render, without rebinding.
//!
//! The set is deliberately `!Send`/`!Sync`: all mutation happens on the
//! render-loop thread.

use std::cell::Cell;
use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use thiserror::Error;

use crate::color::{ColorProfile, Rgb};

/// Fixed value of the second color-ramp breakpoint.
pub const RATIO_STEP_2: f64 = 0.9;

/// Errors raised by [`ParameterSet`] lookups and writes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParameterError {
    #[error("unknown parameter '{name}'")]
    UnknownParameter { name: String },

    #[error("parameter '{name}' holds a {expected}, got a {found}")]
    TypeMismatch {
        name: ParameterName,
        expected: ParameterKind,
        found: ParameterKind,
    },
}

/// Semantic type of a parameter slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    Scalar,
    Vector3,
    Color,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParameterKind::Scalar => "scalar",
            ParameterKind::Vector3 => "3-vector",
            ParameterKind::Color => "color",
        })
    }
}

/// A typed parameter value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParameterValue {
    Scalar(f64),
    Vector3(Vec3),
    Color(Rgb),
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParameterValue::Scalar(_) => ParameterKind::Scalar,
            ParameterValue::Vector3(_) => ParameterKind::Vector3,
            ParameterValue::Color(_) => ParameterKind::Color,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match *self {
            ParameterValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vector3(&self) -> Option<Vec3> {
        match *self {
            ParameterValue::Vector3(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Rgb> {
        match *self {
            ParameterValue::Color(c) => Some(c),
            _ => None,
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        ParameterValue::Scalar(v)
    }
}

impl From<Vec3> for ParameterValue {
    fn from(v: Vec3) -> Self {
        ParameterValue::Vector3(v)
    }
}

impl From<Rgb> for ParameterValue {
    fn from(c: Rgb) -> Self {
        ParameterValue::Color(c)
    }
}

/// The fixed schema of a star's parameter set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterName {
    SphereRadius,
    SpherePosition,
    Time,
    TimeMultiplier,
    ColorStep1,
    ColorStep2,
    ColorStep3,
    ColorStep4,
    RatioStep1,
    RatioStep2,
    Displacement,
}

impl ParameterName {
    /// Every schema name, in declaration order.
    pub const ALL: [ParameterName; 11] = [
        ParameterName::SphereRadius,
        ParameterName::SpherePosition,
        ParameterName::Time,
        ParameterName::TimeMultiplier,
        ParameterName::ColorStep1,
        ParameterName::ColorStep2,
        ParameterName::ColorStep3,
        ParameterName::ColorStep4,
        ParameterName::RatioStep1,
        ParameterName::RatioStep2,
        ParameterName::Displacement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterName::SphereRadius => "sphere_radius",
            ParameterName::SpherePosition => "sphere_position",
            ParameterName::Time => "time",
            ParameterName::TimeMultiplier => "time_multiplier",
            ParameterName::ColorStep1 => "color_step_1",
            ParameterName::ColorStep2 => "color_step_2",
            ParameterName::ColorStep3 => "color_step_3",
            ParameterName::ColorStep4 => "color_step_4",
            ParameterName::RatioStep1 => "ratio_step_1",
            ParameterName::RatioStep2 => "ratio_step_2",
            ParameterName::Displacement => "displacement",
        }
    }

    pub fn kind(&self) -> ParameterKind {
        match self {
            ParameterName::SpherePosition => ParameterKind::Vector3,
            ParameterName::ColorStep1
            | ParameterName::ColorStep2
            | ParameterName::ColorStep3
            | ParameterName::ColorStep4 => ParameterKind::Color,
            _ => ParameterKind::Scalar,
        }
    }
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterName {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParameterName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ParameterError::UnknownParameter {
                name: s.to_string(),
            })
    }
}

/// The star's live visual state.
///
/// Every slot always exists; there is no way to construct a partially
/// populated set. Out-of-domain values are stored as given.
#[derive(Debug)]
pub struct ParameterSet {
    sphere_radius: Cell<f64>,
    sphere_position: Cell<Vec3>,
    time: Cell<f64>,
    time_multiplier: Cell<f64>,
    color_steps: [Cell<Rgb>; 4],
    ratio_step_1: Cell<f64>,
    ratio_step_2: Cell<f64>,
    displacement: Cell<f64>,
}

impl ParameterSet {
    /// Create a fully populated set. `time` starts at zero and the sphere at
    /// the origin.
    pub fn new(radius: f64, colors: &ColorProfile, time_multiplier: f64, displacement: f64) -> Self {
        let [c1, c2, c3, c4] = colors.steps();
        Self {
            sphere_radius: Cell::new(radius),
            sphere_position: Cell::new(Vec3::ZERO),
            time: Cell::new(0.0),
            time_multiplier: Cell::new(time_multiplier),
            color_steps: [Cell::new(c1), Cell::new(c2), Cell::new(c3), Cell::new(c4)],
            ratio_step_1: Cell::new(colors.intensity() as f64),
            ratio_step_2: Cell::new(RATIO_STEP_2),
            displacement: Cell::new(displacement),
        }
    }

    /// Look up a slot by its schema name.
    pub fn get(&self, name: &str) -> Result<ParameterValue, ParameterError> {
        Ok(self.get_slot(name.parse()?))
    }

    /// Overwrite a slot by its schema name.
    pub fn set(&self, name: &str, value: impl Into<ParameterValue>) -> Result<(), ParameterError> {
        self.set_slot(name.parse()?, value)
    }

    pub fn get_slot(&self, name: ParameterName) -> ParameterValue {
        match name {
            ParameterName::SphereRadius => self.sphere_radius.get().into(),
            ParameterName::SpherePosition => self.sphere_position.get().into(),
            ParameterName::Time => self.time.get().into(),
            ParameterName::TimeMultiplier => self.time_multiplier.get().into(),
            ParameterName::ColorStep1 => self.color_steps[0].get().into(),
            ParameterName::ColorStep2 => self.color_steps[1].get().into(),
            ParameterName::ColorStep3 => self.color_steps[2].get().into(),
            ParameterName::ColorStep4 => self.color_steps[3].get().into(),
            ParameterName::RatioStep1 => self.ratio_step_1.get().into(),
            ParameterName::RatioStep2 => self.ratio_step_2.get().into(),
            ParameterName::Displacement => self.displacement.get().into(),
        }
    }

    /// Overwrite a slot. Only the semantic type is checked.
    pub fn set_slot(
        &self,
        name: ParameterName,
        value: impl Into<ParameterValue>,
    ) -> Result<(), ParameterError> {
        let value = value.into();
        let mismatch = || ParameterError::TypeMismatch {
            name,
            expected: name.kind(),
            found: value.kind(),
        };

        match (name, value) {
            (ParameterName::SpherePosition, ParameterValue::Vector3(v)) => {
                self.sphere_position.set(v)
            }
            (ParameterName::ColorStep1, ParameterValue::Color(c)) => self.color_steps[0].set(c),
            (ParameterName::ColorStep2, ParameterValue::Color(c)) => self.color_steps[1].set(c),
            (ParameterName::ColorStep3, ParameterValue::Color(c)) => self.color_steps[2].set(c),
            (ParameterName::ColorStep4, ParameterValue::Color(c)) => self.color_steps[3].set(c),
            (name, ParameterValue::Scalar(v)) => match self.scalar_cell(name) {
                Some(cell) => cell.set(v),
                None => return Err(mismatch()),
            },
            _ => return Err(mismatch()),
        }
        Ok(())
    }

    fn scalar_cell(&self, name: ParameterName) -> Option<&Cell<f64>> {
        match name {
            ParameterName::SphereRadius => Some(&self.sphere_radius),
            ParameterName::Time => Some(&self.time),
            ParameterName::TimeMultiplier => Some(&self.time_multiplier),
            ParameterName::RatioStep1 => Some(&self.ratio_step_1),
            ParameterName::RatioStep2 => Some(&self.ratio_step_2),
            ParameterName::Displacement => Some(&self.displacement),
            _ => None,
        }
    }

    /// Advance `time` by `delta_millis`. Negative and NaN deltas are ignored,
    /// so `time` never decreases.
    pub fn advance_time(&self, delta_millis: f64) {
        if delta_millis > 0.0 {
            self.time.set(self.time.get() + delta_millis);
        }
    }

    /// Move `time` forward to `elapsed_millis`; earlier values are ignored.
    pub fn advance_time_to(&self, elapsed_millis: f64) {
        if elapsed_millis > self.time.get() {
            self.time.set(elapsed_millis);
        }
    }

    /// Iterate every schema name with its current value.
    pub fn entries(&self) -> impl Iterator<Item = (ParameterName, ParameterValue)> + '_ {
        ParameterName::ALL
            .into_iter()
            .map(move |name| (name, self.get_slot(name)))
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        ParameterName::ALL.into_iter().map(|name| name.as_str())
    }

    pub fn len(&self) -> usize {
        ParameterName::ALL.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn sphere_radius(&self) -> f64 {
        self.sphere_radius.get()
    }

    pub fn set_sphere_radius(&self, radius: f64) {
        self.sphere_radius.set(radius);
    }

    pub fn sphere_position(&self) -> Vec3 {
        self.sphere_position.get()
    }

    pub fn set_sphere_position(&self, position: Vec3) {
        self.sphere_position.set(position);
    }

    /// Milliseconds since the owning star was created.
    pub fn time(&self) -> f64 {
        self.time.get()
    }

    pub fn time_multiplier(&self) -> f64 {
        self.time_multiplier.get()
    }

    pub fn set_time_multiplier(&self, multiplier: f64) {
        self.time_multiplier.set(multiplier);
    }

    /// `color_step_1..4` in order.
    pub fn color_steps(&self) -> [Rgb; 4] {
        [
            self.color_steps[0].get(),
            self.color_steps[1].get(),
            self.color_steps[2].get(),
            self.color_steps[3].get(),
        ]
    }

    pub fn ratio_step_1(&self) -> f64 {
        self.ratio_step_1.get()
    }

    pub fn set_ratio_step_1(&self, ratio: f64) {
        self.ratio_step_1.set(ratio);
    }

    pub fn ratio_step_2(&self) -> f64 {
        self.ratio_step_2.get()
    }

    pub fn displacement(&self) -> f64 {
        self.displacement.get()
    }

    pub fn set_displacement(&self, displacement: f64) {
        self.displacement.set(displacement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_set() -> ParameterSet {
        let profile = ColorProfile::from_hex("#ff0000", "#ffaa00", "#ffffff", "#000011", 0.5).unwrap();
        ParameterSet::new(1.0, &profile, 0.0005, 0.03)
    }

    fn sample_value(kind: ParameterKind, seed: f64) -> ParameterValue {
        match kind {
            ParameterKind::Scalar => ParameterValue::Scalar(seed),
            ParameterKind::Vector3 => ParameterValue::Vector3(Vec3::new(seed as f32, 2.0, -3.0)),
            ParameterKind::Color => ParameterValue::Color(Rgb::new(seed as f32, 0.25, 0.75)),
        }
    }

    #[test]
    fn test_new_set_has_every_entry() {
        let params = test_set();
        for name in ParameterSet::names() {
            assert!(params.get(name).is_ok(), "missing slot '{name}'");
        }
        assert_eq!(params.entries().count(), params.len());
    }

    #[test]
    fn test_initial_values_follow_inputs() {
        let params = test_set();
        assert_eq!(params.sphere_radius(), 1.0);
        assert_eq!(params.sphere_position(), Vec3::ZERO);
        assert_eq!(params.time(), 0.0);
        assert_eq!(params.time_multiplier(), 0.0005);
        assert_eq!(params.displacement(), 0.03);
        assert_eq!(params.ratio_step_1(), 0.5);
        assert_eq!(params.ratio_step_2(), RATIO_STEP_2);
        assert_eq!(params.color_steps()[0], Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(
            params.get("color_step_4").unwrap(),
            ParameterValue::Color(Rgb::from_u8(0, 0, 17))
        );
    }

    #[test]
    fn test_set_then_get_returns_value_for_every_name() {
        let params = test_set();
        for (i, name) in ParameterName::ALL.iter().enumerate() {
            let value = sample_value(name.kind(), 0.125 * (i as f64 + 1.0));
            params.set(name.as_str(), value).unwrap();
            assert_eq!(params.get(name.as_str()).unwrap(), value, "slot {name}");
        }
    }

    #[test]
    fn test_unknown_name_fails() {
        let params = test_set();
        assert_eq!(
            params.get("nonexistent"),
            Err(ParameterError::UnknownParameter {
                name: "nonexistent".to_string()
            })
        );
        assert!(matches!(
            params.set("nonexistent", 1.0),
            Err(ParameterError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_wrong_type_is_rejected_and_slot_unchanged() {
        let params = test_set();
        let err = params.set("displacement", Rgb::WHITE).unwrap_err();
        assert_eq!(
            err,
            ParameterError::TypeMismatch {
                name: ParameterName::Displacement,
                expected: ParameterKind::Scalar,
                found: ParameterKind::Color,
            }
        );
        assert_eq!(params.displacement(), 0.03);

        assert!(params.set("sphere_position", 4.0).is_err());
        assert!(params.set("color_step_2", Vec3::ONE).is_err());
    }

    #[test]
    fn test_out_of_domain_values_pass_through() {
        let params = test_set();
        params.set("displacement", -0.5).unwrap();
        params.set("ratio_step_1", 7.0).unwrap();
        params.set("sphere_radius", 0.0).unwrap();
        assert_eq!(params.displacement(), -0.5);
        assert_eq!(params.ratio_step_1(), 7.0);
        assert_eq!(params.sphere_radius(), 0.0);
    }

    #[test]
    fn test_advance_time_is_monotonic() {
        let params = test_set();
        let deltas = [0.0, 16.0, 0.0, 33.3, 1e-9, 1000.0, -50.0, f64::NAN, 4.0];
        let mut last = params.time();
        for delta in deltas {
            params.advance_time(delta);
            assert!(params.time() >= last, "time went backwards after {delta}");
            last = params.time();
        }
        assert!((params.time() - (16.0 + 33.3 + 1e-9 + 1000.0 + 4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_advance_time_to_never_rewinds() {
        let params = test_set();
        params.advance_time_to(100.0);
        params.advance_time_to(40.0);
        assert_eq!(params.time(), 100.0);
        params.advance_time_to(116.0);
        assert_eq!(params.time(), 116.0);
    }

    #[test]
    fn test_large_time_values_do_not_wrap() {
        let params = test_set();
        let ten_years_ms = 10.0 * 365.0 * 24.0 * 3600.0 * 1000.0;
        params.advance_time(ten_years_ms);
        params.advance_time(16.0);
        assert!(params.time() > ten_years_ms);
    }

    #[test]
    fn test_name_round_trip_through_str() {
        for name in ParameterName::ALL {
            assert_eq!(name.as_str().parse::<ParameterName>().unwrap(), name);
        }
    }
}
