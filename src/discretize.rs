//! Mapping continuous observations onto a finite set of state keys

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

use crate::{env::Observation, Error, Result};

/// Index the value `v` into one of `n` equal-width bins spanning `[min, max]`
///
/// Values below `min` land in bin 0, values at or above `max` land in bin `n - 1`.
/// NaN lands in bin 0. `n` must be positive and `min < max`, which [`Discretizer::new`] guarantees.
pub fn bin(v: f32, min: f32, max: f32, n: usize) -> usize {
    debug_assert!(n > 0 && min < max);
    if v < min {
        0
    } else if v > max {
        n - 1
    } else {
        // `as` saturates, so NaN becomes 0 and rounding at `max` is clamped below
        let ix = ((v - min) / (max - min) * n as f32).floor() as usize;
        ix.min(n - 1)
    }
}

/// An observation field that can take part in the state key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    DistanceToEnd,
    PlayerY,
    PlayerX,
    VelZ,
}

impl Field {
    fn read(self, observation: &Observation) -> f32 {
        match self {
            Field::DistanceToEnd => observation.distance_to_end,
            Field::PlayerY => observation.player_y,
            Field::PlayerX => observation.player_x,
            Field::VelZ => observation.vel_z,
        }
    }
}

/// Binning of a single field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldBins {
    pub field: Field,
    pub min: f32,
    pub max: f32,
    pub bins: usize,
}

impl FieldBins {
    pub fn new(field: Field, min: f32, max: f32, bins: usize) -> Self {
        Self {
            field,
            min,
            max,
            bins,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.bins == 0 {
            return Err(Error::configuration(
                format!("{}.bins", self.field),
                self.bins,
                "bin count must be positive",
            ));
        }
        if !(self.min < self.max) || !self.min.is_finite() || !self.max.is_finite() {
            return Err(Error::configuration(
                format!("{}.min", self.field),
                self.min,
                format!("must be finite and below max ({})", self.max),
            ));
        }
        Ok(())
    }
}

/// The ordered list of fields making up a state key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscretizerConfig {
    pub fields: Vec<FieldBins>,
}

impl Default for DiscretizerConfig {
    fn default() -> Self {
        Self {
            fields: vec![
                FieldBins::new(Field::DistanceToEnd, 0.0, 50.0, 20),
                FieldBins::new(Field::PlayerY, -2.0, 4.0, 3),
                FieldBins::new(Field::PlayerX, -2.0, 2.0, 3),
                FieldBins::new(Field::VelZ, -6.0, 2.0, 4),
            ],
        }
    }
}

impl DiscretizerConfig {
    /// Only the mandatory distance-to-goal field
    pub fn distance_only(max_distance: f32, bins: usize) -> Self {
        Self {
            fields: vec![FieldBins::new(Field::DistanceToEnd, 0.0, max_distance, bins)],
        }
    }

    /// Check every field's binning and that the distance to the goal is included exactly once
    pub fn validate(&self) -> Result<()> {
        for (i, f) in self.fields.iter().enumerate() {
            f.validate()?;
            if self.fields[..i].iter().any(|g| g.field == f.field) {
                return Err(Error::configuration(
                    "discretizer.fields",
                    f.field,
                    "field listed more than once",
                ));
            }
        }
        if !self.fields.iter().any(|f| f.field == Field::DistanceToEnd) {
            return Err(Error::configuration(
                "discretizer.fields",
                self.fields.len(),
                "distance_to_end must be included",
            ));
        }
        Ok(())
    }
}

/// A discretized observation
///
/// Holds one bin index per configured field, in field order. Its text form joins the
/// indices with `_`, e.g. `"12_1_0_2"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(Box<[usize]>);

impl StateKey {
    pub fn new(bins: impl Into<Box<[usize]>>) -> Self {
        Self(bins.into())
    }

    pub fn bins(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("_")?;
            }
            write!(f, "{b}")?;
        }
        Ok(())
    }
}

impl FromStr for StateKey {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.split('_')
            .map(str::parse)
            .collect::<std::result::Result<Vec<usize>, _>>()
            .map(StateKey::new)
    }
}

impl Serialize for StateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Pure mapping from [`Observation`] to [`StateKey`]
#[derive(Debug, Clone)]
pub struct Discretizer {
    fields: Vec<FieldBins>,
}

impl Discretizer {
    /// **Errors** with [`Error::Configuration`] if any field has no bins, an empty range,
    /// or if distance to the goal is missing
    pub fn new(config: DiscretizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fields: config.fields,
        })
    }

    pub fn fields(&self) -> &[FieldBins] {
        &self.fields
    }

    pub fn discretize(&self, observation: &Observation) -> StateKey {
        let bins = self
            .fields
            .iter()
            .map(|f| bin(f.field.read(observation), f.min, f.max, f.bins))
            .collect::<Vec<_>>();
        StateKey::new(bins)
    }
}

impl Default for Discretizer {
    fn default() -> Self {
        Self {
            fields: DiscretizerConfig::default().fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::tests::at_distance;

    #[test]
    fn bin_clamps_out_of_range() {
        assert_eq!(bin(-100.0, 0.0, 50.0, 20), 0, "Below min is bin 0");
        assert_eq!(bin(f32::NEG_INFINITY, 0.0, 50.0, 20), 0);
        assert_eq!(bin(51.0, 0.0, 50.0, 20), 19, "Above max is last bin");
        assert_eq!(bin(f32::INFINITY, 0.0, 50.0, 20), 19);
        assert_eq!(bin(f32::NAN, 0.0, 50.0, 20), 0, "NaN is bin 0");
    }

    #[test]
    fn bin_boundaries() {
        assert_eq!(bin(0.0, 0.0, 50.0, 20), 0, "Exactly min is bin 0");
        assert_eq!(bin(3.0, 0.0, 50.0, 20), 1, "Bin width 2.5");
        assert_eq!(bin(2.49, 0.0, 50.0, 20), 0);
        assert_eq!(bin(50.0, 0.0, 50.0, 20), 19, "Exactly max is last bin");
        assert_eq!(bin(0.5, -2.0, 4.0, 3), 1, "Negative min");
    }

    #[test]
    fn bin_monotonic() {
        let mut prev = 0;
        for i in -200..=700 {
            let b = bin(i as f32 * 0.1, 0.0, 50.0, 20);
            assert!(b >= prev, "bin({}) decreased", i as f32 * 0.1);
            prev = b;
        }
    }

    #[test]
    fn rejects_zero_bins() {
        let config = DiscretizerConfig {
            fields: vec![FieldBins::new(Field::DistanceToEnd, 0.0, 50.0, 0)],
        };
        assert!(matches!(
            Discretizer::new(config),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn rejects_empty_range_and_missing_distance() {
        let empty_range = DiscretizerConfig {
            fields: vec![FieldBins::new(Field::DistanceToEnd, 5.0, 5.0, 3)],
        };
        assert!(Discretizer::new(empty_range).is_err(), "min == max rejected");

        let no_distance = DiscretizerConfig {
            fields: vec![FieldBins::new(Field::PlayerY, -2.0, 4.0, 3)],
        };
        assert!(Discretizer::new(no_distance).is_err(), "Distance is mandatory");

        let duplicate = DiscretizerConfig {
            fields: vec![
                FieldBins::new(Field::DistanceToEnd, 0.0, 50.0, 20),
                FieldBins::new(Field::DistanceToEnd, 0.0, 10.0, 2),
            ],
        };
        assert!(Discretizer::new(duplicate).is_err(), "Duplicate field rejected");
    }

    #[test]
    fn key_uses_every_configured_field() {
        let discretizer = Discretizer::default();
        let observation = Observation {
            player_x: 1.9,
            player_y: 0.0,
            vel_x: 0.0,
            vel_y: 0.0,
            vel_z: -5.0,
            distance_to_end: 26.0,
        };
        let key = discretizer.discretize(&observation);
        assert_eq!(key.bins(), [10, 1, 2, 0], "Bins in field order");
        assert_eq!(key.to_string(), "10_1_2_0", "Text form");
    }

    #[test]
    fn equal_bins_equal_keys() {
        let discretizer = Discretizer::new(DiscretizerConfig::distance_only(50.0, 20)).unwrap();
        assert_eq!(
            discretizer.discretize(&at_distance(10.1)),
            discretizer.discretize(&at_distance(12.4)),
            "Same bin, same key"
        );
        assert_ne!(
            discretizer.discretize(&at_distance(10.1)),
            discretizer.discretize(&at_distance(12.6)),
            "Different bin, different key"
        );
    }

    #[test]
    fn key_text_is_unambiguous() {
        let a = StateKey::new(vec![1, 11]);
        let b = StateKey::new(vec![11, 1]);
        assert_ne!(a.to_string(), b.to_string());
        assert_eq!("1_11".parse::<StateKey>().unwrap(), a, "Parses back");
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"1_11\"");
    }

    #[test]
    fn field_names() {
        assert_eq!(Field::VelZ.to_string(), "vel_z");
        assert_eq!("distance_to_end".parse::<Field>().unwrap(), Field::DistanceToEnd);
    }
}
