//! Bike availability classes.

use std::fmt;

use serde::Serialize;

/// How many bikes a station has available to rent.
///
/// Map renderers colour station pins by this class.
///
/// # Examples
///
/// ```
/// use bike_feed::domain::Availability;
///
/// assert_eq!(Availability::classify(0), Availability::Empty);
/// assert_eq!(Availability::classify(3), Availability::Low);
/// assert_eq!(Availability::classify(4), Availability::Sufficient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// No bikes at all.
    Empty,
    /// Between one and [`Availability::LOW_MAX`] bikes.
    Low,
    /// More than [`Availability::LOW_MAX`] bikes.
    Sufficient,
}

impl Availability {
    /// Largest bike count still classed as [`Availability::Low`].
    pub const LOW_MAX: u32 = 3;

    /// Classify a bike count.
    pub fn classify(bikes_available: u32) -> Self {
        match bikes_available {
            0 => Availability::Empty,
            1..=Self::LOW_MAX => Availability::Low,
            _ => Availability::Sufficient,
        }
    }

    /// Classify an optional count; an unknown count has no class.
    pub fn of(bikes_available: Option<u32>) -> Option<Self> {
        bikes_available.map(Self::classify)
    }

    /// Stable lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Empty => "empty",
            Availability::Low => "low",
            Availability::Sufficient => "sufficient",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
