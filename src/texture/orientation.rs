use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::model::MillerIndex;

/// Bunge Euler angles `(phi1, Phi, phi2)` in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub phi1: f64,
    #[serde(rename = "Phi")]
    pub big_phi: f64,
    pub phi2: f64,
}

impl EulerAngles {
    pub const fn new(phi1: f64, big_phi: f64, phi2: f64) -> Self {
        Self { phi1, big_phi, phi2 }
    }
}

impl fmt::Display for EulerAngles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}°, {:.2}°, {:.2}°)", self.phi1, self.big_phi, self.phi2)
    }
}

/// How an ideal orientation is written down: explicit Euler angles or a
/// `{hkl}<uvw>` pair (rolling plane normal to ND, direction along RD).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationSpec {
    Euler(EulerAngles),
    Miller {
        plane: MillerIndex,
        direction: MillerIndex,
    },
}

impl OrientationSpec {
    pub fn euler(phi1: f64, big_phi: f64, phi2: f64) -> Self {
        OrientationSpec::Euler(EulerAngles::new(phi1, big_phi, phi2))
    }

    pub fn miller(plane: MillerIndex, direction: MillerIndex) -> Self {
        OrientationSpec::Miller { plane, direction }
    }
}

impl fmt::Display for OrientationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrientationSpec::Euler(e) => write!(f, "{e}"),
            OrientationSpec::Miller { plane, direction } => write!(f, "{{{plane}}}<{direction}>"),
        }
    }
}

/// A named texture component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdealComponent {
    pub name: String,
    pub orientation: OrientationSpec,
}

impl IdealComponent {
    pub fn new(name: &str, orientation: OrientationSpec) -> Self {
        Self {
            name: name.to_string(),
            orientation,
        }
    }
}
