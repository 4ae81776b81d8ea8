//! The ideal texture components of rolled FCC sheet.

use super::orientation::{IdealComponent, OrientationSpec};
use crate::data::model::MillerIndex;

/// Angular spread (degrees) around each component for volume fractions.
pub const DEFAULT_SPREAD_DEG: f64 = 10.0;

/// Brass, Copper, Cube, CubeND, CubeRD, Goss, P, Q and S.
pub fn default_components() -> Vec<IdealComponent> {
    let m = MillerIndex::new;
    vec![
        IdealComponent::new("Brass", OrientationSpec::miller(m(0, 1, 1), m(2, 1, -1))),
        IdealComponent::new("Copper", OrientationSpec::miller(m(1, 1, 2), m(1, 1, -1))),
        IdealComponent::new("Cube", OrientationSpec::euler(0.0, 0.0, 0.0)),
        IdealComponent::new("CubeND", OrientationSpec::euler(22.0, 0.0, 0.0)),
        IdealComponent::new("CubeRD", OrientationSpec::euler(0.0, 22.0, 0.0)),
        IdealComponent::new("Goss", OrientationSpec::miller(m(0, 1, 1), m(1, 0, 0))),
        IdealComponent::new("P", OrientationSpec::euler(65.0, 45.0, 0.0)),
        IdealComponent::new("Q", OrientationSpec::euler(45.0, 15.0, 10.0)),
        IdealComponent::new("S", OrientationSpec::euler(59.0, 37.0, 63.0)),
    ]
}
