//! GPS distance tracking domain logic

pub mod accumulator;
pub mod geo;

pub use accumulator::DistanceAccumulator;
pub use geo::{EARTH_RADIUS_M, LocationFix, bearing_deg, distance_m};
