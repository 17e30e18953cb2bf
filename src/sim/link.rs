//! Rigid link geometry
//!
//! A link is a segment anchored at `origin` and pointing along `angle`:
//! - `end_point = origin + length * (cos(angle), sin(angle))`
//! - angles are radians, normalized to [-π, π)

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::{normalize_angle, polar_to_cartesian, unit};

/// Names of the four links, for snapshot queries and setters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkName {
    /// Fixed frame between the two pivots
    Ground,
    /// Driven crank at the first pivot
    Input,
    /// Floating link joining the input and output ends
    Coupler,
    /// Follower at the second pivot
    Output,
}

impl LinkName {
    pub const ALL: [LinkName; 4] = [
        LinkName::Ground,
        LinkName::Input,
        LinkName::Coupler,
        LinkName::Output,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkName::Ground => "ground",
            LinkName::Input => "input",
            LinkName::Coupler => "coupler",
            LinkName::Output => "output",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ground" | "link0" => Some(LinkName::Ground),
            "input" | "crank" | "link1" => Some(LinkName::Input),
            "coupler" | "link2" => Some(LinkName::Coupler),
            "output" | "follower" | "rocker" | "link3" => Some(LinkName::Output),
            _ => None,
        }
    }
}

/// A rigid link in the plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Length (positive)
    pub length: f64,
    /// Direction from origin to end (radians, normalized to [-π, π))
    pub angle: f64,
    /// Pivot the link hangs from
    pub origin: DVec2,
}

impl Link {
    /// Create a link, rejecting non-positive or non-finite lengths
    pub fn new(length: f64, angle: f64, origin: DVec2) -> Result<Self> {
        validate_length("link length", length)?;
        Ok(Self {
            length,
            angle: normalize_angle(angle),
            origin,
        })
    }

    /// Free end of the link
    #[inline]
    pub fn end_point(&self) -> DVec2 {
        self.origin + polar_to_cartesian(self.length, self.angle)
    }

    /// Link as a vector from origin to end
    #[inline]
    pub fn vector(&self) -> DVec2 {
        self.length * unit(self.angle)
    }

    /// Angle in degrees
    pub fn angle_deg(&self) -> f64 {
        self.angle.to_degrees()
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.angle = normalize_angle(angle);
    }

    /// Read-only snapshot for renderers
    pub fn state(&self) -> LinkState {
        LinkState {
            origin: self.origin,
            end_point: self.end_point(),
            angle: self.angle,
            length: self.length,
        }
    }
}

/// Read-only view of a link
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkState {
    pub origin: DVec2,
    pub end_point: DVec2,
    pub angle: f64,
    pub length: f64,
}

pub(crate) fn validate_length(name: &'static str, length: f64) -> Result<()> {
    if !length.is_finite() || length <= 0.0 {
        return Err(SimError::InvalidParameter {
            name,
            value: length,
            reason: "must be a finite length > 0",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_end_point() {
        let link = Link::new(2.0, FRAC_PI_2, DVec2::new(1.0, 1.0)).unwrap();
        let end = link.end_point();
        assert!((end.x - 1.0).abs() < 1e-12);
        assert!((end.y - 3.0).abs() < 1e-12);
        assert!(((end - link.origin).length() - link.length).abs() < 1e-12);
    }

    #[test]
    fn test_angle_is_normalized() {
        let mut link = Link::new(1.0, 3.0 * FRAC_PI_2, DVec2::ZERO).unwrap();
        assert!((link.angle + FRAC_PI_2).abs() < 1e-12);
        link.set_angle(PI + 0.5);
        assert!((link.angle - (-PI + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_length() {
        assert!(Link::new(0.0, 0.0, DVec2::ZERO).is_err());
        assert!(Link::new(-1.0, 0.0, DVec2::ZERO).is_err());
        assert!(Link::new(f64::INFINITY, 0.0, DVec2::ZERO).is_err());
    }

    #[test]
    fn test_link_name_parse() {
        assert_eq!(LinkName::from_str("Coupler"), Some(LinkName::Coupler));
        assert_eq!(LinkName::from_str("rocker"), Some(LinkName::Output));
        assert_eq!(LinkName::from_str("wheel"), None);
        for name in LinkName::ALL {
            assert_eq!(LinkName::from_str(name.as_str()), Some(name));
        }
    }
}
