//! Four-bar linkage model
//!
//! The ground link fixes two pivots: its origin carries the input link, its
//! end carries the output link. The coupler hangs from the input link's end
//! and closes the loop on the output link's end.

use std::f64::consts::PI;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::link::{Link, LinkName, LinkState, validate_length};
use super::solver::LinkageSolution;
use crate::error::{Result, SimError};

/// Which of the two loop solutions the linkage is assembled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Assembly {
    /// Coupler/output joint left of the line from input end to output pivot
    #[default]
    Open,
    /// Coupler/output joint right of that line
    Crossed,
}

impl Assembly {
    /// Classify a configuration from its input end `a`, output pivot `o4`
    /// and coupler/output joint `b`. `None` when the joint sits on the line
    /// (toggle position), where both assemblies coincide.
    pub fn classify(a: DVec2, o4: DVec2, b: DVec2, scale: f64) -> Option<Assembly> {
        let cross = (o4 - a).perp_dot(b - a);
        if cross.abs() <= 1e-9 * scale * scale {
            None
        } else if cross > 0.0 {
            Some(Assembly::Open)
        } else {
            Some(Assembly::Crossed)
        }
    }
}

/// A planar four-bar chain with input angle limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FourBarLinkage {
    pub ground: Link,
    pub input: Link,
    pub coupler: Link,
    pub output: Link,
    /// Lower input angle bound (radians)
    pub min_angle: f64,
    /// Upper input angle bound (radians)
    pub max_angle: f64,
    /// Branch the solver keeps the chain on
    pub assembly: Assembly,
    /// Unwrapped input angle of the committed configuration
    input_angle: f64,
    /// Whether the link angles hold a solved configuration
    solved: bool,
}

impl FourBarLinkage {
    /// Build an unsolved linkage with the ground pivot at the origin and the
    /// ground link along +x. Limits default to 0..π.
    pub fn new(ground: f64, input: f64, coupler: f64, output: f64) -> Result<Self> {
        Self::with_ground(ground, input, coupler, output, DVec2::ZERO, 0.0)
    }

    /// Build an unsolved linkage with an explicit input pivot and ground angle
    pub fn with_ground(
        ground: f64,
        input: f64,
        coupler: f64,
        output: f64,
        pivot: DVec2,
        ground_angle: f64,
    ) -> Result<Self> {
        validate_length("ground length", ground)?;
        validate_length("input length", input)?;
        validate_length("coupler length", coupler)?;
        validate_length("output length", output)?;
        if !pivot.is_finite() || !ground_angle.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "ground pivot",
                value: ground_angle,
                reason: "pivot and ground angle must be finite",
            });
        }

        let ground = Link::new(ground, ground_angle, pivot)?;
        let input_link = Link::new(input, ground_angle + PI / 2.0, pivot)?;
        let coupler_link = Link::new(coupler, 0.0, input_link.end_point())?;
        let output_link = Link::new(output, 0.0, ground.end_point())?;

        Ok(Self {
            ground,
            input: input_link,
            coupler: coupler_link,
            output: output_link,
            min_angle: 0.0,
            max_angle: PI,
            assembly: Assembly::Open,
            input_angle: input_link.angle,
            solved: false,
        })
    }

    /// Lengths as `[ground, input, coupler, output]`
    pub fn lengths(&self) -> [f64; 4] {
        [
            self.ground.length,
            self.input.length,
            self.coupler.length,
            self.output.length,
        ]
    }

    /// Characteristic size used to scale tolerances
    pub fn length_scale(&self) -> f64 {
        self.lengths().into_iter().fold(0.0, f64::max)
    }

    /// Pivot carrying the input link
    #[inline]
    pub fn input_pivot(&self) -> DVec2 {
        self.ground.origin
    }

    /// Pivot carrying the output link
    #[inline]
    pub fn output_pivot(&self) -> DVec2 {
        self.ground.end_point()
    }

    /// Point traced by the tracer: the coupler/output joint
    #[inline]
    pub fn output_joint(&self) -> DVec2 {
        self.output.end_point()
    }

    /// Unwrapped input angle of the committed configuration
    pub fn input_angle(&self) -> f64 {
        self.input_angle
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn link(&self, name: LinkName) -> &Link {
        match name {
            LinkName::Ground => &self.ground,
            LinkName::Input => &self.input,
            LinkName::Coupler => &self.coupler,
            LinkName::Output => &self.output,
        }
    }

    pub fn link_state(&self, name: LinkName) -> LinkState {
        self.link(name).state()
    }

    /// Quadrilateral inequality: no link may be as long as the other three
    /// together, otherwise the loop never closes.
    pub fn check_closable(&self, input_angle: f64) -> Result<()> {
        let lengths = self.lengths();
        let total: f64 = lengths.iter().sum();
        let longest = self.length_scale();
        if longest >= total - longest {
            return Err(SimError::LinkageUnreachable {
                input_angle,
                reason: "one link is at least as long as the other three combined",
            });
        }
        Ok(())
    }

    /// Clamp an input angle into the limits; the flag reports a clamp
    pub fn clamp_input(&self, angle: f64) -> (f64, bool) {
        if angle > self.max_angle {
            (self.max_angle, true)
        } else if angle < self.min_angle {
            (self.min_angle, true)
        } else {
            (angle, false)
        }
    }

    /// Set input angle limits (radians). Reversed bounds are swapped.
    pub fn set_angle_limits(&mut self, min: f64, max: f64) -> Result<()> {
        for (name, value) in [("min angle", min), ("max angle", max)] {
            if !value.is_finite() {
                return Err(SimError::InvalidParameter {
                    name,
                    value,
                    reason: "must be finite",
                });
            }
        }
        let (min, max) = if min > max { (max, min) } else { (min, max) };
        self.min_angle = min;
        self.max_angle = max;
        Ok(())
    }

    /// Change one link length. Angles are kept; the caller re-solves.
    pub fn set_length(&mut self, name: LinkName, length: f64) -> Result<()> {
        let label = match name {
            LinkName::Ground => "ground length",
            LinkName::Input => "input length",
            LinkName::Coupler => "coupler length",
            LinkName::Output => "output length",
        };
        validate_length(label, length)?;
        match name {
            LinkName::Ground => self.ground.length = length,
            LinkName::Input => self.input.length = length,
            LinkName::Coupler => self.coupler.length = length,
            LinkName::Output => self.output.length = length,
        }
        self.sync_origins();
        Ok(())
    }

    /// Commit a solver result into the link angles
    pub fn apply(&mut self, solution: &LinkageSolution) {
        self.input_angle = solution.input_angle;
        self.input.set_angle(solution.input_angle);
        self.coupler.set_angle(solution.coupler_angle);
        self.output.set_angle(solution.output_angle);
        self.sync_origins();
        self.solved = true;
    }

    /// Distance between the coupler's far end and the output link's end
    pub fn loop_closure_residual(&self) -> f64 {
        (self.coupler.end_point() - self.output.end_point()).length()
    }

    /// Assembly the committed geometry is in, if not at a toggle position
    pub fn current_assembly(&self) -> Option<Assembly> {
        Assembly::classify(
            self.input.end_point(),
            self.output_pivot(),
            self.coupler.end_point(),
            self.length_scale(),
        )
    }

    fn sync_origins(&mut self) {
        self.input.origin = self.ground.origin;
        self.coupler.origin = self.input.end_point();
        self.output.origin = self.ground.end_point();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pivots() {
        let linkage = FourBarLinkage::new(4.0, 2.0, 3.0, 3.0).unwrap();
        assert_eq!(linkage.input_pivot(), DVec2::ZERO);
        assert!((linkage.output_pivot() - DVec2::new(4.0, 0.0)).length() < 1e-12);
        assert!(!linkage.is_solved());
    }

    #[test]
    fn test_closable() {
        let linkage = FourBarLinkage::new(4.0, 2.0, 3.0, 3.0).unwrap();
        assert!(linkage.check_closable(0.0).is_ok());

        let linkage = FourBarLinkage::new(2.0, 10.0, 2.0, 1.0).unwrap();
        let err = linkage.check_closable(0.3).unwrap_err();
        assert!(matches!(err, SimError::LinkageUnreachable { .. }));
    }

    #[test]
    fn test_angle_limits_swap() {
        let mut linkage = FourBarLinkage::new(4.0, 2.0, 3.0, 3.0).unwrap();
        linkage.set_angle_limits(2.0, 1.0).unwrap();
        assert_eq!(linkage.min_angle, 1.0);
        assert_eq!(linkage.max_angle, 2.0);
        assert!(linkage.set_angle_limits(f64::NAN, 1.0).is_err());
        assert_eq!(linkage.clamp_input(2.5), (2.0, true));
        assert_eq!(linkage.clamp_input(0.5), (1.0, true));
        assert_eq!(linkage.clamp_input(1.5), (1.5, false));
    }

    #[test]
    fn test_set_length_moves_pivots() {
        let mut linkage = FourBarLinkage::new(4.0, 2.0, 3.0, 3.0).unwrap();
        linkage.set_length(LinkName::Ground, 5.0).unwrap();
        assert!((linkage.output_pivot().x - 5.0).abs() < 1e-12);
        assert!((linkage.output.origin.x - 5.0).abs() < 1e-12);

        linkage.set_length(LinkName::Input, 1.0).unwrap();
        assert!((linkage.coupler.origin - linkage.input.end_point()).length() < 1e-12);

        assert!(linkage.set_length(LinkName::Coupler, 0.0).is_err());
        assert_eq!(linkage.coupler.length, 3.0);
    }

    #[test]
    fn test_classify() {
        let a = DVec2::new(0.0, 2.0);
        let o4 = DVec2::new(4.0, 0.0);
        assert_eq!(
            Assembly::classify(a, o4, DVec2::new(2.9, 2.8), 4.0),
            Some(Assembly::Open)
        );
        assert_eq!(
            Assembly::classify(a, o4, DVec2::new(1.1, -0.8), 4.0),
            Some(Assembly::Crossed)
        );
        assert_eq!(Assembly::classify(a, o4, DVec2::new(2.0, 1.0), 4.0), None);
    }
}
