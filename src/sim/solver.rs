//! Loop-closure solver
//!
//! Newton-Raphson on the two scalar loop-closure equations
//!
//! ```text
//! O2 + r2·u(θ2) + r3·u(θ3) - O4 - r4·u(θ4) = 0
//! ```
//!
//! Forward solves take θ2 and find (θ3, θ4). The drag solve takes θ4 and
//! finds (θ2, θ3). Either way Newton starts from the committed angles so the
//! chain stays on its branch; when that fails or lands on the other
//! assembly, the closed-form circle intersection of the wanted assembly is
//! used as a fresh seed.

use glam::{DMat2, DVec2};
use serde::{Deserialize, Serialize};

use super::linkage::{Assembly, FourBarLinkage};
use crate::consts::{SOLVER_MAX_ITERATIONS, SOLVER_TOLERANCE};
use crate::error::{Result, SimError};
use crate::{angle_delta, normalize_angle, unit};

/// Solved loop configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkageSolution {
    /// Input angle the solution belongs to (unwrapped, radians)
    pub input_angle: f64,
    pub coupler_angle: f64,
    pub output_angle: f64,
    /// Newton iterations spent on the accepted seed
    pub iterations: usize,
    /// Loop-closure residual norm
    pub residual: f64,
}

/// Derivative of `unit(theta)`
#[inline]
fn unit_prime(theta: f64) -> DVec2 {
    DVec2::new(-theta.sin(), theta.cos())
}

/// Intersections of two circles, ordered `[left, right]` of the line c1→c2.
/// `None` when the circles do not meet or share a center.
pub fn circle_intersections(c1: DVec2, r1: f64, c2: DVec2, r2: f64) -> Option<[DVec2; 2]> {
    let d = c2 - c1;
    let dist = d.length();
    if dist < f64::EPSILON {
        return None;
    }
    let slack = 1e-12 * (r1 + r2);
    if dist > r1 + r2 + slack || dist < (r1 - r2).abs() - slack {
        return None;
    }
    let along = (r1 * r1 - r2 * r2 + dist * dist) / (2.0 * dist);
    let h = (r1 * r1 - along * along).max(0.0).sqrt();
    let dir = d / dist;
    let mid = c1 + dir * along;
    let perp = dir.perp();
    Some([mid + perp * h, mid - perp * h])
}

/// Newton iteration for the four-bar loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicSolver {
    /// Convergence tolerance, relative to the linkage length scale
    tolerance: f64,
    /// Maximum Newton steps per seed
    max_iterations: usize,
    /// Largest angle change taken in one step (radians)
    max_step: f64,
}

impl Default for KinematicSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl KinematicSolver {
    pub fn new() -> Self {
        Self {
            tolerance: SOLVER_TOLERANCE,
            max_iterations: SOLVER_MAX_ITERATIONS,
            max_step: std::f64::consts::FRAC_PI_4,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Solve coupler and output angles for `input_angle`.
    ///
    /// Pure: the linkage is only read. Commit the result with
    /// [`FourBarLinkage::apply`].
    pub fn solve(&self, linkage: &FourBarLinkage, input_angle: f64) -> Result<LinkageSolution> {
        if !input_angle.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "input angle",
                value: input_angle,
                reason: "must be finite",
            });
        }
        linkage.check_closable(input_angle)?;

        let [_, r2, r3, r4] = linkage.lengths();
        let scale = linkage.length_scale();
        let o4 = linkage.output_pivot();
        let a = linkage.input_pivot() + r2 * unit(input_angle);

        let Some(joints) = circle_intersections(a, r3, o4, r4) else {
            return Err(SimError::LinkageUnreachable {
                input_angle,
                reason: "coupler and output links cannot span the gap to the output pivot",
            });
        };
        let closed_form = |b: DVec2| {
            let coupler = b - a;
            let output = b - o4;
            DVec2::new(coupler.y.atan2(coupler.x), output.y.atan2(output.x))
        };

        let residual = |x: DVec2| a + r3 * unit(x.x) - o4 - r4 * unit(x.y);
        let jacobian = |x: DVec2| DMat2::from_cols(r3 * unit_prime(x.x), -r4 * unit_prime(x.y));
        let assembly_of = |x: DVec2| Assembly::classify(a, o4, a + r3 * unit(x.x), scale);

        let wanted = linkage.assembly;
        let branch_seed = match wanted {
            Assembly::Open => closed_form(joints[0]),
            Assembly::Crossed => closed_form(joints[1]),
        };

        if linkage.is_solved() {
            let seed = DVec2::new(linkage.coupler.angle, linkage.output.angle);
            match self.newton(seed, scale, residual, jacobian) {
                Ok((x, iterations, res)) if assembly_of(x).is_none_or(|m| m == wanted) => {
                    return Ok(self.finish(input_angle, x, iterations, res));
                }
                Ok(_) => log::debug!(
                    "Newton left the {:?} branch at {:.4} rad, reseeding",
                    wanted,
                    input_angle
                ),
                Err((iterations, res)) => log::debug!(
                    "Newton stalled after {} iterations (residual {:e}), reseeding",
                    iterations,
                    res
                ),
            }
        }

        match self.newton(branch_seed, scale, residual, jacobian) {
            Ok((x, iterations, res)) => Ok(self.finish(input_angle, x, iterations, res)),
            Err((iterations, residual)) => Err(SimError::SolverDidNotConverge {
                iterations,
                residual,
            }),
        }
    }

    /// Clamp `input_angle` into the linkage limits, then solve. The flag
    /// reports whether clamping happened.
    pub fn solve_clamped(
        &self,
        linkage: &FourBarLinkage,
        input_angle: f64,
    ) -> Result<(LinkageSolution, bool)> {
        let (angle, clamped) = linkage.clamp_input(input_angle);
        Ok((self.solve(linkage, angle)?, clamped))
    }

    /// Inverse solve: find input and coupler angles that put the output link
    /// at `output_angle`.
    pub fn solve_for_output(
        &self,
        linkage: &FourBarLinkage,
        output_angle: f64,
    ) -> Result<LinkageSolution> {
        if !output_angle.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "output angle",
                value: output_angle,
                reason: "must be finite",
            });
        }
        let current_input = linkage.input_angle();
        linkage.check_closable(current_input)?;

        let [_, r2, r3, r4] = linkage.lengths();
        let scale = linkage.length_scale();
        let o2 = linkage.input_pivot();
        let o4 = linkage.output_pivot();
        let b = o4 + r4 * unit(output_angle);

        let Some(candidates) = circle_intersections(o2, r2, b, r3) else {
            return Err(SimError::LinkageUnreachable {
                input_angle: current_input,
                reason: "input and coupler links cannot reach the requested output position",
            });
        };

        let residual = |x: DVec2| o2 + r2 * unit(x.x) + r3 * unit(x.y) - b;
        let jacobian = |x: DVec2| DMat2::from_cols(r2 * unit_prime(x.x), r3 * unit_prime(x.y));
        let assembly_of = |x: DVec2| Assembly::classify(o2 + r2 * unit(x.x), o4, b, scale);
        let wanted = linkage.assembly;

        let seed = if linkage.is_solved() {
            DVec2::new(current_input, linkage.coupler.angle)
        } else {
            DVec2::new(linkage.input.angle, linkage.coupler.angle)
        };

        // Closed-form seeds: prefer the wanted assembly, then the one nearest
        // the current input angle.
        let mut seeds: Vec<DVec2> = candidates
            .iter()
            .map(|&a| {
                let input = a - o2;
                let coupler = b - a;
                DVec2::new(input.y.atan2(input.x), coupler.y.atan2(coupler.x))
            })
            .collect();
        seeds.sort_by(|p, q| {
            let rank = |x: &DVec2| {
                let off_branch = assembly_of(*x).is_some_and(|m| m != wanted);
                (off_branch, angle_delta(x.x, seed.x).abs())
            };
            rank(p)
                .partial_cmp(&rank(q))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut last = (0, f64::INFINITY);
        for start in std::iter::once(seed).chain(seeds) {
            match self.newton(start, scale, residual, jacobian) {
                Ok((x, iterations, res)) if assembly_of(x).is_none_or(|m| m == wanted) => {
                    // Keep the input angle on the same turn as the current one.
                    let input_angle = current_input + angle_delta(x.x, current_input);
                    return Ok(LinkageSolution {
                        input_angle,
                        coupler_angle: normalize_angle(x.y),
                        output_angle: normalize_angle(output_angle),
                        iterations,
                        residual: res,
                    });
                }
                Ok((_, iterations, res)) | Err((iterations, res)) => last = (iterations, res),
            }
        }

        Err(SimError::SolverDidNotConverge {
            iterations: last.0,
            residual: last.1,
        })
    }

    fn finish(&self, input_angle: f64, x: DVec2, iterations: usize, residual: f64) -> LinkageSolution {
        LinkageSolution {
            input_angle,
            coupler_angle: normalize_angle(x.x),
            output_angle: normalize_angle(x.y),
            iterations,
            residual,
        }
    }

    /// Damped Newton iteration on a 2x2 system. `Err` carries the iteration
    /// count and residual norm at the point of giving up.
    fn newton<F, J>(
        &self,
        mut x: DVec2,
        scale: f64,
        residual: F,
        jacobian: J,
    ) -> std::result::Result<(DVec2, usize, f64), (usize, f64)>
    where
        F: Fn(DVec2) -> DVec2,
        J: Fn(DVec2) -> DMat2,
    {
        let tolerance = self.tolerance * scale;
        let mut norm = f64::INFINITY;

        for iteration in 0..=self.max_iterations {
            let f = residual(x);
            norm = f.length();
            if !norm.is_finite() {
                return Err((iteration, norm));
            }
            if norm <= tolerance {
                return Ok((x, iteration, norm));
            }
            if iteration == self.max_iterations {
                break;
            }

            let j = jacobian(x);
            let det = j.determinant();
            if det.abs() < 1e-12 * scale * scale {
                // Links are collinear: the chain is at a toggle position.
                return Err((iteration, norm));
            }
            let mut dx = j.inverse() * -f;
            let step = dx.abs().max_element();
            if step > self.max_step {
                dx *= self.max_step / step;
            }
            x += dx;
        }

        Err((self.max_iterations, norm))
    }
}
