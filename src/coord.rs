//! Cylindrical coordinate model (t, r, θ) and the minimum bounding
//! rectangle used by the R-tree. Grounded on
//! `original_source/src/indexing/rectangle.py`.

use crate::error::{MeridianError, MeridianResult};
use std::f64::consts::PI;

const TWO_PI: f64 = 2.0 * PI;

/// Normalize an angle into `[0, 2π)`.
pub fn normalize_theta(theta: f64) -> f64 {
    let wrapped = theta % TWO_PI;
    if wrapped < 0.0 {
        wrapped + TWO_PI
    } else {
        wrapped
    }
}

/// Minimum absolute angular gap between two normalized angles, in `[0, π]`.
pub fn angular_delta(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    diff.min(TWO_PI - diff)
}

/// A point in the cylindrical coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub t: f64,
    pub r: f64,
    pub theta: f64,
}

impl Position {
    /// Construct a position, rejecting negative `r` and normalizing `theta`.
    pub fn new(t: f64, r: f64, theta: f64) -> MeridianResult<Self> {
        if r < 0.0 {
            return Err(MeridianError::InvariantViolation(format!(
                "position radius must be >= 0, got {r}"
            )));
        }
        Ok(Self {
            t,
            r,
            theta: normalize_theta(theta),
        })
    }

    /// Cylindrical distance: Euclidean norm of (Δt, Δr, chord-at-mean-radius),
    /// where the chord is the straight-line distance between the two angular
    /// positions at the mean radius, correctly handling wrap-around.
    pub fn distance(&self, other: &Position) -> f64 {
        let dt = self.t - other.t;
        let dr = self.r - other.r;
        let mean_r = (self.r + other.r) / 2.0;
        let dtheta = angular_delta(self.theta, other.theta);
        let chord = 2.0 * mean_r * (dtheta / 2.0).sin();
        (dt * dt + dr * dr + chord * chord).sqrt()
    }
}

/// Minimum bounding rectangle over (t, r, θ). `min_theta > max_theta`
/// denotes a wrap-around range covering `[min_theta, 2π) ∪ [0, max_theta]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub min_t: f64,
    pub max_t: f64,
    pub min_r: f64,
    pub max_r: f64,
    pub min_theta: f64,
    pub max_theta: f64,
}

impl Rectangle {
    pub fn new(min_t: f64, max_t: f64, min_r: f64, max_r: f64, min_theta: f64, max_theta: f64) -> Self {
        let (min_t, max_t) = if min_t > max_t { (max_t, min_t) } else { (min_t, max_t) };
        let (min_r, max_r) = if min_r > max_r { (max_r, min_r) } else { (min_r, max_r) };
        Self {
            min_t,
            max_t,
            min_r: min_r.max(0.0),
            max_r,
            min_theta: normalize_theta(min_theta),
            max_theta: normalize_theta(max_theta),
        }
    }

    pub fn from_position(pos: &Position, epsilon: f64) -> Self {
        Self::new(
            pos.t - epsilon,
            pos.t + epsilon,
            (pos.r - epsilon).max(0.0),
            pos.r + epsilon,
            pos.theta - epsilon,
            pos.theta + epsilon,
        )
    }

    fn theta_wraps(&self) -> bool {
        self.min_theta > self.max_theta
    }

    pub fn contains_point(&self, pos: &Position) -> bool {
        if pos.t < self.min_t || pos.t > self.max_t {
            return false;
        }
        if pos.r < self.min_r || pos.r > self.max_r {
            return false;
        }
        if self.theta_wraps() {
            !(pos.theta < self.min_theta && pos.theta > self.max_theta)
        } else {
            pos.theta >= self.min_theta && pos.theta <= self.max_theta
        }
    }

    pub fn intersects(&self, other: &Rectangle) -> bool {
        if self.max_t < other.min_t || self.min_t > other.max_t {
            return false;
        }
        if self.max_r < other.min_r || self.min_r > other.max_r {
            return false;
        }
        match (self.theta_wraps(), other.theta_wraps()) {
            (false, false) => !(self.max_theta < other.min_theta || self.min_theta > other.max_theta),
            (false, true) => !(self.max_theta < other.min_theta && self.min_theta > other.max_theta),
            (true, false) => !(other.max_theta < self.min_theta && other.min_theta > self.max_theta),
            (true, true) => true,
        }
    }

    fn theta_size(&self) -> f64 {
        if self.theta_wraps() {
            TWO_PI - (self.min_theta - self.max_theta)
        } else {
            self.max_theta - self.min_theta
        }
    }

    pub fn area(&self) -> f64 {
        let t_size = self.max_t - self.min_t;
        (t_size * (self.max_r.powi(2) - self.min_r.powi(2)) * self.theta_size() / 2.0).abs()
    }

    pub fn margin(&self) -> f64 {
        let t_size = self.max_t - self.min_t;
        TWO_PI * (self.min_r.powi(2) + self.max_r.powi(2)) + TWO_PI * (self.min_r + self.max_r) * t_size
    }

    /// Smallest rectangle containing both `self` and `pos`.
    pub fn enlarge(&self, pos: &Position) -> Rectangle {
        let min_t = self.min_t.min(pos.t);
        let max_t = self.max_t.max(pos.t);
        let min_r = self.min_r.min(pos.r).max(0.0);
        let max_r = self.max_r.max(pos.r);

        let (min_theta, max_theta) = if !self.theta_wraps() {
            if pos.theta < self.min_theta || pos.theta > self.max_theta {
                let enlarge_min = (self.min_theta - pos.theta).rem_euclid(TWO_PI);
                let enlarge_max = (pos.theta - self.max_theta).rem_euclid(TWO_PI);
                if enlarge_min <= enlarge_max {
                    (pos.theta, self.max_theta)
                } else {
                    (self.min_theta, pos.theta)
                }
            } else {
                (self.min_theta, self.max_theta)
            }
        } else if pos.theta > self.max_theta && pos.theta < self.min_theta {
            let enlarge_min = (pos.theta - self.max_theta).rem_euclid(TWO_PI);
            let enlarge_max = (self.min_theta - pos.theta).rem_euclid(TWO_PI);
            if enlarge_min <= enlarge_max {
                (self.min_theta, pos.theta)
            } else {
                (pos.theta, self.max_theta)
            }
        } else {
            (self.min_theta, self.max_theta)
        };

        Rectangle::new(min_t, max_t, min_r, max_r, min_theta, max_theta)
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn merge(&self, other: &Rectangle) -> Rectangle {
        let min_t = self.min_t.min(other.min_t);
        let max_t = self.max_t.max(other.max_t);
        let min_r = self.min_r.min(other.min_r).max(0.0);
        let max_r = self.max_r.max(other.max_r);

        let (min_theta, max_theta) = match (self.theta_wraps(), other.theta_wraps()) {
            (false, false) => {
                if self.max_theta < other.min_theta || other.max_theta < self.min_theta {
                    let gap1 = (other.min_theta - self.max_theta).rem_euclid(TWO_PI);
                    let gap2 = (self.min_theta - other.max_theta).rem_euclid(TWO_PI);
                    if gap1 <= gap2 {
                        (self.min_theta, other.max_theta)
                    } else {
                        (other.min_theta, self.max_theta)
                    }
                } else {
                    (self.min_theta.min(other.min_theta), self.max_theta.max(other.max_theta))
                }
            }
            (true, true) => (self.min_theta.max(other.min_theta), self.max_theta.min(other.max_theta)),
            _ => {
                let (wrap, normal) = if self.theta_wraps() { (self, other) } else { (other, self) };
                if normal.min_theta >= wrap.max_theta && normal.max_theta <= wrap.min_theta {
                    (wrap.min_theta, wrap.max_theta)
                } else if normal.min_theta <= wrap.max_theta && normal.max_theta >= wrap.min_theta {
                    (0.0, TWO_PI)
                } else if normal.max_theta >= wrap.min_theta {
                    (normal.min_theta, wrap.max_theta)
                } else {
                    (wrap.min_theta, normal.max_theta)
                }
            }
        };

        Rectangle::new(min_t, max_t, min_r, max_r, min_theta, max_theta)
    }

    /// Distance from a point to the nearest point on/in this rectangle, using
    /// the same cylindrical distance convention as `Position::distance`.
    pub fn min_dist_to(&self, pos: &Position, weights: (f64, f64, f64)) -> f64 {
        let dt = if pos.t < self.min_t {
            self.min_t - pos.t
        } else if pos.t > self.max_t {
            pos.t - self.max_t
        } else {
            0.0
        };
        let dr = if pos.r < self.min_r {
            self.min_r - pos.r
        } else if pos.r > self.max_r {
            pos.r - self.max_r
        } else {
            0.0
        };
        let dtheta = if self.contains_theta(pos.theta) {
            0.0
        } else {
            let to_min = angular_delta(pos.theta, self.min_theta);
            let to_max = angular_delta(pos.theta, self.max_theta);
            to_min.min(to_max)
        };
        // Heuristic admissible-in-practice bound: assume the closest point in
        // the rectangle sits at the r that already minimizes `dr` (clamping
        // the query radius into range), then use that same r as the mean
        // radius for the angular chord term.
        let clamped_r = pos.r.clamp(self.min_r, self.max_r);
        let mean_r = (clamped_r + pos.r) / 2.0;
        let chord = 2.0 * mean_r * (dtheta / 2.0).sin();
        let (wt, wr, wa) = weights;
        ((wt * dt).powi(2) + (wr * dr).powi(2) + (wa * chord).powi(2)).sqrt()
    }

    fn contains_theta(&self, theta: f64) -> bool {
        if self.theta_wraps() {
            !(theta < self.min_theta && theta > self.max_theta)
        } else {
            theta >= self.min_theta && theta <= self.max_theta
        }
    }
}

#[cfg(test)]
#[path = "coord_tests.rs"]
mod coord_tests;
