//! Sampled scalar trajectories, linearly interpolated between samples.
//!
//! The network accumulates real-time measurements of a tube into two trajectories (one for the
//! lower bounds, one for the upper bounds). Only the hull of a trajectory over a time interval is
//! needed, which is what [`Trajectory::eval`] computes.

use crate::interval::Interval;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    /// Samples `(t, value)` sorted by increasing time, without duplicate times.
    samples: Vec<(f64, f64)>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Adds a sample. A sample already present at time `t` is kept unchanged.
    pub fn insert(&mut self, t: f64, value: f64) -> bool {
        match self.samples.binary_search_by(|(s, _)| s.total_cmp(&t)) {
            Ok(_) => false,
            Err(pos) => {
                self.samples.insert(pos, (t, value));
                true
            }
        }
    }

    /// Time span covered by the samples.
    pub fn tdomain(&self) -> Interval {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => Interval::new(first.0, last.0),
            _ => Interval::EMPTY,
        }
    }

    /// Interpolated value at `t`, or `None` outside the time span.
    pub fn value(&self, t: f64) -> Option<f64> {
        if !self.tdomain().contains(t) {
            return None;
        }
        let i = self.samples.partition_point(|(s, _)| *s < t);
        let (t1, y1) = self.samples[i];
        if t1 == t || i == 0 {
            return Some(y1);
        }
        let (t0, y0) = self.samples[i - 1];
        Some(y0 + (y1 - y0) * (t - t0) / (t1 - t0))
    }

    /// Hull of the interpolated trajectory over `t`.
    ///
    /// Returns the empty set if `t` is not inside the time span.
    pub fn eval(&self, t: Interval) -> Interval {
        if t.is_empty() || !t.is_subset(&self.tdomain()) {
            return Interval::EMPTY;
        }
        let mut hull = Interval::EMPTY;
        for x in [self.value(t.lb()), self.value(t.ub())].into_iter().flatten() {
            hull |= Interval::point(x);
        }
        for &(s, y) in &self.samples {
            if t.contains(s) {
                hull |= Interval::point(y);
            }
        }
        hull
    }
}
