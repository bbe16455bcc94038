//! Sliced tubes: guaranteed enclosures of scalar and vector trajectories over a time domain.
//!
//! A [`Tube`] cuts its time domain into consecutive slices. Each slice carries a codomain
//! (the enclosure of the trajectory over the slice) and two gates (the enclosures at the slice
//! boundaries). Adjacent slices share their common gate: the output gate of slice `k` *is* the
//! input gate of slice `k + 1`, so narrowing one is immediately visible from the other.
//!
//! A [`Slice`] obtained from a tube is a detached copy; writing it back with
//! [`Tube::set_slice`] updates the codomain and both shared gates.

use std::fmt::{Display, Formatter};
use std::ops::{Index, IndexMut};

use crate::interval::{Interval, IntervalVector};

/// One time step of a tube.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Slice {
    tdomain: Interval,
    codomain: Interval,
    input_gate: Interval,
    output_gate: Interval,
}

impl Slice {
    /// Creates a slice whose gates are initialized to the codomain.
    pub fn new(tdomain: Interval, codomain: Interval) -> Self {
        Self {
            tdomain,
            codomain,
            input_gate: codomain,
            output_gate: codomain,
        }
    }

    pub fn tdomain(&self) -> Interval {
        self.tdomain
    }
    pub fn codomain(&self) -> Interval {
        self.codomain
    }
    pub fn input_gate(&self) -> Interval {
        self.input_gate
    }
    pub fn output_gate(&self) -> Interval {
        self.output_gate
    }

    /// Replaces the codomain and keeps the gates consistent with it.
    pub fn set_envelope(&mut self, envelope: Interval) {
        self.codomain = envelope;
        self.input_gate &= envelope;
        self.output_gate &= envelope;
    }
    pub fn set_input_gate(&mut self, gate: Interval) {
        self.input_gate = gate & self.codomain;
    }
    pub fn set_output_gate(&mut self, gate: Interval) {
        self.output_gate = gate & self.codomain;
    }

    pub fn is_empty(&self) -> bool {
        self.codomain.is_empty() || self.input_gate.is_empty() || self.output_gate.is_empty()
    }

    pub fn intersect_with(&mut self, other: &Slice) {
        self.codomain &= other.codomain;
        self.input_gate &= other.input_gate & self.codomain;
        self.output_gate &= other.output_gate & self.codomain;
    }
}

impl Display for Slice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}↦{}, in={}, out={}",
            self.tdomain, self.codomain, self.input_gate, self.output_gate
        )
    }
}

/// Scalar tube with shared gates between adjacent slices.
#[derive(Debug, Clone, PartialEq)]
pub struct Tube {
    /// Slice boundaries, `nb_slices + 1` increasing times.
    times: Vec<f64>,
    codomains: Vec<Interval>,
    /// Gates at each boundary, `nb_slices + 1` entries.
    gates: Vec<Interval>,
}

impl Tube {
    /// Creates a tube over `tdomain` cut every `timestep`, with every slice set to `codomain`.
    ///
    /// The last slice is shorter when `timestep` does not divide the time domain.
    ///
    /// # Panics
    ///
    /// Panics if `tdomain` is empty or unbounded, or if `timestep` is not positive.
    pub fn new(tdomain: Interval, timestep: f64, codomain: Interval) -> Self {
        assert!(
            !tdomain.is_empty() && !tdomain.is_unbounded() && !tdomain.is_degenerated(),
            "Time domain should be a bounded non-degenerate interval"
        );
        assert!(timestep > 0.0, "Timestep should be positive");

        let mut times = vec![tdomain.lb()];
        let mut k = 1.0;
        while tdomain.lb() + k * timestep < tdomain.ub() {
            times.push(tdomain.lb() + k * timestep);
            k += 1.0;
        }
        times.push(tdomain.ub());

        let n = times.len() - 1;
        Self {
            times,
            codomains: vec![codomain; n],
            gates: vec![codomain; n + 1],
        }
    }

    pub fn tdomain(&self) -> Interval {
        Interval::new(self.times[0], self.times[self.times.len() - 1])
    }
    pub fn nb_slices(&self) -> usize {
        self.codomains.len()
    }

    /// Hull of all slice codomains.
    pub fn codomain(&self) -> Interval {
        self.codomains.iter().fold(Interval::EMPTY, |acc, x| acc | *x)
    }

    /// Gate at boundary `i` (`0..=nb_slices`).
    pub fn gate(&self, i: usize) -> Interval {
        self.gates[i]
    }
    pub fn gates(&self) -> &[Interval] {
        &self.gates
    }

    /// Narrows gate `i` to `x`, keeping it inside the adjacent codomains.
    pub fn set_gate(&mut self, i: usize, x: Interval) {
        let mut gate = x;
        if i > 0 {
            gate &= self.codomains[i - 1];
        }
        if i < self.nb_slices() {
            gate &= self.codomains[i];
        }
        self.gates[i] = gate;
    }

    /// Copy of the `k`-th slice.
    pub fn slice(&self, k: usize) -> Option<Slice> {
        if k >= self.nb_slices() {
            return None;
        }
        Some(Slice {
            tdomain: Interval::new(self.times[k], self.times[k + 1]),
            codomain: self.codomains[k],
            input_gate: self.gates[k],
            output_gate: self.gates[k + 1],
        })
    }

    pub fn slices(&self) -> impl Iterator<Item = Slice> + '_ {
        (0..self.nb_slices()).filter_map(move |k| self.slice(k))
    }

    /// Index of the slice whose time domain contains `t`.
    ///
    /// A time on a boundary belongs to the later slice, except the final time which belongs to
    /// the last slice.
    pub fn slice_index(&self, t: f64) -> Option<usize> {
        if !self.tdomain().contains(t) {
            return None;
        }
        let n = self.nb_slices();
        let k = self.times.partition_point(|&b| b <= t);
        Some(k.saturating_sub(1).min(n - 1))
    }

    /// Writes back the `k`-th slice: codomain and both gates are replaced.
    pub fn set_slice(&mut self, k: usize, slice: &Slice) {
        assert!(k < self.nb_slices(), "Slice index {} is out of range", k);
        self.codomains[k] = slice.codomain;
        self.gates[k] = slice.input_gate;
        self.gates[k + 1] = slice.output_gate;
    }

    /// Replaces the codomain of slice `k` and keeps its gates consistent.
    pub fn set_envelope(&mut self, k: usize, envelope: Interval) {
        self.codomains[k] = envelope;
        self.gates[k] &= envelope;
        self.gates[k + 1] &= envelope;
    }

    pub fn is_empty(&self) -> bool {
        self.codomains.iter().any(|x| x.is_empty()) || self.gates.iter().any(|x| x.is_empty())
    }

    pub fn same_slicing(&self, other: &Tube) -> bool {
        self.times == other.times
    }

    /// Enclosure of the trajectory over the time interval `t`.
    pub fn eval(&self, t: Interval) -> Interval {
        if t.is_empty() || !t.is_subset(&self.tdomain()) {
            return Interval::EMPTY;
        }
        if t.is_degenerated() {
            if let Some(i) = self.times.iter().position(|&b| b == t.lb()) {
                return self.gates[i];
            }
        }
        let mut result = Interval::EMPTY;
        for k in 0..self.nb_slices() {
            let tdomain = Interval::new(self.times[k], self.times[k + 1]);
            if tdomain.intersects(&t) {
                result |= self.codomains[k];
            }
        }
        result
    }

    /// Slice-wise intersection with a tube of the same slicing.
    pub fn intersect_with(&mut self, other: &Tube) {
        assert!(self.same_slicing(other), "Tubes should share the same slicing");
        for (x, y) in self.codomains.iter_mut().zip(&other.codomains) {
            *x &= *y;
        }
        for (x, y) in self.gates.iter_mut().zip(&other.gates) {
            *x &= *y;
        }
    }
}

impl Display for Tube {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}↦{}, {} slices", self.tdomain(), self.codomain(), self.nb_slices())
    }
}

/// Vector of tubes sharing the same slicing.
#[derive(Debug, Clone, PartialEq)]
pub struct TubeVector(Vec<Tube>);

impl TubeVector {
    /// Creates one tube per component of `codomain`, all with the same slicing.
    pub fn new(tdomain: Interval, timestep: f64, codomain: &IntervalVector) -> Self {
        Self(codomain.iter().map(|&x| Tube::new(tdomain, timestep, x)).collect())
    }

    /// Builds a tube vector from existing tubes, or `None` if they do not share the same slicing.
    pub fn from_tubes(tubes: Vec<Tube>) -> Option<Self> {
        if let Some(first) = tubes.first() {
            if !tubes.iter().all(|t| t.same_slicing(first)) {
                return None;
            }
        }
        Some(Self(tubes))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn nb_slices(&self) -> usize {
        self.0.first().map_or(0, |t| t.nb_slices())
    }
    pub fn tdomain(&self) -> Interval {
        self.0.first().map_or(Interval::EMPTY, |t| t.tdomain())
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Tube> {
        self.0.iter()
    }

    /// Hull of each component codomain.
    pub fn codomain(&self) -> IntervalVector {
        self.0.iter().map(|t| t.codomain()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().any(|t| t.is_empty())
    }

    pub fn same_slicing(&self, tube: &Tube) -> bool {
        self.0.first().is_some_and(|t| t.same_slicing(tube))
    }

    pub fn intersect_with(&mut self, other: &TubeVector) {
        assert_eq!(self.len(), other.len(), "Tube vectors should have the same dimension");
        for (x, y) in self.0.iter_mut().zip(&other.0) {
            x.intersect_with(y);
        }
    }
}

impl Index<usize> for TubeVector {
    type Output = Tube;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for TubeVector {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl Display for TubeVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}↦{}, {} slices", self.tdomain(), self.codomain(), self.nb_slices())
    }
}
