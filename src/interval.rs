//! Closed real intervals and boxes.
//!
//! These are the numeric primitives the network is built on: in-place intersection and hull,
//! diameter and volume, emptiness and unboundedness tests. The empty set has a single canonical
//! representation, so the derived equality is set equality.
//!
//! Arithmetic here is plain `f64` arithmetic without outward rounding. It is good enough to drive
//! the bundled operators and the tests; operators needing rigorous enclosures should bring their
//! own interval library and convert at the boundary.

use std::fmt::{Display, Formatter};
use std::ops::{Add, BitAnd, BitAndAssign, BitOr, BitOrAssign, Index, IndexMut, Mul, Neg, Range, Sub};

/// Closed interval `[lb, ub]` of the real line, possibly empty or unbounded.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Interval {
    lb: f64,
    ub: f64,
}

impl Interval {
    pub const EMPTY: Interval = Interval {
        lb: f64::INFINITY,
        ub: f64::NEG_INFINITY,
    };
    pub const ALL_REALS: Interval = Interval {
        lb: f64::NEG_INFINITY,
        ub: f64::INFINITY,
    };

    /// Creates `[lb, ub]`. Inverted or NaN bounds give the empty set.
    pub fn new(lb: f64, ub: f64) -> Self {
        if lb <= ub && !(lb == f64::INFINITY || ub == f64::NEG_INFINITY) {
            Self { lb, ub }
        } else {
            Self::EMPTY
        }
    }

    /// Degenerate interval `[x, x]`.
    pub fn point(x: f64) -> Self {
        Self::new(x, x)
    }

    pub fn lb(&self) -> f64 {
        self.lb
    }
    pub fn ub(&self) -> f64 {
        self.ub
    }

    pub fn is_empty(&self) -> bool {
        self.lb > self.ub
    }
    pub fn is_unbounded(&self) -> bool {
        !self.is_empty() && (self.lb == f64::NEG_INFINITY || self.ub == f64::INFINITY)
    }
    pub fn is_degenerated(&self) -> bool {
        !self.is_empty() && self.lb == self.ub
    }

    /// Width of the interval. The empty set has diameter `0`.
    pub fn diam(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.ub - self.lb
        }
    }

    pub fn mid(&self) -> f64 {
        if self.is_empty() {
            f64::NAN
        } else if self.is_unbounded() {
            if self.lb == f64::NEG_INFINITY && self.ub == f64::INFINITY {
                0.0
            } else if self.lb == f64::NEG_INFINITY {
                f64::MIN
            } else {
                f64::MAX
            }
        } else {
            self.lb + (self.ub - self.lb) / 2.0
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lb <= x && x <= self.ub
    }

    /// Every point of `self` is in `other`. The empty set is a subset of everything.
    pub fn is_subset(&self, other: &Interval) -> bool {
        self.is_empty() || (other.lb <= self.lb && self.ub <= other.ub)
    }
    pub fn is_superset(&self, other: &Interval) -> bool {
        other.is_subset(self)
    }
    pub fn intersects(&self, other: &Interval) -> bool {
        !self.intersect(other).is_empty()
    }

    pub fn intersect(&self, other: &Interval) -> Interval {
        Interval::new(self.lb.max(other.lb), self.ub.min(other.ub))
    }

    /// Smallest interval containing both operands.
    pub fn hull(&self, other: &Interval) -> Interval {
        if self.is_empty() {
            *other
        } else if other.is_empty() {
            *self
        } else {
            Interval::new(self.lb.min(other.lb), self.ub.max(other.ub))
        }
    }

    /// Widens the interval by `r` on both sides.
    pub fn inflate(&self, r: f64) -> Interval {
        if self.is_empty() {
            *self
        } else {
            Interval::new(self.lb - r, self.ub + r)
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::ALL_REALS
    }
}

impl From<f64> for Interval {
    fn from(x: f64) -> Self {
        Interval::point(x)
    }
}

impl From<(f64, f64)> for Interval {
    fn from((lb, ub): (f64, f64)) -> Self {
        Interval::new(lb, ub)
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "[ empty ]")
        } else {
            write!(f, "[{}, {}]", self.lb, self.ub)
        }
    }
}

impl BitAnd for Interval {
    type Output = Interval;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersect(&rhs)
    }
}

impl BitAndAssign for Interval {
    fn bitand_assign(&mut self, rhs: Self) {
        *self = self.intersect(&rhs);
    }
}

impl BitOr for Interval {
    type Output = Interval;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.hull(&rhs)
    }
}

impl BitOrAssign for Interval {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.hull(&rhs);
    }
}

impl Neg for Interval {
    type Output = Interval;

    fn neg(self) -> Self::Output {
        if self.is_empty() {
            self
        } else {
            Interval::new(-self.ub, -self.lb)
        }
    }
}

impl Add for Interval {
    type Output = Interval;

    fn add(self, rhs: Self) -> Self::Output {
        if self.is_empty() || rhs.is_empty() {
            return Interval::EMPTY;
        }
        Interval::new(self.lb + rhs.lb, self.ub + rhs.ub)
    }
}

impl Sub for Interval {
    type Output = Interval;

    fn sub(self, rhs: Self) -> Self::Output {
        self + (-rhs)
    }
}

/// Product of two bounds where `0 * inf` is taken as `0`.
fn mul_bounds(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 {
        0.0
    } else {
        a * b
    }
}

impl Mul for Interval {
    type Output = Interval;

    fn mul(self, rhs: Self) -> Self::Output {
        if self.is_empty() || rhs.is_empty() {
            return Interval::EMPTY;
        }
        let products = [
            mul_bounds(self.lb, rhs.lb),
            mul_bounds(self.lb, rhs.ub),
            mul_bounds(self.ub, rhs.lb),
            mul_bounds(self.ub, rhs.ub),
        ];
        let lb = products.iter().copied().fold(f64::INFINITY, f64::min);
        let ub = products.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Interval::new(lb, ub)
    }
}

impl Mul<f64> for Interval {
    type Output = Interval;

    fn mul(self, rhs: f64) -> Self::Output {
        self * Interval::point(rhs)
    }
}

/// Box: a vector of intervals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntervalVector(Vec<Interval>);

impl IntervalVector {
    /// Creates a box of dimension `n` with every component equal to `x`.
    pub fn new(n: usize, x: Interval) -> Self {
        Self(vec![x; n])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if any component is empty (the box is the empty set).
    ///
    /// A box of dimension zero is not considered empty.
    pub fn is_empty(&self) -> bool {
        self.0.iter().any(|x| x.is_empty())
    }
    pub fn is_unbounded(&self) -> bool {
        self.0.iter().any(|x| x.is_unbounded())
    }

    /// Product of the component diameters, `0` for the empty set.
    pub fn volume(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.0.iter().map(|x| x.diam()).product()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.0.iter()
    }
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Interval> {
        self.0.iter_mut()
    }
    pub fn as_slice(&self) -> &[Interval] {
        &self.0
    }

    /// Copy of the components in `range`.
    pub fn subvector(&self, range: Range<usize>) -> IntervalVector {
        IntervalVector(self.0[range].to_vec())
    }

    /// Overwrites the components starting at `start` with `other`.
    pub fn put(&mut self, start: usize, other: &IntervalVector) {
        self.0[start..start + other.len()].copy_from_slice(&other.0);
    }

    pub fn is_subset(&self, other: &IntervalVector) -> bool {
        self.is_empty()
            || (self.len() == other.len() && self.0.iter().zip(other.iter()).all(|(a, b)| a.is_subset(b)))
    }
    pub fn is_superset(&self, other: &IntervalVector) -> bool {
        other.is_subset(self)
    }

    pub fn intersect(&self, other: &IntervalVector) -> IntervalVector {
        assert_eq!(self.len(), other.len(), "Boxes should have the same dimension");
        IntervalVector(self.0.iter().zip(other.iter()).map(|(a, b)| a.intersect(b)).collect())
    }

    pub fn hull(&self, other: &IntervalVector) -> IntervalVector {
        assert_eq!(self.len(), other.len(), "Boxes should have the same dimension");
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        IntervalVector(self.0.iter().zip(other.iter()).map(|(a, b)| a.hull(b)).collect())
    }

    pub fn lb(&self) -> Vec<f64> {
        self.0.iter().map(|x| x.lb()).collect()
    }
    pub fn ub(&self) -> Vec<f64> {
        self.0.iter().map(|x| x.ub()).collect()
    }
}

impl From<Vec<Interval>> for IntervalVector {
    fn from(components: Vec<Interval>) -> Self {
        Self(components)
    }
}

impl<const N: usize> From<[(f64, f64); N]> for IntervalVector {
    fn from(bounds: [(f64, f64); N]) -> Self {
        Self(bounds.into_iter().map(Interval::from).collect())
    }
}

impl FromIterator<Interval> for IntervalVector {
    fn from_iter<T: IntoIterator<Item = Interval>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Index<usize> for IntervalVector {
    type Output = Interval;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for IntervalVector {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl BitAnd for &IntervalVector {
    type Output = IntervalVector;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersect(rhs)
    }
}

impl BitOr for &IntervalVector {
    type Output = IntervalVector;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.hull(rhs)
    }
}

impl Display for IntervalVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, x) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ; ")?;
            }
            write!(f, "{}", x)?;
        }
        write!(f, ")")
    }
}
