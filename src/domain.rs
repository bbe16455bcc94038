//! Domains: the set-valued variables of a contractor network.
//!
//! A domain either owns its value or is an alias of a part of another domain (a component of a
//! vector, a slice of a tube). Aliases never hold a copy: reading or writing one goes through the
//! owning root, so a contraction applied on `x[0]` is the same as a contraction of `x` restricted
//! to its first component.
//!
//! Identity is explicit. An owned domain is only ever equal to itself; an alias is identified by
//! its `(parent, part)` pair, and the store interns aliases so that one part of one variable is
//! represented by exactly one domain.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::ops::{Index, IndexMut};

use crate::arena::Arena;
use crate::interval::{Interval, IntervalVector};
use crate::trajectory::Trajectory;
use crate::tube::{Slice, Tube, TubeVector};
use crate::types::{CtcId, DomainId, DomainType};

/// Stand-in diameter for unbounded sets, so that volume ratios stay finite and comparable.
pub const UNBOUNDED_VOLUME: f64 = 999999.0;

fn measure(x: &Interval) -> f64 {
    if x.is_empty() {
        0.0
    } else if x.is_unbounded() {
        UNBOUNDED_VOLUME
    } else {
        x.diam()
    }
}

fn tube_measure(tube: &Tube) -> f64 {
    let codomains: f64 = tube.slices().map(|s| measure(&s.codomain())).sum();
    let gates: f64 = tube.gates().iter().map(measure).sum();
    codomains + gates
}

/// Value held by a domain.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainValue {
    Interval(Interval),
    IntervalVector(IntervalVector),
    Slice(Slice),
    Tube(Tube),
    TubeVector(TubeVector),
}

impl DomainValue {
    pub fn domain_type(&self) -> DomainType {
        self.view().domain_type()
    }

    pub fn is_empty(&self) -> bool {
        self.view().is_empty()
    }

    /// Scalar measure used to detect progress of the contractions.
    ///
    /// - interval: diameter
    /// - interval vector: product of the component diameters
    /// - slice: codomain diameter plus both gate diameters
    /// - tube: sum of the codomain diameters of all slices plus the diameter of every gate
    /// - tube vector: sum over the components
    ///
    /// Unbounded intervals count as [`UNBOUNDED_VOLUME`], empty ones as `0`.
    pub fn volume(&self) -> f64 {
        self.view().volume()
    }

    /// Intersects `self` with a value of the same type and shape.
    ///
    /// Returns `false` (and leaves `self` unchanged) if the values are not comparable.
    pub fn intersect_with(&mut self, other: &DomainValue) -> bool {
        match (self, other) {
            (DomainValue::Interval(a), DomainValue::Interval(b)) => *a &= *b,
            (DomainValue::IntervalVector(a), DomainValue::IntervalVector(b)) if a.len() == b.len() => {
                *a = a.intersect(b);
            }
            (DomainValue::Slice(a), DomainValue::Slice(b)) => a.intersect_with(b),
            (DomainValue::Tube(a), DomainValue::Tube(b)) if a.same_slicing(b) => a.intersect_with(b),
            (DomainValue::TubeVector(a), DomainValue::TubeVector(b))
                if a.len() == b.len() && (b.len() == 0 || a.same_slicing(&b[0])) =>
            {
                a.intersect_with(b);
            }
            _ => return false,
        }
        true
    }

    /// Same type and same shape (dimension, slicing).
    pub fn is_compatible(&self, other: &DomainValue) -> bool {
        match (self, other) {
            (DomainValue::Interval(_), DomainValue::Interval(_)) => true,
            (DomainValue::IntervalVector(a), DomainValue::IntervalVector(b)) => a.len() == b.len(),
            (DomainValue::Slice(a), DomainValue::Slice(b)) => a.tdomain() == b.tdomain(),
            (DomainValue::Tube(a), DomainValue::Tube(b)) => a.same_slicing(b),
            (DomainValue::TubeVector(a), DomainValue::TubeVector(b)) => {
                a.len() == b.len() && (b.len() == 0 || a.same_slicing(&b[0]))
            }
            _ => false,
        }
    }

    pub fn as_interval(&self) -> Option<&Interval> {
        match self {
            DomainValue::Interval(x) => Some(x),
            _ => None,
        }
    }
    pub fn as_interval_vector(&self) -> Option<&IntervalVector> {
        match self {
            DomainValue::IntervalVector(x) => Some(x),
            _ => None,
        }
    }
    pub fn as_slice(&self) -> Option<&Slice> {
        match self {
            DomainValue::Slice(x) => Some(x),
            _ => None,
        }
    }
    pub fn as_tube(&self) -> Option<&Tube> {
        match self {
            DomainValue::Tube(x) => Some(x),
            _ => None,
        }
    }
    pub fn as_tube_vector(&self) -> Option<&TubeVector> {
        match self {
            DomainValue::TubeVector(x) => Some(x),
            _ => None,
        }
    }

    pub(crate) fn view(&self) -> ValueRef<'_> {
        match self {
            DomainValue::Interval(x) => ValueRef::Interval(x),
            DomainValue::IntervalVector(x) => ValueRef::IntervalVector(x),
            DomainValue::Slice(x) => ValueRef::Slice(*x),
            DomainValue::Tube(x) => ValueRef::Tube(x),
            DomainValue::TubeVector(x) => ValueRef::TubeVector(x),
        }
    }
}

impl From<Interval> for DomainValue {
    fn from(x: Interval) -> Self {
        DomainValue::Interval(x)
    }
}
impl From<IntervalVector> for DomainValue {
    fn from(x: IntervalVector) -> Self {
        DomainValue::IntervalVector(x)
    }
}
impl From<Slice> for DomainValue {
    fn from(x: Slice) -> Self {
        DomainValue::Slice(x)
    }
}
impl From<Tube> for DomainValue {
    fn from(x: Tube) -> Self {
        DomainValue::Tube(x)
    }
}
impl From<TubeVector> for DomainValue {
    fn from(x: TubeVector) -> Self {
        DomainValue::TubeVector(x)
    }
}

impl Display for DomainValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainValue::Interval(x) => write!(f, "Interval: {}", x),
            DomainValue::IntervalVector(x) => write!(f, "IntervalVector: {}", x),
            DomainValue::Slice(x) => write!(f, "Slice: {}", x),
            DomainValue::Tube(x) => write!(f, "Tube: {}", x),
            DomainValue::TubeVector(x) => write!(f, "TubeVector: {}", x),
        }
    }
}

/// Borrowed view of a domain value, resolved through its owning root.
///
/// Slices are small and assembled from the tube's shared gates, so they are returned by value.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ValueRef<'a> {
    Interval(&'a Interval),
    IntervalVector(&'a IntervalVector),
    Slice(Slice),
    Tube(&'a Tube),
    TubeVector(&'a TubeVector),
}

impl ValueRef<'_> {
    pub fn domain_type(&self) -> DomainType {
        match self {
            ValueRef::Interval(_) => DomainType::Interval,
            ValueRef::IntervalVector(_) => DomainType::IntervalVector,
            ValueRef::Slice(_) => DomainType::Slice,
            ValueRef::Tube(_) => DomainType::Tube,
            ValueRef::TubeVector(_) => DomainType::TubeVector,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ValueRef::Interval(x) => x.is_empty(),
            ValueRef::IntervalVector(x) => x.is_empty(),
            ValueRef::Slice(x) => x.is_empty(),
            ValueRef::Tube(x) => x.is_empty(),
            ValueRef::TubeVector(x) => x.is_empty(),
        }
    }

    pub fn volume(&self) -> f64 {
        match self {
            ValueRef::Interval(x) => measure(x),
            ValueRef::IntervalVector(x) => {
                if x.is_empty() {
                    0.0
                } else {
                    x.iter().map(measure).product()
                }
            }
            ValueRef::Slice(s) => measure(&s.codomain()) + measure(&s.input_gate()) + measure(&s.output_gate()),
            ValueRef::Tube(t) => tube_measure(t),
            ValueRef::TubeVector(tv) => tv.iter().map(tube_measure).sum(),
        }
    }

    pub fn to_value(self) -> DomainValue {
        match self {
            ValueRef::Interval(x) => DomainValue::Interval(*x),
            ValueRef::IntervalVector(x) => DomainValue::IntervalVector(x.clone()),
            ValueRef::Slice(x) => DomainValue::Slice(x),
            ValueRef::Tube(x) => DomainValue::Tube(x.clone()),
            ValueRef::TubeVector(x) => DomainValue::TubeVector(x.clone()),
        }
    }

    /// Number of structural parts: components of a vector, slices of a tube.
    pub fn nb_parts(&self) -> usize {
        match self {
            ValueRef::IntervalVector(x) => x.len(),
            ValueRef::Tube(x) => x.nb_slices(),
            ValueRef::TubeVector(x) => x.len(),
            _ => 0,
        }
    }
}

/// Structural part of a compound domain.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Part {
    /// `i`-th component of an interval vector or of a tube vector.
    Component(usize),
    /// `k`-th slice of a tube.
    Slice(usize),
}

#[derive(Debug, Clone)]
pub(crate) enum Storage {
    Owned(DomainValue),
    AliasOf { parent: DomainId, part: Part },
}

/// Record of one variable in the network.
#[derive(Debug)]
pub struct Domain {
    id: DomainId,
    ty: DomainType,
    storage: Storage,
    /// Volume at the last propagation step.
    pub(crate) volume: f64,
    pub(crate) contractors: Vec<CtcId>,
    pub(crate) name: Option<String>,
    /// Initial value of an intermediate variable, restored by `reset_interm_vars`.
    pub(crate) initial: Option<DomainValue>,
    /// Accumulated `(lower, upper)` data trajectories, one pair per tube component.
    pub(crate) data: Vec<(Trajectory, Trajectory)>,
}

impl Domain {
    pub fn id(&self) -> DomainId {
        self.id
    }
    pub fn domain_type(&self) -> DomainType {
        self.ty
    }
    /// Volume recorded at the last propagation step involving this domain.
    pub fn saved_volume(&self) -> f64 {
        self.volume
    }
    /// Contractors referencing this domain.
    pub fn contractors(&self) -> &[CtcId] {
        &self.contractors
    }
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    pub fn is_interm_var(&self) -> bool {
        self.initial.is_some()
    }

    /// Parent domain and part, for structural sub-domains.
    pub fn alias_of(&self) -> Option<(DomainId, Part)> {
        match self.storage {
            Storage::Owned(_) => None,
            Storage::AliasOf { parent, part } => Some((parent, part)),
        }
    }
}

/// Identity: owned domains are only equal to themselves, aliases are equal when they designate
/// the same part of the same parent. Equal values held by distinct owners are never equal.
impl PartialEq for Domain {
    fn eq(&self, other: &Self) -> bool {
        match (&self.storage, &other.storage) {
            (Storage::Owned(_), Storage::Owned(_)) => self.id == other.id,
            (Storage::AliasOf { parent: p1, part: k1 }, Storage::AliasOf { parent: p2, part: k2 }) => {
                p1 == p2 && k1 == k2
            }
            _ => false,
        }
    }
}

/// Arena of domains plus the alias interning table.
#[derive(Default)]
pub(crate) struct DomainStore {
    arena: Arena<DomainId, Domain>,
    aliases: HashMap<(DomainId, Part), DomainId>,
}

impl DomainStore {
    pub fn len(&self) -> usize {
        self.arena.len()
    }
    pub fn contains(&self, id: DomainId) -> bool {
        self.arena.contains(id)
    }
    pub fn get(&self, id: DomainId) -> Option<&Domain> {
        self.arena.get(id)
    }
    pub fn ids(&self) -> impl Iterator<Item = DomainId> + '_ {
        self.arena.ids()
    }
    pub fn iter(&self) -> impl Iterator<Item = (DomainId, &Domain)> + '_ {
        self.arena.iter()
    }

    /// Allocates a new owned domain.
    pub fn insert_owned(&mut self, value: DomainValue, interm: bool) -> DomainId {
        let ty = value.domain_type();
        let volume = value.volume();
        let initial = if interm { Some(value.clone()) } else { None };
        self.arena.alloc_with(|id| Domain {
            id,
            ty,
            storage: Storage::Owned(value),
            volume,
            contractors: Vec::new(),
            name: None,
            initial,
            data: Vec::new(),
        })
    }

    /// Returns the domain standing for `part` of `parent`, creating it on first use.
    ///
    /// The boolean is `true` if the domain was just created.
    pub fn intern_alias(&mut self, parent: DomainId, part: Part) -> (DomainId, bool) {
        if let Some(&id) = self.aliases.get(&(parent, part)) {
            return (id, false);
        }
        let (ty, volume) = {
            let view = self
                .resolve_part(parent, part)
                .unwrap_or_else(|| panic!("Part {:?} does not exist in domain {}", part, parent));
            (view.domain_type(), view.volume())
        };
        let id = self.arena.alloc_with(|id| Domain {
            id,
            ty,
            storage: Storage::AliasOf { parent, part },
            volume,
            contractors: Vec::new(),
            name: None,
            initial: None,
            data: Vec::new(),
        });
        self.aliases.insert((parent, part), id);
        (id, true)
    }

    /// Existing domain standing for `part` of `parent`.
    pub fn alias(&self, parent: DomainId, part: Part) -> Option<DomainId> {
        self.aliases.get(&(parent, part)).copied()
    }

    /// Owning root of `id` and the parts leading from the root to `id`.
    fn path(&self, id: DomainId) -> (DomainId, Vec<Part>) {
        let mut parts = Vec::new();
        let mut current = id;
        while let Storage::AliasOf { parent, part } = self.arena[current].storage {
            parts.push(part);
            current = parent;
        }
        parts.reverse();
        (current, parts)
    }

    fn root_value(&self, root: DomainId) -> &DomainValue {
        match &self.arena[root].storage {
            Storage::Owned(value) => value,
            Storage::AliasOf { .. } => unreachable!("Domain {} is not a root", root),
        }
    }

    fn root_value_mut(&mut self, root: DomainId) -> &mut DomainValue {
        match &mut self.arena[root].storage {
            Storage::Owned(value) => value,
            Storage::AliasOf { .. } => unreachable!("Domain {} is not a root", root),
        }
    }

    fn resolve_part(&self, parent: DomainId, part: Part) -> Option<ValueRef<'_>> {
        let (root, mut parts) = self.path(parent);
        parts.push(part);
        navigate(self.root_value(root), &parts)
    }

    pub fn view(&self, id: DomainId) -> ValueRef<'_> {
        let (root, parts) = self.path(id);
        navigate(self.root_value(root), &parts)
            .unwrap_or_else(|| panic!("Domain {} cannot be resolved", id))
    }

    /// Copy of the current value.
    pub fn value(&self, id: DomainId) -> DomainValue {
        self.view(id).to_value()
    }

    pub fn compute_volume(&self, id: DomainId) -> f64 {
        self.view(id).volume()
    }

    pub fn is_empty(&self, id: DomainId) -> bool {
        self.view(id).is_empty()
    }

    /// Records the current volume of every domain.
    pub fn refresh_volumes(&mut self) {
        let volumes: Vec<f64> = self.arena.ids().map(|d| self.compute_volume(d)).collect();
        for ((_, dom), volume) in self.arena.iter_mut().zip(volumes) {
            dom.volume = volume;
        }
    }

    /// Replaces the value of `id`. The caller guarantees the value is compatible.
    pub fn write(&mut self, id: DomainId, value: DomainValue) {
        let (root, parts) = self.path(id);
        let stored = store(self.root_value_mut(root), &parts, value);
        assert!(stored, "Incompatible value written to domain {}", id);
    }

    /// Intersects the value of `id` with `value`. Returns `false` if the value is incompatible.
    pub fn narrow(&mut self, id: DomainId, value: &DomainValue) -> bool {
        let mut current = self.value(id);
        if !current.intersect_with(value) {
            return false;
        }
        self.write(id, current);
        true
    }
}

impl Index<DomainId> for DomainStore {
    type Output = Domain;

    fn index(&self, id: DomainId) -> &Self::Output {
        &self.arena[id]
    }
}

impl IndexMut<DomainId> for DomainStore {
    fn index_mut(&mut self, id: DomainId) -> &mut Self::Output {
        &mut self.arena[id]
    }
}

fn navigate<'a>(root: &'a DomainValue, parts: &[Part]) -> Option<ValueRef<'a>> {
    let mut current = root.view();
    for part in parts {
        current = match (current, part) {
            (ValueRef::IntervalVector(v), Part::Component(i)) => ValueRef::Interval(v.as_slice().get(*i)?),
            (ValueRef::TubeVector(tv), Part::Component(i)) => {
                if *i >= tv.len() {
                    return None;
                }
                ValueRef::Tube(&tv[*i])
            }
            (ValueRef::Tube(t), Part::Slice(k)) => ValueRef::Slice(t.slice(*k)?),
            _ => return None,
        };
    }
    Some(current)
}

fn store(root: &mut DomainValue, parts: &[Part], value: DomainValue) -> bool {
    match (root, parts, value) {
        (root, [], value) => {
            if !root.is_compatible(&value) {
                return false;
            }
            *root = value;
            true
        }
        (DomainValue::IntervalVector(v), [Part::Component(i)], DomainValue::Interval(x)) if *i < v.len() => {
            v[*i] = x;
            true
        }
        (DomainValue::Tube(t), [Part::Slice(k)], DomainValue::Slice(s)) if *k < t.nb_slices() => {
            t.set_slice(*k, &s);
            true
        }
        (DomainValue::TubeVector(tv), [Part::Component(i), rest @ ..], value) if *i < tv.len() => {
            match (rest, value) {
                ([], DomainValue::Tube(t)) if t.same_slicing(&tv[*i]) => {
                    tv[*i] = t;
                    true
                }
                ([Part::Slice(k)], DomainValue::Slice(s)) if *k < tv[*i].nb_slices() => {
                    tv[*i].set_slice(*k, &s);
                    true
                }
                _ => false,
            }
        }
        _ => false,
    }
}
