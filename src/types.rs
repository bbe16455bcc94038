//! Type-safe handles and tags for the contractor network.
//!
//! Domains and contractors live in arenas owned by the network; callers only ever hold these
//! lightweight handles. Handles are dense indices allocated in increasing order, so they are
//! stable for the whole lifetime of the network and never reused.
use std::fmt;

use crate::arena::ArenaId;

/// Handle to a domain (one set-valued variable) of a network.
///
/// # Invariants
///
/// - A handle is only meaningful for the network that returned it.
/// - Two handles are equal iff they designate the same variable.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DomainId(u32);

impl DomainId {
    /// Returns the raw index as a `usize`.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ArenaId for DomainId {
    fn from_index(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "Too many domains");
        DomainId(index as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

/// Handle to a contractor of a network.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CtcId(u32);

impl CtcId {
    /// Returns the raw index as a `usize`.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ArenaId for CtcId {
    fn from_index(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "Too many contractors");
        CtcId(index as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CtcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Runtime type of a domain.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DomainType {
    Interval,
    IntervalVector,
    Slice,
    Tube,
    TubeVector,
}

impl fmt::Display for DomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DomainType::Interval => "Interval",
            DomainType::IntervalVector => "IntervalVector",
            DomainType::Slice => "Slice",
            DomainType::Tube => "Tube",
            DomainType::TubeVector => "TubeVector",
        };
        write!(f, "{}", name)
    }
}

/// What a contractor does when executed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ContractorKind {
    /// External box operator.
    Static,
    /// External tube-capable operator.
    Dynamic,
    /// Structural link between a compound domain and its parts. Never computes anything.
    Component,
    /// Keeps two domains equal by intersecting them.
    Equality,
}

impl ContractorKind {
    /// Component contractors are bookkeeping only.
    pub fn is_structural(self) -> bool {
        self == ContractorKind::Component
    }
}

impl fmt::Display for ContractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContractorKind::Static => "static",
            ContractorKind::Dynamic => "dynamic",
            ContractorKind::Component => "component",
            ContractorKind::Equality => "equality",
        };
        write!(f, "{}", name)
    }
}
