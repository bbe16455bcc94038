//! Contractors: one narrowing operation bound to an ordered list of domains.
//!
//! Operators are plug-ins. A [`StaticCtc`] narrows a box of scalars, a [`DynCtc`] narrows a list of
//! domain values (slices, tubes, ...) by itself. Both are shared through a [`Ctc`] handle, whose
//! identity is the identity of the underlying `Rc`: registering the same handle twice over the
//! same domains yields a single contractor.

use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::domain::{DomainStore, DomainValue};
use crate::error::CnError;
use crate::interval::{Interval, IntervalVector};
use crate::types::{ContractorKind, CtcId, DomainId, DomainType};

/// Box contractor over a fixed number of scalar variables.
pub trait StaticCtc {
    /// Number of scalar variables of the box.
    fn nb_var(&self) -> usize;

    /// Narrows `x` in place. Must never enlarge it.
    fn contract(&self, x: &mut IntervalVector);

    fn name(&self) -> &str {
        "static"
    }
}

/// Contractor over a list of domain values, possibly time-dependent.
pub trait DynCtc {
    /// Narrows `domains` in place. Values must keep their type and shape.
    fn contract(&self, domains: &mut [DomainValue]) -> Result<(), CnError>;

    /// An inter-temporal operator needs whole tubes. Otherwise, the network applies it slice by
    /// slice.
    fn is_intertemporal(&self) -> bool {
        true
    }

    /// Accepted domain type lists. No signature means anything is accepted.
    fn signatures(&self) -> Vec<Vec<DomainType>> {
        Vec::new()
    }

    fn name(&self) -> &str {
        "dynamic"
    }
}

/// Shared handle to a user operator.
#[derive(Clone)]
pub enum Ctc {
    Static(Rc<dyn StaticCtc>),
    Dynamic(Rc<dyn DynCtc>),
}

impl Ctc {
    pub fn new_static(op: impl StaticCtc + 'static) -> Self {
        Ctc::Static(Rc::new(op))
    }

    pub fn new_dynamic(op: impl DynCtc + 'static) -> Self {
        Ctc::Dynamic(Rc::new(op))
    }

    pub fn kind(&self) -> ContractorKind {
        match self {
            Ctc::Static(_) => ContractorKind::Static,
            Ctc::Dynamic(_) => ContractorKind::Dynamic,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Ctc::Static(op) => op.name(),
            Ctc::Dynamic(op) => op.name(),
        }
    }

    /// Address of the shared operator.
    pub(crate) fn identity(&self) -> usize {
        match self {
            Ctc::Static(op) => Rc::as_ptr(op) as *const () as usize,
            Ctc::Dynamic(op) => Rc::as_ptr(op) as *const () as usize,
        }
    }
}

impl fmt::Debug for Ctc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ctc::{}({:#x})", self.kind(), self.identity())
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Operator {
    User(Ctc),
    Component,
    Equality,
}

impl Operator {
    pub fn kind(&self) -> ContractorKind {
        match self {
            Operator::User(ctc) => ctc.kind(),
            Operator::Component => ContractorKind::Component,
            Operator::Equality => ContractorKind::Equality,
        }
    }

    fn identity(&self) -> usize {
        match self {
            Operator::User(ctc) => ctc.identity(),
            _ => 0,
        }
    }
}

/// Deduplication key of a contractor.
///
/// User operators keep their domain order, since it is meaningful. Structural contractors are
/// symmetric, so their domains are sorted.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub(crate) struct CtcKey {
    kind: ContractorKind,
    op: usize,
    domains: Vec<DomainId>,
}

impl CtcKey {
    pub fn new(op: &Operator, domains: &[DomainId]) -> Self {
        let mut domains = domains.to_vec();
        if !matches!(op, Operator::User(_)) {
            domains.sort();
        }
        Self {
            kind: op.kind(),
            op: op.identity(),
            domains,
        }
    }
}

/// Record of one contractor in the network.
#[derive(Debug)]
pub struct Contractor {
    id: CtcId,
    op: Operator,
    domains: Vec<DomainId>,
    active: bool,
    pub(crate) name: Option<String>,
}

impl Contractor {
    pub(crate) fn new(id: CtcId, op: Operator, domains: Vec<DomainId>) -> Self {
        Self {
            id,
            op,
            domains,
            active: false,
            name: None,
        }
    }

    pub fn id(&self) -> CtcId {
        self.id
    }
    pub fn kind(&self) -> ContractorKind {
        self.op.kind()
    }
    /// Domains, in the order given to the operator.
    pub fn domains(&self) -> &[DomainId] {
        &self.domains
    }
    /// Whether the contractor is waiting in the queue.
    pub fn is_active(&self) -> bool {
        self.active
    }
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn operator(&self) -> &Operator {
        &self.op
    }

    /// Own name, else the operator name, else the kind.
    pub fn display_name(&self) -> String {
        match (&self.name, &self.op) {
            (Some(name), _) => name.clone(),
            (None, Operator::User(ctc)) => ctc.name().to_string(),
            (None, op) => op.kind().to_string(),
        }
    }

    fn mismatch(&self, store: &DomainStore, expected: impl Into<String>) -> CnError {
        CnError::DomainTypeMismatch {
            contractor: self.display_name(),
            found: self.domains.iter().map(|&d| store[d].domain_type()).collect(),
            expected: expected.into(),
        }
    }

    /// Runs the operator over the current domain values and writes the narrowed values back.
    pub(crate) fn contract(&self, store: &mut DomainStore) -> Result<(), CnError> {
        debug!("contract({}: {} over {:?})", self.id, self.kind(), self.domains);
        match &self.op {
            Operator::Component => Ok(()),
            Operator::Equality => self.contract_equality(store),
            Operator::User(Ctc::Static(op)) => self.contract_static(op.as_ref(), store),
            Operator::User(Ctc::Dynamic(op)) => self.contract_dynamic(op.as_ref(), store),
        }
    }

    fn contract_equality(&self, store: &mut DomainStore) -> Result<(), CnError> {
        let [a, b] = self.domains[..] else {
            return Err(self.mismatch(store, "exactly two domains"));
        };
        let mut x = store.value(a);
        if !x.intersect_with(&store.value(b)) {
            return Err(self.mismatch(store, "two domains of the same type and shape"));
        }
        store.write(a, x.clone());
        store.write(b, x);
        Ok(())
    }

    fn contract_static(&self, op: &dyn StaticCtc, store: &mut DomainStore) -> Result<(), CnError> {
        let n = op.nb_var();
        let types: Vec<DomainType> = self.domains.iter().map(|&d| store[d].domain_type()).collect();

        if let [d] = self.domains[..] {
            if let DomainValue::IntervalVector(mut x) = store.value(d) {
                if x.len() != n {
                    return Err(self.mismatch(store, format!("one vector of dimension {}", n)));
                }
                op.contract(&mut x);
                store.narrow(d, &DomainValue::IntervalVector(x));
                return Ok(());
            }
        }

        let scalar = |t: &DomainType| matches!(t, DomainType::Interval | DomainType::Slice);
        if types.iter().all(scalar) {
            if types.len() != n {
                return Err(self.mismatch(store, format!("{} scalar domains", n)));
            }
            let passes = if types.contains(&DomainType::Slice) { 3 } else { 1 };
            for pass in 0..passes {
                self.contract_scalars(op, store, pass);
            }
            return Ok(());
        }

        if types.iter().all(|&t| t == DomainType::IntervalVector) && types.len() == n {
            let mut columns: Vec<IntervalVector> = self
                .domains
                .iter()
                .filter_map(|&d| store.value(d).as_interval_vector().cloned())
                .collect();
            let len = columns[0].len();
            if columns.iter().any(|c| c.len() != len) {
                return Err(self.mismatch(store, format!("{} vectors of the same dimension", n)));
            }
            for k in 0..len {
                let mut x: IntervalVector = columns.iter().map(|c| c[k]).collect();
                op.contract(&mut x);
                for (column, xi) in columns.iter_mut().zip(x.iter()) {
                    column[k] &= *xi;
                }
            }
            for (&d, column) in self.domains.iter().zip(columns) {
                store.narrow(d, &DomainValue::IntervalVector(column));
            }
            return Ok(());
        }

        Err(self.mismatch(
            store,
            format!("one vector, {} scalars or {} stacked vectors", n, n),
        ))
    }

    /// One box over scalar domains. Slices contribute their codomain (pass 0), their input gate
    /// (pass 1) or their output gate (pass 2).
    fn contract_scalars(&self, op: &dyn StaticCtc, store: &mut DomainStore, pass: usize) {
        let mut x: IntervalVector = self
            .domains
            .iter()
            .map(|&d| match store.value(d) {
                DomainValue::Interval(v) => v,
                DomainValue::Slice(s) => match pass {
                    0 => s.codomain(),
                    1 => s.input_gate(),
                    _ => s.output_gate(),
                },
                _ => Interval::ALL_REALS,
            })
            .collect();
        op.contract(&mut x);

        for (&d, &xi) in self.domains.iter().zip(x.iter()) {
            match store.value(d) {
                DomainValue::Interval(_) => {
                    store.narrow(d, &DomainValue::Interval(xi));
                }
                DomainValue::Slice(mut s) => {
                    match pass {
                        0 => s.set_envelope(s.codomain() & xi),
                        1 => s.set_input_gate(s.input_gate() & xi),
                        _ => s.set_output_gate(s.output_gate() & xi),
                    }
                    store.write(d, DomainValue::Slice(s));
                }
                _ => {}
            }
        }
    }

    fn contract_dynamic(&self, op: &dyn DynCtc, store: &mut DomainStore) -> Result<(), CnError> {
        let types: Vec<DomainType> = self.domains.iter().map(|&d| store[d].domain_type()).collect();
        let signatures = op.signatures();
        if !signatures.is_empty() && !signatures.contains(&types) {
            return Err(self.mismatch(store, format_signatures(&signatures)));
        }

        let mut values: Vec<DomainValue> = self.domains.iter().map(|&d| store.value(d)).collect();
        op.contract(&mut values)?;
        for (&d, value) in self.domains.iter().zip(&values) {
            if !store.narrow(d, value) {
                return Err(self.mismatch(store, "values of unchanged type and shape after contraction"));
            }
        }
        Ok(())
    }
}

fn format_signatures(signatures: &[Vec<DomainType>]) -> String {
    signatures
        .iter()
        .map(|sig| {
            let types: Vec<String> = sig.iter().map(|t| t.to_string()).collect();
            format!("({})", types.join(", "))
        })
        .collect::<Vec<_>>()
        .join(" or ")
}
