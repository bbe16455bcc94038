//! Graph construction of a contractor network.
//!
//! All domains and contractors are owned by the [`ContractorNetwork`]; callers hold
//! [`DomainId`] and [`CtcId`] handles. Registering a compound domain (vector, tube) expands it into
//! its structural parts, each part becoming a domain of its own linked to its parent by a
//! `Component` contractor. The propagation loop lives in [`solve`](crate::solve).

use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::ops::Range;

use log::debug;

use crate::arena::Arena;
use crate::config::CnConfig;
use crate::contractor::{Contractor, Ctc, CtcKey, Operator};
use crate::domain::{Domain, DomainStore, DomainValue, Part, ValueRef};
use crate::error::CnError;
use crate::interval::{Interval, IntervalVector};
use crate::solve::add_to_queue;
use crate::trajectory::Trajectory;
use crate::tube::{Slice, Tube, TubeVector};
use crate::types::{CtcId, DomainId, DomainType};

pub struct ContractorNetwork {
    pub(crate) domains: DomainStore,
    pub(crate) contractors: Arena<CtcId, Contractor>,
    ctc_index: HashMap<CtcKey, CtcId>,
    /// Active contractors. High priority at the front.
    pub(crate) queue: VecDeque<CtcId>,
    pub(crate) config: CnConfig,
    pub(crate) executions: usize,
    pub(crate) iteration_nb: usize,
}

impl ContractorNetwork {
    pub fn new() -> Self {
        Self {
            domains: DomainStore::default(),
            contractors: Arena::new(),
            ctc_index: HashMap::new(),
            queue: VecDeque::new(),
            config: CnConfig::default(),
            executions: 0,
            iteration_nb: 0,
        }
    }

    pub fn with_config(config: CnConfig) -> Result<Self, CnError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }
}

impl Default for ContractorNetwork {
    fn default() -> Self {
        ContractorNetwork::new()
    }
}

impl Debug for ContractorNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractorNetwork")
            .field("nb_dom", &self.nb_dom())
            .field("nb_ctc", &self.nb_ctc())
            .field("nb_ctc_in_stack", &self.queue.len())
            .field("fixedpoint_ratio", &self.config.fixedpoint_ratio)
            .finish()
    }
}

// Sizes and lookups
impl ContractorNetwork {
    pub fn config(&self) -> &CnConfig {
        &self.config
    }

    pub fn nb_dom(&self) -> usize {
        self.domains.len()
    }
    pub fn nb_ctc(&self) -> usize {
        self.contractors.len()
    }

    /// Returns `true` if any domain of the network is empty.
    pub fn emptiness(&self) -> bool {
        self.domains.ids().any(|d| self.domains.is_empty(d))
    }

    pub fn domain(&self, id: DomainId) -> Result<&Domain, CnError> {
        self.domains.get(id).ok_or(CnError::UnknownDomain(id))
    }
    pub fn contractor(&self, id: CtcId) -> Result<&Contractor, CnError> {
        self.contractors.get(id).ok_or(CnError::UnknownContractor(id))
    }

    pub fn domain_ids(&self) -> impl Iterator<Item = DomainId> + '_ {
        self.domains.ids()
    }
    pub fn contractor_ids(&self) -> impl Iterator<Item = CtcId> + '_ {
        self.contractors.ids()
    }

    pub(crate) fn check_domain(&self, id: DomainId) -> Result<(), CnError> {
        if self.domains.contains(id) {
            Ok(())
        } else {
            Err(CnError::UnknownDomain(id))
        }
    }

    fn check_type(&self, id: DomainId, expected: DomainType) -> Result<(), CnError> {
        self.check_domain(id)?;
        let found = self.domains[id].domain_type();
        if found != expected {
            return Err(CnError::UnexpectedType {
                domain: id,
                expected,
                found,
            });
        }
        Ok(())
    }

    /// Domain standing for the `i`-th component of a vector or a tube vector.
    pub fn component(&self, vector: DomainId, i: usize) -> Result<DomainId, CnError> {
        self.check_domain(vector)?;
        self.domains
            .alias(vector, Part::Component(i))
            .ok_or_else(|| CnError::invalid("component", format!("{} has no component {}", vector, i)))
    }

    /// Domain standing for the `k`-th slice of a tube.
    pub fn slice_domain(&self, tube: DomainId, k: usize) -> Result<DomainId, CnError> {
        self.check_domain(tube)?;
        self.domains
            .alias(tube, Part::Slice(k))
            .ok_or_else(|| CnError::invalid("slice_domain", format!("{} has no slice {}", tube, k)))
    }

    /// Structural part created when `id` was registered.
    fn part(&self, id: DomainId, part: Part) -> DomainId {
        self.domains
            .alias(id, part)
            .unwrap_or_else(|| panic!("Domain {} has no structural part {:?}", id, part))
    }

    fn components(&self, id: DomainId) -> Vec<DomainId> {
        let n = self.domains.view(id).nb_parts();
        (0..n).map(|i| self.part(id, Part::Component(i))).collect()
    }

    /// Existing structural parts of `id`.
    pub(crate) fn parts(&self, id: DomainId) -> Vec<DomainId> {
        let n = self.domains.view(id).nb_parts();
        let slices = self.domains[id].domain_type() == DomainType::Tube;
        (0..n)
            .filter_map(|i| {
                let part = if slices { Part::Slice(i) } else { Part::Component(i) };
                self.domains.alias(id, part)
            })
            .collect()
    }

    fn types(&self, domains: &[DomainId]) -> Vec<DomainType> {
        domains.iter().map(|&d| self.domains[d].domain_type()).collect()
    }
}

// Values
impl ContractorNetwork {
    /// Copy of the current value of a domain.
    pub fn value(&self, id: DomainId) -> Result<DomainValue, CnError> {
        self.check_domain(id)?;
        Ok(self.domains.value(id))
    }

    fn typed<T>(
        &self,
        id: DomainId,
        expected: DomainType,
        f: impl FnOnce(DomainValue) -> Option<T>,
    ) -> Result<T, CnError> {
        self.check_type(id, expected)?;
        let found = self.domains[id].domain_type();
        f(self.domains.value(id)).ok_or(CnError::UnexpectedType {
            domain: id,
            expected,
            found,
        })
    }

    pub fn interval(&self, id: DomainId) -> Result<Interval, CnError> {
        self.typed(id, DomainType::Interval, |v| v.as_interval().copied())
    }
    pub fn interval_vector(&self, id: DomainId) -> Result<IntervalVector, CnError> {
        self.typed(id, DomainType::IntervalVector, |v| match v {
            DomainValue::IntervalVector(x) => Some(x),
            _ => None,
        })
    }
    pub fn slice(&self, id: DomainId) -> Result<Slice, CnError> {
        self.typed(id, DomainType::Slice, |v| v.as_slice().copied())
    }
    pub fn tube(&self, id: DomainId) -> Result<Tube, CnError> {
        self.typed(id, DomainType::Tube, |v| match v {
            DomainValue::Tube(x) => Some(x),
            _ => None,
        })
    }
    pub fn tube_vector(&self, id: DomainId) -> Result<TubeVector, CnError> {
        self.typed(id, DomainType::TubeVector, |v| match v {
            DomainValue::TubeVector(x) => Some(x),
            _ => None,
        })
    }

    pub fn compute_volume(&self, id: DomainId) -> Result<f64, CnError> {
        self.check_domain(id)?;
        Ok(self.domains.compute_volume(id))
    }

    pub fn is_empty(&self, id: DomainId) -> Result<bool, CnError> {
        self.check_domain(id)?;
        Ok(self.domains.is_empty(id))
    }

    /// Overwrites the value of a domain from outside the network and flags its contractors.
    ///
    /// The new value must have the type and shape of the current one. The contractors of the domain
    /// and of its structural parts are only reactivated if they shrank; call
    /// [`trigger_all_contractors`](ContractorNetwork::trigger_all_contractors) after widening a
    /// domain.
    pub fn set_value(&mut self, id: DomainId, value: impl Into<DomainValue>) -> Result<(), CnError> {
        let value = value.into();
        self.check_type(id, value.domain_type())?;
        if !self.domains.value(id).is_compatible(&value) {
            return Err(CnError::invalid(
                "set_value",
                format!("value does not have the dimension or the slicing of {}", id),
            ));
        }
        debug!("set_value({}, {})", id, value);
        self.domains.write(id, value);

        // Structural parts changed along with their root.
        let mut worklist = vec![id];
        while let Some(d) = worklist.pop() {
            self.propagate_from(d, None);
            worklist.extend(self.parts(d));
        }
        Ok(())
    }

    pub fn set_name(&mut self, id: DomainId, name: impl Into<String>) -> Result<(), CnError> {
        self.check_domain(id)?;
        self.domains[id].name = Some(name.into());
        Ok(())
    }

    /// Names every contractor built from `ctc`.
    pub fn set_ctc_name(&mut self, ctc: &Ctc, name: impl Into<String>) {
        let name = name.into();
        for (_, c) in self.contractors.iter_mut() {
            if let Operator::User(op) = c.operator() {
                if op.identity() == ctc.identity() {
                    c.name = Some(name.clone());
                }
            }
        }
    }
}

// Construction
impl ContractorNetwork {
    /// Registers a new variable owned by the network.
    ///
    /// Two calls always create two distinct domains, even for equal values.
    pub fn create_dom(&mut self, value: impl Into<DomainValue>) -> Result<DomainId, CnError> {
        self.register(value.into(), false)
    }

    /// Registers an intermediate variable, restored to `value` by
    /// [`reset_interm_vars`](ContractorNetwork::reset_interm_vars).
    pub fn create_interm_var(&mut self, value: impl Into<DomainValue>) -> Result<DomainId, CnError> {
        self.register(value.into(), true)
    }

    fn register(&mut self, value: DomainValue, interm: bool) -> Result<DomainId, CnError> {
        if value.is_empty() {
            return Err(CnError::invalid("create_dom", format!("domain is already empty: {}", value)));
        }
        let id = self.domains.insert_owned(value, interm);
        debug!("register({}: {})", id, self.domains[id].domain_type());
        self.expand(id);
        Ok(id)
    }

    /// Creates the structural parts of a new compound domain, with their `Component` contractors.
    fn expand(&mut self, root: DomainId) {
        let mut worklist = vec![root];
        while let Some(id) = worklist.pop() {
            let ty = self.domains[id].domain_type();
            let n = self.domains.view(id).nb_parts();
            match ty {
                DomainType::Interval | DomainType::Slice => {}
                DomainType::IntervalVector | DomainType::TubeVector => {
                    let mut linked = vec![id];
                    for i in 0..n {
                        let (c, created) = self.domains.intern_alias(id, Part::Component(i));
                        if created && ty == DomainType::TubeVector {
                            worklist.push(c);
                        }
                        linked.push(c);
                    }
                    self.add_ctc(Operator::Component, linked);
                }
                DomainType::Tube => {
                    let slices: Vec<DomainId> = (0..n)
                        .map(|k| self.domains.intern_alias(id, Part::Slice(k)).0)
                        .collect();
                    let mut linked = vec![id];
                    linked.extend(&slices);
                    self.add_ctc(Operator::Component, linked);
                    for pair in slices.windows(2) {
                        self.add_ctc(Operator::Component, pair.to_vec());
                    }
                }
            }
        }
    }

    /// Registers a contractor, or returns the existing one with the same operator and domains.
    ///
    /// New contractors start active and queued.
    fn add_ctc(&mut self, op: Operator, domains: Vec<DomainId>) -> CtcId {
        let key = CtcKey::new(&op, &domains);
        if let Some(&id) = self.ctc_index.get(&key) {
            debug!("add_ctc: {} already exists", id);
            return id;
        }

        let kind = op.kind();
        let id = self.contractors.alloc_with(|id| Contractor::new(id, op, domains));
        self.ctc_index.insert(key, id);

        let contractor = &mut self.contractors[id];
        for &d in contractor.domains() {
            let dom = &mut self.domains[d];
            if dom.contractors.last() != Some(&id) {
                dom.contractors.push(id);
            }
        }
        contractor.set_active(true);
        add_to_queue(&mut self.queue, id, kind);

        debug!("add_ctc({}: {} over {:?})", id, kind, self.contractors[id].domains());
        id
    }

    /// Adds a contractor built from a user operator over `domains`.
    ///
    /// - A static operator over tubes is applied slice by slice, interval domains acting as
    ///   parameters shared by every slice.
    /// - A static operator over several domains whose total scalar size is its arity sees the
    ///   vectors as their components.
    /// - A dynamic operator that is not inter-temporal is applied slice by slice over tubes.
    ///
    /// Adding the same operator over the same domains again does nothing.
    pub fn add(&mut self, ctc: &Ctc, domains: &[DomainId]) -> Result<(), CnError> {
        if domains.is_empty() {
            return Err(CnError::invalid("add", "cannot add a contractor without domains"));
        }
        for &d in domains {
            self.check_domain(d)?;
        }
        debug!("add({:?}, {:?})", ctc, domains);

        match ctc {
            Ctc::Static(op) => self.add_static(ctc, op.nb_var(), domains),
            Ctc::Dynamic(op) => self.add_dynamic(ctc, op.is_intertemporal(), domains),
        }
    }

    fn add_static(&mut self, ctc: &Ctc, nb_var: usize, domains: &[DomainId]) -> Result<(), CnError> {
        let types = self.types(domains);

        if types.iter().any(|t| matches!(t, DomainType::Tube | DomainType::TubeVector)) {
            let nb_slices = self.common_slicing(domains)?;
            for k in 0..nb_slices {
                let mut row = Vec::new();
                for (&d, ty) in domains.iter().zip(&types) {
                    match ty {
                        DomainType::Interval | DomainType::Slice => row.push(d),
                        DomainType::IntervalVector => row.extend(self.components(d)),
                        DomainType::Tube => row.push(self.part(d, Part::Slice(k))),
                        DomainType::TubeVector => {
                            for c in self.components(d) {
                                row.push(self.part(c, Part::Slice(k)));
                            }
                        }
                    }
                }
                self.add_ctc(Operator::User(ctc.clone()), row);
            }
            return Ok(());
        }

        let heterogeneous = domains.len() > 1
            && types.contains(&DomainType::IntervalVector)
            && self.scalar_size(domains) == nb_var;
        let row = if heterogeneous {
            let mut row = Vec::new();
            for (&d, ty) in domains.iter().zip(&types) {
                match ty {
                    DomainType::IntervalVector => row.extend(self.components(d)),
                    _ => row.push(d),
                }
            }
            row
        } else {
            domains.to_vec()
        };
        self.add_ctc(Operator::User(ctc.clone()), row);
        Ok(())
    }

    fn add_dynamic(&mut self, ctc: &Ctc, intertemporal: bool, domains: &[DomainId]) -> Result<(), CnError> {
        let types = self.types(domains);
        if intertemporal || types.iter().all(|&t| t == DomainType::Slice) {
            self.add_ctc(Operator::User(ctc.clone()), domains.to_vec());
            return Ok(());
        }

        if let Some(t) = types
            .iter()
            .find(|t| !matches!(t, DomainType::Tube | DomainType::TubeVector))
        {
            return Err(CnError::invalid(
                "add",
                format!("a slice-wise contractor expects tubes, got a {}", t),
            ));
        }
        let nb_slices = self.common_slicing(domains)?;

        let mut tubes = Vec::new();
        for (&d, ty) in domains.iter().zip(&types) {
            match ty {
                DomainType::TubeVector => tubes.extend(self.components(d)),
                _ => tubes.push(d),
            }
        }
        for k in 0..nb_slices {
            let row = tubes.iter().map(|&t| self.part(t, Part::Slice(k))).collect();
            self.add_ctc(Operator::User(ctc.clone()), row);
        }
        Ok(())
    }

    /// Number of slices shared by all the tubes among `domains`.
    fn common_slicing(&self, domains: &[DomainId]) -> Result<usize, CnError> {
        let mut reference: Option<&Tube> = None;
        for &d in domains {
            let tubes: Vec<&Tube> = match self.domains.view(d) {
                ValueRef::Tube(t) => vec![t],
                ValueRef::TubeVector(tv) => tv.iter().collect(),
                _ => Vec::new(),
            };
            for t in tubes {
                if let Some(r) = reference {
                    if !r.same_slicing(t) {
                        return Err(CnError::invalid("add", "tubes do not share the same slicing"));
                    }
                } else {
                    reference = Some(t);
                }
            }
        }
        reference
            .map(|t| t.nb_slices())
            .ok_or_else(|| CnError::invalid("add", "no tube among the domains"))
    }

    fn scalar_size(&self, domains: &[DomainId]) -> usize {
        domains
            .iter()
            .map(|&d| match self.domains.view(d) {
                ValueRef::Interval(_) | ValueRef::Slice(_) => 1,
                ValueRef::IntervalVector(v) => v.len(),
                _ => 0,
            })
            .sum()
    }

    /// Keeps `a` and `b` equal.
    pub fn add_equality(&mut self, a: DomainId, b: DomainId) -> Result<CtcId, CnError> {
        self.check_domain(a)?;
        self.check_domain(b)?;
        Ok(self.add_ctc(Operator::Equality, vec![a, b]))
    }

    /// Creates a copy of `v[range]` kept equal to the corresponding components of `v`.
    pub fn subvector(&mut self, v: DomainId, range: Range<usize>) -> Result<DomainId, CnError> {
        let vector = self.interval_vector(v)?;
        if range.start >= range.end || range.end > vector.len() {
            return Err(CnError::invalid(
                "subvector",
                format!("range {:?} is not inside 0..{}", range, vector.len()),
            ));
        }
        let sub = self.create_dom(vector.subvector(range.clone()))?;
        for (j, i) in range.enumerate() {
            let a = self.part(v, Part::Component(i));
            let b = self.part(sub, Part::Component(j));
            self.add_ctc(Operator::Equality, vec![a, b]);
        }
        Ok(sub)
    }
}

// Real-time data
impl ContractorNetwork {
    /// Adds a bounded measurement `y` at time `t` to a tube.
    ///
    /// Measurements are accumulated into lower and upper trajectories. Walking backward from `t`,
    /// every slice fully covered by the data so far is narrowed to the hull of the interpolated
    /// bounds, and its contractors are flagged. The walk stops at the first uncovered slice or at
    /// the first slice already tighter than the data.
    pub fn add_data(&mut self, tube: DomainId, t: f64, y: Interval) -> Result<(), CnError> {
        self.check_type(tube, DomainType::Tube)?;
        if !t.is_finite() {
            return Err(CnError::invalid("add_data", format!("time {} is not finite", t)));
        }
        if y.is_empty() {
            return Err(CnError::invalid("add_data", "measurement is empty"));
        }
        self.add_data_to_tube(tube, tube, 0, t, y);
        Ok(())
    }

    /// Adds a bounded vector measurement to a tube vector, component by component.
    pub fn add_data_vector(&mut self, tubes: DomainId, t: f64, y: &IntervalVector) -> Result<(), CnError> {
        self.check_type(tubes, DomainType::TubeVector)?;
        if !t.is_finite() {
            return Err(CnError::invalid("add_data_vector", format!("time {} is not finite", t)));
        }
        let n = self.domains.view(tubes).nb_parts();
        if y.len() != n {
            return Err(CnError::invalid(
                "add_data_vector",
                format!("measurement has dimension {}, tube vector has {}", y.len(), n),
            ));
        }
        if y.is_empty() {
            return Err(CnError::invalid("add_data_vector", "measurement is empty"));
        }
        for (i, c) in self.components(tubes).into_iter().enumerate() {
            self.add_data_to_tube(tubes, c, i, t, y[i]);
        }
        Ok(())
    }

    fn add_data_to_tube(&mut self, holder: DomainId, tube: DomainId, component: usize, t: f64, y: Interval) {
        let (lb, ub) = {
            let data = &mut self.domains[holder].data;
            if data.len() <= component {
                data.resize_with(component + 1, || (Trajectory::new(), Trajectory::new()));
            }
            let (lb, ub) = &mut data[component];
            lb.insert(t, y.lb());
            ub.insert(t, y.ub());
            (lb.clone(), ub.clone())
        };
        let covered = lb.tdomain();

        let (tdomain, nb_slices, current) = match self.domains.view(tube) {
            ValueRef::Tube(x) => (x.tdomain(), x.nb_slices(), x.slice_index(t)),
            _ => return,
        };
        let mut k = if t >= tdomain.ub() {
            Some(nb_slices - 1)
        } else {
            current.and_then(|k| k.checked_sub(1))
        };

        while let Some(i) = k {
            let dom = self.part(tube, Part::Slice(i));
            let Some(mut slice) = self.domains.value(dom).as_slice().copied() else {
                break;
            };
            if !slice.tdomain().is_subset(&covered) {
                break;
            }
            let envelope = lb.eval(slice.tdomain()) | ub.eval(slice.tdomain());
            if !slice.codomain().is_superset(&envelope) {
                break;
            }
            debug!("add_data: {}({}) narrowed to {}", tube, i, envelope);
            slice.set_envelope(envelope);
            self.domains.write(dom, DomainValue::Slice(slice));
            self.propagate_from(dom, None);
            k = i.checked_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::ctc::{CtcAdd, CtcDeriv};
    use crate::types::ContractorKind;

    #[test]
    fn test_vector_expansion() {
        let mut cn = ContractorNetwork::new();
        let v = cn.create_dom(IntervalVector::new(3, Interval::new(0.0, 1.0))).unwrap();
        // vector and its 3 components, linked by one component contractor
        assert_eq!(cn.nb_dom(), 4);
        assert_eq!(cn.nb_ctc(), 1);
        let c = cn.component(v, 2).unwrap();
        assert_eq!(cn.interval(c).unwrap(), Interval::new(0.0, 1.0));
        assert!(cn.component(v, 3).is_err());
    }

    #[test]
    fn test_tube_expansion() {
        let mut cn = ContractorNetwork::new();
        let tube = Tube::new(Interval::new(0.0, 4.0), 1.0, Interval::new(-1.0, 1.0));
        let x = cn.create_dom(tube).unwrap();
        // tube and 4 slices; tube-slices link and 3 adjacent pairs
        assert_eq!(cn.nb_dom(), 5);
        assert_eq!(cn.nb_ctc(), 4);
        let s0 = cn.slice_domain(x, 0).unwrap();
        assert_eq!(cn.domain(s0).unwrap().contractors().len(), 2);
        assert!(cn
            .contractor_ids()
            .all(|c| cn.contractor(c).unwrap().kind() == ContractorKind::Component));
    }

    #[test]
    fn test_tube_vector_expansion() {
        let mut cn = ContractorNetwork::new();
        let tv = TubeVector::new(Interval::new(0.0, 2.0), 1.0, &IntervalVector::new(2, Interval::new(-1.0, 1.0)));
        let x = cn.create_dom(tv).unwrap();
        // 1 + 2 tubes + 2 * 2 slices
        assert_eq!(cn.nb_dom(), 7);
        // vector link, then per tube: tube-slices link and 1 adjacent pair
        assert_eq!(cn.nb_ctc(), 5);
        let x1 = cn.component(x, 1).unwrap();
        assert!(cn.slice_domain(x1, 1).is_ok());
    }

    #[test]
    fn test_add_rejects_empty_list() {
        let mut cn = ContractorNetwork::new();
        let err = cn.add(&Ctc::new_static(CtcAdd), &[]).unwrap_err();
        assert!(matches!(err, CnError::InvalidArgument { context: "add", .. }));
    }

    #[test]
    fn test_create_rejects_empty_value() {
        let mut cn = ContractorNetwork::new();
        assert!(cn.create_dom(Interval::EMPTY).is_err());
        assert_eq!(cn.nb_dom(), 0);
    }

    #[test]
    fn test_add_same_contractor_twice() {
        let mut cn = ContractorNetwork::new();
        let a = cn.create_dom(Interval::new(0.0, 1.0)).unwrap();
        let b = cn.create_dom(Interval::new(0.0, 1.0)).unwrap();
        let c = cn.create_dom(Interval::new(0.0, 1.0)).unwrap();
        let plus = Ctc::new_static(CtcAdd);
        cn.add(&plus, &[a, b, c]).unwrap();
        cn.add(&plus, &[a, b, c]).unwrap();
        assert_eq!(cn.nb_ctc(), 1);
        cn.add(&plus, &[b, a, c]).unwrap();
        assert_eq!(cn.nb_ctc(), 2);
        cn.add(&Ctc::new_static(CtcAdd), &[a, b, c]).unwrap();
        assert_eq!(cn.nb_ctc(), 3);
    }

    #[test]
    fn test_slicewise_contractor_requires_same_slicing() {
        let mut cn = ContractorNetwork::new();
        let x = cn
            .create_dom(Tube::new(Interval::new(0.0, 4.0), 1.0, Interval::ALL_REALS))
            .unwrap();
        let v = cn
            .create_dom(Tube::new(Interval::new(0.0, 4.0), 2.0, Interval::ALL_REALS))
            .unwrap();
        let err = cn.add(&Ctc::new_dynamic(CtcDeriv), &[x, v]).unwrap_err();
        assert!(matches!(err, CnError::InvalidArgument { .. }));
    }

    #[test]
    fn test_slicewise_contractor_rejects_intervals() {
        let mut cn = ContractorNetwork::new();
        let x = cn
            .create_dom(Tube::new(Interval::new(0.0, 4.0), 1.0, Interval::ALL_REALS))
            .unwrap();
        let a = cn.create_dom(Interval::ALL_REALS).unwrap();
        assert!(cn.add(&Ctc::new_dynamic(CtcDeriv), &[x, a]).is_err());
    }

    #[test]
    fn test_static_over_tubes_is_applied_per_slice() {
        let mut cn = ContractorNetwork::new();
        let tdomain = Interval::new(0.0, 3.0);
        let x = cn.create_dom(Tube::new(tdomain, 1.0, Interval::new(0.0, 1.0))).unwrap();
        let y = cn.create_dom(Tube::new(tdomain, 1.0, Interval::new(0.0, 1.0))).unwrap();
        let z = cn.create_dom(Interval::new(1.5, 2.0)).unwrap();
        let before = cn.nb_ctc();
        cn.add(&Ctc::new_static(CtcAdd), &[x, y, z]).unwrap();
        assert_eq!(cn.nb_ctc(), before + 3);
        assert_eq!(cn.domain(z).unwrap().contractors().len(), 3);
    }

    #[test]
    fn test_typed_accessors() {
        let mut cn = ContractorNetwork::new();
        let a = cn.create_dom(Interval::new(0.0, 1.0)).unwrap();
        assert!(cn.interval(a).is_ok());
        assert_eq!(
            cn.tube(a).unwrap_err(),
            CnError::UnexpectedType {
                domain: a,
                expected: DomainType::Tube,
                found: DomainType::Interval,
            }
        );
    }

    #[test]
    fn test_set_value_checks_shape() {
        let mut cn = ContractorNetwork::new();
        let v = cn.create_dom(IntervalVector::new(2, Interval::ALL_REALS)).unwrap();
        assert!(cn.set_value(v, IntervalVector::new(3, Interval::ALL_REALS)).is_err());
        assert!(cn.set_value(v, Interval::new(0.0, 1.0)).is_err());
        cn.set_value(v, IntervalVector::new(2, Interval::new(0.0, 1.0))).unwrap();
        let c0 = cn.component(v, 0).unwrap();
        assert_eq!(cn.interval(c0).unwrap(), Interval::new(0.0, 1.0));
    }

    #[test]
    fn test_add_data_rejects_non_finite_time() {
        let mut cn = ContractorNetwork::new();
        let x = cn
            .create_dom(Tube::new(Interval::new(0.0, 4.0), 1.0, Interval::new(-10.0, 10.0)))
            .unwrap();
        let err = cn.add_data(x, f64::NAN, Interval::new(2.0, 3.0)).unwrap_err();
        assert!(matches!(err, CnError::InvalidArgument { context: "add_data", .. }));
        assert!(cn.add_data(x, f64::INFINITY, Interval::new(2.0, 3.0)).is_err());

        // later measurements still tighten the tube
        for t in 0..=4 {
            cn.add_data(x, t as f64, Interval::new(2.0, 3.0)).unwrap();
        }
        let tube = cn.tube(x).unwrap();
        assert!(tube.slices().all(|s| s.codomain().is_subset(&Interval::new(2.0, 3.0))));

        let tv = TubeVector::new(Interval::new(0.0, 4.0), 1.0, &IntervalVector::new(2, Interval::ALL_REALS));
        let v = cn.create_dom(tv).unwrap();
        let y = IntervalVector::new(2, Interval::new(0.0, 1.0));
        assert!(cn.add_data_vector(v, f64::NAN, &y).is_err());
    }

    #[test]
    fn test_add_data_needs_a_tube() {
        let mut cn = ContractorNetwork::new();
        let a = cn.create_dom(Interval::new(0.0, 1.0)).unwrap();
        assert!(cn.add_data(a, 0.0, Interval::new(0.0, 1.0)).is_err());
    }
}
