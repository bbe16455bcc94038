//! Propagation loop of a contractor network.
//!
//! Active contractors wait in a double-ended queue. Structural contractors go to the back, the
//! others to the front. Executing a contractor may shrink its domains; when a domain shrinks by
//! more than the fixpoint ratio, its inactive contractors are pushed to the front of the queue, so
//! propagation runs depth-first from the last change.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, error, log, warn, Level};

use crate::config::check_ratio;
use crate::error::CnError;
use crate::network::ContractorNetwork;
use crate::types::{ContractorKind, CtcId, DomainId};

/// Enqueues a contractor according to its priority.
pub(crate) fn add_to_queue(queue: &mut VecDeque<CtcId>, ctc: CtcId, kind: ContractorKind) {
    if kind.is_structural() {
        queue.push_back(ctc);
    } else {
        queue.push_front(ctc);
    }
}

impl ContractorNetwork {
    pub fn fixedpoint_ratio(&self) -> f64 {
        self.config.fixedpoint_ratio
    }

    /// Sets the relative shrink, in `[0, 1]`, needed to reactivate the contractors of a domain.
    pub fn set_fixedpoint_ratio(&mut self, r: f64) -> Result<(), CnError> {
        check_ratio(r)?;
        self.config.fixedpoint_ratio = r;
        Ok(())
    }

    /// Number of active contractors.
    pub fn nb_ctc_in_stack(&self) -> usize {
        self.queue.len()
    }

    /// Active contractors, in execution order.
    pub fn queued(&self) -> Vec<CtcId> {
        self.queue.iter().copied().collect()
    }

    /// Number of contractor executions since the network was created.
    pub fn nb_ctc_executions(&self) -> usize {
        self.executions
    }

    /// Number of passes of the last [`contract_ordered_mode`](Self::contract_ordered_mode) call.
    pub fn iteration_nb(&self) -> usize {
        self.iteration_nb
    }

    /// Runs the contractors until the queue is empty, or until the configured time budget is
    /// exhausted.
    ///
    /// Returns the elapsed time in seconds, or [`CnError::EmptyDomain`] if the model turned out to
    /// be infeasible.
    pub fn contract(&mut self, verbose: bool) -> Result<f64, CnError> {
        self.run(self.config.max_duration, verbose)
    }

    /// Same as [`contract`](Self::contract) with a time budget of `dt`.
    ///
    /// The budget is checked between two contractions, so the call may last slightly longer.
    pub fn contract_during(&mut self, dt: Duration, verbose: bool) -> Result<f64, CnError> {
        self.run(Some(dt), verbose)
    }

    fn run(&mut self, budget: Option<Duration>, verbose: bool) -> Result<f64, CnError> {
        let level = if verbose { Level::Info } else { Level::Debug };
        let start = Instant::now();
        let executions = self.executions;

        log!(
            level,
            "Contractor network has {} contractors and {} domains",
            self.nb_ctc(),
            self.nb_dom()
        );
        match budget {
            Some(dt) => log!(
                level,
                "Computing, {} contractors currently in stack, during {}s",
                self.queue.len(),
                dt.as_secs_f64()
            ),
            None => log!(level, "Computing, {} contractors currently in stack", self.queue.len()),
        }

        while let Some(&ctc) = self.queue.front() {
            if budget.is_some_and(|dt| start.elapsed() >= dt) {
                warn!(
                    "Time budget exhausted, {} contractors left in stack",
                    self.queue.len()
                );
                break;
            }
            self.queue.pop_front();
            self.contractors[ctc].set_active(false);
            self.execute(ctc)?;

            let domains = self.contractors[ctc].domains().to_vec();
            for d in domains {
                self.propagate_from(d, Some(ctc));
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        log!(
            level,
            "Constraint propagation time: {:.6}s, {} contractions",
            elapsed,
            self.executions - executions
        );
        self.check_emptiness()?;
        Ok(elapsed)
    }

    /// Runs the queued contractors in a fixed order until no domain shrinks.
    ///
    /// Each pass runs the queue from back to front, then from front to back. The queue is left
    /// empty.
    pub fn contract_ordered_mode(&mut self, verbose: bool) -> Result<f64, CnError> {
        let level = if verbose { Level::Info } else { Level::Debug };
        let start = Instant::now();

        let order = self.queued();
        let mut involved: Vec<DomainId> = order
            .iter()
            .flat_map(|&c| self.contractors[c].domains().iter().copied())
            .collect();
        // Parts are measured on their own, a vector with a degenerate component having no volume.
        let mut worklist = involved.clone();
        while let Some(d) = worklist.pop() {
            let parts = self.parts(d);
            involved.extend(&parts);
            worklist.extend(parts);
        }
        involved.sort();
        involved.dedup();

        log!(
            level,
            "Computing in ordered mode, {} contractors over {} domains",
            order.len(),
            involved.len()
        );

        self.iteration_nb = 0;
        if !order.is_empty() {
            loop {
                self.iteration_nb += 1;
                for &c in order.iter().rev() {
                    self.execute(c)?;
                }
                self.save_volumes(&involved);
                for &c in order.iter().skip(1) {
                    self.execute(c)?;
                }
                if self.save_volumes(&involved) == 0 {
                    break;
                }
            }
        }

        for c in self.queue.drain(..) {
            self.contractors[c].set_active(false);
        }

        let elapsed = start.elapsed().as_secs_f64();
        log!(
            level,
            "Ordered propagation time: {:.6}s, {} iterations",
            elapsed,
            self.iteration_nb
        );
        self.check_emptiness()?;
        Ok(elapsed)
    }

    fn execute(&mut self, ctc: CtcId) -> Result<(), CnError> {
        self.executions += 1;
        self.contractors[ctc].contract(&mut self.domains)
    }

    /// Records the volumes of `domains`, and returns how many shrank past the fixpoint ratio.
    fn save_volumes(&mut self, domains: &[DomainId]) -> usize {
        let threshold = 1.0 - self.config.fixedpoint_ratio;
        let mut shrunk = 0;
        for &d in domains {
            let current = self.domains.compute_volume(d);
            if current / self.domains[d].volume < threshold {
                shrunk += 1;
            }
            self.domains[d].volume = current;
        }
        shrunk
    }

    /// Flags the contractors of a domain modified from outside the network.
    ///
    /// If the domain shrank by more than the fixpoint ratio since its last propagation, every
    /// inactive contractor referencing it, except `avoid`, is activated and pushed to the front of
    /// the queue.
    pub fn propagate_ctc_from_domain(&mut self, dom: DomainId, avoid: Option<CtcId>) -> Result<(), CnError> {
        self.check_domain(dom)?;
        self.propagate_from(dom, avoid);
        Ok(())
    }

    pub(crate) fn propagate_from(&mut self, dom: DomainId, avoid: Option<CtcId>) {
        let current = self.domains.compute_volume(dom);
        let saved = self.domains[dom].volume;
        self.domains[dom].volume = current;

        if current / saved < 1.0 - self.config.fixedpoint_ratio {
            debug!("propagate({}: {} -> {})", dom, saved, current);
            self.activate(dom, avoid);

            // A degenerate component zeroes the volume of its vector.
            if let Some((parent, _)) = self.domains[dom].alias_of() {
                if self.domains[parent].volume == 0.0 {
                    debug!("propagate({}): vector {} has no volume left", dom, parent);
                    self.activate(parent, avoid);
                }
            }
        } else if saved == 0.0 && current == 0.0 {
            for part in self.parts(dom) {
                self.propagate_from(part, avoid);
            }
        }
    }

    /// Pushes the inactive contractors of `dom`, except `avoid`, to the front of the queue.
    fn activate(&mut self, dom: DomainId, avoid: Option<CtcId>) {
        let mut batch = VecDeque::new();
        for &c in self.domains[dom].contractors() {
            let ctc = &mut self.contractors[c];
            if Some(c) != avoid && !ctc.is_active() {
                ctc.set_active(true);
                add_to_queue(&mut batch, c, ctc.kind());
            }
        }
        debug!("activate({}): {:?}", dom, batch);
        while let Some(c) = batch.pop_back() {
            self.queue.push_front(c);
        }
    }

    /// Activates every non-structural contractor and deactivates the structural ones.
    ///
    /// Needed after domains were widened from outside the network. Saved volumes are reset to the
    /// current ones.
    pub fn trigger_all_contractors(&mut self) {
        self.domains.refresh_volumes();
        self.queue.clear();
        for (id, ctc) in self.contractors.iter_mut() {
            if ctc.kind().is_structural() {
                ctc.set_active(false);
            } else {
                ctc.set_active(true);
                add_to_queue(&mut self.queue, id, ctc.kind());
            }
        }
        debug!("trigger_all_contractors: {} in stack", self.queue.len());
    }

    pub fn set_all_contractors_active(&mut self) {
        self.trigger_all_contractors();
    }

    /// Restores every intermediate variable to its initial value and triggers all contractors.
    pub fn reset_interm_vars(&mut self) {
        let initial: Vec<_> = self
            .domains
            .iter()
            .filter_map(|(id, dom)| dom.initial.clone().map(|value| (id, value)))
            .collect();
        for (id, value) in initial {
            self.domains.write(id, value);
        }
        self.trigger_all_contractors();
    }

    fn check_emptiness(&self) -> Result<(), CnError> {
        for (id, dom) in self.domains.iter() {
            if !dom.contractors().is_empty() && self.domains.is_empty(id) {
                let name = self.var_name(id);
                error!("Empty domain {} ({}): the model is infeasible", name, id);
                return Err(CnError::EmptyDomain { domain: id, name });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::contractor::Ctc;
    use crate::ctc::{CtcAdd, CtcBox};
    use crate::interval::{Interval, IntervalVector};

    #[test]
    fn test_add_to_queue_priority() {
        let mut queue = VecDeque::new();
        let ids: Vec<CtcId> = (0..3).map(crate::arena::ArenaId::from_index).collect();
        add_to_queue(&mut queue, ids[0], ContractorKind::Component);
        add_to_queue(&mut queue, ids[1], ContractorKind::Static);
        add_to_queue(&mut queue, ids[2], ContractorKind::Equality);
        assert_eq!(queue, [ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn test_set_fixedpoint_ratio() {
        let mut cn = ContractorNetwork::new();
        assert_eq!(cn.fixedpoint_ratio(), 1e-4);
        cn.set_fixedpoint_ratio(0.5).unwrap();
        assert_eq!(cn.fixedpoint_ratio(), 0.5);
        assert!(cn.set_fixedpoint_ratio(1.5).is_err());
        assert_eq!(cn.fixedpoint_ratio(), 0.5);
    }

    #[test]
    fn test_contract_empties_queue() {
        let mut cn = ContractorNetwork::new();
        let x = cn.create_dom(IntervalVector::from([(-3.0, 4.0), (2.0, 5.0)])).unwrap();
        cn.add(&Ctc::new_static(CtcBox::new(IntervalVector::from([(1.0, 2.0), (3.0, 4.0)]))), &[x])
            .unwrap();
        assert_eq!(cn.nb_ctc_in_stack(), 2);
        cn.contract(false).unwrap();
        assert_eq!(cn.nb_ctc_in_stack(), 0);
        assert!(cn.contractor_ids().all(|c| !cn.contractor(c).unwrap().is_active()));
    }

    #[test]
    fn test_trigger_all_skips_structural() {
        let mut cn = ContractorNetwork::new();
        let a = cn.create_dom(IntervalVector::new(3, Interval::new(0.0, 1.0))).unwrap();
        cn.add(&Ctc::new_static(CtcAdd), &[a]).unwrap();
        cn.contract(false).unwrap();
        cn.trigger_all_contractors();
        assert_eq!(cn.nb_ctc_in_stack(), 1);
        let queued = cn.queued();
        assert_eq!(cn.contractor(queued[0]).unwrap().kind(), ContractorKind::Static);
    }

    #[test]
    fn test_budget_zero_runs_nothing() {
        let mut cn = ContractorNetwork::new();
        let a = cn.create_dom(Interval::new(0.0, 10.0)).unwrap();
        let b = cn.create_dom(Interval::new(5.0, 20.0)).unwrap();
        cn.add_equality(a, b).unwrap();
        cn.contract_during(Duration::ZERO, false).unwrap();
        assert_eq!(cn.nb_ctc_executions(), 0);
        assert_eq!(cn.nb_ctc_in_stack(), 1);
    }

    #[test]
    fn test_configured_budget() {
        let config = crate::config::CnConfig {
            max_duration: Some(Duration::ZERO),
            ..Default::default()
        };
        let mut cn = ContractorNetwork::with_config(config).unwrap();
        let a = cn.create_dom(Interval::new(0.0, 10.0)).unwrap();
        let b = cn.create_dom(Interval::new(5.0, 20.0)).unwrap();
        cn.add_equality(a, b).unwrap();
        cn.contract(false).unwrap();
        assert_eq!(cn.nb_ctc_in_stack(), 1);
        assert_eq!(cn.interval(a).unwrap(), Interval::new(0.0, 10.0));
    }

    #[test]
    fn test_reset_interm_vars() {
        let mut cn = ContractorNetwork::new();
        let a = cn.create_interm_var(Interval::new(0.0, 10.0)).unwrap();
        let b = cn.create_dom(Interval::new(5.0, 20.0)).unwrap();
        cn.add_equality(a, b).unwrap();
        cn.contract(false).unwrap();
        assert_eq!(cn.interval(a).unwrap(), Interval::new(5.0, 10.0));

        cn.reset_interm_vars();
        assert_eq!(cn.interval(a).unwrap(), Interval::new(0.0, 10.0));
        assert_eq!(cn.interval(b).unwrap(), Interval::new(5.0, 10.0));
        assert_eq!(cn.nb_ctc_in_stack(), 1);
    }

    #[test]
    fn test_ordered_mode() {
        let mut cn = ContractorNetwork::new();
        let a = cn.create_dom(Interval::new(0.0, 1.0)).unwrap();
        let b = cn.create_dom(Interval::new(-1.0, 1.0)).unwrap();
        let c = cn.create_dom(Interval::new(1.5, 2.0)).unwrap();
        cn.add(&Ctc::new_static(CtcAdd), &[a, b, c]).unwrap();
        cn.contract_ordered_mode(false).unwrap();
        assert!(cn.iteration_nb() >= 1);
        assert_eq!(cn.nb_ctc_in_stack(), 0);
        assert_eq!(cn.interval(a).unwrap(), Interval::new(0.5, 1.0));
        assert_eq!(cn.interval(b).unwrap(), Interval::new(0.5, 1.0));
    }
}
