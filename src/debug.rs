//! Debug utilities for inspecting a contractor network.
//!
//! These helpers give a read-only view of domains, contractors and the queue.
//! They are primarily useful in tests and during development.

use std::fmt::Write;

use crate::domain::Part;
use crate::error::CnError;
use crate::network::ContractorNetwork;
use crate::types::{ContractorKind, CtcId, DomainId, DomainType};

/// Detailed information about a single domain.
#[derive(Debug, Clone)]
pub struct DomainInfo {
    pub id: DomainId,
    /// Display name, derived from the parent for structural parts
    pub name: String,
    pub domain_type: DomainType,
    /// Volume computed now
    pub volume: f64,
    /// Volume at the last propagation step
    pub saved_volume: f64,
    pub contractors: Vec<CtcId>,
    pub is_empty: bool,
    pub is_interm_var: bool,
}

impl std::fmt::Display for DomainInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}: {}(volume={}, ctc={}{}{})",
            self.id,
            self.name,
            self.domain_type,
            self.volume,
            self.contractors.len(),
            if self.is_empty { ", empty" } else { "" },
            if self.is_interm_var { ", interm" } else { "" },
        )
    }
}

/// Detailed information about a single contractor.
#[derive(Debug, Clone)]
pub struct ContractorInfo {
    pub id: CtcId,
    pub name: String,
    pub kind: ContractorKind,
    pub domains: Vec<DomainId>,
    pub is_active: bool,
}

impl std::fmt::Display for ContractorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let domains: Vec<String> = self.domains.iter().map(|d| d.to_string()).collect();
        write!(
            f,
            "{} {}: {}({}){}",
            self.id,
            self.name,
            self.kind,
            domains.join(", "),
            if self.is_active { " active" } else { "" },
        )
    }
}

/// Sizes of a network.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSummary {
    pub nb_dom: usize,
    pub nb_ctc: usize,
    pub nb_ctc_in_stack: usize,
    pub nb_ctc_executions: usize,
    pub fixedpoint_ratio: f64,
}

impl std::fmt::Display for NetworkSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} domains, {} contractors ({} in stack), {} executions, ratio {}",
            self.nb_dom, self.nb_ctc, self.nb_ctc_in_stack, self.nb_ctc_executions, self.fixedpoint_ratio
        )
    }
}

impl ContractorNetwork {
    pub fn domain_info(&self, id: DomainId) -> Result<DomainInfo, CnError> {
        let dom = self.domain(id)?;
        Ok(DomainInfo {
            id,
            name: self.var_name(id),
            domain_type: dom.domain_type(),
            volume: self.domains.compute_volume(id),
            saved_volume: dom.saved_volume(),
            contractors: dom.contractors().to_vec(),
            is_empty: self.domains.is_empty(id),
            is_interm_var: dom.is_interm_var(),
        })
    }

    pub fn contractor_info(&self, id: CtcId) -> Result<ContractorInfo, CnError> {
        let ctc = self.contractor(id)?;
        Ok(ContractorInfo {
            id,
            name: ctc.display_name(),
            kind: ctc.kind(),
            domains: ctc.domains().to_vec(),
            is_active: ctc.is_active(),
        })
    }

    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            nb_dom: self.nb_dom(),
            nb_ctc: self.nb_ctc(),
            nb_ctc_in_stack: self.nb_ctc_in_stack(),
            nb_ctc_executions: self.nb_ctc_executions(),
            fixedpoint_ratio: self.fixedpoint_ratio(),
        }
    }

    /// Display name of a domain.
    ///
    /// Unnamed parts are named after their parent: `x[i]` for a component, `x(k)` for a slice.
    /// An unnamed variable kept equal to named ones gets their names joined with `/`. Anything
    /// else is `?`.
    pub fn var_name(&self, id: DomainId) -> String {
        if let Some(name) = self.base_name(id) {
            return name;
        }
        let Some(dom) = self.domains.get(id) else {
            return "?".to_string();
        };
        let aliases: Vec<String> = dom
            .contractors()
            .iter()
            .map(|&c| &self.contractors[c])
            .filter(|c| c.kind() == ContractorKind::Equality)
            .flat_map(|c| c.domains().iter().copied())
            .filter(|&d| d != id)
            .filter_map(|d| self.base_name(d))
            .collect();
        if aliases.is_empty() {
            "?".to_string()
        } else {
            aliases.join("/")
        }
    }

    fn base_name(&self, id: DomainId) -> Option<String> {
        let dom = self.domains.get(id)?;
        if let Some(name) = dom.name() {
            return Some(name.to_string());
        }
        let (parent, part) = dom.alias_of()?;
        let parent = self.base_name(parent).unwrap_or_else(|| "?".to_string());
        Some(match part {
            Part::Component(i) => format!("{}[{}]", parent, i),
            Part::Slice(k) => format!("{}({})", parent, k),
        })
    }

    /// Multi-line listing of every domain and contractor.
    pub fn dump(&self) -> String {
        let mut s = String::new();
        writeln!(s, "{}", self.summary()).unwrap();
        for id in self.domain_ids() {
            if let Ok(info) = self.domain_info(id) {
                writeln!(s, "  {}", info).unwrap();
            }
        }
        for id in self.contractor_ids() {
            if let Ok(info) = self.contractor_info(id) {
                writeln!(s, "  {}", info).unwrap();
            }
        }
        s
    }
}
