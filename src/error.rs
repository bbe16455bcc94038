//! Errors reported by the contractor network.

use std::error::Error;
use std::fmt;

use crate::types::{CtcId, DomainId, DomainType};

#[derive(Clone, Debug, PartialEq)]
pub enum CnError {
    /// A contractor was given domains that match none of the signatures it accepts.
    ///
    /// Detected at the first contraction attempt of that contractor.
    DomainTypeMismatch {
        /// Display name of the contractor.
        contractor: String,
        /// Types of the domains it was given, in order.
        found: Vec<DomainType>,
        /// Human-readable description of what was expected.
        expected: String,
    },
    /// A domain was contracted to the empty set: the model is infeasible.
    EmptyDomain {
        domain: DomainId,
        /// Display name of the domain.
        name: String,
    },
    /// Malformed input at a call site.
    InvalidArgument {
        /// Operation that rejected the input.
        context: &'static str,
        reason: String,
    },
    /// A typed accessor was used on a domain of another type.
    UnexpectedType {
        domain: DomainId,
        expected: DomainType,
        found: DomainType,
    },
    /// The handle does not belong to this network.
    UnknownDomain(DomainId),
    /// The handle does not belong to this network.
    UnknownContractor(CtcId),
}

impl CnError {
    pub(crate) fn invalid(context: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            context,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DomainTypeMismatch {
                contractor,
                found,
                expected,
            } => {
                write!(f, "contractor '{contractor}' cannot handle domains (")?;
                for (i, ty) in found.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{ty}")?;
                }
                write!(f, "), expected {expected}")
            }
            Self::EmptyDomain { domain, name } => {
                write!(f, "domain {name} ({domain}) is empty: the model is infeasible")
            }
            Self::InvalidArgument { context, reason } => write!(f, "{context}: {reason}"),
            Self::UnexpectedType {
                domain,
                expected,
                found,
            } => write!(f, "domain {domain} is a {found}, not a {expected}"),
            Self::UnknownDomain(id) => write!(f, "unknown domain {id}"),
            Self::UnknownContractor(id) => write!(f, "unknown contractor {id}"),
        }
    }
}

impl Error for CnError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaId;

    #[test]
    fn test_display() {
        let err = CnError::DomainTypeMismatch {
            contractor: "deriv".to_string(),
            found: vec![DomainType::Interval, DomainType::Tube],
            expected: "(Slice, Slice)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "contractor 'deriv' cannot handle domains (Interval, Tube), expected (Slice, Slice)"
        );

        let err = CnError::invalid("add", "cannot add a contractor without domains");
        assert_eq!(err.to_string(), "add: cannot add a contractor without domains");

        let err = CnError::UnknownDomain(DomainId::from_index(4));
        assert_eq!(err.to_string(), "unknown domain d4");
    }
}
