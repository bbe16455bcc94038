use std::time::Duration;

use crate::error::CnError;

/// Tuning of the propagation loop.
#[derive(Debug, Clone, PartialEq)]
pub struct CnConfig {
    /// Relative shrink a domain must reach to reactivate its contractors, in `[0, 1]`.
    ///
    /// `0` chases the fixed point down to floating-point granularity, larger values stop the
    /// propagation earlier.
    pub fixedpoint_ratio: f64,
    /// Wall-clock budget of `contract`. `None` runs until the queue is empty.
    pub max_duration: Option<Duration>,
}

impl Default for CnConfig {
    fn default() -> Self {
        Self {
            fixedpoint_ratio: 1e-4,
            max_duration: None,
        }
    }
}

impl CnConfig {
    pub fn validate(&self) -> Result<(), CnError> {
        check_ratio(self.fixedpoint_ratio)
    }
}

pub(crate) fn check_ratio(r: f64) -> Result<(), CnError> {
    if (0.0..=1.0).contains(&r) {
        Ok(())
    } else {
        Err(CnError::invalid(
            "set_fixedpoint_ratio",
            format!("ratio {} is not in [0, 1]", r),
        ))
    }
}
