//! A few ready-made operators.

use crate::contractor::{DynCtc, StaticCtc};
use crate::domain::DomainValue;
use crate::error::CnError;
use crate::interval::{Interval, IntervalVector};
use crate::types::DomainType;

/// Static operator defined by a closure.
pub struct CtcFn<F> {
    nb_var: usize,
    f: F,
    name: String,
}

impl<F> CtcFn<F>
where
    F: Fn(&mut IntervalVector),
{
    pub fn new(nb_var: usize, f: F) -> Self {
        Self {
            nb_var,
            f,
            name: "fn".to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F> StaticCtc for CtcFn<F>
where
    F: Fn(&mut IntervalVector),
{
    fn nb_var(&self) -> usize {
        self.nb_var
    }
    fn contract(&self, x: &mut IntervalVector) {
        (self.f)(x)
    }
    fn name(&self) -> &str {
        &self.name
    }
}

/// Intersection with a constant box.
pub struct CtcBox {
    bounds: IntervalVector,
}

impl CtcBox {
    pub fn new(bounds: IntervalVector) -> Self {
        Self { bounds }
    }
}

impl StaticCtc for CtcBox {
    fn nb_var(&self) -> usize {
        self.bounds.len()
    }
    fn contract(&self, x: &mut IntervalVector) {
        *x = x.intersect(&self.bounds);
    }
    fn name(&self) -> &str {
        "box"
    }
}

/// `x[0] + x[1] = x[2]`, forward then backward.
pub struct CtcAdd;

impl StaticCtc for CtcAdd {
    fn nb_var(&self) -> usize {
        3
    }
    fn contract(&self, x: &mut IntervalVector) {
        let sum = x[0] + x[1];
        x[2] &= sum;
        let a = x[2] - x[1];
        x[0] &= a;
        let b = x[2] - x[0];
        x[1] &= b;
    }
    fn name(&self) -> &str {
        "add"
    }
}

/// `x' ∈ v` over one slice of `x` and the matching slice of `v`.
///
/// Only `x` is narrowed: both gates through each other, then the codomain through both gates.
pub struct CtcDeriv;

impl DynCtc for CtcDeriv {
    fn contract(&self, domains: &mut [DomainValue]) -> Result<(), CnError> {
        let [DomainValue::Slice(x), DomainValue::Slice(v)] = domains else {
            return Err(CnError::invalid("deriv", "expected two slices"));
        };
        let dt = x.tdomain().diam();
        let v = v.codomain();

        let input = x.input_gate() & (x.output_gate() - v * dt);
        let output = x.output_gate() & (input + v * dt);
        x.set_input_gate(input);
        x.set_output_gate(output);

        let ramp = Interval::new(0.0, dt) * v;
        let envelope = x.codomain() & (x.input_gate() + ramp) & (x.output_gate() - ramp);
        x.set_envelope(envelope);
        Ok(())
    }

    fn is_intertemporal(&self) -> bool {
        false
    }

    fn signatures(&self) -> Vec<Vec<DomainType>> {
        vec![vec![DomainType::Slice, DomainType::Slice]]
    }

    fn name(&self) -> &str {
        "deriv"
    }
}
