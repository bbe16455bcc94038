use tube_cn::arena::ArenaId;
use tube_cn::contractor::{Ctc, DynCtc};
use tube_cn::ctc::{CtcAdd, CtcBox, CtcDeriv, CtcFn};
use tube_cn::domain::DomainValue;
use tube_cn::error::CnError;
use tube_cn::interval::{Interval, IntervalVector};
use tube_cn::network::ContractorNetwork;
use tube_cn::tube::{Tube, TubeVector};
use tube_cn::types::{ContractorKind, CtcId, DomainId, DomainType};

fn all_volumes(cn: &ContractorNetwork) -> Vec<f64> {
    cn.domain_ids().map(|d| cn.compute_volume(d).unwrap()).collect()
}

#[test]
fn test_equality_of_two_intervals() {
    let mut cn = ContractorNetwork::new();
    let a = cn.create_dom(Interval::new(0.0, 10.0)).unwrap();
    let b = cn.create_dom(Interval::new(5.0, 20.0)).unwrap();
    cn.add_equality(a, b).unwrap();
    cn.contract(false).unwrap();
    assert_eq!(cn.interval(a).unwrap(), Interval::new(5.0, 10.0));
    assert_eq!(cn.interval(b).unwrap(), Interval::new(5.0, 10.0));
}

#[test]
fn test_box_contractor() {
    let mut cn = ContractorNetwork::new();
    let x = cn.create_dom(IntervalVector::from([(-3.0, 4.0), (2.0, 5.0)])).unwrap();
    let bounds = IntervalVector::from([(1.0, 2.0), (3.0, 4.0)]);
    cn.add(&Ctc::new_static(CtcBox::new(bounds.clone())), &[x]).unwrap();
    cn.contract(false).unwrap();
    assert_eq!(cn.interval_vector(x).unwrap(), bounds);

    // components follow their vector
    let x1 = cn.component(x, 1).unwrap();
    assert_eq!(cn.interval(x1).unwrap(), Interval::new(3.0, 4.0));
}

#[test]
fn test_add_data_tightens_covered_slices() {
    let mut cn = ContractorNetwork::new();
    let x = cn
        .create_dom(Tube::new(Interval::new(0.0, 10.0), 1.0, Interval::new(-10.0, 10.0)))
        .unwrap();

    // a single measurement covers no slice
    cn.add_data(x, 5.0, Interval::new(2.0, 3.0)).unwrap();
    let tube = cn.tube(x).unwrap();
    assert!(tube.slices().all(|s| s.codomain() == Interval::new(-10.0, 10.0)));

    for t in 0..=5 {
        cn.add_data(x, t as f64, Interval::new(2.0, 3.0)).unwrap();
    }
    let tube = cn.tube(x).unwrap();
    for (k, s) in tube.slices().enumerate() {
        if k < 5 {
            assert!(s.codomain().is_subset(&Interval::new(2.0, 3.0)), "slice {}: {}", k, s);
        } else {
            assert_eq!(s.codomain(), Interval::new(-10.0, 10.0), "slice {}", k);
        }
    }
}

#[test]
fn test_add_data_at_final_time_covers_last_slice() {
    let mut cn = ContractorNetwork::new();
    let x = cn
        .create_dom(Tube::new(Interval::new(0.0, 2.0), 1.0, Interval::new(-10.0, 10.0)))
        .unwrap();
    cn.add_data(x, 0.0, Interval::new(0.0, 1.0)).unwrap();
    cn.add_data(x, 1.0, Interval::new(1.0, 2.0)).unwrap();
    cn.add_data(x, 2.0, Interval::new(2.0, 3.0)).unwrap();
    let tube = cn.tube(x).unwrap();
    assert_eq!(tube.slice(0).unwrap().codomain(), Interval::new(0.0, 2.0));
    assert_eq!(tube.slice(1).unwrap().codomain(), Interval::new(1.0, 3.0));
}

#[test]
fn test_add_data_then_derivative_propagation() {
    let mut cn = ContractorNetwork::new();
    let tdomain = Interval::new(0.0, 10.0);
    let x = cn.create_dom(Tube::new(tdomain, 1.0, Interval::new(-10.0, 10.0))).unwrap();
    let v = cn.create_dom(Tube::new(tdomain, 1.0, Interval::new(-1.0, 1.0))).unwrap();
    cn.add(&Ctc::new_dynamic(CtcDeriv), &[x, v]).unwrap();

    for t in 0..=5 {
        cn.add_data(x, t as f64, Interval::new(2.0, 3.0)).unwrap();
    }
    cn.contract(false).unwrap();

    let tube = cn.tube(x).unwrap();
    assert_eq!(tube.slice(5).unwrap().codomain(), Interval::new(1.0, 4.0));
    assert_eq!(tube.slice(9).unwrap().codomain(), Interval::new(-3.0, 8.0));
    assert_eq!(tube.gate(10), Interval::new(-3.0, 8.0));
}

fn halving_network(ratio: f64) -> (ContractorNetwork, DomainId, DomainId) {
    let mut cn = ContractorNetwork::new();
    cn.set_fixedpoint_ratio(ratio).unwrap();
    let x = cn.create_dom(Interval::new(-8.0, 8.0)).unwrap();
    let y = cn.create_dom(Interval::new(-8.0, 8.0)).unwrap();
    let fx = CtcFn::new(2, |b: &mut IntervalVector| {
        let half = b[1] * 0.5;
        b[0] &= half;
    });
    let fy = CtcFn::new(2, |b: &mut IntervalVector| {
        let half = b[0] * 0.5;
        b[1] &= half;
    });
    cn.add(&Ctc::new_static(fx), &[x, y]).unwrap();
    cn.add(&Ctc::new_static(fy), &[x, y]).unwrap();
    cn.contract(false).unwrap();
    (cn, x, y)
}

#[test]
fn test_fixedpoint_ratio_trades_precision_for_executions() {
    let (fine, fx, fy) = halving_network(0.0);
    let (coarse, cx, cy) = halving_network(0.5);

    assert!(coarse.nb_ctc_executions() <= fine.nb_ctc_executions());
    assert!(fine.interval(fx).unwrap().is_subset(&coarse.interval(cx).unwrap()));
    assert!(fine.interval(fy).unwrap().is_subset(&coarse.interval(cy).unwrap()));
    assert!(fine.interval(fx).unwrap().diam() < 1e-10);
}

#[test]
fn test_same_domain_added_twice() {
    let mut cn = ContractorNetwork::new();
    let v = cn.create_dom(IntervalVector::new(2, Interval::new(0.0, 1.0))).unwrap();
    let nb_dom = cn.nb_dom();
    cn.add(&Ctc::new_static(CtcBox::new(IntervalVector::new(2, Interval::ALL_REALS))), &[v])
        .unwrap();
    cn.add(&Ctc::new_static(CtcBox::new(IntervalVector::new(2, Interval::ALL_REALS))), &[v])
        .unwrap();
    assert_eq!(cn.nb_dom(), nb_dom);

    // an equal value held by another variable is another domain
    let w = cn.create_dom(IntervalVector::new(2, Interval::new(0.0, 1.0))).unwrap();
    assert_ne!(v, w);
    assert_eq!(cn.nb_dom(), 2 * nb_dom);
    assert_eq!(cn.value(v).unwrap(), cn.value(w).unwrap());
    assert_ne!(cn.domain(v).unwrap(), cn.domain(w).unwrap());
}

#[test]
fn test_subvector_is_kept_equal() {
    let mut cn = ContractorNetwork::new();
    let v = cn.create_dom(IntervalVector::new(4, Interval::new(0.0, 10.0))).unwrap();
    let s = cn.subvector(v, 1..3).unwrap();
    cn.contract(false).unwrap();

    cn.set_value(s, IntervalVector::from([(2.0, 3.0), (4.0, 5.0)])).unwrap();
    cn.contract(false).unwrap();
    assert_eq!(
        cn.interval_vector(v).unwrap(),
        IntervalVector::from([(0.0, 10.0), (2.0, 3.0), (4.0, 5.0), (0.0, 10.0)])
    );

    cn.set_value(v, IntervalVector::from([(0.0, 10.0), (2.5, 3.0), (4.0, 5.0), (0.0, 10.0)]))
        .unwrap();
    cn.contract(false).unwrap();
    assert_eq!(cn.interval_vector(s).unwrap(), IntervalVector::from([(2.5, 3.0), (4.0, 5.0)]));
}

#[test]
fn test_subvector_range_is_checked() {
    let mut cn = ContractorNetwork::new();
    let v = cn.create_dom(IntervalVector::new(4, Interval::new(0.0, 10.0))).unwrap();
    assert!(cn.subvector(v, 2..5).is_err());
    assert!(cn.subvector(v, 2..2).is_err());
}

#[test]
fn test_component_contractors_run_last() {
    let mut cn = ContractorNetwork::new();
    let v = cn.create_dom(IntervalVector::new(2, Interval::new(0.0, 10.0))).unwrap();
    cn.add(&Ctc::new_static(CtcBox::new(IntervalVector::new(2, Interval::new(0.0, 10.0)))), &[v])
        .unwrap();
    cn.contract(false).unwrap();
    assert_eq!(cn.nb_ctc_in_stack(), 0);

    cn.set_value(v, IntervalVector::from([(0.0, 5.0), (0.0, 10.0)])).unwrap();
    let kinds: Vec<ContractorKind> = cn
        .queued()
        .into_iter()
        .map(|c| cn.contractor(c).unwrap().kind())
        .collect();
    assert_eq!(kinds, [ContractorKind::Static, ContractorKind::Component]);
}

#[test]
fn test_propagated_batch_goes_first() {
    let mut cn = ContractorNetwork::new();
    let a = cn.create_dom(Interval::new(0.0, 10.0)).unwrap();
    let b = cn.create_dom(Interval::new(0.0, 10.0)).unwrap();
    let c = cn.create_dom(Interval::new(0.0, 10.0)).unwrap();
    let ab = cn.add_equality(a, b).unwrap();
    let bc = cn.add_equality(b, c).unwrap();
    cn.contract(false).unwrap();

    cn.set_value(c, Interval::new(0.0, 1.0)).unwrap();
    assert_eq!(cn.queued(), [bc]);
    cn.set_value(a, Interval::new(0.0, 1.0)).unwrap();
    assert_eq!(cn.queued(), [ab, bc]);
}

#[test]
fn test_second_contract_does_nothing() {
    let mut cn = ContractorNetwork::new();
    let a = cn.create_dom(Interval::new(0.0, 1.0)).unwrap();
    let b = cn.create_dom(Interval::new(-1.0, 1.0)).unwrap();
    let c = cn.create_dom(Interval::new(1.5, 2.0)).unwrap();
    cn.add(&Ctc::new_static(CtcAdd), &[a, b, c]).unwrap();
    cn.contract(false).unwrap();

    let executions = cn.nb_ctc_executions();
    let volumes = all_volumes(&cn);
    cn.contract(false).unwrap();
    assert_eq!(cn.nb_ctc_executions(), executions);
    assert_eq!(all_volumes(&cn), volumes);
    assert_eq!(cn.nb_ctc_in_stack(), 0);
}

#[test]
fn test_volumes_never_increase() {
    let mut cn = ContractorNetwork::new();
    let tdomain = Interval::new(0.0, 6.0);
    let x = cn.create_dom(Tube::new(tdomain, 0.5, Interval::ALL_REALS)).unwrap();
    let v = cn.create_dom(Tube::new(tdomain, 0.5, Interval::new(-1.0, 1.0))).unwrap();
    cn.add(&Ctc::new_dynamic(CtcDeriv), &[x, v]).unwrap();

    let mut previous = all_volumes(&cn);
    for t in 0..=6 {
        let t = t as f64;
        cn.add_data(x, t, Interval::new(t.sin() - 0.5, t.sin() + 0.5)).unwrap();
        cn.contract(false).unwrap();
        let volumes = all_volumes(&cn);
        for (before, after) in previous.iter().zip(&volumes) {
            assert!(after <= before, "volume increased from {} to {}", before, after);
        }
        previous = volumes;
    }
}

#[test]
fn test_empty_domain_is_reported() {
    let mut cn = ContractorNetwork::new();
    let a = cn.create_dom(Interval::new(0.0, 1.0)).unwrap();
    let b = cn.create_dom(Interval::new(2.0, 3.0)).unwrap();
    cn.set_name(a, "a").unwrap();
    cn.add_equality(a, b).unwrap();
    let err = cn.contract(false).unwrap_err();
    assert_eq!(
        err,
        CnError::EmptyDomain {
            domain: a,
            name: "a".to_string(),
        }
    );
    assert!(cn.emptiness());
}

#[test]
fn test_type_mismatch_is_reported_at_contraction() {
    let mut cn = ContractorNetwork::new();
    let a = cn.create_dom(Interval::new(0.0, 1.0)).unwrap();
    let b = cn.create_dom(IntervalVector::new(2, Interval::new(0.0, 1.0))).unwrap();
    cn.add_equality(a, b).unwrap();
    let err = cn.contract(false).unwrap_err();
    assert!(matches!(err, CnError::DomainTypeMismatch { .. }));
}

#[test]
fn test_dynamic_signature_mismatch() {
    let mut cn = ContractorNetwork::new();
    let x = cn
        .create_dom(Tube::new(Interval::new(0.0, 3.0), 1.0, Interval::ALL_REALS))
        .unwrap();
    let slices: Vec<DomainId> = (0..3).map(|k| cn.slice_domain(x, k).unwrap()).collect();
    let deriv = Ctc::new_dynamic(CtcDeriv);
    cn.add(&deriv, &slices).unwrap();
    cn.set_ctc_name(&deriv, "d/dt");

    let err = cn.contract(false).unwrap_err();
    assert_eq!(
        err,
        CnError::DomainTypeMismatch {
            contractor: "d/dt".to_string(),
            found: vec![DomainType::Slice; 3],
            expected: "(Slice, Slice)".to_string(),
        }
    );
}

#[test]
fn test_scalar_sum() {
    let mut cn = ContractorNetwork::new();
    let x = cn.create_dom(Interval::new(0.0, 1.0)).unwrap();
    let y = cn.create_dom(Interval::new(-2.0, 3.0)).unwrap();
    let a = cn.create_dom(Interval::new(1.0, 20.0)).unwrap();
    cn.add(&Ctc::new_static(CtcAdd), &[x, y, a]).unwrap();
    cn.contract(false).unwrap();
    assert_eq!(cn.interval(x).unwrap(), Interval::new(0.0, 1.0));
    assert_eq!(cn.interval(y).unwrap(), Interval::new(0.0, 3.0));
    assert_eq!(cn.interval(a).unwrap(), Interval::new(1.0, 4.0));
}

#[test]
fn test_stacked_vectors() {
    let mut cn = ContractorNetwork::new();
    let a = cn.create_dom(IntervalVector::from([(0.0, 1.0), (0.0, 1.0)])).unwrap();
    let b = cn.create_dom(IntervalVector::from([(-1.0, 1.0), (0.0, 0.0)])).unwrap();
    let c = cn
        .create_dom(IntervalVector::from([(1.5, 2.0), (f64::NEG_INFINITY, f64::INFINITY)]))
        .unwrap();
    cn.add(&Ctc::new_static(CtcAdd), &[a, b, c]).unwrap();
    cn.contract(false).unwrap();
    assert_eq!(cn.interval_vector(a).unwrap(), IntervalVector::from([(0.5, 1.0), (0.0, 1.0)]));
    assert_eq!(cn.interval_vector(b).unwrap(), IntervalVector::from([(0.5, 1.0), (0.0, 0.0)]));
    assert_eq!(cn.interval_vector(c).unwrap(), IntervalVector::from([(1.5, 2.0), (0.0, 1.0)]));
}

#[test]
fn test_vector_components_in_other_contractors() {
    let mut cn = ContractorNetwork::new();
    let a = cn.create_dom(IntervalVector::new(2, Interval::new(0.0, 1.0))).unwrap();
    let b = cn.create_dom(IntervalVector::new(2, Interval::new(-1.0, 1.0))).unwrap();
    let c = cn.create_dom(IntervalVector::new(2, Interval::new(1.5, 2.0))).unwrap();
    let d = cn.create_dom(IntervalVector::new(2, Interval::point(0.0))).unwrap();
    let e = cn.create_dom(IntervalVector::new(2, Interval::ALL_REALS)).unwrap();

    // the vector contractor runs first, the scalar one then narrows b[0]
    let plus = Ctc::new_static(CtcAdd);
    cn.add(&plus, &[b, d, e]).unwrap();
    let a0 = cn.component(a, 0).unwrap();
    let b0 = cn.component(b, 0).unwrap();
    let c0 = cn.component(c, 0).unwrap();
    cn.add(&plus, &[a0, b0, c0]).unwrap();
    cn.contract(false).unwrap();

    assert_eq!(cn.interval(a0).unwrap(), Interval::new(0.5, 1.0));
    assert_eq!(cn.interval(b0).unwrap(), Interval::new(0.5, 1.0));
    assert_eq!(cn.interval(c0).unwrap(), Interval::new(1.5, 2.0));
    assert_eq!(cn.interval_vector(d).unwrap()[0], Interval::point(0.0));
    assert_eq!(cn.interval_vector(e).unwrap()[0], Interval::new(0.5, 1.0));
}

#[test]
fn test_heterogeneous_domains() {
    let mut cn = ContractorNetwork::new();
    let a = cn.create_dom(Interval::new(0.0, 1.0)).unwrap();
    let v = cn.create_dom(IntervalVector::from([(-1.0, 1.0), (1.5, 2.0)])).unwrap();
    cn.add(&Ctc::new_static(CtcAdd), &[a, v]).unwrap();
    cn.contract(false).unwrap();
    assert_eq!(cn.interval(a).unwrap(), Interval::new(0.5, 1.0));
    assert_eq!(cn.interval_vector(v).unwrap(), IntervalVector::from([(0.5, 1.0), (1.5, 2.0)]));
}

#[test]
fn test_slicewise_derivative_structure() {
    let mut cn = ContractorNetwork::new();
    let tdomain = Interval::new(0.0, 20.0);
    let x = cn.create_dom(Tube::new(tdomain, 5.0, Interval::ALL_REALS)).unwrap();
    let v = cn.create_dom(Tube::new(tdomain, 5.0, Interval::ALL_REALS)).unwrap();
    let deriv = Ctc::new_dynamic(CtcDeriv);
    cn.add(&deriv, &[x, v]).unwrap();
    assert_eq!(cn.nb_dom(), 10);
    assert_eq!(cn.nb_ctc(), 12);

    cn.add(&deriv, &[x, v]).unwrap();
    assert_eq!(cn.nb_dom(), 10);
    assert_eq!(cn.nb_ctc(), 12);

    let s0 = cn.slice_domain(x, 0).unwrap();
    // tube-slices link, adjacent pair, derivative
    assert_eq!(cn.domain(s0).unwrap().contractors().len(), 3);
}

#[test]
fn test_contract_during_reports_elapsed_time() {
    let (mut cn, _, _) = halving_network(0.0);
    cn.trigger_all_contractors();
    let elapsed = cn.contract_during(std::time::Duration::from_secs(10), true).unwrap();
    assert!(elapsed >= 0.0);
    assert_eq!(cn.nb_ctc_in_stack(), 0);
}

/// `b = v[1]`, over an interval `b` and a vector `v`.
struct CopyToSecond;

impl DynCtc for CopyToSecond {
    fn contract(&self, domains: &mut [DomainValue]) -> Result<(), CnError> {
        let [DomainValue::Interval(b), DomainValue::IntervalVector(v)] = domains else {
            return Err(CnError::InvalidArgument {
                context: "copy",
                reason: "expected an interval and a vector".to_string(),
            });
        };
        v[1] &= *b;
        *b &= v[1];
        Ok(())
    }
}

#[test]
fn test_vector_with_degenerate_component_keeps_propagating() {
    let mut cn = ContractorNetwork::new();
    let v = cn.create_dom(IntervalVector::from([(0.0, 0.0), (0.0, 10.0)])).unwrap();
    let b = cn.create_dom(Interval::new(0.0, 10.0)).unwrap();
    let a = cn.create_dom(Interval::new(0.0, 10.0)).unwrap();
    cn.add(&Ctc::new_dynamic(CopyToSecond), &[b, v]).unwrap();
    let v1 = cn.component(v, 1).unwrap();
    cn.add_equality(v1, a).unwrap();
    cn.contract(false).unwrap();

    // from the vector down to its component
    cn.set_value(b, Interval::new(2.0, 3.0)).unwrap();
    cn.contract(false).unwrap();
    assert_eq!(cn.interval_vector(v).unwrap(), IntervalVector::from([(0.0, 0.0), (2.0, 3.0)]));
    assert_eq!(cn.interval(a).unwrap(), Interval::new(2.0, 3.0));

    // from the component up to the vector
    cn.set_value(a, Interval::new(2.5, 3.0)).unwrap();
    cn.contract(false).unwrap();
    assert_eq!(cn.interval(v1).unwrap(), Interval::new(2.5, 3.0));
    assert_eq!(cn.interval(b).unwrap(), Interval::new(2.5, 3.0));
    assert_eq!(cn.nb_ctc_in_stack(), 0);
}

#[test]
fn test_degenerate_vector_in_ordered_mode() {
    let mut cn = ContractorNetwork::new();
    let v = cn.create_dom(IntervalVector::from([(0.0, 0.0), (0.0, 10.0)])).unwrap();
    let b = cn.create_dom(Interval::new(2.0, 3.0)).unwrap();
    let a = cn.create_dom(Interval::new(0.0, 10.0)).unwrap();
    cn.add(&Ctc::new_dynamic(CopyToSecond), &[b, v]).unwrap();
    let v1 = cn.component(v, 1).unwrap();
    cn.add_equality(v1, a).unwrap();
    cn.contract_ordered_mode(false).unwrap();
    assert_eq!(cn.interval(a).unwrap(), Interval::new(2.0, 3.0));
}

#[test]
fn test_add_data_vector() {
    let mut cn = ContractorNetwork::new();
    let codomain = IntervalVector::new(2, Interval::new(-10.0, 10.0));
    let x = cn.create_dom(TubeVector::new(Interval::new(0.0, 2.0), 1.0, &codomain)).unwrap();

    cn.add_data_vector(x, 0.0, &IntervalVector::from([(0.0, 1.0), (5.0, 6.0)])).unwrap();
    cn.add_data_vector(x, 1.0, &IntervalVector::from([(1.0, 2.0), (6.0, 7.0)])).unwrap();

    let x0 = cn.tube(cn.component(x, 0).unwrap()).unwrap();
    let x1 = cn.tube(cn.component(x, 1).unwrap()).unwrap();
    assert_eq!(x0.slice(0).unwrap().codomain(), Interval::new(0.0, 2.0));
    assert_eq!(x1.slice(0).unwrap().codomain(), Interval::new(5.0, 7.0));
    assert_eq!(x0.slice(1).unwrap().codomain(), Interval::new(-10.0, 10.0));

    // the vector sees the narrowed components
    let tv = cn.tube_vector(x).unwrap();
    assert_eq!(tv.iter().next().unwrap().slice(0).unwrap().codomain(), Interval::new(0.0, 2.0));

    let wrong = IntervalVector::new(3, Interval::new(0.0, 1.0));
    assert!(cn.add_data_vector(x, 2.0, &wrong).is_err());
}

#[test]
fn test_equality_of_two_tubes() {
    let mut cn = ContractorNetwork::new();
    let tdomain = Interval::new(0.0, 3.0);
    let x = cn.create_dom(Tube::new(tdomain, 1.0, Interval::new(0.0, 10.0))).unwrap();
    let y = cn.create_dom(Tube::new(tdomain, 1.0, Interval::new(5.0, 20.0))).unwrap();
    cn.add_equality(x, y).unwrap();
    cn.contract(false).unwrap();

    for tube in [cn.tube(x).unwrap(), cn.tube(y).unwrap()] {
        assert!(tube.slices().all(|s| s.codomain() == Interval::new(5.0, 10.0)));
        assert!(tube.gates().iter().all(|g| *g == Interval::new(5.0, 10.0)));
    }
    let s2 = cn.slice_domain(y, 2).unwrap();
    assert_eq!(cn.slice(s2).unwrap().codomain(), Interval::new(5.0, 10.0));
}

struct Noop(&'static str);

impl DynCtc for Noop {
    fn contract(&self, _domains: &mut [DomainValue]) -> Result<(), CnError> {
        Ok(())
    }
    fn name(&self) -> &str {
        self.0
    }
}

#[test]
fn test_propagate_ctc_from_domain_skips_avoided() {
    let mut cn = ContractorNetwork::new();
    let x = cn
        .create_dom(Tube::new(Interval::new(0.0, 2.0), 1.0, Interval::new(-10.0, 10.0)))
        .unwrap();
    cn.add(&Ctc::new_dynamic(Noop("p")), &[x]).unwrap();
    cn.add(&Ctc::new_dynamic(Noop("q")), &[x]).unwrap();
    let users: Vec<CtcId> = cn
        .contractor_ids()
        .filter(|&c| cn.contractor(c).unwrap().kind() == ContractorKind::Dynamic)
        .collect();
    let [p, q] = users[..] else {
        panic!("two dynamic contractors expected, got {:?}", users);
    };
    cn.contract(false).unwrap();

    // narrows a slice, the tube itself is not flagged yet
    cn.add_data(x, 0.0, Interval::new(0.0, 1.0)).unwrap();
    cn.add_data(x, 1.0, Interval::new(1.0, 2.0)).unwrap();
    assert!(!cn.queued().contains(&q));

    cn.propagate_ctc_from_domain(x, Some(p)).unwrap();
    assert!(cn.queued().contains(&q));
    assert!(!cn.queued().contains(&p));
    assert!(!cn.contractor(p).unwrap().is_active());

    // nothing shrank since
    let queued = cn.queued();
    cn.propagate_ctc_from_domain(x, None).unwrap();
    assert_eq!(cn.queued(), queued);

    assert_eq!(
        cn.propagate_ctc_from_domain(DomainId::from_index(999), None).unwrap_err(),
        CnError::UnknownDomain(DomainId::from_index(999))
    );
}

#[test]
fn test_set_all_contractors_active() {
    let mut cn = ContractorNetwork::new();
    let v = cn.create_dom(IntervalVector::new(2, Interval::new(0.0, 10.0))).unwrap();
    let a = cn.create_dom(Interval::new(0.0, 10.0)).unwrap();
    let v0 = cn.component(v, 0).unwrap();
    cn.add(&Ctc::new_static(CtcBox::new(IntervalVector::new(2, Interval::new(1.0, 9.0)))), &[v])
        .unwrap();
    cn.add_equality(v0, a).unwrap();
    cn.contract(false).unwrap();
    assert_eq!(cn.nb_ctc_in_stack(), 0);

    cn.set_all_contractors_active();
    assert_eq!(cn.nb_ctc_in_stack(), 2);
    for c in cn.contractor_ids() {
        let ctc = cn.contractor(c).unwrap();
        assert_eq!(ctc.is_active(), ctc.kind() != ContractorKind::Component, "{}", ctc.display_name());
    }

    let executions = cn.nb_ctc_executions();
    cn.contract(false).unwrap();
    assert!(cn.nb_ctc_executions() >= executions + 2);
    assert_eq!(cn.interval(a).unwrap(), Interval::new(1.0, 9.0));
}
