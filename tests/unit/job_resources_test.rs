//! Tests for the domination partial order

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scheduler_resource_tree::core::{dominates, JobResources, ResourceKind};

fn random_vector(rng: &mut StdRng) -> JobResources {
    let mut value = JobResources::zero();
    for kind in ResourceKind::ALL {
        // A narrow range makes equal and comparable pairs common.
        value.set(kind, rng.random_range(0..3));
    }
    value
}

#[test]
fn test_domination_is_reflexive() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..500 {
        let a = random_vector(&mut rng);
        assert!(dominates(&a, &a));
    }
}

#[test]
fn test_domination_is_antisymmetric() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..5000 {
        let a = random_vector(&mut rng);
        let b = random_vector(&mut rng);
        if dominates(&a, &b) && dominates(&b, &a) {
            assert_eq!(a, b);
        }
    }
}

#[test]
fn test_domination_is_transitive() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..5000 {
        let a = random_vector(&mut rng);
        let b = random_vector(&mut rng);
        let c = random_vector(&mut rng);
        if dominates(&a, &b) && dominates(&b, &c) {
            assert!(dominates(&a, &c));
        }
    }
}

#[test]
fn test_sum_dominates_parts() {
    let mut rng = StdRng::seed_from_u64(4);
    for _ in 0..500 {
        let a = random_vector(&mut rng);
        let b = random_vector(&mut rng);
        assert!(dominates(&(a + b), &a));
        assert!(dominates(&a.max(b), &b));
        assert!(dominates(&a, &a.min(b)));
        assert_eq!(a + b - b, a);
    }
}
