//! Property tests over random configurations.

mod common;

use compartment_core::{
    config::SimConfig,
    models::{ModelKind, INFECTION_RATE, RECOVERY_RATE},
    rounding::RoundingPolicy,
};
use proptest::prelude::*;

fn policy() -> impl Strategy<Value = RoundingPolicy> {
    prop_oneof![
        Just(RoundingPolicy::Exact),
        Just(RoundingPolicy::Nearest),
        Just(RoundingPolicy::Truncate),
    ]
}

fn kind() -> impl Strategy<Value = ModelKind> {
    prop_oneof![Just(ModelKind::Sir), Just(ModelKind::Influenza), Just(ModelKind::Sqeir)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn no_compartment_is_ever_negative(
        kind in kind(),
        susceptible in 0.0f64..1_000_000.0,
        infected in 0.0f64..10_000.0,
        beta in 0.0f64..3.0,
        gamma in 0.0f64..3.0,
        rounding in policy(),
    ) {
        let mut config = SimConfig::for_model(kind).unwrap();
        config.set_initial("Susceptible", susceptible).unwrap();
        config.set_initial("Infected", infected).unwrap();
        config.set_rate(INFECTION_RATE, beta).unwrap();
        config.set_rate(RECOVERY_RATE, gamma).unwrap();
        config.rounding = rounding;

        for snap in common::run_config(&config) {
            for c in &snap.compartments {
                prop_assert!(c.value >= 0.0, "{} = {}", c.name, c.value);
            }
        }
    }

    #[test]
    fn run_length_is_twelve_steps_per_year(start in 1900i32..2100, years in 0i32..4) {
        let mut config = SimConfig::for_model(ModelKind::Sir).unwrap();
        config.start_year = start;
        config.end_year = start + years;
        let snapshots = common::run_config(&config);
        prop_assert_eq!(snapshots.len(), 12 * years as usize);
        for pair in snapshots.windows(2) {
            prop_assert_eq!(pair[1].months_elapsed, pair[0].months_elapsed + 1);
        }
    }
}
