use mc_core::{Condition, ThermoConditions};
use proptest::prelude::*;

proptest! {
    #[test]
    fn stepping_never_overshoots_final(
        start in -50i32..50,
        span in 0u32..200,
        step in 1u32..40,
    ) {
        let initial = start as f64;
        let final_value = initial + span as f64;
        let increment = step as f64;
        let count = final_value.difference(&initial).whole_increments(&increment);
        prop_assert_eq!(count, (span / step) as usize);

        let mut current = initial;
        for _ in 0..count {
            current.increment_by(&increment);
        }
        prop_assert!(current <= final_value + 1e-9);
        prop_assert!(current + increment > final_value);
    }
}

#[test]
fn thermo_conditions_round_trip_json() {
    let conditions = ThermoConditions::new(2.25, -0.5);
    let json = serde_json::to_string(&conditions).expect("serialize");
    let decoded: ThermoConditions = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, conditions);

    let defaulted: ThermoConditions =
        serde_json::from_str(r#"{"temperature": 1.5}"#).expect("field defaults");
    assert_eq!(defaulted.field, 0.0);
}
