//! Contract-level properties of the domain types.

use qgate_domain::error_codes::{self, REGISTRY};
use qgate_domain::{
    build_result, recommendation_quick_map, CheckStatus, FailureClass, ValidationError,
};
use std::collections::HashSet;

// ---- Failure class map ----

#[test]
fn every_failure_class_has_exactly_one_recommendation() {
    let mut ids = HashSet::new();
    for class in FailureClass::ALL {
        let id = class.recommendation_id();
        assert!(id.starts_with("QG-"), "{} -> {}", class, id);
        assert!(ids.insert(id), "recommendation {} reused", id);
        assert_eq!(FailureClass::from_recommendation_id(id), Some(class));
    }
    assert_eq!(ids.len(), FailureClass::ALL.len());
}

#[test]
fn quick_map_lists_every_class_in_id_order() {
    let map = recommendation_quick_map();
    assert!(map.starts_with("QG-001 infra_artifact | QG-002 inconsistent_state"));
    assert!(map.ends_with("QG-009 config_contract"));
    assert_eq!(map.split(" | ").count(), 9);
}

// ---- Status precedence ----

#[test]
fn overall_status_precedence_holds_for_all_small_counts() {
    for fail in 0..4 {
        for warning in 0..4 {
            let expected = if fail > 0 {
                CheckStatus::Fail
            } else if warning > 0 {
                CheckStatus::Warning
            } else {
                CheckStatus::Pass
            };
            assert_eq!(CheckStatus::from_counts(fail, warning), expected);
        }
    }
}

// ---- Validator output ----

#[test]
fn validator_output_ok_iff_no_errors() {
    for n in 0..4 {
        let errors = (0..n)
            .map(|i| ValidationError::new("C", format!("f{}", i), "m"))
            .collect();
        let result = build_result(None, errors);
        assert_eq!(result.ok, result.error_count == 0);
        assert_eq!(result.error_count, result.errors.len());
    }
}

#[test]
fn registry_codes_resolve_through_typed_constants() {
    let policy = error_codes::namespace("errorCodesPolicy").expect("namespace");
    assert_eq!(
        policy.code("DUPLICATE_VALUE"),
        Some(error_codes::error_codes_policy::DUPLICATE_VALUE)
    );
    assert_eq!(REGISTRY.first().map(|ns| ns.name), Some("common"));
}
