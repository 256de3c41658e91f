
use form_rules::{entity_facts, ConditionError, ErrorMode, Evaluator, Facts, PredicateTable};
use proptest::prelude::*;
use serde_json::{json, Value};
use strategies::{
    arb_condition, arb_entity, arb_field_value, arb_leaf, arb_plain_condition, arb_when,
};

fn check(value: &Value, condition: &Value) -> Result<bool, ConditionError> {
    let table = PredicateTable::builtin();
    Evaluator::new(&table)
        .mode(ErrorMode::Development)
        .check(value, condition)
}

// ---------------------------------------------------------------------------
// Well-formed trees never error
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn well_formed_trees_evaluate(value in arb_field_value(), cond in arb_condition()) {
        prop_assert!(check(&value, &cond).is_ok(), "{cond} errored on {value}");
    }

    #[test]
    fn determinism(value in arb_field_value(), cond in arb_condition()) {
        let first = check(&value, &cond);
        for _ in 0..3 {
            prop_assert_eq!(&first, &check(&value, &cond));
        }
    }
}

// ---------------------------------------------------------------------------
// Polarity
//
// `not` flips every leaf beneath it, so two of them cancel out, and over a
// single leaf it is plain negation.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn double_not_cancels(value in arb_field_value(), cond in arb_condition()) {
        let twice = json!({ "not": { "not": cond.clone() } });
        prop_assert_eq!(check(&value, &twice), check(&value, &cond));
    }

    #[test]
    fn not_over_leaf_negates(value in arb_field_value(), leaf in arb_leaf()) {
        let negated = check(&value, &json!({ "not": leaf.clone() })).unwrap();
        prop_assert_eq!(negated, !check(&value, &leaf).unwrap());
    }
}

// ---------------------------------------------------------------------------
// Disjunction
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn or_is_any(value in arb_field_value(), a in arb_condition(), b in arb_condition()) {
        let either = check(&value, &json!({ "or": [a.clone(), b.clone()] })).unwrap();
        prop_assert_eq!(either, check(&value, &a).unwrap() || check(&value, &b).unwrap());
    }

    #[test]
    fn or_order_independent(value in arb_field_value(), a in arb_condition(), b in arb_condition()) {
        let ab = check(&value, &json!({ "or": [a.clone(), b.clone()] }));
        let ba = check(&value, &json!({ "or": [b, a] }));
        prop_assert_eq!(ab, ba);
    }
}

// ---------------------------------------------------------------------------
// Composition
//
// Under a composing key the subtree sees the projected value, with `or` and
// `not` behaving exactly as they do at the root.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn or_under_length_is_any(
        value in arb_field_value(),
        a in arb_plain_condition(),
        b in arb_plain_condition(),
    ) {
        let length = match &value {
            Value::String(s) => json!(s.chars().count()),
            Value::Array(items) => json!(items.len()),
            _ => Value::Null,
        };
        let nested = check(&value, &json!({ "length": { "or": [a.clone(), b.clone()] } })).unwrap();
        prop_assert_eq!(nested, check(&length, &a).unwrap() || check(&length, &b).unwrap());
    }

    #[test]
    fn not_under_length_cancels(value in arb_field_value(), cond in arb_plain_condition()) {
        let twice = json!({ "length": { "not": { "not": cond.clone() } } });
        prop_assert_eq!(check(&value, &twice), check(&value, &json!({ "length": cond })));
    }
}

// ---------------------------------------------------------------------------
// Top-level conditions are the conjunction of their per-fact checks
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn apply_when_is_conjunction(entity in arb_entity(), when in arb_when()) {
        let table = PredicateTable::builtin();
        let eval = Evaluator::new(&table).mode(ErrorMode::Development);
        let facts: Facts = entity_facts(entity);

        let combined = eval.apply_when_facts(&when, &facts).unwrap();
        let expected = when
            .as_object()
            .unwrap()
            .iter()
            .map(|(path, cond)| {
                let value = form_rules::locate::lookup(&facts, path).cloned().unwrap_or(Value::Null);
                eval.check(&value, cond).unwrap()
            })
            .all(|held| held);
        prop_assert_eq!(combined, expected);
    }
}
