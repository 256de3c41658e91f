use std::sync::Arc;

use form_rules::{
    Combinator, ConditionError, ErrorMode, Evaluator, PredicateTable, Projection,
};
use serde_json::{json, Value};

fn dev(table: &PredicateTable) -> Evaluator<'_> {
    Evaluator::new(table).mode(ErrorMode::Development)
}

#[test]
fn or_of_equals() {
    let table = PredicateTable::builtin();
    let cond = json!({ "or": [{ "equals": "a" }, { "equals": "b" }] });
    assert!(dev(&table).check(&json!("b"), &cond).unwrap());
    assert!(!dev(&table).check(&json!("c"), &cond).unwrap());
}

#[test]
fn range_with_aliases() {
    let table = PredicateTable::builtin();
    let cond = json!({ "greaterThanOrEqual": 18, "lessThan": 65 });
    assert!(dev(&table).check(&json!(18), &cond).unwrap());
    assert!(!dev(&table).check(&json!(65), &cond).unwrap());
    assert!(!dev(&table).check(&json!("forty"), &cond).unwrap());
}

#[test]
fn not_negates_each_leaf() {
    let table = PredicateTable::builtin();
    // Both leaves flip: neither "greater than 1" nor "less than 10" may hold.
    let cond = json!({ "not": { "greater": 1, "less": 10 } });
    assert!(!dev(&table).check(&json!(5), &cond).unwrap());
    assert!(!dev(&table).check(&json!(0), &cond).unwrap());
    assert!(dev(&table).check(&json!(0), &json!({ "not": { "greater": 1 } })).unwrap());
}

#[test]
fn length_composes_with_not() {
    let table = PredicateTable::builtin();
    let cond = json!({ "length": { "not": { "greater": 3 } } });
    assert!(dev(&table).check(&json!("abc"), &cond).unwrap());
    assert!(!dev(&table).check(&json!("abcd"), &cond).unwrap());
    assert!(dev(&table).check(&json!([1, 2]), &cond).unwrap());
}

#[test]
fn or_inside_composing_key() {
    let table = PredicateTable::builtin();
    let cond = json!({ "length": { "or": [{ "equal": 2 }, { "greater": 5 }] } });
    assert!(dev(&table).check(&json!("ab"), &cond).unwrap());
    assert!(!dev(&table).check(&json!("abc"), &cond).unwrap());
    assert!(dev(&table).check(&json!([1, 2, 3, 4, 5, 6]), &cond).unwrap());
    assert!(!dev(&table).check(&json!(7), &cond).unwrap());

    let negated = json!({ "not": cond });
    assert!(!dev(&table).check(&json!("ab"), &negated).unwrap());
    assert!(dev(&table).check(&json!("abc"), &negated).unwrap());
}

#[test]
fn custom_predicate_and_table() {
    let words: Projection = Arc::new(|v: &Value| {
        Value::from(v.as_str().map_or(0, |s| s.split_whitespace().count()))
    });
    let table = PredicateTable::builtin()
        .predicate(
            "adult",
            Arc::new(|v: &Value, _: Option<&Value>| v.as_i64().is_some_and(|n| n >= 18)),
        )
        .table("words", PredicateTable::builtin(), Some(words));

    let eval = dev(&table);
    assert!(eval.check(&json!(30), &json!("adult")).unwrap());
    assert!(eval.check(&json!(12), &json!({ "not": "adult" })).unwrap());
    assert!(eval
        .check(&json!("one two three"), &json!({ "words": { "equal": 3 } }))
        .unwrap());
}

#[test]
fn some_combinator_at_root() {
    let table = PredicateTable::builtin();
    let scope = form_rules::Scope::positive(&table);
    let cond = json!({ "equal": 1, "greater": 100 });
    assert!(dev(&table)
        .check_in(&json!(1), &cond, scope, Combinator::Some)
        .unwrap());
    assert!(!dev(&table)
        .check_in(&json!(1), &cond, scope, Combinator::Every)
        .unwrap());
}

#[test]
fn unknown_predicate_propagates_in_every_mode() {
    let table = PredicateTable::builtin();
    for mode in [ErrorMode::Development, ErrorMode::Production] {
        let err = Evaluator::new(&table)
            .mode(mode)
            .check(&json!(1), &json!("enormous"))
            .unwrap_err();
        assert_eq!(
            err,
            ConditionError::UnknownPredicate {
                name: "enormous".into()
            }
        );
    }
}

#[test]
fn malformed_or_depends_on_mode() {
    let table = PredicateTable::builtin();
    let cond = json!({ "or": { "equal": 1 } });

    let err = dev(&table).check(&json!(1), &cond).unwrap_err();
    assert!(matches!(err, ConditionError::Malformed { .. }));

    let prod = Evaluator::new(&table).mode(ErrorMode::Production);
    assert!(!prod.check(&json!(1), &cond).unwrap());
}

#[test]
fn object_argument_on_leaf_is_rejected() {
    let table = PredicateTable::builtin();
    let err = dev(&table)
        .check(&json!(1), &json!({ "equal": { "greater": 0 } }))
        .unwrap_err();
    assert_eq!(err, ConditionError::NotATable { name: "equal".into() });
}

#[test]
fn apply_when_with_and_or() {
    let table = PredicateTable::builtin();
    let facts = json!({ "age": 15, "country": "NO", "consent": false });
    let when = json!({
        "age": { "less": 18 },
        "or": { "country": { "equal": "SE" }, "consent": "falsey" }
    });
    assert!(dev(&table).apply_when(&when, &facts, Combinator::Every).unwrap());

    let strict = json!({ "and": { "age": { "less": 18 }, "country": { "equal": "SE" } } });
    assert!(!dev(&table).apply_when(&strict, &facts, Combinator::Every).unwrap());
}

#[test]
fn apply_when_missing_fact_is_null() {
    let table = PredicateTable::builtin();
    let facts = json!({});
    assert!(dev(&table)
        .apply_when(&json!({ "nickname": "empty" }), &facts, Combinator::Every)
        .unwrap());
}

#[test]
fn apply_when_rejects_non_object() {
    let table = PredicateTable::builtin();
    let err = dev(&table)
        .apply_when(&json!("empty"), &json!({}), Combinator::Every)
        .unwrap_err();
    assert!(matches!(err, ConditionError::Malformed { .. }));
}

#[test]
fn field_to_actions_collects_firing_rules() {
    let table = PredicateTable::builtin();
    let rules = json!({
        "guardianName": { "when": { "age": { "less": 18 } }, "action": "require" },
        "email": [
            { "when": { "age": { "less": 18 } }, "action": "remove" },
            { "when": { "newsletter": "truthy" }, "action": "require" }
        ],
        "pension": { "when": { "age": { "greater": 64 } }, "action": "require" }
    });
    let fired = dev(&table)
        .field_to_actions(&rules, &json!({ "age": 15, "newsletter": true }))
        .unwrap();

    assert_eq!(fired["guardianName"], vec![json!("require")]);
    assert_eq!(fired["email"], vec![json!("remove"), json!("require")]);
    assert!(!fired.contains_key("pension"));
}
