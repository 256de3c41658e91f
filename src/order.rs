use std::cmp::Ordering;

use crate::Rule;

/// Order rules for registration with an engine.
///
/// Stable ascending sort by `order`. Rules without an order come after every
/// ordered rule; ties and unordered rules keep their input order. The result
/// is the order in which an engine emits events within one round.
#[must_use]
pub fn order_rules(mut rules: Vec<Rule>) -> Vec<Rule> {
    rules.sort_by(|a, b| compare_order(a.order, b.order));
    rules
}

fn compare_order(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Action;
    use serde_json::json;

    fn rule(tag: &str, order: Option<f64>) -> Rule {
        let rule = Rule::new(json!({}), Action::new(tag, json!({})));
        match order {
            Some(o) => rule.with_order(o),
            None => rule,
        }
    }

    fn tags(rules: &[Rule]) -> Vec<&str> {
        rules
            .iter()
            .map(|r| r.actions().next().map_or("", |a| a.kind.as_str()))
            .collect()
    }

    #[test]
    fn unordered_rules_go_last() {
        let ordered = order_rules(vec![
            rule("two", Some(2.0)),
            rule("none", None),
            rule("one", Some(1.0)),
        ]);
        assert_eq!(tags(&ordered), vec!["one", "two", "none"]);
    }

    #[test]
    fn stable_among_peers() {
        let ordered = order_rules(vec![
            rule("a", None),
            rule("b", Some(1.0)),
            rule("c", None),
            rule("d", Some(1.0)),
            rule("e", Some(0.5)),
        ]);
        assert_eq!(tags(&ordered), vec!["e", "b", "d", "a", "c"]);
    }

    #[test]
    fn negative_orders_sort_first() {
        let ordered = order_rules(vec![rule("zero", Some(0.0)), rule("neg", Some(-3.0))]);
        assert_eq!(tags(&ordered), vec!["neg", "zero"]);
    }

    #[test]
    fn signed_zeros_are_peers() {
        let ordered = order_rules(vec![
            rule("pos", Some(0.0)),
            rule("neg", Some(-0.0)),
            rule("first", Some(-1.0)),
        ]);
        assert_eq!(tags(&ordered), vec!["first", "pos", "neg"]);
    }

    #[test]
    fn empty_input() {
        assert!(order_rules(Vec::new()).is_empty());
    }
}
