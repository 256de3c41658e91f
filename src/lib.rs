//! Conditional form configuration.
//!
//! Rules pair a condition tree with actions that rewrite a form definition,
//! its presentation definition and the form data. [`RulesRunner`] applies
//! them repeatedly until the facts stop changing.
//!
//! ```
//! use form_rules::{entity_facts, Action, Rule, RulesRunner};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let runner = RulesRunner::builder(
//!     json!({ "properties": { "age": {}, "guardianName": {} } }),
//!     json!({}),
//! )
//! .rule(
//!     Rule::new(json!({ "less": 18 }), Action::new("require", json!({ "field": "guardianName" })))
//!         .with_field("entity.age"),
//! )
//! .build()
//! .unwrap();
//!
//! let conf = runner.recompute(Some(entity_facts(json!({ "age": 15 })))).await.unwrap();
//! assert_eq!(conf.form_def["required"], json!(["guardianName"]));
//! # }
//! ```

mod actions;
mod engine;
mod error;
mod evaluate;
pub mod locate;
mod order;
pub mod parse;
mod runner;
mod session;
mod types;

pub use actions::{ActionHandler, ActionRegistry, BuiltinAction};
pub use engine::{EngineOptions, EngineOutput, MatchEngine, RuleEngine};
pub use error::FormRulesError;
pub use evaluate::{Combinator, Evaluator};
pub use order::order_rules;
pub use runner::{Conf, RulesRunner, RulesRunnerBuilder, RunError, RunnerOptions};
pub use session::{FormSession, SessionUpdate};
pub use types::{
    entity_facts, sanitize_facts, Action, ActionError, Builtin, ConditionError, EngineError,
    ErrorMode, Facts, FieldPath, NestedTable, OneOrMany, PathError, Polarity, PredicateEntry,
    PredicateFn, PredicateTable, Projection, Rule, Scope, Segment, ENTITY,
};
