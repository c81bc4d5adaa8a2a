//! # Ferrule
//!
//! **A forward-chaining business rule engine**
//!
//! Rules are written in a small language of condition/action pairs with a
//! salience priority, compiled once into a versioned library, and executed
//! against caller-owned facts until no rule matches any more.
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrule::{impl_fact, DataContext, Engine, FerruleResult, KnowledgeLibrary};
//!
//! #[derive(Default)]
//! struct Item {
//!     name: String,
//!     price: i64,
//!     discount: i64,
//! }
//!
//! impl_fact!(Item {
//!     "Name" => name,
//!     "Price" => price,
//!     "Discount" => discount,
//! });
//!
//! fn main() -> FerruleResult<()> {
//!     let mut library = KnowledgeLibrary::new();
//!     library.compile("items", "0.0.1", br#"
//!         rule HondaDiscount "Expensive Hondas get 30% off" salience 10 {
//!             When
//!                 Item.Discount == 0 && Item.Name == "Honda" && Item.Price > 2000
//!             Then
//!                 Log("Item Price:" + Item.Price);
//!                 Item.Discount = 30;
//!         }
//!     "#)?;
//!
//!     let mut kb = library.new_knowledge_base("items", "0.0.1")?;
//!     let mut item = Item { name: "Honda".into(), price: 2300, ..Default::default() };
//!
//!     let mut facts = DataContext::new();
//!     facts.add("Item", &mut item)?;
//!     let report = Engine::with_max_cycles(10).execute(&mut facts, &mut kb)?;
//!     drop(facts);
//!
//!     assert_eq!(report.fired, vec!["HondaDiscount"]);
//!     assert_eq!(item.discount, 30);
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Rules
//! `rule Name "description" salience N { When <condition> Then <actions> }`.
//! Higher salience fires first; equal saliences fire in declaration order.
//!
//! ### Facts
//! Any type implementing [`Fact`] can be bound into a [`DataContext`]:
//! maps, vectors, `serde_json::Value`, or structs via [`impl_fact!`].
//!
//! ### Sessions
//! A [`KnowledgeBase`] holds the per-session activation state of a compiled
//! [`RuleSet`]. `Retract("Rule")` deactivates a rule for the rest of the
//! session, `Complete()` ends the session after the current rule.

pub mod ast;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod host;
pub mod library;
pub mod parser;
pub mod report;
pub mod resource_limits;
pub mod semantic;
pub mod validator;
pub mod value;

pub use ast::Span;
pub use engine::{Engine, DEFAULT_MAX_CYCLES};
pub use error::{ErrorDetails, FerruleError, FerruleResult};
pub use evaluator::context::{DataContext, HostFunction};
pub use host::{arg, expect_arity, Fact, HostError};
pub use library::{KnowledgeBase, KnowledgeLibrary, RuleSet};
pub use parser::parse;
pub use report::{ExecutionReport, Outcome};
pub use resource_limits::ResourceLimits;
pub use semantic::*;
pub use validator::Validator;
pub use value::{FromValue, ToValue, Value};

#[cfg(test)]
mod tests;
