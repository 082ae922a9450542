//! JSON conversion-and-validation engine.
//!
//! Parses JSON literals into a richly-typed, immutable parse tree and
//! validates that tree against a declarative table of structural/semantic
//! constraints, with locatable diagnostics.
//!
//! - [`codec`]: byte-level JSON string escaping (standalone encode/decode)
//! - [`convert`]: numeric classifier and string/bool/null converters
//! - [`node`]: the arena parse-tree the converters populate
//! - [`walk`]: generic pre-order traversal
//! - [`semantic`]: rule-table validation and typed member accessors
//! - [`table`]: semantic-table serialization and generation
//! - [`grammar`]: recursive-descent parser driving the node constructors
//! - [`query`], [`cli`]: jq filtering and the command-line front end

pub mod cli;
pub mod codec;
pub mod convert;
pub mod error;
pub mod grammar;
pub mod node;
pub mod query;
pub mod semantic;
pub mod table;
pub mod walk;
