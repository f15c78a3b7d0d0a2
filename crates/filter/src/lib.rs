//! Service filter expressions.
//!
//! Filters are the boolean dialect used to select registrations by their properties:
//! `(&(component.name=Run1)(key=value))`. This crate parses them into a [`Filter`] tree,
//! evaluates that tree against a [`Properties`](sift_primitives::Properties) bag, and
//! composes filter strings from selection inputs.

/// Filter syntax tree and property matching.
pub mod ast;
/// Filter composition from names, property clauses and raw fragments.
pub mod compose;
/// Recursive descent filter parser.
pub mod parser;

pub use ast::Filter;
pub use compose::{compose, escape_value, type_filter};
pub use parser::{ParseError, parse};
