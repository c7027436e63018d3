//! AST module
//!
//! Type definitions for the drun abstract syntax tree.

pub mod types;

pub use types::*;
