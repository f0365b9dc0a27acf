//! # Direct_DFA
//!
//! `direct_dfa` crate compiles regexes into minimal DFAs without the NFA
//! detour. The followpos table of an annotated syntax tree drives a subset
//! construction over leaf positions; a partition-refinement pass then
//! collapses the automaton to its minimal form.

pub mod dfa;
pub mod dot;
pub mod error;
pub mod minimized_dfa;
pub mod parser;
pub mod preprocess;
pub mod symbol;
pub mod syntax_tree;

pub use dfa::DirectDFA;
pub use error::{Error, Result};
pub use minimized_dfa::MinimizedDFA;
pub use symbol::{Symbol, SymbolKind};
pub use syntax_tree::SyntaxTree;
