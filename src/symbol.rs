//! Symbols making up postfix expressions and automaton alphabets.

use std::fmt;

/// The empty-string operand. Carries no position in the annotated tree.
pub const EPSILON: char = 'ε';
/// Synthetic terminal appended to every expression before construction.
pub const END_MARKER: char = '☒';
/// Marker the preprocessor puts in front of an escaped literal.
pub const ESCAPE_MARKER: char = '§';

pub const CONCAT: char = '·';
pub const UNION: char = '|';
pub const STAR: char = '*';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Operand,
    Operator,
    EndMarker,
}

/// An immutable (name, kind) pair. Operand names are single characters,
/// operator names are the glyphs above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    name: char,
    kind: SymbolKind,
}

impl Symbol {
    pub fn operand(name: char) -> Self {
        Self {
            name,
            kind: SymbolKind::Operand,
        }
    }

    pub fn operator(name: char) -> Self {
        Self {
            name,
            kind: SymbolKind::Operator,
        }
    }

    pub fn epsilon() -> Self {
        Self::operand(EPSILON)
    }

    pub fn end_marker() -> Self {
        Self {
            name: END_MARKER,
            kind: SymbolKind::EndMarker,
        }
    }

    pub fn name(&self) -> char {
        self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn is_operand(&self) -> bool {
        self.kind == SymbolKind::Operand
    }

    pub fn is_operator(&self) -> bool {
        self.kind == SymbolKind::Operator
    }

    pub fn is_epsilon(&self) -> bool {
        self.kind == SymbolKind::Operand && self.name == EPSILON
    }

    pub fn is_end_marker(&self) -> bool {
        self.kind == SymbolKind::EndMarker
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
