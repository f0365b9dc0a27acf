//! Postfix-to-tree construction with the followpos annotation pass.
//!
//! Every positioned leaf (the appended end marker included) is numbered from
//! 1 in encounter order, which the postfix walk makes a left-to-right
//! post-order traversal. nullable, firstpos and lastpos are computed bottom
//! up while the tree is assembled; Concat and Star contribute their followpos
//! entries at the same time. The finished table drives the subset
//! construction in [`crate::dfa`].

use std::collections::BTreeSet;

use rustc_hash::FxHashMap as HashMap;

use crate::symbol::{self, Symbol, SymbolKind};
use crate::{Error, Result};

pub type Position = u32;
pub type PositionSet = BTreeSet<Position>;

#[derive(Debug, Clone)]
pub enum NodeKind {
    Leaf(Symbol),
    Concat(Box<Node>, Box<Node>),
    Union(Box<Node>, Box<Node>),
    Star(Box<Node>),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Set for positioned leaves only; ε leaves and interior nodes have none.
    pub position: Option<Position>,
    pub nullable: bool,
    pub firstpos: PositionSet,
    pub lastpos: PositionSet,
}

#[derive(Debug, Clone)]
pub struct SyntaxTree {
    root: Node,
    followpos: HashMap<Position, PositionSet>,
    position_symbols: HashMap<Position, Symbol>,
    end_position: Position,
}

impl SyntaxTree {
    /// Builds the annotated tree for a postfix symbol sequence over the
    /// operand alphabet and the operators `·`, `|`, `*`. The end marker is
    /// appended here, as `root = user · ☒`; callers must not include one in
    /// `tokens`.
    pub fn from_postfix(tokens: &[Symbol]) -> Result<Self> {
        let mut builder = TreeBuilder::default();
        let mut stack: Vec<Node> = Vec::new();
        for token in tokens {
            match token.kind() {
                SymbolKind::Operand => stack.push(builder.leaf(*token)),
                SymbolKind::Operator => {
                    let node = builder.apply(token.name(), &mut stack)?;
                    stack.push(node);
                }
                SymbolKind::EndMarker => {
                    return Err(Error::MalformedExpression(
                        "the end marker is appended internally and must not appear in the input"
                            .into(),
                    ))
                }
            }
        }
        let user_root = stack
            .pop()
            .ok_or_else(|| Error::MalformedExpression("empty postfix sequence".into()))?;
        if !stack.is_empty() {
            return Err(Error::MalformedExpression(format!(
                "{} operands left on the stack after the build",
                stack.len() + 1
            )));
        }
        let end_leaf = builder.leaf(Symbol::end_marker());
        let root = builder.concat(user_root, end_leaf);

        // the symbol map must hold exactly one end marker at this point
        let end_position = builder
            .position_symbols
            .iter()
            .find(|(_, s)| s.is_end_marker())
            .map(|(&p, _)| p)
            .ok_or(Error::EndMarkerNotFound)?;

        Ok(Self {
            root,
            followpos: builder.followpos,
            position_symbols: builder.position_symbols,
            end_position,
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Positions that may immediately follow `position` in a derivation.
    /// None when nothing was recorded, which reads as the empty set.
    pub fn followpos(&self, position: Position) -> Option<&PositionSet> {
        self.followpos.get(&position)
    }

    pub fn symbol_at(&self, position: Position) -> Option<Symbol> {
        self.position_symbols.get(&position).copied()
    }

    pub fn end_position(&self) -> Position {
        self.end_position
    }

    /// Number of positioned leaves, the end marker included.
    pub fn position_count(&self) -> Position {
        self.position_symbols.len() as Position
    }
}

#[derive(Default)]
struct TreeBuilder {
    followpos: HashMap<Position, PositionSet>,
    position_symbols: HashMap<Position, Symbol>,
    next_position: Position,
}

impl TreeBuilder {
    fn leaf(&mut self, symbol: Symbol) -> Node {
        if symbol.is_epsilon() {
            return Node {
                kind: NodeKind::Leaf(symbol),
                position: None,
                nullable: true,
                firstpos: PositionSet::new(),
                lastpos: PositionSet::new(),
            };
        }
        self.next_position += 1;
        let position = self.next_position;
        self.position_symbols.insert(position, symbol);
        Node {
            kind: NodeKind::Leaf(symbol),
            position: Some(position),
            nullable: false,
            firstpos: PositionSet::from([position]),
            lastpos: PositionSet::from([position]),
        }
    }

    fn apply(&mut self, operator: char, stack: &mut Vec<Node>) -> Result<Node> {
        match operator {
            symbol::STAR => {
                let child = stack.pop().ok_or_else(|| {
                    Error::MalformedExpression(format!("operator '{operator}' lacks an operand"))
                })?;
                Ok(self.star(child))
            }
            symbol::CONCAT | symbol::UNION => {
                let right = stack.pop();
                let left = stack.pop();
                match (left, right) {
                    (Some(left), Some(right)) if operator == symbol::CONCAT => {
                        Ok(self.concat(left, right))
                    }
                    (Some(left), Some(right)) => Ok(self.union(left, right)),
                    _ => Err(Error::MalformedExpression(format!(
                        "operator '{operator}' lacks two operands"
                    ))),
                }
            }
            other => Err(Error::MalformedExpression(format!(
                "unsupported operator '{other}'"
            ))),
        }
    }

    fn concat(&mut self, left: Node, right: Node) -> Node {
        for &p in &left.lastpos {
            self.followpos
                .entry(p)
                .or_default()
                .extend(right.firstpos.iter().copied());
        }
        let nullable = left.nullable && right.nullable;
        let firstpos = if left.nullable {
            left.firstpos.union(&right.firstpos).copied().collect()
        } else {
            left.firstpos.clone()
        };
        let lastpos = if right.nullable {
            left.lastpos.union(&right.lastpos).copied().collect()
        } else {
            right.lastpos.clone()
        };
        Node {
            kind: NodeKind::Concat(Box::new(left), Box::new(right)),
            position: None,
            nullable,
            firstpos,
            lastpos,
        }
    }

    fn union(&mut self, left: Node, right: Node) -> Node {
        let nullable = left.nullable || right.nullable;
        let firstpos = left.firstpos.union(&right.firstpos).copied().collect();
        let lastpos = left.lastpos.union(&right.lastpos).copied().collect();
        Node {
            kind: NodeKind::Union(Box::new(left), Box::new(right)),
            position: None,
            nullable,
            firstpos,
            lastpos,
        }
    }

    fn star(&mut self, child: Node) -> Node {
        for &p in &child.lastpos {
            self.followpos
                .entry(p)
                .or_default()
                .extend(child.firstpos.iter().copied());
        }
        let firstpos = child.firstpos.clone();
        let lastpos = child.lastpos.clone();
        Node {
            kind: NodeKind::Star(Box::new(child)),
            position: None,
            nullable: true,
            firstpos,
            lastpos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::postfix_tokens;

    fn tree(pattern: &str) -> SyntaxTree {
        SyntaxTree::from_postfix(&postfix_tokens(pattern).unwrap()).unwrap()
    }

    fn set(positions: &[Position]) -> PositionSet {
        positions.iter().copied().collect()
    }

    #[test]
    fn appends_end_marker_under_root_concat() {
        let t = tree("ab");
        let NodeKind::Concat(_, right) = &t.root().kind else {
            panic!("root must be a concatenation");
        };
        let NodeKind::Leaf(leaf) = &right.kind else {
            panic!("right child of the root must be the end marker leaf");
        };
        assert!(leaf.is_end_marker());
        assert_eq!(right.position, Some(t.end_position()));
        // the end marker is the last leaf, so it takes the highest position
        assert_eq!(t.end_position(), t.position_count());
    }

    #[test]
    fn positions_cover_one_to_k() {
        let t = tree("(a|b)*abb");
        assert_eq!(t.position_count(), 6);
        for position in 1..=6 {
            assert!(t.symbol_at(position).is_some());
        }
        assert!(t.symbol_at(7).is_none());
        assert_eq!(t.symbol_at(1), Some(Symbol::operand('a')));
        assert_eq!(t.symbol_at(6), Some(Symbol::end_marker()));
    }

    #[test]
    fn textbook_followpos_table() {
        let t = tree("(a|b)*abb");
        assert_eq!(t.followpos(1), Some(&set(&[1, 2, 3])));
        assert_eq!(t.followpos(2), Some(&set(&[1, 2, 3])));
        assert_eq!(t.followpos(3), Some(&set(&[4])));
        assert_eq!(t.followpos(4), Some(&set(&[5])));
        assert_eq!(t.followpos(5), Some(&set(&[6])));
        assert_eq!(t.followpos(6), None);
    }

    #[test]
    fn root_attributes_of_textbook_tree() {
        let t = tree("(a|b)*abb");
        assert_eq!(t.root().firstpos, set(&[1, 2, 3]));
        assert_eq!(t.root().lastpos, set(&[6]));
        assert!(!t.root().nullable);
    }

    #[test]
    fn followpos_entries_accumulate_across_rules() {
        // star contributes {1}, the following concatenation adds {2}
        let t = tree("a*a");
        assert_eq!(t.followpos(1), Some(&set(&[1, 2])));
        assert_eq!(t.followpos(2), Some(&set(&[3])));
    }

    #[test]
    fn epsilon_leaves_carry_no_position() {
        let t = tree("a?");
        assert_eq!(t.position_count(), 2);
        // a nullable left operand exposes the end marker in root firstpos
        assert_eq!(t.root().firstpos, set(&[1, 2]));
    }

    #[test]
    fn operator_underflow_is_malformed() {
        let tokens = [Symbol::operand('a'), Symbol::operator(symbol::CONCAT)];
        assert!(matches!(
            SyntaxTree::from_postfix(&tokens),
            Err(Error::MalformedExpression(_))
        ));
        let tokens = [Symbol::operator(symbol::STAR)];
        assert!(matches!(
            SyntaxTree::from_postfix(&tokens),
            Err(Error::MalformedExpression(_))
        ));
    }

    #[test]
    fn leftover_operands_are_malformed() {
        let tokens = [Symbol::operand('a'), Symbol::operand('b')];
        assert!(SyntaxTree::from_postfix(&tokens).unwrap_err().is_malformed());
    }

    #[test]
    fn unsupported_operator_is_malformed() {
        let tokens = [
            Symbol::operand('a'),
            Symbol::operand('b'),
            Symbol::operator('+'),
        ];
        assert!(matches!(
            SyntaxTree::from_postfix(&tokens),
            Err(Error::MalformedExpression(_))
        ));
    }

    #[test]
    fn embedded_end_marker_is_rejected() {
        let tokens = [Symbol::operand('a'), Symbol::end_marker()];
        assert!(matches!(
            SyntaxTree::from_postfix(&tokens),
            Err(Error::MalformedExpression(_))
        ));
    }

    #[test]
    fn empty_sequence_is_malformed() {
        assert!(matches!(
            SyntaxTree::from_postfix(&[]),
            Err(Error::MalformedExpression(_))
        ));
    }
}
