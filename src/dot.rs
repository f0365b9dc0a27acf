//! Graphviz renderings of the annotated tree and both automata.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use crate::dfa::{format_set, DirectDFA, StateId};
use crate::minimized_dfa::{BlockId, MinimizedDFA};
use crate::symbol;
use crate::syntax_tree::{Node, NodeKind, SyntaxTree};

impl SyntaxTree {
    /// Renders the annotated tree as a `digraph`, one node per tree node,
    /// leaf labels carrying their position in parentheses.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        format_tree(self.root(), &mut out).expect("String write never fails");
        out
    }
}

impl DirectDFA {
    /// Renders the automaton as a `digraph`, final states drawn with a
    /// double circle and state labels showing the underlying position sets.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        format_dfa(self, &mut out).expect("String write never fails");
        out
    }
}

impl MinimizedDFA {
    /// Renders the minimized automaton as a `digraph`, block labels showing
    /// the merged state ids of the source automaton.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        format_minimized(self, &mut out).expect("String write never fails");
        out
    }
}

fn format_tree(root: &Node, out: &mut String) -> fmt::Result {
    writeln!(out, "digraph syntax_tree {{")?;
    writeln!(out, "\tnode [shape=ellipse];")?;
    let mut next_id = 0;
    format_tree_node(root, &mut next_id, out)?;
    writeln!(out, "}}")
}

fn format_tree_node(
    node: &Node,
    next_id: &mut usize,
    out: &mut String,
) -> Result<usize, fmt::Error> {
    let id = *next_id;
    *next_id += 1;
    writeln!(out, "\tn{} [label=\"{}\"];", id, escape_label(&node_label(node)))?;
    match &node.kind {
        NodeKind::Leaf(_) => {}
        NodeKind::Star(child) => {
            let child_id = format_tree_node(child, next_id, out)?;
            writeln!(out, "\tn{} -> n{};", id, child_id)?;
        }
        NodeKind::Concat(left, right) | NodeKind::Union(left, right) => {
            let left_id = format_tree_node(left, next_id, out)?;
            writeln!(out, "\tn{} -> n{};", id, left_id)?;
            let right_id = format_tree_node(right, next_id, out)?;
            writeln!(out, "\tn{} -> n{};", id, right_id)?;
        }
    }
    Ok(id)
}

fn node_label(node: &Node) -> String {
    match &node.kind {
        NodeKind::Leaf(sym) => match node.position {
            Some(position) => format!("{sym} ({position})"),
            None => sym.to_string(),
        },
        NodeKind::Concat(..) => symbol::CONCAT.to_string(),
        NodeKind::Union(..) => symbol::UNION.to_string(),
        NodeKind::Star(_) => symbol::STAR.to_string(),
    }
}

fn format_dfa(dfa: &DirectDFA, out: &mut String) -> fmt::Result {
    writeln!(out, "digraph dfa {{")?;
    writeln!(out, "\trankdir=LR;")?;
    writeln!(out, "\tentry [shape=none, label=\"\"];")?;
    writeln!(out, "\tentry -> s{};", dfa.get_initial_state())?;
    for (id, positions) in dfa.get_states().iter().enumerate() {
        let shape = if dfa.is_final_state(id as StateId) {
            "doublecircle"
        } else {
            "circle"
        };
        writeln!(
            out,
            "\ts{} [shape={}, label=\"{}\"];",
            id,
            shape,
            escape_label(&format_set(positions))
        )?;
    }
    for id in 0..dfa.state_count() {
        let Some(row) = dfa.get_transitions().get(&(id as StateId)) else {
            continue;
        };
        let row: BTreeMap<char, StateId> = row.iter().map(|(&c, &t)| (c, t)).collect();
        for (input, target) in row {
            writeln!(
                out,
                "\ts{} -> s{} [label=\"{}\"];",
                id,
                target,
                escape_label(&input.to_string())
            )?;
        }
    }
    writeln!(out, "}}")
}

fn format_minimized(min: &MinimizedDFA, out: &mut String) -> fmt::Result {
    writeln!(out, "digraph minimized_dfa {{")?;
    writeln!(out, "\trankdir=LR;")?;
    writeln!(out, "\tentry [shape=none, label=\"\"];")?;
    writeln!(out, "\tentry -> m{};", min.get_initial_block())?;
    for (id, members) in min.get_blocks().iter().enumerate() {
        let shape = if min.is_final_block(id as BlockId) {
            "doublecircle"
        } else {
            "circle"
        };
        writeln!(
            out,
            "\tm{} [shape={}, label=\"{}\"];",
            id,
            shape,
            escape_label(&format_set(members))
        )?;
    }
    for id in 0..min.block_count() {
        let Some(row) = min.get_transitions().get(&(id as BlockId)) else {
            continue;
        };
        let row: BTreeMap<char, BlockId> = row.iter().map(|(&c, &t)| (c, t)).collect();
        for (input, target) in row {
            writeln!(
                out,
                "\tm{} -> m{} [label=\"{}\"];",
                id,
                target,
                escape_label(&input.to_string())
            )?;
        }
    }
    writeln!(out, "}}")
}

/// Backslash-escapes quotes and backslashes so labels survive dot's string
/// syntax, and spells control characters out.
fn escape_label(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::postfix_tokens;

    fn tree(pattern: &str) -> SyntaxTree {
        SyntaxTree::from_postfix(&postfix_tokens(pattern).unwrap()).unwrap()
    }

    #[test]
    fn tree_rendering_labels_leaves_with_positions() {
        let dot = tree("ab").to_dot();
        println!("{dot}");
        assert!(dot.starts_with("digraph syntax_tree {"));
        assert!(dot.contains("label=\"a (1)\""));
        assert!(dot.contains("label=\"b (2)\""));
        assert!(dot.contains("label=\"☒ (3)\""));
        assert!(dot.contains(" -> "));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn epsilon_leaves_render_without_a_position() {
        let dot = tree("a?").to_dot();
        assert!(dot.contains("label=\"ε\""));
        assert!(dot.contains("label=\"|\""));
    }

    #[test]
    fn dfa_rendering_marks_entry_and_finals() {
        let dfa = DirectDFA::new("ab").unwrap();
        let dot = dfa.to_dot();
        assert!(dot.starts_with("digraph dfa {"));
        assert!(dot.contains("rankdir=LR;"));
        assert!(dot.contains("entry -> s0;"));
        assert_eq!(dot.matches("doublecircle").count(), 1);
        assert!(dot.contains("[label=\"a\"]"));
        assert!(dot.contains("[label=\"b\"]"));
    }

    #[test]
    fn merged_finals_leave_a_single_double_circle() {
        let min = MinimizedDFA::new("(a|b)*abb(a|b)*").unwrap();
        let dot = min.to_dot();
        assert!(dot.starts_with("digraph minimized_dfa {"));
        assert_eq!(dot.matches("doublecircle").count(), 1);
        assert!(dot.matches("entry -> m").count() == 1);
    }

    #[test]
    fn labels_escape_dot_metacharacters() {
        let dot = tree(r"\\").to_dot();
        assert!(dot.contains(r#"label="\\ (1)""#));

        let dfa = DirectDFA::new("\\\"").unwrap();
        assert!(dfa.to_dot().contains(r#"[label="\""]"#));
    }
}
