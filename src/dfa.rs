//! Subset construction of a deterministic automaton over followpos sets.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

use crate::minimized_dfa::MinimizedDFA;
use crate::parser::postfix_tokens;
use crate::syntax_tree::{PositionSet, SyntaxTree};
use crate::Result;

pub type StateId = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct DirectDFA {
    pub(crate) initial_state: StateId,
    pub(crate) states: Vec<PositionSet>,
    pub(crate) final_states: HashSet<StateId>,
    pub(crate) transitions: HashMap<StateId, HashMap<char, StateId>>,
}

impl DirectDFA {
    /// Compiles `pattern` through the whole pipeline: preprocess, parse,
    /// postfix emission, tree annotation, subset construction.
    pub fn new(pattern: &str) -> Result<Self> {
        let tokens = postfix_tokens(pattern)?;
        let tree = SyntaxTree::from_postfix(&tokens)?;
        Ok(Self::from_syntax_tree(&tree))
    }

    /// Subset construction from an annotated tree. A state is a set of tree
    /// positions; state identity is set equality, and the dense ids record
    /// discovery order with the root firstpos set as state 0.
    pub fn from_syntax_tree(tree: &SyntaxTree) -> Self {
        let start = tree.root().firstpos.clone();
        let mut states: Vec<PositionSet> = vec![start.clone()];
        let mut index: HashMap<PositionSet, StateId> = HashMap::default();
        index.insert(start, 0);
        let mut transitions: HashMap<StateId, HashMap<char, StateId>> = HashMap::default();
        let mut queue: VecDeque<StateId> = VecDeque::from([0]);

        while let Some(state) = queue.pop_front() {
            // union the followers of the current positions per operand
            // symbol; sorted keys keep discovery order reproducible
            let mut moves: BTreeMap<char, PositionSet> = BTreeMap::new();
            let positions = states[state as usize].clone();
            for &position in &positions {
                let Some(symbol) = tree.symbol_at(position) else {
                    continue;
                };
                if symbol.is_end_marker() || symbol.is_epsilon() {
                    continue;
                }
                let successor = moves.entry(symbol.name()).or_default();
                if let Some(follow) = tree.followpos(position) {
                    successor.extend(follow.iter().copied());
                }
            }
            for (input, successor) in moves {
                // an empty union is the implicit reject state, not a transition
                if successor.is_empty() {
                    continue;
                }
                let next = match index.get(&successor) {
                    Some(&id) => id,
                    None => {
                        let id = states.len() as StateId;
                        states.push(successor.clone());
                        index.insert(successor, id);
                        queue.push_back(id);
                        id
                    }
                };
                transitions.entry(state).or_default().insert(input, next);
            }
        }

        let end = tree.end_position();
        let final_states = states
            .iter()
            .enumerate()
            .filter(|(_, positions)| positions.contains(&end))
            .map(|(id, _)| id as StateId)
            .collect();

        Self {
            initial_state: 0,
            states,
            final_states,
            transitions,
        }
    }

    pub fn minimize(&self) -> MinimizedDFA {
        MinimizedDFA::from_dfa(self)
    }

    /// Full-input simulation. A missing transition rejects immediately; the
    /// input is accepted iff the state after the last character is final.
    pub fn accepts(&self, input: &str) -> bool {
        let mut state = self.initial_state;
        for c in input.chars() {
            match self.next_state(state, c) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.final_states.contains(&state)
    }

    pub fn next_state(&self, state: StateId, input: char) -> Option<StateId> {
        Some(*self.transitions.get(&state)?.get(&input)?)
    }

    pub fn get_state_sequence(&self, inputs: &str) -> Option<Vec<StateId>> {
        let mut state = self.initial_state;
        let mut seq = vec![state];
        for input in inputs.chars() {
            if let Some(s) = self.next_state(state, input) {
                seq.push(s);
                state = s;
            } else {
                return None;
            }
        }
        Some(seq)
    }

    pub fn get_initial_state(&self) -> StateId {
        self.initial_state
    }

    pub fn is_initial_state(&self, state: StateId) -> bool {
        state == self.initial_state
    }

    pub fn is_final_state(&self, state: StateId) -> bool {
        self.final_states.contains(&state)
    }

    pub fn get_final_states(&self) -> &HashSet<StateId> {
        &self.final_states
    }

    pub fn get_transitions(&self) -> &HashMap<StateId, HashMap<char, StateId>> {
        &self.transitions
    }

    /// Position sets of the discovered states, indexed by state id.
    pub fn get_states(&self) -> &[PositionSet] {
        &self.states
    }

    pub fn get_state_positions(&self, state: StateId) -> Option<&PositionSet> {
        self.states.get(state as usize)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn get_alphabet(&self) -> BTreeSet<char> {
        self.transitions
            .values()
            .flat_map(|row| row.keys().copied())
            .collect()
    }
}

impl fmt::Display for DirectDFA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let finals: BTreeSet<u32> = self.final_states.iter().copied().collect();
        writeln!(
            f,
            "Direct DFA with {} states, start {}, finals {}:",
            self.states.len(),
            self.initial_state,
            format_set(&finals)
        )?;
        for (id, positions) in self.states.iter().enumerate() {
            let row: BTreeMap<char, StateId> = self
                .transitions
                .get(&(id as StateId))
                .map(|row| row.iter().map(|(&c, &t)| (c, t)).collect())
                .unwrap_or_default();
            let row = row
                .iter()
                .map(|(c, t)| format!("{c} -> {t}"))
                .collect::<Vec<_>>()
                .join(", ");
            if row.is_empty() {
                writeln!(f, "  {} {}", id, format_set(positions))?;
            } else {
                writeln!(f, "  {} {}: {}", id, format_set(positions), row)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn format_set(set: &BTreeSet<u32>) -> String {
    let items = set
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{items}}}")
}
