//! Reachability pruning and partition-refinement minimization.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

use crate::dfa::{format_set, DirectDFA, StateId};
use crate::Result;

pub type BlockId = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct MinimizedDFA {
    initial_block: BlockId,
    blocks: Vec<BTreeSet<StateId>>,
    final_blocks: HashSet<BlockId>,
    transitions: HashMap<BlockId, HashMap<char, BlockId>>,
}

impl MinimizedDFA {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(DirectDFA::new(pattern)?.minimize())
    }

    /// Minimizes `dfa`: prune states unreachable from the start, refine the
    /// rest into equivalence blocks, then rebuild the table from one
    /// representative per block.
    pub fn from_dfa(dfa: &DirectDFA) -> Self {
        let reachable = reachable_states(dfa);
        let partition = refine_partition(&reachable, &dfa.final_states, &dfa.transitions);

        let mut block_of: HashMap<StateId, BlockId> = HashMap::default();
        for (id, block) in partition.iter().enumerate() {
            for &state in block {
                block_of.insert(state, id as BlockId);
            }
        }

        let initial_block = block_of[&dfa.initial_state];
        let final_blocks = partition
            .iter()
            .enumerate()
            .filter(|(_, block)| block.iter().any(|s| dfa.final_states.contains(s)))
            .map(|(id, _)| id as BlockId)
            .collect();

        // refinement leaves every member agreeing on its targets' blocks,
        // so any representative yields the same rows
        let mut transitions: HashMap<BlockId, HashMap<char, BlockId>> = HashMap::default();
        for (id, block) in partition.iter().enumerate() {
            let Some(representative) = block.first() else {
                continue;
            };
            if let Some(row) = dfa.transitions.get(representative) {
                for (&input, &target) in row {
                    transitions
                        .entry(id as BlockId)
                        .or_default()
                        .insert(input, block_of[&target]);
                }
            }
        }

        Self {
            initial_block,
            blocks: partition,
            final_blocks,
            transitions,
        }
    }

    /// Full-input simulation over the minimized table.
    pub fn accepts(&self, input: &str) -> bool {
        let mut block = self.initial_block;
        for c in input.chars() {
            match self.next_block(block, c) {
                Some(next) => block = next,
                None => return false,
            }
        }
        self.final_blocks.contains(&block)
    }

    pub fn next_block(&self, block: BlockId, input: char) -> Option<BlockId> {
        Some(*self.transitions.get(&block)?.get(&input)?)
    }

    pub fn get_block_sequence(&self, inputs: &str) -> Option<Vec<BlockId>> {
        let mut block = self.initial_block;
        let mut seq = vec![block];
        for input in inputs.chars() {
            if let Some(b) = self.next_block(block, input) {
                seq.push(b);
                block = b;
            } else {
                return None;
            }
        }
        Some(seq)
    }

    pub fn get_initial_block(&self) -> BlockId {
        self.initial_block
    }

    pub fn is_initial_block(&self, block: BlockId) -> bool {
        block == self.initial_block
    }

    pub fn is_final_block(&self, block: BlockId) -> bool {
        self.final_blocks.contains(&block)
    }

    pub fn get_final_blocks(&self) -> &HashSet<BlockId> {
        &self.final_blocks
    }

    pub fn get_transitions(&self) -> &HashMap<BlockId, HashMap<char, BlockId>> {
        &self.transitions
    }

    /// Member state ids of each block, indexed by block id. Members are the
    /// source automaton's states; together the blocks partition its
    /// reachable states.
    pub fn get_blocks(&self) -> &[BTreeSet<StateId>] {
        &self.blocks
    }

    pub fn get_block_states(&self, block: BlockId) -> Option<&BTreeSet<StateId>> {
        self.blocks.get(block as usize)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn get_alphabet(&self) -> BTreeSet<char> {
        self.transitions
            .values()
            .flat_map(|row| row.keys().copied())
            .collect()
    }
}

impl fmt::Display for MinimizedDFA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let finals: BTreeSet<u32> = self.final_blocks.iter().copied().collect();
        writeln!(
            f,
            "Minimized DFA with {} states, start {}, finals {}:",
            self.blocks.len(),
            self.initial_block,
            format_set(&finals)
        )?;
        for (id, members) in self.blocks.iter().enumerate() {
            let row: BTreeMap<char, BlockId> = self
                .transitions
                .get(&(id as BlockId))
                .map(|row| row.iter().map(|(&c, &t)| (c, t)).collect())
                .unwrap_or_default();
            let row = row
                .iter()
                .map(|(c, t)| format!("{c} -> {t}"))
                .collect::<Vec<_>>()
                .join(", ");
            if row.is_empty() {
                writeln!(f, "  {} {}", id, format_set(members))?;
            } else {
                writeln!(f, "  {} {}: {}", id, format_set(members), row)?;
            }
        }
        Ok(())
    }
}

fn reachable_states(dfa: &DirectDFA) -> BTreeSet<StateId> {
    let mut reachable = BTreeSet::from([dfa.initial_state]);
    let mut queue = VecDeque::from([dfa.initial_state]);
    while let Some(state) = queue.pop_front() {
        if let Some(row) = dfa.transitions.get(&state) {
            for &target in row.values() {
                if reachable.insert(target) {
                    queue.push_back(target);
                }
            }
        }
    }
    reachable
}

/// Worklist partition refinement over plain automaton tables. Returns the
/// coarsest partition of `reachable` under which finality and the target
/// block per input are uniform within every block.
fn refine_partition(
    reachable: &BTreeSet<u32>,
    finals: &HashSet<u32>,
    transitions: &HashMap<u32, HashMap<char, u32>>,
) -> Vec<BTreeSet<u32>> {
    let final_block: BTreeSet<u32> = reachable
        .iter()
        .copied()
        .filter(|s| finals.contains(s))
        .collect();
    let other_block: BTreeSet<u32> = reachable
        .iter()
        .copied()
        .filter(|s| !finals.contains(s))
        .collect();

    let mut partition: Vec<BTreeSet<u32>> = [final_block, other_block]
        .into_iter()
        .filter(|block| !block.is_empty())
        .collect();
    let mut worklist = partition.clone();

    let alphabet: BTreeSet<char> = reachable
        .iter()
        .filter_map(|s| transitions.get(s))
        .flat_map(|row| row.keys().copied())
        .collect();

    while let Some(splitter) = worklist.pop() {
        for &input in &alphabet {
            // states whose transition on `input` lands in the splitter
            let movers: BTreeSet<u32> = reachable
                .iter()
                .copied()
                .filter(|s| {
                    transitions
                        .get(s)
                        .and_then(|row| row.get(&input))
                        .is_some_and(|target| splitter.contains(target))
                })
                .collect();
            if movers.is_empty() {
                continue;
            }
            let mut refined = Vec::with_capacity(partition.len());
            for block in &partition {
                let inside: BTreeSet<u32> = block.intersection(&movers).copied().collect();
                if inside.is_empty() || inside.len() == block.len() {
                    refined.push(block.clone());
                    continue;
                }
                let outside: BTreeSet<u32> = block.difference(&movers).copied().collect();
                if let Some(at) = worklist.iter().position(|w| w == block) {
                    worklist.remove(at);
                    worklist.push(inside.clone());
                    worklist.push(outside.clone());
                } else if inside.len() <= outside.len() {
                    // ties push the intersection half
                    worklist.push(inside.clone());
                } else {
                    worklist.push(outside.clone());
                }
                refined.push(inside);
                refined.push(outside);
            }
            partition = refined;
        }
    }
    partition
}
