use std::collections::HashMap;

use log::debug;
use strum::EnumCount;

use crate::{discretize::StateKey, env::Action};

/// One estimate per action, indexed by [`Action::index`]
pub type ActionValues = [f32; Action::COUNT];

/// An entry in the table
#[derive(Debug, Clone, PartialEq)]
pub struct TableEntry {
    pub key: StateKey,
    pub values: ActionValues,
    /// Number of times an action was chosen from this state
    pub visits: u32,
}

/// Sparse table of action values keyed by [`StateKey`]
///
/// Entries are created zeroed on first access and are only ever removed by [`reset`](Self::reset).
/// Iteration follows the order in which states were first seen.
#[derive(Debug, Clone, Default)]
pub struct ActionValueTable {
    index: HashMap<StateKey, usize>,
    entries: Vec<TableEntry>,
}

impl ActionValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, key: &StateKey) -> usize {
        if let Some(&ix) = self.index.get(key) {
            return ix;
        }
        let ix = self.entries.len();
        self.entries.push(TableEntry {
            key: key.clone(),
            values: [0.0; Action::COUNT],
            visits: 0,
        });
        self.index.insert(key.clone(), ix);
        debug!("New state {key} (table size {})", ix + 1);
        ix
    }

    /// Get the action values for `key`, creating a zero vector if the state is new
    pub fn values(&mut self, key: &StateKey) -> &mut ActionValues {
        let ix = self.slot(key);
        &mut self.entries[ix].values
    }

    /// Look up the action values for `key` without creating an entry
    pub fn get(&self, key: &StateKey) -> Option<&ActionValues> {
        self.index.get(key).map(|&ix| &self.entries[ix].values)
    }

    /// Record that an action was chosen from `key`, creating the entry if needed
    pub fn visit(&mut self, key: &StateKey) {
        let ix = self.slot(key);
        self.entries[ix].visits += 1;
    }

    pub fn visits(&self, key: &StateKey) -> u32 {
        self.index.get(key).map_or(0, |&ix| self.entries[ix].visits)
    }

    /// Number of known states
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Up to `max_entries` `(key, values)` copies in first-seen order
    pub fn snapshot(&self, max_entries: usize) -> Vec<(StateKey, ActionValues)> {
        self.entries
            .iter()
            .take(max_entries)
            .map(|e| (e.key.clone(), e.values))
            .collect()
    }

    /// All entries in first-seen order
    pub fn entries(&self) -> impl Iterator<Item = &TableEntry> {
        self.entries.iter()
    }

    /// Forget every state
    pub fn reset(&mut self) {
        self.index.clear();
        self.entries.clear();
    }
}
