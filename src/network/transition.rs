use std::collections::{BTreeMap, BTreeSet};

use super::rate::Rate;

/* Invariants:
- `inputs` and `outputs` map each place to a strictly positive weight
- a place may appear in `reads` and in `inputs`/`outputs`; it is then bound only once
*/
#[derive(Clone, Debug, PartialEq)]
pub struct PetriTransition {
    inputs: BTreeMap<usize, u32>,
    outputs: BTreeMap<usize, u32>,
    reads: BTreeSet<usize>,
    pub label: Option<String>,
    pub rate: Rate,
}

impl PetriTransition {
    pub fn new(inputs: Vec<usize>, outputs: Vec<usize>, rate: Rate) -> Self {
        let mut res = Self {
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            reads: BTreeSet::new(),
            label: None,
            rate,
        };
        for input in inputs {
            res.add_input(input, 1);
        }
        for output in outputs {
            res.add_output(output, 1);
        }
        res
    }

    pub fn inputs(&self) -> &BTreeMap<usize, u32> {
        &self.inputs
    }

    pub fn outputs(&self) -> &BTreeMap<usize, u32> {
        &self.outputs
    }

    pub fn reads(&self) -> &BTreeSet<usize> {
        &self.reads
    }

    /// Adds `weight` to the number of tokens consumed from `input`
    pub fn add_input(&mut self, input: usize, weight: u32) {
        if weight > 0 {
            *self.inputs.entry(input).or_insert(0) += weight;
        }
    }

    pub fn add_output(&mut self, output: usize, weight: u32) {
        if weight > 0 {
            *self.outputs.entry(output).or_insert(0) += weight;
        }
    }

    pub fn add_read(&mut self, place: usize) {
        self.reads.insert(place);
    }

    pub fn label(&mut self, label: String) {
        self.label = Some(label);
    }

    /// Every place connected to this transition, in ascending order and without duplicates
    pub fn connected(&self) -> BTreeSet<usize> {
        self.inputs
            .keys()
            .chain(self.outputs.keys())
            .chain(self.reads.iter())
            .copied()
            .collect()
    }

    pub(crate) fn max_index(&self) -> Option<usize> {
        self.connected().into_iter().next_back()
    }

    pub fn is_active(&self, nodes: &[u32]) -> bool {
        self.inputs
            .iter()
            .all(|(&input, &weight)| nodes.get(input).map_or(false, |&value| value >= weight))
    }

    /// Whether firing would leave every output place with at most `u32::MAX` tokens
    pub fn fits(&self, nodes: &[u32]) -> bool {
        self.outputs.iter().all(|(&output, &weight)| {
            let consumed = self.inputs.get(&output).copied().unwrap_or(0);
            nodes.get(output).map_or(false, |&value| {
                value.saturating_sub(consumed).checked_add(weight).is_some()
            })
        })
    }

    /// Consumes the inputs and produces the outputs; the caller must check `is_active` and `fits` beforehand.
    pub fn apply(&self, state: &mut [u32]) {
        self.apply_inputs(state);
        self.apply_outputs(state);
    }

    fn apply_inputs(&self, state: &mut [u32]) {
        for (&input, &weight) in self.inputs.iter() {
            state[input] -= weight;
        }
    }

    fn apply_outputs(&self, state: &mut [u32]) {
        for (&output, &weight) in self.outputs.iter() {
            state[output] = state[output].saturating_add(weight);
        }
    }
}
