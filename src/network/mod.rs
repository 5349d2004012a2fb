use std::collections::HashSet;

use crate::simulator::{StochasticNet, TIME_KEY};
use crate::{NetworkError, SimulationError};

pub mod data;
use data::{Binding, Marking, PetriNodeData};

pub mod rate;
pub use rate::{Rate, RateExpression};

mod transition;
pub use transition::PetriTransition;

/* Invariants:
    nodes.len() > max(max(transitions→inputs), max(transitions→outputs), max(transitions→reads))
    => ∀ transition ∈ transitions, ∀ place ∈ transition.connected(), place < nodes.len()

    node_data.len() = nodes.len()

    place names are distinct and differ from TIME_KEY
*/
#[derive(Clone, Debug, PartialEq)]
pub struct PetriNetwork {
    pub(crate) nodes: Vec<u32>,
    pub(crate) node_data: Vec<PetriNodeData>,
    pub(crate) transitions: Vec<PetriTransition>,
}

impl PetriNetwork {
    /// Builds a network, adding unlabeled places for the indices the transitions refer to.
    ///
    /// Every place names a series of the trajectory logs, so the names must be distinct and may not be
    /// `TIME_KEY`.
    pub fn new(
        nodes: Vec<u32>,
        node_data: Vec<PetriNodeData>,
        transitions: Vec<PetriTransition>,
    ) -> Result<Self, NetworkError> {
        let mut res = Self {
            nodes,
            node_data,
            transitions,
        };
        res.uphold_invariants();
        res.check_names()?;
        Ok(res)
    }

    pub fn nodes(&self) -> &Vec<u32> {
        &self.nodes
    }

    pub fn transitions(&self) -> &Vec<PetriTransition> {
        &self.transitions
    }

    /// Name of a place: its label, or `P{index}` for unlabeled places.
    pub fn place_name(&self, index: usize) -> String {
        match self.node_data.get(index).and_then(|data| data.label.as_ref()) {
            Some(label) => label.clone(),
            None => format!("P{}", index),
        }
    }

    /// Name of a transition: its label, or `T{index}` for unlabeled transitions.
    pub fn transition_label(&self, index: usize) -> String {
        match self.transitions.get(index).and_then(|t| t.label.as_ref()) {
            Some(label) => label.clone(),
            None => format!("T{}", index),
        }
    }

    /// Makes sure that the class invariants are upheld
    fn uphold_invariants(&mut self) {
        if let Some(max_index) = self.max_index() {
            if self.nodes.len() <= max_index {
                self.nodes.resize(max_index + 1, 0);
            }
        }
        self.node_data.resize(self.nodes.len(), Default::default());
    }

    fn check_names(&self) -> Result<(), NetworkError> {
        let mut seen = HashSet::new();
        for index in 0..self.nodes.len() {
            let name = self.place_name(index);
            if name == TIME_KEY {
                return Err(NetworkError::ReservedName(name));
            }
            if !seen.insert(name.clone()) {
                return Err(NetworkError::DuplicateName(name));
            }
        }
        Ok(())
    }

    fn max_index(&self) -> Option<usize> {
        self.transitions
            .iter()
            .filter_map(|transition| transition.max_index())
            .max()
    }

    /// The values of the places connected to `transition`, named after these places
    fn binding_of(&self, transition: &PetriTransition) -> Binding {
        transition
            .connected()
            .into_iter()
            .map(|place| (self.place_name(place), self.nodes[place]))
            .collect()
    }

    fn can_fire(&self, transition: &PetriTransition) -> bool {
        transition.is_active(&self.nodes) && transition.fits(&self.nodes)
    }
}

impl StochasticNet for PetriNetwork {
    fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    fn transition_name(&self, transition: usize) -> String {
        self.transition_label(transition)
    }

    fn modes(&self, transition: usize) -> Vec<Binding> {
        match self.transitions.get(transition) {
            Some(t) if self.can_fire(t) => vec![self.binding_of(t)],
            _ => vec![],
        }
    }

    fn current_rate(&self, transition: usize, binding: &Binding) -> Result<f64, SimulationError> {
        let t = self
            .transitions
            .get(transition)
            .ok_or_else(|| SimulationError::InfeasibleBinding {
                transition: self.transition_label(transition),
            })?;

        let reactants = t
            .inputs()
            .iter()
            .map(|(&place, &weight)| (self.place_name(place), weight))
            .collect::<Vec<_>>();

        t.rate
            .evaluate(
                binding,
                reactants.iter().map(|(name, weight)| (name.as_str(), *weight)),
            )
            .map_err(|message| SimulationError::RateEvaluation {
                transition: self.transition_label(transition),
                message,
            })
    }

    fn fire(&mut self, transition: usize, binding: &Binding) -> Result<(), SimulationError> {
        let infeasible = || SimulationError::InfeasibleBinding {
            transition: self.transition_label(transition),
        };

        let t = self.transitions.get(transition).ok_or_else(infeasible)?;
        if !self.can_fire(t) || self.binding_of(t) != *binding {
            return Err(infeasible());
        }

        t.apply(&mut self.nodes);
        Ok(())
    }

    fn places(&self) -> Vec<(String, u32)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, &value)| (self.place_name(index), value))
            .collect()
    }

    fn marking(&self) -> Marking {
        Marking(self.nodes.clone())
    }

    /// Places missing from `marking` are emptied; extra values of `marking` are ignored.
    fn set_marking(&mut self, marking: &Marking) {
        for (index, value) in self.nodes.iter_mut().enumerate() {
            *value = marking.tokens().get(index).copied().unwrap_or(0);
        }
    }
}
