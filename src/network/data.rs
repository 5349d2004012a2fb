use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PetriNodeData {
    pub label: Option<String>,
}

impl PetriNodeData {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());

        self
    }
}

/// Assignment of token counts to every place of a network, indexed like `PetriNetwork::nodes`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marking(pub Vec<u32>);

impl Marking {
    pub fn tokens(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for Marking {
    fn from(tokens: Vec<u32>) -> Self {
        Self(tokens)
    }
}

/// A mode of a transition: the values taken by the variables of its arcs for one feasible firing.
/// Variables are named after the places they read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Binding(BTreeMap<String, u32>);

impl Binding {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, variable: impl Into<String>, value: u32) -> Self {
        self.0.insert(variable.into(), value);
        self
    }

    pub fn get(&self, variable: &str) -> Option<u32> {
        self.0.get(variable).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(name, &value)| (name.as_str(), value))
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for Binding {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
