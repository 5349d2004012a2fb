use crate::network::data::PetriNodeData;
use crate::{NetworkError, PetriNetwork, PetriTransition, Rate};

pub struct PetriBuilder {
    pub nodes: Vec<u32>,
    pub node_data: Vec<PetriNodeData>,
    pub transitions: Vec<PetriTransition>,
}

pub struct PetriTransitionBuilder<'a> {
    pub builder: &'a mut PetriBuilder,
    pub label: Option<String>,
    pub inputs: Vec<(usize, u32)>,
    pub outputs: Vec<(usize, u32)>,
    pub reads: Vec<usize>,
    pub rate: Rate,
}

impl PetriBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            node_data: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn node(&mut self, value: u32) -> usize {
        let res = self.nodes.len();
        self.nodes.push(value);
        self.node_data.push(PetriNodeData::default());
        res
    }

    pub fn node_with_label(&mut self, value: u32, label: impl Into<String>) -> usize {
        let res = self.node(value);
        self.node_data[res] = PetriNodeData::default().label(label);
        res
    }

    pub fn build_transition<'b>(&'b mut self, label: impl Into<String>) -> PetriTransitionBuilder<'b> {
        PetriTransitionBuilder {
            builder: self,
            label: Some(label.into()),
            inputs: Vec::new(),
            outputs: Vec::new(),
            reads: Vec::new(),
            rate: Rate::default(),
        }
    }

    /// Fails if two places share a name or if a place is named `time`.
    pub fn build(self) -> Result<PetriNetwork, NetworkError> {
        PetriNetwork::new(self.nodes, self.node_data, self.transitions)
    }
}

impl Default for PetriBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> PetriTransitionBuilder<'a> {
    pub fn input(self, index: usize) -> Self {
        self.input_weighted(index, 1)
    }

    pub fn input_weighted(mut self, index: usize, weight: u32) -> Self {
        self.inputs.push((index, weight));

        self
    }

    pub fn output(self, index: usize) -> Self {
        self.output_weighted(index, 1)
    }

    pub fn output_weighted(mut self, index: usize, weight: u32) -> Self {
        self.outputs.push((index, weight));

        self
    }

    /// Makes the value of `index` visible to the rate of the transition, without consuming it
    pub fn read(mut self, index: usize) -> Self {
        self.reads.push(index);

        self
    }

    pub fn rate(mut self, rate: Rate) -> Self {
        self.rate = rate;

        self
    }

    pub fn build(self) -> usize {
        let mut transition = PetriTransition::new(vec![], vec![], self.rate);
        for (input, weight) in self.inputs {
            transition.add_input(input, weight);
        }
        for (output, weight) in self.outputs {
            transition.add_output(output, weight);
        }
        for read in self.reads {
            transition.add_read(read);
        }
        if let Some(label) = self.label {
            transition.label(label);
        }

        let res = self.builder.transitions.len();
        self.builder.transitions.push(transition);
        res
    }
}
