pub mod error;
pub use error::{NetworkError, PersistenceError, SimulationError};

mod network;
pub use network::{
    data::{Binding, Marking, PetriNodeData},
    PetriNetwork, PetriTransition, Rate, RateExpression,
};

pub mod builder;
pub use builder::{PetriBuilder, PetriTransitionBuilder};

pub mod parser;

pub mod simulator;
pub use simulator::{
    resolve_enabled, run, run_repeated, run_repeated_seeded, sample, step, RunCollection,
    RunSettings, StochasticNet, TrajectoryLog, UniformSource, TIME_KEY,
};

#[cfg(feature = "parallel")]
pub use simulator::run_repeated_parallel;

pub mod aggregate;
pub use aggregate::{aggregate_in_timeboxes, summarize, SeriesSummary};

pub mod persistence;
pub use persistence::{load_log, load_runs, store_experiment, store_log, Hyperparameters};

pub mod config;
pub use config::ExperimentConfig;

#[cfg(test)]
pub(crate) mod test_nets {
    use super::*;

    /// Three competing oxidations sharing the oxygen place:
    /// water forms with rate `hydrogen * oxygen`, rust with rate `iron * oxygen / 2`,
    /// and titanium dioxide never forms.
    pub(crate) fn combustion(
        hydrogen: u32,
        oxygen: u32,
        water: u32,
        iron: u32,
        rust: u32,
        titanium: u32,
        titanium_dioxide: u32,
    ) -> PetriNetwork {
        let mut builder = PetriBuilder::new();
        let h2 = builder.node_with_label(hydrogen, "hydrogen");
        let o2 = builder.node_with_label(oxygen, "oxygen");
        let h2o = builder.node_with_label(water, "water");
        let fe = builder.node_with_label(iron, "iron");
        let fe2o3 = builder.node_with_label(rust, "rust");
        let ti = builder.node_with_label(titanium, "titanium");
        let tio2 = builder.node_with_label(titanium_dioxide, "titanium_dioxide");

        builder
            .build_transition("O2+2H2->2H2O")
            .input_weighted(h2, 2)
            .input(o2)
            .output_weighted(h2o, 2)
            .rate(Rate::Expression(expression("hydrogen * oxygen")))
            .build();

        builder
            .build_transition("4Fe+3O2->2Fe2O3")
            .input_weighted(fe, 4)
            .input_weighted(o2, 3)
            .output_weighted(fe2o3, 2)
            .rate(Rate::Expression(expression("iron * oxygen / 2")))
            .build();

        builder
            .build_transition("Ti+O2->TiO2")
            .input(ti)
            .input(o2)
            .output(tio2)
            .rate(Rate::MassAction(0.0))
            .build();

        builder.build().unwrap()
    }

    fn expression(source: &str) -> RateExpression {
        source.parse().unwrap()
    }
}
