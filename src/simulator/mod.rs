use rand::Rng;

use crate::network::data::{Binding, Marking};
use crate::SimulationError;

pub mod resolver;
pub use resolver::{resolve_enabled, EnabledTransition};

pub mod gillespie;
pub use gillespie::{sample, select, SampledEvent};

pub mod runner;
pub use runner::{
    run, run_repeated, run_repeated_seeded, LogProgress, NoProgress, ProgressObserver,
    RunCollection, RunSettings, TrajectoryLog, TIME_KEY,
};
#[cfg(feature = "parallel")]
pub use runner::run_repeated_parallel;

/// The part of a Petri network that the stochastic simulation needs.
/// Transitions are identified by their index in `0..transition_count()`.
pub trait StochasticNet {
    fn transition_count(&self) -> usize;

    fn transition_name(&self, transition: usize) -> String;

    /// Returns every binding under which `transition` may currently fire; an empty list means it is not enabled.
    fn modes(&self, transition: usize) -> Vec<Binding>;

    fn current_rate(&self, transition: usize, binding: &Binding) -> Result<f64, SimulationError>;

    /// Atomically applies `transition` under `binding` to the marking.
    fn fire(&mut self, transition: usize, binding: &Binding) -> Result<(), SimulationError>;

    /// The name and token count of every place, in a stable order.
    fn places(&self) -> Vec<(String, u32)>;

    fn marking(&self) -> Marking;

    fn set_marking(&mut self, marking: &Marking);
}

/// A source of uniformly distributed numbers in `[0, 1)`.
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;
}

impl<R: Rng + ?Sized> UniformSource for R {
    fn next_uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Fires a single transition, chosen with the Gillespie algorithm, and returns the delay that elapsed before it.
/// Returns `Ok(None)` when no further event can happen.
pub fn step<N, U>(net: &mut N, random: &mut U) -> Result<Option<f64>, SimulationError>
where
    N: StochasticNet + ?Sized,
    U: UniformSource + ?Sized,
{
    let enabled = match resolve_enabled(net) {
        Ok(enabled) => enabled,
        Err(SimulationError::NoEnabledTransition) => return Ok(None),
        Err(e) => return Err(e),
    };

    let event = match sample(&enabled, random) {
        Ok(event) => event,
        Err(SimulationError::ZeroRateDeadlock) => {
            tracing::debug!("every enabled transition has a rate of zero");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    tracing::trace!(
        transition = %net.transition_name(event.transition),
        delay = event.delay,
        "firing"
    );
    net.fire(event.transition, &event.binding)?;

    Ok(Some(event.delay))
}
