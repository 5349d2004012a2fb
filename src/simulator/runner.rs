use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::{step, StochasticNet, UniformSource};
use crate::SimulationError;

/// Name of the series holding the simulated time, next to the series of every place.
pub const TIME_KEY: &str = "time";

/// Stopping conditions of a simulation. Both are checked once per step.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSettings {
    /// Maximum number of transitions to fire; `None` for no limit.
    pub max_steps: Option<usize>,
    /// Maximum amount of simulated time. The last recorded timestamp may exceed it.
    pub max_time: f64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_steps: None,
            max_time: f64::INFINITY,
        }
    }
}

/// Token counts of every place at every simulated step, along with the timestamp of that step.
/// All series have the same length.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryLog {
    pub time: Vec<f64>,
    #[serde(flatten)]
    pub places: BTreeMap<String, Vec<u32>>,
}

/// One trajectory per repetition of an experiment.
pub type RunCollection = BTreeMap<usize, TrajectoryLog>;

impl TrajectoryLog {
    pub fn new<S: Into<String>>(places: impl IntoIterator<Item = S>) -> Self {
        Self {
            time: Vec::new(),
            places: places.into_iter().map(|name| (name.into(), Vec::new())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Returns the series named `name` as floating-point values; `TIME_KEY` designates the timestamps.
    pub fn series(&self, name: &str) -> Option<Vec<f64>> {
        if name == TIME_KEY {
            Some(self.time.clone())
        } else {
            self.places
                .get(name)
                .map(|values| values.iter().map(|&value| value as f64).collect())
        }
    }

    fn record(&mut self, time: f64, places: Vec<(String, u32)>) {
        self.time.push(time);
        for (name, tokens) in places {
            self.places.entry(name).or_default().push(tokens);
        }
    }
}

/// Simulates `net` with the Gillespie algorithm, until no transition can fire or until one of the limits
/// of `settings` is reached.
///
/// The initial marking is recorded at time 0, then one row is recorded after every firing:
/// if `N` transitions fired, the log holds `N + 1` rows.
///
/// Both limits are checked before each step rather than after it. The last row may lie past
/// `max_time`, but no transition fires once it has been reached, so the final marking of `net`
/// is always the last row of the log.
pub fn run<N, U>(
    net: &mut N,
    settings: &RunSettings,
    random: &mut U,
) -> Result<TrajectoryLog, SimulationError>
where
    N: StochasticNet + ?Sized,
    U: UniformSource + ?Sized,
{
    let initial_places = net.places();
    let mut log = TrajectoryLog::new(initial_places.iter().map(|(name, _)| name.clone()));
    log.record(0.0, initial_places);

    let mut current_time = 0.0;
    let mut remaining_steps = settings.max_steps;

    loop {
        if remaining_steps == Some(0) {
            tracing::debug!(steps = log.len() - 1, "step limit reached");
            break;
        }
        if current_time >= settings.max_time {
            tracing::debug!(time = current_time, "time limit reached");
            break;
        }

        match step(net, random)? {
            Some(delay) => current_time += delay,
            None => {
                tracing::debug!(time = current_time, "no transition can fire");
                break;
            }
        }

        if let Some(remaining) = remaining_steps.as_mut() {
            *remaining -= 1;
        }

        log.record(current_time, net.places());
    }

    Ok(log)
}

/// Hooks to follow the progress of a repeated experiment. They never influence the simulation.
pub trait ProgressObserver {
    fn on_start(&mut self, _num_reps: usize) {}

    fn on_repetition(&mut self, _completed: usize, _num_reps: usize) {}

    fn on_finish(&mut self) {}
}

pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Reports progress through `tracing`.
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_start(&mut self, num_reps: usize) {
        tracing::info!("Starting repeated experiment with {} repetitions", num_reps);
    }

    fn on_repetition(&mut self, completed: usize, num_reps: usize) {
        tracing::info!("Finished repetition {}/{}", completed, num_reps);
    }

    fn on_finish(&mut self) {
        tracing::info!("All repetitions completed");
    }
}

/// Runs `num_reps` independent simulations of `net`, each starting from the marking `net` had when this
/// function was called. All repetitions draw from the same `random` source, one after the other.
///
/// The net is reset before every repetition but not after the last one: it is left in the final state
/// of the last repetition.
pub fn run_repeated<N, U, P>(
    net: &mut N,
    num_reps: usize,
    settings: &RunSettings,
    random: &mut U,
    progress: &mut P,
) -> Result<RunCollection, SimulationError>
where
    N: StochasticNet + ?Sized,
    U: UniformSource + ?Sized,
    P: ProgressObserver + ?Sized,
{
    let initial_marking = net.marking();
    let mut runs = RunCollection::new();

    progress.on_start(num_reps);
    for repetition in 0..num_reps {
        net.set_marking(&initial_marking);
        let log = run(net, settings, random)?;
        runs.insert(repetition, log);
        progress.on_repetition(repetition + 1, num_reps);
    }
    progress.on_finish();

    Ok(runs)
}

/// Same as `run_repeated`, but each repetition draws from its own generator, seeded from `seed` and the
/// index of the repetition. A repetition thus yields the same trajectory regardless of the others.
pub fn run_repeated_seeded<N, P>(
    net: &mut N,
    num_reps: usize,
    settings: &RunSettings,
    seed: u64,
    progress: &mut P,
) -> Result<RunCollection, SimulationError>
where
    N: StochasticNet + ?Sized,
    P: ProgressObserver + ?Sized,
{
    let initial_marking = net.marking();
    let mut runs = RunCollection::new();

    progress.on_start(num_reps);
    for repetition in 0..num_reps {
        net.set_marking(&initial_marking);
        let mut random = repetition_rng(seed, repetition);
        let log = run(net, settings, &mut random)?;
        runs.insert(repetition, log);
        progress.on_repetition(repetition + 1, num_reps);
    }
    progress.on_finish();

    Ok(runs)
}

/// Runs the repetitions of `run_repeated_seeded` in parallel, each on its own copy of `net`.
/// The output is identical to `run_repeated_seeded`; `net` itself is left untouched.
#[cfg(feature = "parallel")]
pub fn run_repeated_parallel<N>(
    net: &N,
    num_reps: usize,
    settings: &RunSettings,
    seed: u64,
) -> Result<RunCollection, SimulationError>
where
    N: StochasticNet + Clone + Send + Sync,
{
    use rayon::prelude::*;

    (0..num_reps)
        .into_par_iter()
        .map(|repetition| {
            let mut net = net.clone();
            let mut random = repetition_rng(seed, repetition);
            run(&mut net, settings, &mut random).map(|log| (repetition, log))
        })
        .collect()
}

fn repetition_rng(seed: u64, repetition: usize) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_seed(seed, repetition as u64))
}

fn derive_seed(seed: u64, repetition: u64) -> u64 {
    const GOLDEN_GAMMA: u64 = 0x9E3779B97F4A7C15;
    let mut z = seed ^ repetition.wrapping_mul(GOLDEN_GAMMA);
    // SplitMix64
    z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;

    use super::*;
    use crate::simulator::test::source_to_sink;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl ProgressObserver for Recorder {
        fn on_start(&mut self, num_reps: usize) {
            self.0.push(format!("start {}", num_reps));
        }

        fn on_repetition(&mut self, completed: usize, num_reps: usize) {
            self.0.push(format!("{}/{}", completed, num_reps));
        }

        fn on_finish(&mut self) {
            self.0.push(String::from("finish"));
        }
    }

    #[test]
    fn run_until_dead_state() {
        let tokens = 36;
        let mut network = source_to_sink(tokens);
        let mut rng = StdRng::seed_from_u64(42);

        let log = run(&mut network, &RunSettings::default(), &mut rng).unwrap();

        // The initial state is part of the output
        assert_eq!(log.len(), tokens as usize + 1);
        assert_eq!(log.places["sink"], (0..=tokens).collect::<Vec<_>>());
        assert_eq!(log.places["source"], (0..=tokens).rev().collect::<Vec<_>>());
        assert_eq!(log.time[0], 0.0);
        for i in 0..tokens as usize {
            assert!(log.time[i + 1] > log.time[i]);
        }
    }

    #[test]
    fn run_with_zero_steps_records_initial_state() {
        let mut network = source_to_sink(10);
        let mut rng = StdRng::seed_from_u64(0);
        let settings = RunSettings {
            max_steps: Some(0),
            ..Default::default()
        };

        let log = run(&mut network, &settings, &mut rng).unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(log.places["source"], vec![10]);
        assert_eq!(network.nodes(), &vec![10, 0]);
    }

    #[test]
    fn run_respects_step_limit() {
        let mut network = source_to_sink(10);
        let mut rng = StdRng::seed_from_u64(0);
        let settings = RunSettings {
            max_steps: Some(4),
            ..Default::default()
        };

        let log = run(&mut network, &settings, &mut rng).unwrap();

        assert_eq!(log.len(), 5);
        assert_eq!(log.places["sink"], vec![0, 1, 2, 3, 4]);
        assert_eq!(network.nodes(), &vec![6, 4]);
    }

    #[test]
    fn run_may_overshoot_time_limit_by_one_step() {
        let mut network = source_to_sink(1000);
        let mut rng = StdRng::seed_from_u64(3);
        let settings = RunSettings {
            max_time: 0.0005,
            ..Default::default()
        };

        let log = run(&mut network, &settings, &mut rng).unwrap();

        // About 0.0005 * 1000 events are expected before the limit
        assert!(log.len() > 1);
        assert!(log.len() < 1000);
        let last = log.len() - 1;
        assert!(log.time[last] >= settings.max_time);
        assert!(log.time[..last].iter().all(|&t| t < settings.max_time));
        assert_eq!(log.places["sink"].len(), log.len());
        assert_eq!(log.places["source"].len(), log.len());
    }

    #[test]
    fn nothing_fires_after_time_limit() {
        let mut network = source_to_sink(1000);
        let mut rng = StdRng::seed_from_u64(8);
        let settings = RunSettings {
            max_time: 0.001,
            ..Default::default()
        };

        let log = run(&mut network, &settings, &mut rng).unwrap();

        let last = log.len() - 1;
        assert!(log.time[last] >= settings.max_time);
        assert_eq!(
            network.nodes(),
            &vec![log.places["source"][last], log.places["sink"][last]]
        );
    }

    #[test]
    fn series_exposes_time_and_places() {
        let mut network = source_to_sink(2);
        let mut rng = StdRng::seed_from_u64(0);
        let log = run(&mut network, &RunSettings::default(), &mut rng).unwrap();

        assert_eq!(log.series("sink"), Some(vec![0.0, 1.0, 2.0]));
        assert_eq!(log.series(TIME_KEY), Some(log.time.clone()));
        assert_eq!(log.series("nothing"), None);
    }

    #[test]
    fn repeated_runs_start_from_initial_marking() {
        let mut network = source_to_sink(8);
        let mut rng = StdRng::seed_from_u64(11);
        let settings = RunSettings {
            max_steps: Some(5),
            ..Default::default()
        };

        let runs = run_repeated(&mut network, 4, &settings, &mut rng, &mut NoProgress).unwrap();

        assert_eq!(runs.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        for log in runs.values() {
            assert_eq!(log.len(), 6);
            assert_eq!(log.places["source"][0], 8);
            assert_eq!(log.places["sink"][0], 0);
        }
        // The net is not reset after the last repetition
        assert_eq!(network.nodes(), &vec![3, 5]);
    }

    #[test]
    fn repeated_runs_are_independent() {
        let mut network = source_to_sink(20);
        let mut rng = StdRng::seed_from_u64(5);

        let runs = run_repeated(&mut network, 2, &RunSettings::default(), &mut rng, &mut NoProgress)
            .unwrap();

        assert_eq!(runs[&0].places, runs[&1].places);
        assert_ne!(runs[&0].time, runs[&1].time);
    }

    #[test]
    fn progress_does_not_affect_output() {
        let settings = RunSettings::default();

        let mut recorder = Recorder::default();
        let observed =
            run_repeated_seeded(&mut source_to_sink(5), 2, &settings, 9, &mut recorder).unwrap();
        let silent =
            run_repeated_seeded(&mut source_to_sink(5), 2, &settings, 9, &mut NoProgress).unwrap();

        assert_eq!(observed, silent);
        assert_eq!(recorder.0, vec!["start 2", "1/2", "2/2", "finish"]);
    }

    #[test]
    fn seeded_repetitions_are_reproducible() {
        let settings = RunSettings::default();
        let first = run_repeated_seeded(&mut source_to_sink(15), 3, &settings, 1234, &mut NoProgress)
            .unwrap();
        let second =
            run_repeated_seeded(&mut source_to_sink(15), 5, &settings, 1234, &mut NoProgress)
                .unwrap();

        for repetition in 0..3 {
            assert_eq!(first[&repetition], second[&repetition]);
        }
        assert_ne!(first[&0].time, first[&1].time);
    }

    #[test]
    fn derived_seeds_differ() {
        assert_ne!(derive_seed(0, 0), derive_seed(0, 1));
        assert_ne!(derive_seed(0, 1), derive_seed(1, 1));
        assert_eq!(derive_seed(7, 3), derive_seed(7, 3));
    }

    #[test]
    #[cfg(feature = "parallel")]
    fn parallel_matches_sequential() {
        let settings = RunSettings {
            max_steps: Some(10),
            ..Default::default()
        };
        let network = source_to_sink(25);

        let parallel = run_repeated_parallel(&network, 6, &settings, 99).unwrap();
        let sequential =
            run_repeated_seeded(&mut network.clone(), 6, &settings, 99, &mut NoProgress).unwrap();

        assert_eq!(parallel, sequential);
        assert_eq!(network.nodes(), &vec![25, 0]);
    }
}
