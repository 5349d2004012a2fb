//! JSON storage of simulation results.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::simulator::{RunCollection, StochasticNet};
use crate::{PersistenceError, PetriNetwork};

pub const RUNS_FILE: &str = "run_to_log.json";
pub const HYPERPARAMETERS_FILE: &str = "hyperparameters.json";
pub const SUMMARY_FILE: &str = "summary.json";

/// Top-level key of a loaded log: keys written as plain decimal integers (like repetition indices) are recovered
/// as such.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogKey {
    Index(u64),
    Name(String),
}

impl From<String> for LogKey {
    fn from(key: String) -> Self {
        // "01" and "+1" stay names so that distinct keys never collapse into one index
        match key.parse::<u64>() {
            Ok(index) if index.to_string() == key => LogKey::Index(index),
            _ => LogKey::Name(key),
        }
    }
}

/// Writes `value` as JSON to `path`, creating the missing parent directories.
/// Object keys are written in sorted order.
pub fn store_log<T: Serialize + ?Sized>(value: &T, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
    let path = path.as_ref();
    if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
        return Err(PersistenceError::InvalidExtension(path.to_path_buf()));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    // Going through `Value` sorts the keys of flattened structs too
    let value = serde_json::to_value(value)?;

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &value)?;
    writer.flush()?;

    tracing::debug!(path = %path.display(), "stored log");
    Ok(())
}

/// Reads a JSON object from `path`, converting its top-level keys to integers where possible.
pub fn load_log(path: impl AsRef<Path>) -> Result<BTreeMap<LogKey, serde_json::Value>, PersistenceError> {
    let reader = BufReader::new(File::open(path)?);
    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_reader(reader)?;

    Ok(raw.into_iter().map(|(key, value)| (LogKey::from(key), value)).collect())
}

/// Reads a run collection written by `store_log` or `store_experiment`.
pub fn load_runs(path: impl AsRef<Path>) -> Result<RunCollection, PersistenceError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// The parameters of an experiment: the rate of every transition and the initial marking of every place.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub rates: BTreeMap<String, String>,
    pub initial_marking: BTreeMap<String, u32>,
}

impl Hyperparameters {
    /// Reads the parameters off `network`, whose current marking is taken as the initial one.
    pub fn from_network(network: &PetriNetwork) -> Self {
        let rates = network
            .transitions()
            .iter()
            .enumerate()
            .map(|(index, transition)| (network.transition_label(index), transition.rate.describe()))
            .collect();

        Self {
            rates,
            initial_marking: network.places().into_iter().collect(),
        }
    }
}

/// Stores the runs of an experiment and its parameters next to each other in `directory`.
pub fn store_experiment(
    directory: impl AsRef<Path>,
    runs: &RunCollection,
    hyperparameters: &Hyperparameters,
) -> Result<(), PersistenceError> {
    let directory = directory.as_ref();

    store_log(runs, directory.join(RUNS_FILE))?;
    store_log(hyperparameters, directory.join(HYPERPARAMETERS_FILE))?;

    tracing::info!(
        directory = %directory.display(),
        runs = runs.len(),
        "stored experiment"
    );
    Ok(())
}
