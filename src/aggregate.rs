//! Conversion of event-driven trajectories to series on a regular time grid, so that independent runs
//! can be compared index by index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::simulator::RunCollection;
use crate::SimulationError;

/// Averages `measurements` within consecutive boxes of width `timebox_size`, box `i` covering the
/// interval `[i * timebox_size, (i + 1) * timebox_size)`.
///
/// `timestamps` must be in ascending order. An empty box takes the value of the box before it, or 0 if it
/// is the first one; the boxes after the last measurement all repeat the value of the last filled box.
/// Measurements past the last box are ignored.
pub fn aggregate_in_timeboxes(
    timestamps: &[f64],
    measurements: &[f64],
    num_timeboxes: usize,
    timebox_size: f64,
) -> Result<Vec<f64>, SimulationError> {
    if timestamps.len() != measurements.len() {
        return Err(SimulationError::LengthMismatch {
            timestamps: timestamps.len(),
            measurements: measurements.len(),
        });
    }

    let mut output = vec![0.0; num_timeboxes];
    if num_timeboxes == 0 {
        return Ok(output);
    }

    let end_time = |timebox: usize| (timebox + 1) as f64 * timebox_size;

    let mut current = 0;
    let mut points_added = 0;

    for (&timestamp, &measurement) in timestamps.iter().zip(measurements) {
        while timestamp >= end_time(current) {
            close_timebox(&mut output, current, points_added);
            points_added = 0;
            current += 1;

            if current >= num_timeboxes {
                return Ok(output);
            }
        }

        output[current] += measurement;
        points_added += 1;
    }

    close_timebox(&mut output, current, points_added);

    let last = output[current];
    for value in output[current..].iter_mut() {
        *value = last;
    }

    Ok(output)
}

/// Turns the sum accumulated in `output[timebox]` into the value of that box.
fn close_timebox(output: &mut [f64], timebox: usize, points_added: usize) {
    output[timebox] = match (points_added, timebox) {
        (0, 0) => 0.0,
        (0, _) => output[timebox - 1],
        (n, _) => output[timebox] / n as f64,
    };
}

/// Statistics across runs of one variable, one value per timebox.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxStatistics {
    pub mean: Vec<f64>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
    /// Sample standard deviation; 0 when there is a single run.
    pub std: Vec<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// Centres of the timeboxes.
    pub x: Vec<f64>,
    pub series: BTreeMap<String, BoxStatistics>,
}

/// Aggregates every run into `num_timeboxes` boxes spanning `[0, max_x]`, `max_x` being the largest final
/// value of `x_var` over all runs, and computes the per-box statistics of each variable of `y_vars`.
pub fn summarize(
    runs: &RunCollection,
    x_var: &str,
    y_vars: &[&str],
    num_timeboxes: usize,
) -> Result<SeriesSummary, SimulationError> {
    let unknown = |name: &str| SimulationError::UnknownVariable(name.to_owned());

    let xs = runs
        .values()
        .map(|log| log.series(x_var).ok_or_else(|| unknown(x_var)))
        .collect::<Result<Vec<_>, _>>()?;

    let max_x = xs
        .iter()
        .filter_map(|x| x.last().copied())
        .fold(0.0, f64::max);
    let timebox_size = if num_timeboxes > 0 {
        max_x / num_timeboxes as f64
    } else {
        0.0
    };

    let mut summary = SeriesSummary {
        x: (0..num_timeboxes)
            .map(|i| (i as f64 + 0.5) * timebox_size)
            .collect(),
        series: BTreeMap::new(),
    };

    for &y_var in y_vars {
        let mut aggregated = Vec::with_capacity(runs.len());
        for (log, x) in runs.values().zip(&xs) {
            let y = log.series(y_var).ok_or_else(|| unknown(y_var))?;
            aggregated.push(aggregate_in_timeboxes(x, &y, num_timeboxes, timebox_size)?);
        }

        tracing::debug!(variable = y_var, runs = aggregated.len(), "aggregated runs");
        summary
            .series
            .insert(y_var.to_owned(), statistics(&aggregated, num_timeboxes));
    }

    Ok(summary)
}

fn statistics(aggregated: &[Vec<f64>], num_timeboxes: usize) -> BoxStatistics {
    let mut res = BoxStatistics::default();
    if aggregated.is_empty() {
        return res;
    }

    let count = aggregated.len() as f64;
    for timebox in 0..num_timeboxes {
        let values = aggregated.iter().map(|run| run[timebox]);

        let mean = values.clone().sum::<f64>() / count;
        let std = if aggregated.len() > 1 {
            let squares = values.clone().map(|v| (v - mean).powi(2)).sum::<f64>();
            (squares / (count - 1.0)).sqrt()
        } else {
            0.0
        };

        res.mean.push(mean);
        res.min.push(values.clone().fold(f64::INFINITY, f64::min));
        res.max.push(values.fold(f64::NEG_INFINITY, f64::max));
        res.std.push(std);
    }

    res
}
