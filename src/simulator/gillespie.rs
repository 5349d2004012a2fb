use super::{EnabledTransition, UniformSource};
use crate::network::data::Binding;
use crate::SimulationError;

/// Tolerance on the cumulative probability, to absorb rounding errors of the summation.
pub const EPSILON: f64 = 1e-5;

#[derive(Clone, Debug, PartialEq)]
pub struct SampledEvent {
    pub transition: usize,
    pub binding: Binding,
    pub delay: f64,
}

/// Samples the next transition to fire and the delay until it fires, drawing two numbers from `random`.
///
/// The delay until the first of independent exponential clocks rings is itself exponentially distributed,
/// with the sum of their rates as rate; transition `i` is the first one with probability `rate_i / sum`.
pub fn sample<U: UniformSource + ?Sized>(
    enabled: &[EnabledTransition],
    random: &mut U,
) -> Result<SampledEvent, SimulationError> {
    if enabled.is_empty() {
        return Err(SimulationError::NoEnabledTransition);
    }
    if total_rate(enabled) <= 0.0 {
        return Err(SimulationError::ZeroRateDeadlock);
    }

    let u1 = random.next_uniform();
    let u2 = random.next_uniform();

    select(enabled, u1, u2)
}

/// The deterministic part of `sample`: `u1` determines the delay and `u2` the transition.
pub fn select(
    enabled: &[EnabledTransition],
    u1: f64,
    u2: f64,
) -> Result<SampledEvent, SimulationError> {
    if enabled.is_empty() {
        return Err(SimulationError::NoEnabledTransition);
    }

    let sum_rates = total_rate(enabled);
    if sum_rates <= 0.0 {
        return Err(SimulationError::ZeroRateDeadlock);
    }

    // u1 = 0 would yield an infinite delay
    let delay = -u1.max(f64::MIN_POSITIVE).ln() / sum_rates;

    let mut cumulative = 0.0;
    let mut last_candidate = None;
    for (index, candidate) in enabled.iter().enumerate() {
        if candidate.rate == 0.0 {
            continue;
        }

        cumulative += candidate.rate / sum_rates;
        if cumulative > 1.0 + EPSILON {
            return Err(SimulationError::InvalidProbability { cumulative });
        }

        last_candidate = Some(index);
        if cumulative >= u2 {
            break;
        }
    }

    // Rounding may leave the final cumulative probability just below u2
    let index = last_candidate.ok_or(SimulationError::ZeroRateDeadlock)?;
    let chosen = &enabled[index];

    Ok(SampledEvent {
        transition: chosen.transition,
        binding: chosen.binding.clone(),
        delay,
    })
}

fn total_rate(enabled: &[EnabledTransition]) -> f64 {
    enabled.iter().map(|e| e.rate).sum()
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::simulator::resolve_enabled;
    use crate::test_nets::combustion;

    fn enabled(rates: &[f64]) -> Vec<EnabledTransition> {
        rates
            .iter()
            .enumerate()
            .map(|(transition, &rate)| EnabledTransition {
                transition,
                binding: Binding::new().with("x", transition as u32),
                rate,
            })
            .collect()
    }

    #[test]
    fn select_is_deterministic() {
        let list = enabled(&[1.0, 3.0]);
        let u1 = (-1.0f64).exp();

        let first = select(&list, u1, 0.2).unwrap();
        assert_eq!(first.transition, 0);
        assert_eq!(first.binding, Binding::new().with("x", 0));
        assert!((first.delay - 0.25).abs() < 1e-12);
        assert_eq!(select(&list, u1, 0.2).unwrap(), first);

        let second = select(&list, u1, 0.3).unwrap();
        assert_eq!(second.transition, 1);
        assert_eq!(second.delay, first.delay);
    }

    #[test]
    fn select_skips_zero_rates() {
        let list = enabled(&[0.0, 2.0, 0.0]);
        assert_eq!(select(&list, 0.5, 0.0).unwrap().transition, 1);
        assert_eq!(select(&list, 0.5, 0.999999).unwrap().transition, 1);
    }

    #[test]
    fn select_tolerates_rounding() {
        let list = enabled(&[0.1, 0.2, 0.3, 0.4]);
        let event = select(&list, 0.5, 1.0 - f64::EPSILON).unwrap();
        assert_eq!(event.transition, 3);
    }

    #[test]
    fn select_with_zero_uniform_has_finite_delay() {
        let event = select(&enabled(&[1.0]), 0.0, 0.5).unwrap();
        assert!(event.delay.is_finite());
    }

    #[test]
    fn select_rejects_corrupted_rates() {
        let list = enabled(&[2.0, -1.0]);
        assert!(matches!(
            select(&list, 0.5, 0.99),
            Err(SimulationError::InvalidProbability { cumulative }) if cumulative > 1.0
        ));
    }

    #[test]
    fn sample_signals_degenerate_lists() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            sample(&[], &mut rng),
            Err(SimulationError::NoEnabledTransition)
        ));
        assert!(matches!(
            sample(&enabled(&[0.0, 0.0]), &mut rng),
            Err(SimulationError::ZeroRateDeadlock)
        ));
    }

    #[test]
    fn sample_frequencies_follow_rates() {
        // Rates: water 10000, rust 5000, titanium dioxide 0
        let network = combustion(100, 100, 0, 100, 0, 100, 0);
        let list = resolve_enabled(&network).unwrap();
        let mut rng = StdRng::seed_from_u64(0x5eed);

        let num_trials = 15000;
        let mut counts = [0usize; 3];
        let mut total_delay = 0.0;
        for _ in 0..num_trials {
            let event = sample(&list, &mut rng).unwrap();
            assert_eq!(event.binding, list[event.transition].binding);
            counts[event.transition] += 1;
            total_delay += event.delay;
        }

        let frequency = |index: usize| counts[index] as f64 / num_trials as f64;
        assert!((frequency(0) - 2.0 / 3.0).abs() < 0.05);
        assert!((frequency(1) - 1.0 / 3.0).abs() < 0.05);
        assert_eq!(counts[2], 0);

        // The delay follows Exp(15000), whose mean is 1/15000
        let mean_delay = total_delay / num_trials as f64;
        assert!((mean_delay * 15000.0 - 1.0).abs() < 0.05);
    }
}
