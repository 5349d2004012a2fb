use super::StochasticNet;
use crate::network::data::Binding;
use crate::SimulationError;

/// An enabled transition, along with the binding it will fire with and its current rate.
#[derive(Clone, Debug, PartialEq)]
pub struct EnabledTransition {
    pub transition: usize,
    pub binding: Binding,
    pub rate: f64,
}

/// Lists the enabled transitions of `net`, in the order of their indices.
///
/// Only the first mode of each transition is considered. A transition with a rate of zero is still listed.
/// Fails with `NoEnabledTransition` if no transition has any mode.
pub fn resolve_enabled<N: StochasticNet + ?Sized>(
    net: &N,
) -> Result<Vec<EnabledTransition>, SimulationError> {
    let mut res = Vec::new();

    for transition in 0..net.transition_count() {
        let binding = match net.modes(transition).into_iter().next() {
            Some(binding) => binding,
            None => continue,
        };

        let rate = net.current_rate(transition, &binding)?;
        if !rate.is_finite() || rate < 0.0 {
            return Err(SimulationError::InvalidRate {
                transition: net.transition_name(transition),
                rate,
            });
        }

        res.push(EnabledTransition {
            transition,
            binding,
            rate,
        });
    }

    if res.is_empty() {
        return Err(SimulationError::NoEnabledTransition);
    }

    Ok(res)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_nets::combustion;
    use crate::{PetriBuilder, Rate};

    #[test]
    fn resolve_lists_enabled_transitions_with_rates() {
        let network = combustion(100, 100, 0, 100, 0, 100, 0);
        let enabled = resolve_enabled(&network).unwrap();

        assert_eq!(enabled.len(), 3);
        assert_eq!(enabled[0].transition, 0);
        assert_eq!(enabled[0].rate, 10000.0);
        assert_eq!(
            enabled[0].binding,
            Binding::new()
                .with("hydrogen", 100)
                .with("oxygen", 100)
                .with("water", 0)
        );
        assert_eq!(enabled[1].rate, 5000.0);
        assert_eq!(enabled[2].rate, 0.0);
    }

    #[test]
    fn resolve_skips_disabled_transitions() {
        // No hydrogen: water cannot be produced
        let network = combustion(0, 100, 0, 100, 0, 1, 0);
        let enabled = resolve_enabled(&network).unwrap();

        assert_eq!(
            enabled.iter().map(|e| e.transition).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn resolve_fails_in_dead_state() {
        // Only products hold tokens
        let network = combustion(0, 0, 100, 0, 100, 0, 100);
        assert!(matches!(
            resolve_enabled(&network),
            Err(SimulationError::NoEnabledTransition)
        ));
    }

    #[test]
    fn resolve_rejects_negative_rates() {
        let mut builder = PetriBuilder::new();
        let a = builder.node_with_label(1, "a");
        builder
            .build_transition("broken")
            .input(a)
            .rate(Rate::Constant(-1.0))
            .build();

        assert!(matches!(
            resolve_enabled(&builder.build().unwrap()),
            Err(SimulationError::InvalidRate { rate, .. }) if rate == -1.0
        ));
    }
}
