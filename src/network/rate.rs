use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use meval::{Context, Expr};

use super::data::Binding;

pub type RateFn = dyn Fn(&Binding) -> f64 + Send + Sync;

/// The rate (λ) of the exponentially distributed delay of a transition, as a function of its binding.
#[derive(Clone)]
pub enum Rate {
    /// A fixed rate, independent of the marking.
    Constant(f64),
    /// `k` times the falling factorial of every input count by its arc weight.
    MassAction(f64),
    /// An arithmetic expression over the names of the connected places.
    Expression(RateExpression),
    Custom(Arc<RateFn>),
}

impl Rate {
    pub fn custom<F>(function: F) -> Self
    where
        F: Fn(&Binding) -> f64 + Send + Sync + 'static,
    {
        Rate::Custom(Arc::new(function))
    }

    /// Evaluates the rate for `binding`. `reactants` lists the variable and arc weight of every input place,
    /// and is only used by `MassAction`.
    pub fn evaluate<'a>(
        &self,
        binding: &Binding,
        reactants: impl IntoIterator<Item = (&'a str, u32)>,
    ) -> Result<f64, String> {
        match self {
            Rate::Constant(k) => Ok(*k),
            Rate::MassAction(k) => {
                let mut rate = *k;
                for (variable, weight) in reactants {
                    let available = binding
                        .get(variable)
                        .ok_or_else(|| format!("variable `{}` is not bound", variable))?;
                    rate *= falling_factorial(available, weight);
                }
                Ok(rate)
            }
            Rate::Expression(expression) => expression.evaluate(binding),
            Rate::Custom(function) => Ok((function)(binding)),
        }
    }

    /// A textual representation, used when persisting hyperparameters.
    pub fn describe(&self) -> String {
        match self {
            Rate::Constant(k) => format!("{}", k),
            Rate::MassAction(k) => format!("mass({})", k),
            Rate::Expression(expression) => expression.source().to_owned(),
            Rate::Custom(_) => String::from("<custom>"),
        }
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::Constant(1.0)
    }
}

impl fmt::Debug for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rate::Constant(k) => f.debug_tuple("Constant").field(k).finish(),
            Rate::MassAction(k) => f.debug_tuple("MassAction").field(k).finish(),
            Rate::Expression(expression) => f.debug_tuple("Expression").field(&expression.source).finish(),
            Rate::Custom(function) => write!(f, "Custom({:p})", Arc::as_ptr(function)),
        }
    }
}

impl PartialEq for Rate {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Rate::Constant(a), Rate::Constant(b)) => a == b,
            (Rate::MassAction(a), Rate::MassAction(b)) => a == b,
            (Rate::Expression(a), Rate::Expression(b)) => a.source == b.source,
            (Rate::Custom(a), Rate::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RateExpression {
    source: String,
    expr: Expr,
}

impl RateExpression {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, binding: &Binding) -> Result<f64, String> {
        let mut context = Context::new();
        for (variable, value) in binding.iter() {
            context.var(variable, value as f64);
        }

        self.expr
            .eval_with_context(context)
            .map_err(|e| e.to_string())
    }
}

impl FromStr for RateExpression {
    type Err = meval::Error;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            source: source.trim().to_owned(),
            expr: source.parse()?,
        })
    }
}

#[inline]
fn falling_factorial(value: u32, count: u32) -> f64 {
    if value < count {
        return 0.0;
    }

    let mut acc = 1.0;
    for i in 0..count {
        acc *= (value - i) as f64;
    }
    acc
}

#[cfg(test)]
mod test {
    use super::*;

    const NO_REACTANTS: [(&str, u32); 0] = [];

    #[test]
    fn evaluate_constant() {
        let rate = Rate::Constant(2.5);
        assert_eq!(rate.evaluate(&Binding::new(), NO_REACTANTS), Ok(2.5));
    }

    #[test]
    fn evaluate_mass_action() {
        let binding = Binding::new().with("hydrogen", 10).with("oxygen", 5);
        let rate = Rate::MassAction(0.5);

        // 0.5 * (10 * 9) * 5
        assert_eq!(
            rate.evaluate(&binding, [("hydrogen", 2), ("oxygen", 1)]),
            Ok(225.0)
        );
        assert_eq!(rate.evaluate(&binding, [("oxygen", 6)]), Ok(0.0));
        assert!(rate.evaluate(&binding, [("water", 1)]).is_err());
    }

    #[test]
    fn evaluate_expression() {
        let binding = Binding::new().with("hydrogen", 100).with("oxygen", 100);
        let rate = Rate::Expression("hydrogen * oxygen".parse().unwrap());

        assert_eq!(rate.evaluate(&binding, NO_REACTANTS), Ok(10000.0));
        assert_eq!(rate.describe(), "hydrogen * oxygen");
    }

    #[test]
    fn expression_with_unbound_variable_fails() {
        let rate = Rate::Expression("2 * nitrogen".parse().unwrap());
        assert!(rate.evaluate(&Binding::new(), NO_REACTANTS).is_err());
    }

    #[test]
    fn evaluate_custom() {
        let rate = Rate::custom(|binding| binding.get("a").unwrap_or(0) as f64 / 2.0);
        assert_eq!(rate.evaluate(&Binding::new().with("a", 7), NO_REACTANTS), Ok(3.5));
        assert_eq!(rate, rate.clone());
        assert_ne!(rate, Rate::custom(|_| 3.5));
    }
}
