//! A line-based text format for stochastic Petri networks:
//!
//! ```text
//! # initial marking
//! source = 36
//!
//! # [label:] inputs -> outputs [@ rate]
//! drain: source -> sink @ mass(0.5)
//! {?catalyst, 2*A} -> {B, C} @ catalyst * A / 10
//! ```
//!
//! A side is either a single place or a set of places; `2*A` moves two tokens and `?A` reads `A` without
//! consuming it. The rate is a number, `mass(k)` for mass action with constant `k`, or an arithmetic
//! expression over the place names. Transitions without rate fire with rate 1.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    hash::Hash,
    num::{ParseFloatError, ParseIntError},
};

use thiserror::Error;

use crate::network::data::PetriNodeData;
use crate::{NetworkError, PetriNetwork, PetriTransition, Rate, TIME_KEY};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error on line {0}")]
    SyntaxError(usize),
    #[error("invalid integer: {0}")]
    ParseIntError(#[from] ParseIntError),
    #[error("invalid rate on line {line}: {message}")]
    InvalidRate { line: usize, message: String },
    #[error("line {0}: the place name `time` is reserved")]
    ReservedName(usize),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

pub fn parse(raw: &str) -> Result<PetriNetwork, ParseError> {
    let rules = parse_rules(raw)?;

    let transitions = rules
        .iter()
        .filter_map(|rule| match rule {
            Rule::Transition(t) => Some(t),
            _ => None,
        })
        .collect::<Vec<_>>();

    let assigns = rules
        .iter()
        .filter_map(|rule| match rule {
            Rule::Assign(node, value) => Some((node, *value)),
            _ => None,
        })
        .collect::<Vec<_>>();

    let nodes = transitions
        .iter()
        .flat_map(|transition| transition.places())
        .chain(assigns.iter().map(|(name, _)| name.as_str()))
        .collect::<BTreeSet<_>>();

    let indices = get_indices(nodes.iter().map(|name| name.to_string()).collect::<Vec<_>>().iter());

    let node_data = get_node_data(&indices);

    let nodes = get_values(&assigns, &indices);

    let transitions = transitions
        .iter()
        .map(|transition| generate_edge(transition, &indices))
        .collect::<Vec<_>>();

    Ok(PetriNetwork::new(nodes, node_data, transitions)?)
}

#[derive(Debug, PartialEq)]
enum Rule {
    Transition(Transition),
    Assign(String, u32),
}

#[derive(Debug, PartialEq)]
struct Transition {
    label: Option<String>,
    inputs: BTreeMap<String, u32>,
    outputs: BTreeMap<String, u32>,
    reads: BTreeSet<String>,
    rate: Rate,
}

impl Transition {
    fn places(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .keys()
            .chain(self.outputs.keys())
            .chain(self.reads.iter())
            .map(|name| name.as_str())
    }
}

#[derive(Debug, Default, PartialEq)]
struct Side {
    weighted: BTreeMap<String, u32>,
    reads: BTreeSet<String>,
}

fn parse_rules(raw: &str) -> Result<Vec<Rule>, ParseError> {
    let mut res = Vec::new();

    for (index, line) in raw.lines().enumerate() {
        let line_number = index + 1;
        let line = match line.split_once('#') {
            Some((content, _comment)) => content,
            None => line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        let split = line.split("->").collect::<Vec<_>>();

        match split[..] {
            [left, right] => {
                let (label, left) = match left.split_once(':') {
                    Some((label, left)) => (Some(parse_name(label, line_number)?), left),
                    None => (None, left),
                };
                let (right, rate) = match right.split_once('@') {
                    Some((right, rate)) => (right, parse_rate(rate, line_number)?),
                    None => (right, Rate::default()),
                };

                let inputs = parse_set(left, line_number)?;
                let outputs = parse_set(right, line_number)?;
                if !outputs.reads.is_empty() {
                    return Err(ParseError::SyntaxError(line_number));
                }

                res.push(Rule::Transition(Transition {
                    label,
                    inputs: inputs.weighted,
                    outputs: outputs.weighted,
                    reads: inputs.reads,
                    rate,
                }))
            }
            [_] => {
                if let [name, value] = line.split('=').collect::<Vec<_>>()[..] {
                    let name = parse_name(name, line_number)?;
                    let value = value.trim().parse::<u32>()?;

                    res.push(Rule::Assign(name, value));
                } else {
                    return Err(ParseError::SyntaxError(line_number));
                }
            }
            _ => {
                return Err(ParseError::SyntaxError(line_number));
            }
        }
    }

    Ok(res)
}

fn parse_set(raw: &str, line: usize) -> Result<Side, ParseError> {
    let raw = raw.trim();
    let items = if raw.starts_with('{') {
        if !raw.ends_with('}') {
            return Err(ParseError::SyntaxError(line));
        }
        &raw[1..(raw.len() - 1)]
    } else if raw.is_empty() {
        return Err(ParseError::SyntaxError(line));
    } else {
        raw
    };

    let mut res = Side::default();
    for item in items.split(|c: char| c == ',' || c.is_whitespace()) {
        if item.is_empty() {
            continue;
        }

        if let Some(name) = item.strip_prefix('?') {
            res.reads.insert(parse_name(name, line)?);
            continue;
        }

        let (weight, name) = match item.split_once('*') {
            Some((weight, name)) => (weight.parse::<u32>()?, name),
            None => (1, item),
        };
        if weight > 0 {
            *res.weighted.entry(parse_name(name, line)?).or_insert(0) += weight;
        }
    }
    Ok(res)
}

fn parse_name(raw: &str, line: usize) -> Result<String, ParseError> {
    let name = raw.trim();
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !valid {
        Err(ParseError::SyntaxError(line))
    } else if name == TIME_KEY {
        Err(ParseError::ReservedName(line))
    } else {
        Ok(name.to_owned())
    }
}

fn parse_rate(raw: &str, line: usize) -> Result<Rate, ParseError> {
    let raw = raw.trim();
    let invalid = |message: String| ParseError::InvalidRate { line, message };

    if let Ok(constant) = raw.parse::<f64>() {
        return Ok(Rate::Constant(constant));
    }

    if let Some(constant) = raw.strip_prefix("mass(").and_then(|rest| rest.strip_suffix(')')) {
        return constant
            .trim()
            .parse::<f64>()
            .map(Rate::MassAction)
            .map_err(|e: ParseFloatError| invalid(e.to_string()));
    }

    raw.parse()
        .map(Rate::Expression)
        .map_err(|e: meval::Error| invalid(e.to_string()))
}

fn generate_edge(rule: &Transition, indices: &HashMap<String, usize>) -> PetriTransition {
    // Every place of `rule` was registered in `indices` by `parse`
    let mut res = PetriTransition::new(vec![], vec![], rule.rate.clone());

    for (input, &weight) in rule.inputs.iter() {
        res.add_input(indices[input], weight);
    }
    for (output, &weight) in rule.outputs.iter() {
        res.add_output(indices[output], weight);
    }
    for read in rule.reads.iter() {
        res.add_read(indices[read]);
    }
    if let Some(label) = &rule.label {
        res.label(label.clone());
    }

    res
}

fn get_indices<'a, T: Hash + Clone + Eq + 'a>(
    iter: impl IntoIterator<Item = &'a T>,
) -> HashMap<T, usize> {
    let mut res = HashMap::new();

    for (index, item) in iter.into_iter().enumerate() {
        res.insert(item.clone(), index);
    }

    res
}

fn get_values(assigns: &[(&String, u32)], indices: &HashMap<String, usize>) -> Vec<u32> {
    let mut res = vec![0; indices.len()];

    for &(name, value) in assigns {
        res[indices[name]] = value;
    }

    res
}

fn get_node_data(indices: &HashMap<String, usize>) -> Vec<PetriNodeData> {
    let mut res = vec![PetriNodeData::default(); indices.len()];

    for (name, &index) in indices {
        res[index] = PetriNodeData::default().label(name.clone());
    }

    res
}
