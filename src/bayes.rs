//! Bayesian-network to weighted-CNF encoder (spec §4 of SPEC_FULL.md),
//! grounded on `original_source/graphical/bayes_graph.py`.
//!
//! One indicator variable per (network variable, value); one parameter
//! variable per CPT entry. At-most-one clauses keep each variable's
//! indicators exclusive, at-least-one clauses over a factor's parameter
//! variables make its table jointly exhaustive, and
//! `parameter -> indicator` implication clauses tie a chosen table row back
//! to the variable assignments it represents.

use std::collections::BTreeMap;
use std::io::Write;

use crate::error::SolverError;

pub struct BayesNetwork {
    cardinalities: Vec<usize>,
    /// Each factor names the (ordered) network variables its table ranges
    /// over.
    factors: Vec<Vec<usize>>,
    /// One table per factor, keyed by the local value-assignment (aligned
    /// with that factor's variable list) and holding the probability as its
    /// original text so no precision is lost.
    tables: Vec<BTreeMap<Vec<usize>, String>>,
}

impl BayesNetwork {
    pub fn parse(text: &str) -> Result<BayesNetwork, SolverError> {
        let mut lines = text.lines();
        let header = lines
            .next()
            .ok_or_else(|| SolverError::invariant("empty .uai file"))?;
        if header.trim() != "BAYES" {
            return Err(SolverError::invariant(
                "file does not contain a Bayes network in .uai format",
            ));
        }
        lines.next(); // declared variable count, unused like the original
        let cardinalities: Vec<usize> = parse_ints(
            lines
                .next()
                .ok_or_else(|| SolverError::invariant("missing cardinality line"))?,
        )?;
        let num_factors: usize = lines
            .next()
            .ok_or_else(|| SolverError::invariant("missing factor count line"))?
            .trim()
            .parse()
            .map_err(|_| SolverError::invariant("factor count is not an integer"))?;

        let mut factors = Vec::with_capacity(num_factors);
        for _ in 0..num_factors {
            let description: Vec<usize> = parse_ints(
                lines
                    .next()
                    .ok_or_else(|| SolverError::invariant("missing factor description line"))?,
            )?;
            let (&arity, vars) = description
                .split_first()
                .ok_or_else(|| SolverError::invariant("empty factor description"))?;
            if arity != vars.len() {
                return Err(SolverError::invariant(
                    "factor arity does not match the number of variables listed",
                ));
            }
            factors.push(vars.to_vec());
        }

        let remainder: String = lines.collect::<Vec<_>>().join(" ");
        let mut tokens = remainder.split_whitespace();
        let mut tables = Vec::with_capacity(num_factors);
        for factor in &factors {
            let num_entries: usize = tokens
                .next()
                .ok_or_else(|| SolverError::invariant("truncated function table"))?
                .parse()
                .map_err(|_| SolverError::invariant("function table size is not an integer"))?;
            let mut table = BTreeMap::new();
            let mut assignment = vec![0usize; factor.len()];
            for _ in 0..num_entries {
                let value = tokens
                    .next()
                    .ok_or_else(|| SolverError::invariant("truncated function table entry"))?;
                table.insert(assignment.clone(), value.to_string());
                for j in (0..assignment.len()).rev() {
                    if assignment[j] < cardinalities[factor[j]] - 1 {
                        assignment[j] += 1;
                        break;
                    } else {
                        assignment[j] = 0;
                    }
                }
            }
            tables.push(table);
        }

        Ok(BayesNetwork {
            cardinalities,
            factors,
            tables,
        })
    }

    fn indicator_index(&self, var: usize, val: usize) -> usize {
        self.cardinalities[..var].iter().sum::<usize>() + val
    }

    fn num_indicators(&self) -> usize {
        self.cardinalities.iter().sum()
    }

    /// Returns `(weights, clauses)`; clause literals are 1-based DIMACS
    /// integers over a variable space of `weights.len()` propositional
    /// variables.
    pub fn to_formula(&self) -> (Vec<String>, Vec<Vec<i64>>) {
        let num_indicators = self.num_indicators();
        let mut weights = vec!["1.0".to_string(); num_indicators];
        let mut clauses = Vec::new();

        for var in 0..self.cardinalities.len() {
            let indicators: Vec<usize> = (0..self.cardinalities[var])
                .map(|val| self.indicator_index(var, val))
                .collect();
            clauses.extend(at_most_one(&indicators));
        }

        // Parameter variables, one per CPT entry, in `(factor, assignment)`
        // order; stable so `parameter_index` below agrees with `weights`.
        let mut parameter_index: BTreeMap<(usize, Vec<usize>), usize> = BTreeMap::new();
        for (factor_i, table) in self.tables.iter().enumerate() {
            for (assignment, prob) in table {
                parameter_index.insert((factor_i, assignment.clone()), weights.len());
                weights.push(prob.clone());
            }
        }

        for (factor_i, table) in self.tables.iter().enumerate() {
            let params_in_factor: Vec<i64> = table
                .keys()
                .map(|assignment| {
                    let idx = parameter_index[&(factor_i, assignment.clone())];
                    (idx + 1) as i64
                })
                .collect();
            clauses.push(params_in_factor);
        }

        for (factor_i, table) in self.tables.iter().enumerate() {
            for assignment in table.keys() {
                let param_lit = (parameter_index[&(factor_i, assignment.clone())] + 1) as i64;
                for (local_var, &val) in assignment.iter().enumerate() {
                    let var = self.factors[factor_i][local_var];
                    let indicator_lit = (self.indicator_index(var, val) + 1) as i64;
                    clauses.push(vec![-param_lit, indicator_lit]);
                }
            }
        }

        (weights, clauses)
    }

    /// Parses a `.uai.evid` evidence file into unit clauses forcing the
    /// observed indicator for each named variable.
    pub fn evidence_to_formula(&self, text: &str) -> Result<Vec<Vec<i64>>, SolverError> {
        let description = parse_ints(text)?;
        let (&count, rest) = description
            .split_first()
            .ok_or_else(|| SolverError::invariant("empty evidence file"))?;
        if rest.len() != count * 2 {
            return Err(SolverError::invariant("evidence file is improperly formatted"));
        }
        let mut clauses = Vec::with_capacity(count);
        for pair in rest.chunks_exact(2) {
            let (var, val) = (pair[0], pair[1]);
            let lit = (self.indicator_index(var, val) + 1) as i64;
            clauses.push(vec![lit]);
        }
        Ok(clauses)
    }
}

/// For each pair of literals in `indicators`, forbids both being true.
fn at_most_one(indicators: &[usize]) -> Vec<Vec<i64>> {
    let mut clauses = Vec::new();
    for i in 0..indicators.len() {
        for j in (i + 1)..indicators.len() {
            clauses.push(vec![-((indicators[i] + 1) as i64), -((indicators[j] + 1) as i64)]);
        }
    }
    clauses
}

fn parse_ints(line: &str) -> Result<Vec<usize>, SolverError> {
    line.split_whitespace()
        .map(|tok| {
            tok.parse()
                .map_err(|_| SolverError::invariant(format!("expected an integer, found '{tok}'")))
        })
        .collect()
}

pub fn write_cnf_and_weights<W1: Write, W2: Write>(
    weights: &[String],
    clauses: &[Vec<i64>],
    cnf_out: &mut W1,
    weights_out: &mut W2,
) -> std::io::Result<()> {
    writeln!(cnf_out, "p cnf {} {}", weights.len(), clauses.len())?;
    for clause in clauses {
        let body = clause
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(cnf_out, "{body} 0")?;
    }

    writeln!(weights_out, "p {}", weights.len())?;
    for (i, weight) in weights.iter().enumerate() {
        let var = i + 1;
        writeln!(weights_out, "w {var} {weight} 0")?;
        writeln!(weights_out, "w -{var} 1.0 0")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_network() -> &'static str {
        "BAYES\n2\n2 2\n2\n1 0\n1 1\n2 0.6 0.4\n2 0.1 0.9\n"
    }

    #[test]
    fn parses_cardinalities_and_factors() {
        let net = BayesNetwork::parse(sample_network()).unwrap();
        assert_eq!(net.cardinalities, vec![2, 2]);
        assert_eq!(net.factors, vec![vec![0], vec![1]]);
        assert_eq!(net.tables[0][&vec![0]], "0.6");
        assert_eq!(net.tables[0][&vec![1]], "0.4");
    }

    #[test]
    fn to_formula_produces_one_indicator_per_value_and_exclusion_clauses() {
        let net = BayesNetwork::parse(sample_network()).unwrap();
        let (weights, clauses) = net.to_formula();
        // 4 indicators (2 vars x 2 values) + 4 parameter vars (2 CPT entries each).
        assert_eq!(weights.len(), 8);
        // at-most-one: one clause per variable; at-least-one: one clause per factor;
        // implication: one clause per parameter.
        assert!(clauses.iter().any(|c| c.len() == 2 && c.iter().all(|&l| l < 0)));
    }

    #[test]
    fn evidence_forces_the_named_indicator() {
        let net = BayesNetwork::parse(sample_network()).unwrap();
        let clauses = net.evidence_to_formula("1 0 1").unwrap();
        assert_eq!(clauses, vec![vec![2]]);
    }

    #[test]
    fn rejects_non_bayes_header() {
        assert!(BayesNetwork::parse("MARKOV\n").is_err());
    }
}
