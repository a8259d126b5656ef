//! Random k-CNF generation (spec §4 of SPEC_FULL.md), grounded on
//! `original_source/randcnf.py`.

use std::io::Write;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Draws `width` distinct variables out of `1..=num_vars` and gives each a
/// random sign.
pub fn random_clause(num_vars: usize, width: usize, rng: &mut StdRng) -> Vec<i64> {
    let mut vars: Vec<i64> = (1..=num_vars as i64).collect();
    vars.shuffle(rng);
    vars.truncate(width);
    vars.into_iter()
        .map(|v| if rng.gen_bool(0.5) { v } else { -v })
        .collect()
}

pub fn random_formula(
    num_vars: usize,
    num_clauses: usize,
    width: usize,
    rng: &mut StdRng,
) -> Vec<Vec<i64>> {
    (0..num_clauses)
        .map(|_| random_clause(num_vars, width, rng))
        .collect()
}

pub fn write_formula<W: Write>(
    out: &mut W,
    num_vars: usize,
    formula: &[Vec<i64>],
) -> std::io::Result<()> {
    writeln!(out, "p cnf {} {}", num_vars, formula.len())?;
    for clause in formula {
        let body = clause
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{body} 0")?;
    }
    Ok(())
}

/// A suite of random 3-CNF instances with clause counts spaced along
/// `MIN_NUM_CLAUSES..=MAX_NUM_CLAUSES` and a variable count chosen so that
/// the clauses-to-variables ratio grows roughly cubically, matching
/// `gen_poly_3cnf_suite`.
pub struct SuiteInstance {
    pub name: String,
    pub num_vars: usize,
    pub formula: Vec<Vec<i64>>,
}

pub fn generate_poly_3cnf_suite(rng: &mut StdRng) -> Vec<SuiteInstance> {
    const MIN_NUM_CLAUSES: usize = 32;
    const MAX_NUM_CLAUSES: usize = 256;
    const STEP: usize = 4;
    const INSTANCES: usize = 16;
    const WIDTH: usize = 3;

    let mut suite = Vec::new();
    let mut m = MIN_NUM_CLAUSES;
    while m <= MAX_NUM_CLAUSES {
        let n = ((m as f64).cbrt()).ceil() as usize;
        for i in 0..INSTANCES {
            let formula = random_formula(n, m, WIDTH, rng);
            suite.push(SuiteInstance {
                name: format!("poly-{n}-{m}-{i}.cnf"),
                num_vars: n,
                formula,
            });
        }
        m += STEP;
    }
    suite
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn clause_literals_are_distinct_variables_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let clause = random_clause(10, 3, &mut rng);
        assert_eq!(clause.len(), 3);
        let mut vars: Vec<i64> = clause.iter().map(|l| l.abs()).collect();
        vars.sort_unstable();
        vars.dedup();
        assert_eq!(vars.len(), 3);
        assert!(vars.iter().all(|&v| (1..=10).contains(&v)));
    }

    #[test]
    fn formula_has_requested_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let formula = random_formula(20, 15, 3, &mut rng);
        assert_eq!(formula.len(), 15);
        assert!(formula.iter().all(|c| c.len() == 3));
    }

    #[test]
    fn write_formula_emits_dimacs_header_and_trailing_zero() {
        let mut rng = StdRng::seed_from_u64(2);
        let formula = random_formula(5, 2, 3, &mut rng);
        let mut buf = Vec::new();
        write_formula(&mut buf, 5, &formula).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("p cnf 5 2\n"));
        assert!(text.lines().skip(1).all(|l| l.ends_with(" 0")));
    }

    #[test]
    fn poly_3cnf_suite_sweeps_clause_counts_with_cube_root_sized_vars() {
        let mut rng = StdRng::seed_from_u64(3);
        let suite = generate_poly_3cnf_suite(&mut rng);

        assert_eq!(suite.len(), 16 * ((256 - 32) / 4 + 1));
        assert!(suite.iter().all(|inst| inst.formula.iter().all(|c| c.len() == 3)));
        let first = &suite[0];
        assert_eq!(first.num_vars, (32f64).cbrt().ceil() as usize);
        assert_eq!(first.formula.len(), 32);
    }
}
