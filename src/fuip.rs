//! First Unique Implication Point conflict analysis via dominators (spec
//! §4.5). Ported from `fuip_analyzer.py`, with the Lengauer–Tarjan
//! dominator computation completed per the reference sketch in
//! `dominator_sketch.py` (see DESIGN.md: the production `fuip_analyzer.py`
//! dropped the final dominator-correction pass that the sketch has; we keep
//! the correct, complete algorithm).

use std::collections::{HashMap, HashSet};

use crate::brancher::Brancher;
use crate::error::SolverError;
use crate::lit::VarId;
use crate::propagating_formula::PropagatingFormula;

/// A vertex of the conflict DAG: either the artificial conflict sink κ, or
/// the trail item belonging to a variable. Variables are a stable, dense
/// identity (spec §9 prefers integer identity over object references).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Vertex {
    Kappa,
    Var(VarId),
}

pub struct Analysis {
    pub backjump_level: i64,
    pub learned_clause: Vec<i64>,
}

pub fn analyze(
    formula: &PropagatingFormula,
    brancher: &mut dyn Brancher,
) -> Result<Analysis, SolverError> {
    let level = formula.decision_level();
    let assignment = formula.assignment();
    let inner = formula.formula();

    let (root, succ) = build_conflict_dag(level, inner, assignment)?;
    let dom = dominators(Vertex::Var(root), &succ);
    let fuip = *dom
        .get(&Vertex::Kappa)
        .ok_or_else(|| SolverError::invariant("kappa has no immediate dominator"))?;
    let fuip_var = match fuip {
        Vertex::Var(v) => v,
        Vertex::Kappa => {
            return Err(SolverError::invariant(
                "kappa cannot be its own immediate dominator",
            ))
        }
    };

    let pred = build_pred(&succ);
    let (backjump_level, learned_clause) = build_clause(level, fuip_var, &pred, assignment)?;

    for &lit in &learned_clause {
        brancher.record_resolved_lit(dimacs::Lit::from_i64(lit));
    }

    Ok(Analysis {
        backjump_level,
        learned_clause,
    })
}

fn build_conflict_dag(
    level: usize,
    formula: &crate::formula::Formula,
    assignment: &crate::assignment::Assignment,
) -> Result<(VarId, HashMap<Vertex, HashSet<Vertex>>), SolverError> {
    let mut succ: HashMap<Vertex, HashSet<Vertex>> = HashMap::new();
    succ.entry(Vertex::Kappa).or_default();

    let mut worklist: Vec<Vertex> = Vec::new();
    for id in formula.unsat_clause_ids().collect::<Vec<_>>() {
        for var in formula.clause(id).assigned_vars(assignment) {
            succ.entry(Vertex::Var(var)).or_default().insert(Vertex::Kappa);
            worklist.push(Vertex::Var(var));
        }
    }

    let mut seen: HashSet<Vertex> = HashSet::new();
    let mut root: Option<VarId> = None;

    while let Some(v) = worklist.pop() {
        if !seen.insert(v) {
            continue;
        }
        let var = match v {
            Vertex::Var(var) => var,
            Vertex::Kappa => continue,
        };
        let item = assignment
            .item_of(var)
            .ok_or_else(|| SolverError::invariant(format!("variable {var} missing from trail")))?;

        if item.level != level || item.antecedent.is_none() {
            if item.level == level {
                root = Some(var);
            }
            continue;
        }

        let antecedent_id = item.antecedent.unwrap();
        for other in formula.clause(antecedent_id).vars() {
            if other == var {
                continue;
            }
            assignment.item_of(other).ok_or_else(|| {
                SolverError::invariant(format!("antecedent variable {other} missing from trail"))
            })?;
            succ.entry(Vertex::Var(other)).or_default().insert(Vertex::Var(var));
            worklist.push(Vertex::Var(other));
        }
    }

    let root = root.ok_or_else(|| {
        SolverError::invariant("no decision-level vertex found while building conflict DAG")
    })?;
    Ok((root, succ))
}

fn build_pred(succ: &HashMap<Vertex, HashSet<Vertex>>) -> HashMap<Vertex, HashSet<Vertex>> {
    let mut pred: HashMap<Vertex, HashSet<Vertex>> = HashMap::new();
    for (&p, children) in succ {
        for &c in children {
            pred.entry(c).or_default().insert(p);
        }
    }
    pred
}

/// Lengauer–Tarjan immediate dominators, rooted at `root`. Follows the
/// simple (non path-compressed) forest-eval variant of the algorithm, as the
/// corpus's own `dominator_sketch.py` implements — adequate at the problem
/// sizes this solver targets.
fn dominators(root: Vertex, succ: &HashMap<Vertex, HashSet<Vertex>>) -> HashMap<Vertex, Vertex> {
    let mut numbering: HashMap<Vertex, usize> = HashMap::new();
    let mut vertex: Vec<Vertex> = vec![root]; // 1-indexed; vertex[0] unused
    let mut parent: HashMap<Vertex, Vertex> = HashMap::new();
    let mut pred: HashMap<Vertex, Vec<Vertex>> = HashMap::new();
    let mut semi: HashMap<Vertex, usize> = HashMap::new();
    for &v in succ.keys() {
        semi.insert(v, 0);
    }

    // Step 1: iterative preorder DFS numbering.
    let mut stack = vec![root];
    while let Some(v) = stack.pop() {
        if numbering.contains_key(&v) {
            continue;
        }
        let number = vertex.len();
        numbering.insert(v, number);
        if vertex.len() == number {
            vertex.push(v);
        }
        semi.insert(v, number);
        if let Some(children) = succ.get(&v) {
            for &child in children {
                pred.entry(child).or_default().push(v);
                if !numbering.contains_key(&child) {
                    parent.insert(child, v);
                    stack.push(child);
                }
            }
        }
    }
    let current_number = vertex.len() - 1;

    let mut forest_parent: HashMap<Vertex, Vertex> = HashMap::new();
    let mut bucket: HashMap<Vertex, HashSet<Vertex>> = HashMap::new();
    let mut dom: HashMap<Vertex, Vertex> = HashMap::new();

    let eval = |v: Vertex,
                forest_parent: &HashMap<Vertex, Vertex>,
                semi: &HashMap<Vertex, usize>|
     -> Vertex {
        if !forest_parent.contains_key(&v) {
            return v;
        }
        let mut u = v;
        let mut semi_u = semi[&u];
        let mut cur = v;
        while let Some(&next) = forest_parent.get(&cur) {
            if !forest_parent.contains_key(&next) {
                break;
            }
            cur = next;
            if semi[&cur] < semi_u {
                u = cur;
                semi_u = semi[&u];
            }
        }
        u
    };

    for i in (2..=current_number).rev() {
        let w = vertex[i];
        if let Some(preds) = pred.get(&w) {
            for &v in preds {
                let u = eval(v, &forest_parent, &semi);
                if semi[&u] < semi[&w] {
                    *semi.get_mut(&w).unwrap() = semi[&u];
                }
            }
        }
        let bucket_key = vertex[semi[&w]];
        bucket.entry(bucket_key).or_default().insert(w);
        forest_parent.insert(w, parent[&w]);

        if let Some(parent_w) = parent.get(&w).copied() {
            if let Some(entries) = bucket.get_mut(&parent_w) {
                let drained: Vec<Vertex> = entries.drain().collect();
                for v in drained {
                    let u = eval(v, &forest_parent, &semi);
                    if semi[&u] < semi[&v] {
                        dom.insert(v, u);
                    } else {
                        dom.insert(v, parent_w);
                    }
                }
            }
        }
    }

    // Step 4: final correction pass (see module docs).
    for i in 2..=current_number {
        let w = vertex[i];
        let semi_vertex = vertex[semi[&w]];
        if dom.get(&w).copied() != Some(semi_vertex) {
            let fixed = dom[&dom[&w]];
            dom.insert(w, fixed);
        }
    }

    dom
}

/// Starting from κ, cut across every edge that either reaches the FUIP or
/// leaves the conflict decision level; the learned clause negates the
/// surviving vertices' current literals.
fn build_clause(
    conflict_level: usize,
    fuip: VarId,
    pred: &HashMap<Vertex, HashSet<Vertex>>,
    assignment: &crate::assignment::Assignment,
) -> Result<(i64, Vec<i64>), SolverError> {
    let mut stack = vec![Vertex::Kappa];
    let mut seen: HashSet<Vertex> = HashSet::new();
    let mut cut: HashSet<VarId> = HashSet::new();
    let mut max_sub_level: i64 = 0;

    while let Some(v) = stack.pop() {
        if !seen.insert(v) {
            continue;
        }
        let at_level_d_and_not_fuip = match v {
            Vertex::Var(var) => {
                if var == fuip {
                    false
                } else {
                    let item = assignment.item_of(var).ok_or_else(|| {
                        SolverError::invariant(format!("cut variable {var} missing from trail"))
                    })?;
                    item.level != conflict_level
                }
            }
            Vertex::Kappa => false,
        };

        let is_fuip = matches!(v, Vertex::Var(var) if var == fuip);

        if is_fuip || at_level_d_and_not_fuip {
            if let Vertex::Var(var) = v {
                let item = assignment.item_of(var).unwrap();
                if at_level_d_and_not_fuip && (item.level as i64) > max_sub_level {
                    max_sub_level = item.level as i64;
                }
                cut.insert(var);
            }
            continue;
        }

        if let Some(preds) = pred.get(&v) {
            for &p in preds {
                stack.push(p);
            }
        }
    }

    let mut clause: Vec<i64> = cut
        .into_iter()
        .map(|var| {
            let item = assignment.item_of(var).unwrap();
            match item.value {
                crate::lit::Value::True => -(var.0 as i64),
                crate::lit::Value::False => var.0 as i64,
            }
        })
        .collect();
    clause.sort_unstable();

    let backjump = if conflict_level == 0 { -1 } else { max_sub_level };
    Ok((backjump, clause))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brancher::ArbitraryBrancher;
    use crate::lit::Value;

    #[test]
    fn root_conflict_signals_backjump_below_zero() {
        let mut pf = PropagatingFormula::from_dimacs("p cnf 2 3\n1 2 0\n-1 2 0\n").unwrap();
        pf.decide(VarId::new(2), Value::False);
        assert_eq!(
            pf.get_current_state(),
            crate::formula::FormulaState::Unsatisfied
        );
        let mut brancher = ArbitraryBrancher::new(pf.formula().clauses());
        let analysis = analyze(&pf, &mut brancher).unwrap();
        assert_eq!(analysis.backjump_level, -1);
    }

    #[test]
    fn learned_clause_forbids_current_prefix() {
        // 1=T, 2=T forced; a decision 3=F then 4=T conflicts with -1 -3 -4.
        let text = "p cnf 4 4\n1 0\n-1 2 0\n-2 -3 -4 0\n-2 3 4 0\n";
        let mut pf = PropagatingFormula::from_dimacs(text).unwrap();
        pf.decide(VarId::new(3), Value::False);
        pf.decide(VarId::new(4), Value::True);
        assert_eq!(
            pf.get_current_state(),
            crate::formula::FormulaState::Unsatisfied
        );
        let mut brancher = ArbitraryBrancher::new(pf.formula().clauses());
        let analysis = analyze(&pf, &mut brancher).unwrap();
        assert!(analysis.backjump_level >= 0);
        assert!(!analysis.learned_clause.is_empty());
    }
}
