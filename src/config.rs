//! Solver configuration (spec §3.3 of SPEC_FULL.md), scoped to what this
//! solver actually supports: no restart schedule, no clause deletion policy.

use crate::brancher::{ArbitraryBrancher, Brancher, RandomBrancher, TwoChoiceBrancher, VsidsBrancher};
use crate::clause::ClauseArena;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum BrancherKind {
    Arbitrary,
    Random,
    TwoChoice,
    #[default]
    Vsids,
}

impl std::str::FromStr for BrancherKind {
    type Err = String;

    fn from_str(s: &str) -> Result<BrancherKind, String> {
        match s.to_ascii_lowercase().as_str() {
            "arbitrary" => Ok(BrancherKind::Arbitrary),
            "random" => Ok(BrancherKind::Random),
            "two-choice" | "two_choice" => Ok(BrancherKind::TwoChoice),
            "vsids" => Ok(BrancherKind::Vsids),
            other => Err(format!("unknown brancher '{other}'")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SolverConfig {
    pub brancher: BrancherKind,
    /// Seed for the randomized branchers; ignored by `Arbitrary`/`Vsids`.
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            brancher: BrancherKind::default(),
            seed: 0,
        }
    }
}

impl SolverConfig {
    pub fn build_brancher(&self, clauses: &ClauseArena, num_vars: usize) -> Box<dyn Brancher> {
        match self.brancher {
            BrancherKind::Arbitrary => Box::new(ArbitraryBrancher::new(clauses)),
            BrancherKind::Random => Box::new(RandomBrancher::new(clauses, self.seed)),
            BrancherKind::TwoChoice => Box::new(TwoChoiceBrancher::new(clauses, self.seed)),
            BrancherKind::Vsids => Box::new(VsidsBrancher::new(clauses, num_vars)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_brancher_names() {
        assert_eq!("vsids".parse::<BrancherKind>().unwrap(), BrancherKind::Vsids);
        assert_eq!(
            "two-choice".parse::<BrancherKind>().unwrap(),
            BrancherKind::TwoChoice
        );
        assert!("bogus".parse::<BrancherKind>().is_err());
    }

    #[test]
    fn default_config_is_vsids() {
        assert_eq!(SolverConfig::default().brancher, BrancherKind::Vsids);
    }
}
