//! CLI front end (spec §3.4 of SPEC_FULL.md): a thin external collaborator
//! around the library's `solve`/`verify`/`randcnf`/`bayes` surfaces.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;
use rand::rngs::StdRng;
use rand::SeedableRng;

use cdclsat::cdcl::{self, Outcome};
use cdclsat::config::{BrancherKind, SolverConfig};
use cdclsat::{bayes, randcnf, verify};

#[derive(Parser)]
#[command(name = "cdclsat", about = "A CDCL based SAT solver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a single DIMACS CNF file, printing SATISFIABLE or UNSATISFIABLE.
    Solve {
        file: PathBuf,
        #[arg(long, default_value = "vsids")]
        brancher: BrancherKind,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Check solver verdicts against the `c SATISFIABLE`/`c UNSATISFIABLE`
    /// comment in every `*.cnf` file of a directory.
    Verify {
        dir: PathBuf,
        #[arg(long, default_value = "vsids")]
        brancher: BrancherKind,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Generate a random k-CNF file, or a suite of them with `--suite`.
    Gen {
        out: PathBuf,
        #[arg(long)]
        vars: Option<usize>,
        #[arg(long)]
        clauses: Option<usize>,
        #[arg(long)]
        width: Option<usize>,
        #[arg(long, default_value_t = 1)]
        count: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Generate the polynomial 3-CNF suite (varying clause counts, cube-root
        /// sized variable counts) into `out` as a directory, ignoring
        /// `--vars`/`--clauses`/`--width`/`--count`.
        #[arg(long)]
        suite: bool,
    },
    /// Encode a Bayesian network (.uai + .uai.evid) as a weighted CNF.
    Encode {
        net: PathBuf,
        evidence: PathBuf,
        out: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("CDCLSAT_LOG", "warn")).init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<ExitCode, cdclsat::SolverError> {
    match command {
        Command::Solve {
            file,
            brancher,
            seed,
        } => {
            let input = fs::read_to_string(file)?;
            let config = SolverConfig { brancher, seed };
            match cdcl::solve(&input, &config)? {
                Outcome::Satisfiable { .. } => println!("SATISFIABLE"),
                Outcome::Unsatisfiable { .. } => println!("UNSATISFIABLE"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify {
            dir,
            brancher,
            seed,
        } => {
            let config = SolverConfig { brancher, seed };
            let mismatches = verify::verify_directory(&dir, &config)?;
            for m in &mismatches {
                println!(
                    "{}: expected {}, solver said {}",
                    m.file,
                    verdict_word(m.expected_satisfiable),
                    verdict_word(m.solver_satisfiable)
                );
            }
            if mismatches.is_empty() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Gen {
            out,
            vars,
            clauses,
            width,
            count,
            seed,
            suite,
        } => {
            let mut rng = StdRng::seed_from_u64(seed);
            if suite {
                fs::create_dir_all(&out)?;
                for instance in randcnf::generate_poly_3cnf_suite(&mut rng) {
                    let path = out.join(&instance.name);
                    let mut file = fs::File::create(path)?;
                    randcnf::write_formula(&mut file, instance.num_vars, &instance.formula)?;
                }
                return Ok(ExitCode::SUCCESS);
            }

            let (Some(vars), Some(clauses), Some(width)) = (vars, clauses, width) else {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "--vars, --clauses and --width are required unless --suite is set",
                )
                .into());
            };
            if count <= 1 {
                let formula = randcnf::random_formula(vars, clauses, width, &mut rng);
                let mut file = fs::File::create(out)?;
                randcnf::write_formula(&mut file, vars, &formula)?;
            } else {
                fs::create_dir_all(&out)?;
                for i in 0..count {
                    let formula = randcnf::random_formula(vars, clauses, width, &mut rng);
                    let path = out.join(format!("poly-{vars}-{clauses}-{i}.cnf"));
                    let mut file = fs::File::create(path)?;
                    randcnf::write_formula(&mut file, vars, &formula)?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Encode { net, evidence, out } => {
            let net_text = fs::read_to_string(net)?;
            let evidence_text = fs::read_to_string(evidence)?;
            let network = bayes::BayesNetwork::parse(&net_text)?;
            let (weights, mut clauses) = network.to_formula();
            clauses.extend(network.evidence_to_formula(&evidence_text)?);

            let mut cnf_file = fs::File::create(&out)?;
            let weights_path = out.with_extension("w");
            let mut weights_file = fs::File::create(weights_path)?;
            bayes::write_cnf_and_weights(&weights, &clauses, &mut cnf_file, &mut weights_file)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn verdict_word(satisfiable: bool) -> &'static str {
    if satisfiable {
        "SATISFIABLE"
    } else {
        "UNSATISFIABLE"
    }
}
