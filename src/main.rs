use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use dnfsat::brute_force::solve_exhaustive;
use dnfsat::formula::dimacs::{parse, write_dnf, DimacsParseError, Problem};
use dnfsat::generation::{hard_dnf, random_dnf, rng_from_seed, HardFamily};
use dnfsat::*;
use std::fmt::{self, Display, Formatter};
use std::fs::File;
use std::str::FromStr;

fn main() {
    env_logger::init();

    let matches = App::new("dnfsat")
        .about("Searches for assignments that falsify DNF formulas")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("solve")
                .about("look for a falsifying assignment")
                .arg(Arg::with_name("INPUT").help("input file (DIMACS, 'p dnf' or 'p cnf')").index(1))
                .arg(
                    Arg::with_name("exhaustive")
                        .long("exhaustive")
                        .help("enumerate every assignment instead of local search"),
                )
                .arg(
                    Arg::with_name("max-iterations")
                        .long("max-iterations")
                        .takes_value(true)
                        .help("moves before local search gives up"),
                )
                .arg(
                    Arg::with_name("max-stall")
                        .long("max-stall")
                        .takes_value(true)
                        .help("moves between forced restarts"),
                )
                .arg(Arg::with_name("seed").long("seed").takes_value(true).help("random seed")),
        )
        .subcommand(
            SubCommand::with_name("generate")
                .about("print a generated DNF formula")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(
                    SubCommand::with_name("random")
                        .arg(Arg::with_name("variables").long("variables").takes_value(true).required(true))
                        .arg(Arg::with_name("clauses").long("clauses").takes_value(true).required(true))
                        .arg(Arg::with_name("seed").long("seed").takes_value(true)),
                )
                .subcommand(
                    SubCommand::with_name("hard")
                        .arg(Arg::with_name("index").long("index").takes_value(true).required(true)),
                ),
        )
        .get_matches();

    let result = match matches.subcommand() {
        ("solve", Some(m)) => solve(m),
        ("generate", Some(m)) => generate(m),
        _ => unreachable!("clap requires a subcommand"),
    };

    match result {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(-1);
        }
    }
}

fn solve(matches: &ArgMatches) -> Result<i32, CliError> {
    let problem = if let Some(path) = matches.value_of("INPUT") {
        parse_from_file(path)?
    } else {
        parse(std::io::stdin())?
    };
    let formula = problem.into_dnf();

    if matches.is_present("exhaustive") {
        return match solve_exhaustive(&formula)? {
            ExhaustiveResult::Falsified(model) => {
                println!("falsified: {}", model);
                Ok(0)
            }
            ExhaustiveResult::Tautology => {
                println!("tautology");
                Ok(1)
            }
        };
    }

    let defaults = Config::default();
    let config = Config {
        max_iterations: number(matches, "max-iterations")?.unwrap_or(defaults.max_iterations),
        max_stall: number(matches, "max-stall")?.unwrap_or(defaults.max_stall),
    };
    let mut rng = rng_from_seed(number(matches, "seed")?);

    match falsify(&formula, config, &mut rng)? {
        SearchResult::Falsified(model) => {
            println!("falsified: {}", model);
            Ok(0)
        }
        SearchResult::BudgetExhausted => {
            println!("unknown: nothing found in {} iterations", config.max_iterations);
            Ok(2)
        }
    }
}

fn generate(matches: &ArgMatches) -> Result<i32, CliError> {
    let formula = match matches.subcommand() {
        ("random", Some(m)) => {
            let num_variables = number(m, "variables")?.unwrap_or(0);
            let max_clauses = number(m, "clauses")?.unwrap_or(0);
            let mut rng = rng_from_seed(number(m, "seed")?);
            random_dnf(&mut rng, num_variables, max_clauses)
        }
        ("hard", Some(m)) => {
            let index = number(m, "index")?.unwrap_or(0);
            let formula = hard_dnf(index).ok_or_else(|| {
                CliError::Usage(format!(
                    "no hard instance {} (there are {})",
                    index,
                    HardFamily::count()
                ))
            })?;
            if let Some(family) = HardFamily::nth(index) {
                log::debug!("negating {}", family);
            }
            formula
        }
        _ => unreachable!("clap requires a subcommand"),
    };

    let stdout = std::io::stdout();
    write_dnf(stdout.lock(), &formula).map_err(DimacsParseError::Io)?;
    Ok(0)
}

fn number<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>, CliError> {
    matches
        .value_of(name)
        .map(|s| {
            s.parse::<T>()
                .map_err(|_| CliError::Usage(format!("--{} expects a number, got '{}'", name, s)))
        })
        .transpose()
}

fn parse_from_file(path: &str) -> Result<Problem, DimacsParseError> {
    let file = File::open(path)?;
    parse(file)
}

#[derive(Debug)]
enum CliError {
    Dimacs(DimacsParseError),
    Solve(SolveError),
    Usage(String),
}

impl From<DimacsParseError> for CliError {
    fn from(e: DimacsParseError) -> Self {
        Self::Dimacs(e)
    }
}

impl From<SolveError> for CliError {
    fn from(e: SolveError) -> Self {
        Self::Solve(e)
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        match self {
            CliError::Dimacs(e) => write!(f, "{}", e),
            CliError::Solve(e) => write!(f, "{}", e),
            CliError::Usage(msg) => f.write_str(msg),
        }
    }
}
