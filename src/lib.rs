pub mod brute_force;
pub mod formula;
pub mod generation;
pub mod reduction;
pub mod solver;

use std::fmt::{self, Display, Formatter};

pub use formula::{Assignment, Clause, Formula, Literal, Variable};
pub use solver::{falsify, Config, ConfigError, Solver};

// one signed literal per variable; the sign is the variable's value
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct FalsifyingAssignment(Vec<Literal>);

impl FalsifyingAssignment {
    pub fn new(literals: Vec<Literal>) -> Self {
        Self(literals)
    }

    pub fn literals(&self) -> impl Iterator<Item = &Literal> {
        self.0.iter()
    }

    pub fn to_dimacs(&self) -> Vec<i64> {
        self.0.iter().map(Literal::to_dimacs).collect()
    }

    pub fn to_assignment(&self) -> Assignment {
        self.0.iter().copied().collect()
    }
}

impl Display for FalsifyingAssignment {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        let mut first = true;
        for literal in &self.0 {
            if first {
                first = false;
            } else {
                f.write_str(" ")?;
            }
            write!(f, "{}", literal)?;
        }
        Ok(())
    }
}

// running out of budget says nothing about whether a falsifying assignment exists,
// unlike ExhaustiveResult::Tautology
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum SearchResult {
    Falsified(FalsifyingAssignment),
    BudgetExhausted,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum ExhaustiveResult {
    Falsified(FalsifyingAssignment),
    Tautology,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum SolveError {
    EmptyFormula,
    TooManyVariables { variables: usize, limit: usize },
    Config(ConfigError),
}

impl From<ConfigError> for SolveError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl Display for SolveError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        match self {
            SolveError::EmptyFormula => f.write_str("formula has no clauses"),
            SolveError::TooManyVariables { variables, limit } => write!(
                f,
                "{} variables is too many for exhaustive search (limit {})",
                variables, limit
            ),
            SolveError::Config(e) => write!(f, "invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for SolveError {}
