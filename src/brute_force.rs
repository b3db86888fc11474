use crate::formula::{Formula, Literal, Variable};
use crate::{ExhaustiveResult, FalsifyingAssignment, SolveError};
use log::debug;

pub const MAX_EXHAUSTIVE_VARIABLES: usize = 24;

// Tries every assignment to variables 1..=n, n the largest variable in f, with true
// before false. No falsifying assignment means f is a tautology.
pub fn solve_exhaustive(f: &Formula) -> Result<ExhaustiveResult, SolveError> {
    if f.is_empty() {
        return Err(SolveError::EmptyFormula);
    }
    let num_variables = f.max_variable().map_or(0, |v| v.0);
    if num_variables > MAX_EXHAUSTIVE_VARIABLES {
        return Err(SolveError::TooManyVariables {
            variables: num_variables,
            limit: MAX_EXHAUSTIVE_VARIABLES,
        });
    }

    // variable 1 is the most significant bit, and a clear bit means true
    let value_of = |assignment: u64, literal: &Literal| -> bool {
        let value = assignment & (1 << (num_variables - literal.idx())) == 0;
        literal.is_true_under(value)
    };

    'search: for assignment in 0..(1u64 << num_variables) {
        'clauses: for clause in f.clauses() {
            for literal in clause.literals() {
                if !value_of(assignment, literal) {
                    // one false literal kills the conjunction, on to the next clause
                    continue 'clauses;
                }
            }
            // every literal held, so this clause keeps the formula true
            continue 'search;
        }
        let model = (1..=num_variables)
            .map(|x| Literal::new(Variable(x), assignment & (1 << (num_variables - x)) == 0))
            .collect();
        debug!("exhaustive search falsified after {} assignments", assignment + 1);
        return Ok(ExhaustiveResult::Falsified(FalsifyingAssignment::new(model)));
    }
    debug!("exhaustive search proved a tautology over {} variables", num_variables);
    Ok(ExhaustiveResult::Tautology)
}
