// A CNF is satisfiable exactly when its negation is not a tautology, and the
// assignments that falsify the negation are the models of the CNF.

use crate::formula::{Assignment, Clause, Formula, Variable};

// each clause is read as a disjunction here
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Cnf {
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn new(conjuncts: impl IntoIterator<Item = Clause>) -> Self {
        Self {
            clauses: conjuncts.into_iter().collect(),
        }
    }

    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn max_variable(&self) -> Option<Variable> {
        self.clauses
            .iter()
            .flat_map(|clause| clause.literals().map(|literal| *literal.variable()))
            .max()
    }

    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.literals().any(|literal| assignment.literal_value(literal)))
    }
}

/// De Morgan: `!(c1 & ... & cm)` with `ci = (l1 | ... | lk)` becomes
/// `(!l1 & ... & !lk) | ...`, one DNF clause per CNF clause.
pub fn negate(cnf: &Cnf) -> Formula {
    Formula::new(
        cnf.clauses()
            .map(|clause| Clause::new(clause.literals().map(|literal| literal.negated()))),
    )
}
