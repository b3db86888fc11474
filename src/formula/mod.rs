pub mod dimacs;

use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Debug, Display, Formatter};
use std::iter::FromIterator;

// numbered from 1, as in DIMACS
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, Debug)]
pub struct Variable(pub usize);

#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, Debug)]
pub enum Literal {
    Positive(Variable),
    Negative(Variable),
}

impl Literal {
    pub fn new(variable: Variable, positive: bool) -> Self {
        if positive {
            Literal::Positive(variable)
        } else {
            Literal::Negative(variable)
        }
    }

    pub fn from_dimacs(x: i64) -> Result<Self, LiteralError> {
        if x > 0 {
            Ok(Literal::Positive(Variable(x as usize)))
        } else if x < 0 {
            Ok(Literal::Negative(Variable(x.unsigned_abs() as usize)))
        } else {
            Err(LiteralError::Zero)
        }
    }

    pub fn to_dimacs(&self) -> i64 {
        match self {
            Literal::Positive(Variable(x)) => *x as i64,
            Literal::Negative(Variable(x)) => -(*x as i64),
        }
    }

    pub fn variable(&self) -> &Variable {
        match self {
            Literal::Positive(v) => v,
            Literal::Negative(v) => v,
        }
    }

    pub fn is_positive(&self) -> bool {
        match self {
            Literal::Positive(_) => true,
            Literal::Negative(_) => false,
        }
    }

    pub fn idx(&self) -> usize {
        self.variable().0
    }

    pub fn negated(&self) -> Self {
        match self {
            Literal::Positive(v) => Literal::Negative(*v),
            Literal::Negative(v) => Literal::Positive(*v),
        }
    }

    pub fn is_true_under(&self, value: bool) -> bool {
        value == self.is_positive()
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}", self.to_dimacs())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LiteralError {
    Zero,
}

impl Display for LiteralError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        match self {
            LiteralError::Zero => f.write_str("0 is not a literal"),
        }
    }
}

impl std::error::Error for LiteralError {}

/// An ordered list of literals. Inside a [`Formula`] it is read as a conjunction;
/// inside a [`Cnf`](crate::reduction::Cnf) as a disjunction.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: impl IntoIterator<Item = Literal>) -> Self {
        Self {
            literals: literals.into_iter().collect(),
        }
    }

    pub fn from_dimacs(literals: &[i64]) -> Result<Self, LiteralError> {
        let literals = literals
            .iter()
            .map(|&x| Literal::from_dimacs(x))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { literals })
    }

    pub fn literals(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// A conjunction is false as soon as one of its literals is false, so the empty
    /// clause is never falsified.
    pub fn is_falsified_by(&self, assignment: &Assignment) -> bool {
        self.literals.iter().any(|literal| !assignment.literal_value(literal))
    }
}

/// A formula in disjunctive normal form: an OR of [`Clause`]s, each an AND of literals.
#[derive(Clone, PartialEq, Eq)]
pub struct Formula {
    clauses: Vec<Clause>,
}

impl Formula {
    pub fn new(disjuncts: impl IntoIterator<Item = Clause>) -> Self {
        Self {
            clauses: disjuncts.into_iter().collect(),
        }
    }

    pub fn from_dimacs(clauses: impl IntoIterator<Item = Vec<i64>>) -> Result<Self, LiteralError> {
        let clauses = clauses
            .into_iter()
            .map(|clause| Clause::from_dimacs(&clause))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { clauses })
    }

    pub fn to_dimacs(&self) -> Vec<Vec<i64>> {
        self.clauses
            .iter()
            .map(|clause| clause.literals().map(Literal::to_dimacs).collect())
            .collect()
    }

    pub fn variables(&self) -> Vec<Variable> {
        let set: BTreeSet<Variable> = self
            .clauses
            .iter()
            .flat_map(|clause| clause.literals().map(|literal| *literal.variable()))
            .collect();
        set.into_iter().collect()
    }

    pub fn max_variable(&self) -> Option<Variable> {
        self.clauses
            .iter()
            .flat_map(|clause| clause.literals().map(|literal| *literal.variable()))
            .max()
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    /// True iff every clause is falsified, i.e. the whole disjunction is false.
    pub fn is_falsified_by(&self, assignment: &Assignment) -> bool {
        self.clauses.iter().all(|clause| clause.is_falsified_by(assignment))
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        if self.clauses.is_empty() {
            return f.write_str("false");
        }
        let mut first_clause = true;
        for clause in &self.clauses {
            if first_clause {
                first_clause = false;
            } else {
                f.write_str(" | ")?;
            }
            if clause.literals.is_empty() {
                f.write_str("true")?;
                continue;
            }
            if clause.literals.len() > 1 {
                f.write_str("(")?;
            }
            let mut first_literal = true;
            for literal in &clause.literals {
                if first_literal {
                    first_literal = false;
                } else {
                    f.write_str(" & ")?;
                }
                match literal {
                    Literal::Positive(Variable(x)) => write!(f, "{}", x)?,
                    Literal::Negative(Variable(x)) => write!(f, "!{}", x)?,
                }
            }
            if clause.literals.len() > 1 {
                f.write_str(")")?;
            }
        }
        Ok(())
    }
}

impl Debug for Formula {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        Display::fmt(self, f)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Assignment {
    values: HashMap<Variable, bool>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bits(values: &[bool]) -> Self {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| Literal::new(Variable(i + 1), value))
            .collect()
    }

    pub fn set(&mut self, variable: Variable, value: bool) {
        self.values.insert(variable, value);
    }

    pub fn value(&self, variable: Variable) -> Option<bool> {
        self.values.get(&variable).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn literal_value(&self, literal: &Literal) -> bool {
        match self.value(*literal.variable()) {
            Some(value) => literal.is_true_under(value),
            None => panic!("cannot evaluate literal {} under a partial assignment", literal),
        }
    }
}

// each literal binds its variable to the value that makes it true; later literals win
impl FromIterator<Literal> for Assignment {
    fn from_iter<I: IntoIterator<Item = Literal>>(iter: I) -> Self {
        let mut assignment = Assignment::new();
        for literal in iter {
            assignment.set(*literal.variable(), literal.is_positive());
        }
        assignment
    }
}

#[cfg(test)]
pub(crate) fn p(x: usize) -> Literal {
    Literal::Positive(Variable(x))
}

#[cfg(test)]
pub(crate) fn n(x: usize) -> Literal {
    Literal::Negative(Variable(x))
}

#[cfg(test)]
pub(crate) fn small_dnf_strategy() -> impl proptest::strategy::Strategy<Value = Formula> {
    use proptest::prelude::*;

    let literal = (1usize..=6, any::<bool>()).prop_map(|(v, positive)| Literal::new(Variable(v), positive));
    let clause = prop::collection::vec(literal, 1..4).prop_map(Clause::new);
    prop::collection::vec(clause, 1..8).prop_map(Formula::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn literal_dimacs() {
        assert_eq!(Literal::from_dimacs(3), Ok(p(3)));
        assert_eq!(Literal::from_dimacs(-7), Ok(n(7)));
        assert_eq!(Literal::from_dimacs(0), Err(LiteralError::Zero));
        assert_eq!(n(7).to_dimacs(), -7);
        assert_eq!(p(2).negated(), n(2));
    }

    #[test]
    fn from_dimacs_rejects_zero() {
        assert!(Formula::from_dimacs(vec![vec![1, 2], vec![0]]).is_err());
        assert!(Formula::from_dimacs(vec![vec![1, 2], vec![-3]]).is_ok());
    }

    #[test]
    fn variables_sorted_and_dense() {
        let f = Formula::from_dimacs(vec![vec![9, -2], vec![2, 4, -9]]).unwrap();
        assert_eq!(f.variables(), vec![Variable(2), Variable(4), Variable(9)]);
        assert_eq!(f.max_variable(), Some(Variable(9)));
        assert_eq!(f.to_dimacs(), vec![vec![9, -2], vec![2, 4, -9]]);
    }

    #[test]
    fn evaluate_two_clauses() {
        // (1 & 2) | (!1 & !2)
        let f = Formula::new(vec![Clause::new(vec![p(1), p(2)]), Clause::new(vec![n(1), n(2)])]);

        let a: Assignment = vec![p(1), n(2)].into_iter().collect();
        assert!(f.is_falsified_by(&a));

        let a: Assignment = vec![p(1), p(2)].into_iter().collect();
        assert!(!f.is_falsified_by(&a));
        let a = Assignment::from_bits(&[false, false]);
        assert!(!f.is_falsified_by(&a));
    }

    #[test]
    fn contradictory_clause_always_falsified() {
        let c = Clause::new(vec![p(1), n(1)]);
        assert!(c.is_falsified_by(&Assignment::from_bits(&[true])));
        assert!(c.is_falsified_by(&Assignment::from_bits(&[false])));
    }

    #[test]
    fn empty_clause_never_falsified() {
        let c = Clause::new(vec![]);
        assert!(!c.is_falsified_by(&Assignment::new()));
        let f = Formula::new(vec![Clause::new(vec![p(1)]), c]);
        assert!(!f.is_falsified_by(&Assignment::from_bits(&[false])));
    }

    #[test]
    fn empty_formula_is_false() {
        let f = Formula::new(vec![]);
        assert!(f.is_falsified_by(&Assignment::new()));
        assert_eq!(f.to_string(), "false");
    }

    #[test]
    #[should_panic(expected = "partial assignment")]
    fn partial_assignment_panics() {
        let f = Formula::new(vec![Clause::new(vec![p(1), p(2)])]);
        let a: Assignment = vec![p(1)].into_iter().collect();
        f.is_falsified_by(&a);
    }

    #[test]
    fn later_literals_win() {
        let a: Assignment = vec![p(1), n(1)].into_iter().collect();
        assert_eq!(a.value(Variable(1)), Some(false));
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn display_dnf() {
        let f = Formula::new(vec![
            Clause::new(vec![p(1), n(2)]),
            Clause::new(vec![n(3)]),
            Clause::new(vec![]),
        ]);
        assert_eq!(f.to_string(), "(1 & !2) | !3 | true");
    }

    proptest! {
        #[test]
        fn evaluation_is_pure(f in small_dnf_strategy(), bits in prop::collection::vec(any::<bool>(), 6)) {
            let a = Assignment::from_bits(&bits);
            let first = f.is_falsified_by(&a);
            prop_assert_eq!(first, f.is_falsified_by(&a));
            for clause in f.clauses() {
                prop_assert_eq!(clause.is_falsified_by(&a), clause.is_falsified_by(&a));
            }
            prop_assert_eq!(first, f.clauses().all(|c| c.is_falsified_by(&a)));
        }
    }
}
