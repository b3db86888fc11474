use crate::formula::{Clause, Formula, Literal, Variable};
use crate::reduction::{negate, Cnf};
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt::{self, Display, Formatter};

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Weights {
    pub positive: f64,
    pub negative: f64,
    pub absent: f64,
}

pub const WEIGHT_TABLE: [Weights; 13] = [
    Weights { positive: 0.8, negative: 0.1, absent: 0.1 },
    Weights { positive: 0.1, negative: 0.8, absent: 0.1 },
    Weights { positive: 0.1, negative: 0.1, absent: 0.8 },
    Weights { positive: 0.6, negative: 0.3, absent: 0.1 },
    Weights { positive: 0.1, negative: 0.6, absent: 0.3 },
    Weights { positive: 0.3, negative: 0.1, absent: 0.6 },
    Weights { positive: 0.1, negative: 0.3, absent: 0.6 },
    Weights { positive: 0.6, negative: 0.1, absent: 0.3 },
    Weights { positive: 0.3, negative: 0.6, absent: 0.1 },
    Weights { positive: 1.0 / 3.0, negative: 1.0 / 3.0, absent: 1.0 / 3.0 },
    Weights { positive: 0.45, negative: 0.45, absent: 0.1 },
    Weights { positive: 0.1, negative: 0.45, absent: 0.45 },
    Weights { positive: 0.45, negative: 0.1, absent: 0.45 },
];

pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// empty clauses are dropped, so the result may have fewer than max_clauses
pub fn random_dnf_with_weights<R: Rng + ?Sized>(
    rng: &mut R,
    num_variables: usize,
    max_clauses: usize,
    weights: Weights,
) -> Result<Formula, WeightedError> {
    let slot = WeightedIndex::new(&[weights.positive, weights.negative, weights.absent])?;

    let mut clauses = vec![];
    for _ in 0..max_clauses {
        let mut literals = vec![];
        for x in 1..=num_variables {
            match slot.sample(rng) {
                0 => literals.push(Literal::Positive(Variable(x))),
                1 => literals.push(Literal::Negative(Variable(x))),
                _ => {}
            }
        }
        if !literals.is_empty() {
            clauses.push(Clause::new(literals));
        }
    }
    Ok(Formula::new(clauses))
}

pub fn random_dnf<R: Rng + ?Sized>(rng: &mut R, num_variables: usize, max_clauses: usize) -> Formula {
    let weights = *WEIGHT_TABLE.choose(rng).expect("weight table is not empty");
    random_dnf_with_weights(rng, num_variables, max_clauses, weights).expect("weight table entries are positive")
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HardFamily {
    // holes * k + 1 pigeons, at most k per hole
    Pigeonhole { holes: usize, k: usize },
    // perfect matching on 2 * size + 1 nodes
    Parity { size: usize },
    // strict order on size elements with no minimal element
    Ordering { size: usize },
}

// kept small enough for exhaustive checking
const CATALOGUE: [HardFamily; 11] = [
    HardFamily::Pigeonhole { holes: 1, k: 0 },
    HardFamily::Pigeonhole { holes: 1, k: 1 },
    HardFamily::Pigeonhole { holes: 2, k: 1 },
    HardFamily::Pigeonhole { holes: 1, k: 2 },
    HardFamily::Pigeonhole { holes: 2, k: 2 },
    HardFamily::Pigeonhole { holes: 2, k: 3 },
    HardFamily::Parity { size: 1 },
    HardFamily::Parity { size: 2 },
    HardFamily::Ordering { size: 2 },
    HardFamily::Ordering { size: 3 },
    HardFamily::Ordering { size: 4 },
];

impl HardFamily {
    pub fn nth(index: usize) -> Option<Self> {
        CATALOGUE.get(index).copied()
    }

    pub fn count() -> usize {
        CATALOGUE.len()
    }

    pub fn name(&self) -> &'static str {
        match self {
            HardFamily::Pigeonhole { .. } => "PHP",
            HardFamily::Parity { .. } => "PAR",
            HardFamily::Ordering { .. } => "GT",
        }
    }

    pub fn build(&self) -> Cnf {
        match *self {
            HardFamily::Pigeonhole { holes, k } => pigeonhole(holes, k),
            HardFamily::Parity { size } => parity(size),
            HardFamily::Ordering { size } => ordering(size),
        }
    }
}

impl Display for HardFamily {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        match self {
            HardFamily::Pigeonhole { holes, k } => write!(f, "{}({}, {})", self.name(), holes, k),
            HardFamily::Parity { size } | HardFamily::Ordering { size } => write!(f, "{}({})", self.name(), size),
        }
    }
}

// negation of an unsatisfiable CNF, so always a tautology
pub fn hard_dnf(index: usize) -> Option<Formula> {
    Some(negate(&HardFamily::nth(index)?.build()))
}

fn pos(x: usize) -> Literal {
    Literal::Positive(Variable(x))
}

fn neg(x: usize) -> Literal {
    Literal::Negative(Variable(x))
}

fn combinations(n: usize, r: usize) -> Vec<Vec<usize>> {
    fn extend(start: usize, n: usize, r: usize, prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if prefix.len() == r {
            out.push(prefix.clone());
            return;
        }
        for i in start..=n {
            prefix.push(i);
            extend(i + 1, n, r, prefix, out);
            prefix.pop();
        }
    }

    let mut out = vec![];
    extend(1, n, r, &mut vec![], &mut out);
    out
}

fn pigeonhole(holes: usize, k: usize) -> Cnf {
    let pigeons = holes * k + 1;
    let var = |pigeon: usize, hole: usize| (pigeon - 1) * holes + hole;

    let mut clauses = vec![];
    for pigeon in 1..=pigeons {
        clauses.push(Clause::new((1..=holes).map(|hole| pos(var(pigeon, hole)))));
    }
    for hole in 1..=holes {
        for crowd in combinations(pigeons, k + 1) {
            clauses.push(Clause::new(crowd.into_iter().map(|pigeon| neg(var(pigeon, hole)))));
        }
    }
    Cnf::new(clauses)
}

fn parity(size: usize) -> Cnf {
    let nodes = 2 * size + 1;
    // edge[i][j] == edge[j][i] numbers the edge between nodes i and j
    let mut edge = vec![vec![0; nodes + 1]; nodes + 1];
    let mut next = 0;
    for i in 1..=nodes {
        for j in (i + 1)..=nodes {
            next += 1;
            edge[i][j] = next;
            edge[j][i] = next;
        }
    }

    let mut clauses = vec![];
    for i in 1..=nodes {
        clauses.push(Clause::new((1..=nodes).filter(|&j| j != i).map(|j| pos(edge[i][j]))));
    }
    for i in 1..=nodes {
        for j in 1..=nodes {
            for k in (j + 1)..=nodes {
                if j != i && k != i {
                    clauses.push(Clause::new(vec![neg(edge[i][j]), neg(edge[i][k])]));
                }
            }
        }
    }
    Cnf::new(clauses)
}

fn ordering(size: usize) -> Cnf {
    // less[i][j] numbers "i precedes j"
    let mut less = vec![vec![0; size + 1]; size + 1];
    let mut next = 0;
    for i in 1..=size {
        for j in 1..=size {
            if i != j {
                next += 1;
                less[i][j] = next;
            }
        }
    }

    let mut clauses = vec![];
    for i in 1..=size {
        for j in (i + 1)..=size {
            clauses.push(Clause::new(vec![neg(less[i][j]), neg(less[j][i])]));
        }
    }
    for i in 1..=size {
        for j in 1..=size {
            for k in 1..=size {
                if i != j && j != k && i != k {
                    clauses.push(Clause::new(vec![neg(less[i][j]), neg(less[j][k]), pos(less[i][k])]));
                }
            }
        }
    }
    for j in 1..=size {
        clauses.push(Clause::new((1..=size).filter(|&i| i != j).map(|i| pos(less[i][j]))));
    }
    Cnf::new(clauses)
}
