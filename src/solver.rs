use crate::formula::{Formula, Literal, Variable};
use crate::{FalsifyingAssignment, SearchResult, SolveError};
use log::{debug, trace};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt::{self, Display, Formatter};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Config {
    pub max_iterations: usize,
    pub max_stall: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_iterations: 1000,
            max_stall: 80,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.max_stall == 0 {
            return Err(ConfigError::ZeroStall);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConfigError {
    ZeroIterations,
    ZeroStall,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        match self {
            ConfigError::ZeroIterations => f.write_str("max_iterations must be positive"),
            ConfigError::ZeroStall => f.write_str("max_stall must be positive"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RestartReason {
    Stalled,
    NoImprovingMove,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Step {
    Falsified,
    Restarted(RestartReason),
    // fitness before and after the flip, to < from
    Moved { from: usize, to: usize },
    BudgetExhausted,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct SearchStats {
    pub iterations: usize,
    pub restarts: usize,
    pub moves: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position(usize);

#[derive(Debug)]
struct CompiledClause {
    literals: Vec<(Position, bool)>,
}

impl CompiledClause {
    // a conjunction survives while every literal is true
    fn survives(&self, values: &[bool]) -> bool {
        self.literals.iter().all(|&(Position(i), positive)| values[i] == positive)
    }
}

#[derive(Debug)]
struct SearchState {
    current: Vec<bool>,
    // number of clauses that survive under `current`
    fitness: usize,
    stall: usize,
    stats: SearchStats,
}

/// GSAT-style hill climbing towards an assignment that falsifies every clause of a DNF.
/// Fitness counts the clauses that are still true; the search drives it to zero.
pub struct Solver<R> {
    variables: Vec<Variable>,
    clauses: Vec<CompiledClause>,
    // for each position, the clauses mentioning that variable
    occurrences: Vec<Vec<usize>>,
    config: Config,
    rng: R,
    state: SearchState,
}

impl<R: Rng> Solver<R> {
    pub fn new(formula: &Formula, config: Config, mut rng: R) -> Result<Self, SolveError> {
        config.validate()?;
        if formula.is_empty() {
            return Err(SolveError::EmptyFormula);
        }

        let variables = formula.variables();
        let position = |v: &Variable| match variables.binary_search(v) {
            Ok(i) => Position(i),
            Err(_) => panic!("variable {} missing from the variable set", v.0),
        };

        let clauses: Vec<CompiledClause> = formula
            .clauses()
            .map(|clause| CompiledClause {
                literals: clause
                    .literals()
                    .map(|literal| (position(literal.variable()), literal.is_positive()))
                    .collect(),
            })
            .collect();

        let mut occurrences = vec![vec![]; variables.len()];
        for (idx, clause) in clauses.iter().enumerate() {
            for &(Position(i), _) in &clause.literals {
                if occurrences[i].last() != Some(&idx) {
                    occurrences[i].push(idx);
                }
            }
        }

        let current = random_assignment(&mut rng, variables.len());
        let mut solver = Self {
            variables,
            clauses,
            occurrences,
            config,
            rng,
            state: SearchState {
                current,
                fitness: 0,
                stall: 0,
                stats: SearchStats::default(),
            },
        };
        solver.state.fitness = solver.fitness(&solver.state.current);
        Ok(solver)
    }

    pub fn solve(&mut self) -> SearchResult {
        loop {
            match self.step() {
                Step::Falsified => {
                    debug!(
                        "falsified after {} iterations and {} restarts",
                        self.state.stats.iterations, self.state.stats.restarts
                    );
                    break SearchResult::Falsified(self.model());
                }
                Step::BudgetExhausted => {
                    debug!(
                        "gave up after {} iterations and {} restarts",
                        self.state.stats.iterations, self.state.stats.restarts
                    );
                    break SearchResult::BudgetExhausted;
                }
                Step::Restarted(_) | Step::Moved { .. } => {}
            }
        }
    }

    pub fn step(&mut self) -> Step {
        if self.state.stats.iterations >= self.config.max_iterations {
            return Step::BudgetExhausted;
        }
        if self.state.fitness == 0 {
            return Step::Falsified;
        }
        // only empty clauses and they can never be falsified
        if self.variables.is_empty() {
            return Step::BudgetExhausted;
        }
        if self.state.stall > self.config.max_stall {
            self.restart(RestartReason::Stalled);
            return Step::Restarted(RestartReason::Stalled);
        }

        match self.best_flip() {
            Some((Position(i), to)) => {
                let from = self.state.fitness;
                self.state.current[i] = !self.state.current[i];
                self.state.fitness = to;
                self.state.stall += 1;
                self.state.stats.iterations += 1;
                self.state.stats.moves += 1;
                trace!("flip {} ({} -> {} surviving clauses)", self.variables[i].0, from, to);
                Step::Moved { from, to }
            }
            None => {
                // a failed move still spends budget, or a tautology would restart forever
                self.restart(RestartReason::NoImprovingMove);
                self.state.stats.iterations += 1;
                Step::Restarted(RestartReason::NoImprovingMove)
            }
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.state.stats
    }

    pub fn fitness_of_current(&self) -> usize {
        self.state.fitness
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn model(&self) -> FalsifyingAssignment {
        FalsifyingAssignment::new(
            self.variables
                .iter()
                .zip(&self.state.current)
                .map(|(&v, &value)| Literal::new(v, value))
                .collect(),
        )
    }

    fn fitness(&self, values: &[bool]) -> usize {
        self.clauses.iter().filter(|clause| clause.survives(values)).count()
    }

    fn surviving_among(&self, clauses: &[usize]) -> usize {
        clauses
            .iter()
            .filter(|&&idx| self.clauses[idx].survives(&self.state.current))
            .count()
    }

    // fitness of the neighbour that differs from `current` at position i
    fn flip_fitness(&mut self, i: usize) -> usize {
        let before = self.surviving_among(&self.occurrences[i]);
        self.state.current[i] = !self.state.current[i];
        let after = self.surviving_among(&self.occurrences[i]);
        self.state.current[i] = !self.state.current[i];
        self.state.fitness - before + after
    }

    fn best_flip(&mut self) -> Option<(Position, usize)> {
        let mut best = usize::MAX;
        let mut ties = vec![];
        for i in 0..self.variables.len() {
            let fitness = self.flip_fitness(i);
            if fitness < best {
                best = fitness;
                ties.clear();
            }
            if fitness == best {
                ties.push(Position(i));
            }
        }
        if best >= self.state.fitness {
            return None;
        }
        let position = *ties.choose(&mut self.rng)?;
        Some((position, best))
    }

    fn restart(&mut self, reason: RestartReason) {
        debug!(
            "restart ({:?}) at iteration {} with {} surviving clauses",
            reason, self.state.stats.iterations, self.state.fitness
        );
        self.state.current = random_assignment(&mut self.rng, self.variables.len());
        self.state.fitness = self.fitness(&self.state.current);
        self.state.stall = 0;
        self.state.stats.restarts += 1;
    }

    #[cfg(test)]
    fn set_current(&mut self, values: Vec<bool>) {
        assert_eq!(values.len(), self.variables.len());
        self.state.fitness = self.fitness(&values);
        self.state.current = values;
    }
}

fn random_assignment<R: Rng>(rng: &mut R, n: usize) -> Vec<bool> {
    (0..n).map(|_| rng.gen::<bool>()).collect()
}

pub fn falsify<R: Rng>(formula: &Formula, config: Config, rng: R) -> Result<SearchResult, SolveError> {
    Ok(Solver::new(formula, config, rng)?.solve())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{n, p, small_dnf_strategy, Clause};
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};
    use test_env_log::test;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn falsify_two_clauses() {
        // (1 & 2) | (!1 & !2)
        let f = Formula::from_dimacs(vec![vec![1, 2], vec![-1, -2]]).unwrap();
        for seed in 0..20 {
            match falsify(&f, Config::default(), rng(seed)).unwrap() {
                SearchResult::Falsified(model) => {
                    assert!(f.is_falsified_by(&model.to_assignment()));
                    let model = model.to_dimacs();
                    assert!(model == vec![1, -2] || model == vec![-1, 2], "{:?}", model);
                }
                SearchResult::BudgetExhausted => panic!("(1 & 2) | (!1 & !2) is not a tautology"),
            }
        }
    }

    #[test]
    fn excluded_middle_exhausts_budget() {
        let f = Formula::new(vec![Clause::new(vec![p(1)]), Clause::new(vec![n(1)])]);
        let config = Config {
            max_iterations: 500,
            max_stall: 80,
        };
        let mut solver = Solver::new(&f, config, rng(1)).unwrap();
        assert_eq!(solver.solve(), SearchResult::BudgetExhausted);
        assert_eq!(solver.stats().iterations, 500);
        assert_eq!(solver.stats().moves, 0);
    }

    #[test]
    fn contradictory_clause_is_falsified() {
        let f = Formula::from_dimacs(vec![vec![1, -1]]).unwrap();
        let mut solver = Solver::new(&f, Config::default(), rng(3)).unwrap();
        assert!(matches!(solver.solve(), SearchResult::Falsified(_)));
        assert_eq!(solver.stats().iterations, 0);
    }

    #[test]
    fn empty_clauses_consume_no_iterations() {
        let f = Formula::new(vec![Clause::new(vec![]), Clause::new(vec![])]);
        let mut solver = Solver::new(&f, Config::default(), rng(0)).unwrap();
        assert!(solver.variables().is_empty());
        assert_eq!(solver.solve(), SearchResult::BudgetExhausted);
        assert_eq!(solver.stats(), SearchStats::default());
    }

    #[test]
    fn empty_clause_blocks_falsification() {
        let f = Formula::new(vec![Clause::new(vec![p(1), p(2)]), Clause::new(vec![])]);
        let config = Config {
            max_iterations: 100,
            max_stall: 80,
        };
        assert_eq!(falsify(&f, config, rng(5)).unwrap(), SearchResult::BudgetExhausted);
    }

    #[test]
    fn rejects_bad_input() {
        let empty = Formula::new(vec![]);
        assert!(matches!(
            Solver::new(&empty, Config::default(), rng(0)),
            Err(SolveError::EmptyFormula)
        ));

        let f = Formula::new(vec![Clause::new(vec![p(1)])]);
        let config = Config {
            max_iterations: 0,
            max_stall: 80,
        };
        assert!(matches!(
            Solver::new(&f, config, rng(0)),
            Err(SolveError::Config(ConfigError::ZeroIterations))
        ));
        let config = Config {
            max_iterations: 10,
            max_stall: 0,
        };
        assert_eq!(falsify(&f, config, rng(0)), Err(SolveError::Config(ConfigError::ZeroStall)));
    }

    #[test]
    fn unreferenced_variables_are_skipped() {
        let f = Formula::new(vec![Clause::new(vec![p(5), p(9)]), Clause::new(vec![n(9), p(12)])]);
        let solver = Solver::new(&f, Config::default(), rng(0)).unwrap();
        assert_eq!(solver.variables(), &[Variable(5), Variable(9), Variable(12)]);

        match falsify(&f, Config::default(), rng(0)).unwrap() {
            SearchResult::Falsified(model) => {
                let vars: Vec<usize> = model.literals().map(|l| l.idx()).collect();
                assert_eq!(vars, vec![5, 9, 12]);
                assert!(f.is_falsified_by(&model.to_assignment()));
            }
            SearchResult::BudgetExhausted => panic!("formula is not a tautology"),
        }
    }

    #[test]
    fn same_seed_same_result() {
        let f = Formula::from_dimacs(vec![
            vec![1, 2, -3],
            vec![-1, 4],
            vec![3, -4, 5],
            vec![-2, -5],
            vec![2, 3, 6],
            vec![-6, 1],
        ])
        .unwrap();
        let config = Config {
            max_iterations: 1000,
            max_stall: 80,
        };
        for seed in 0..10 {
            let first = falsify(&f, config, rng(seed)).unwrap();
            let second = falsify(&f, config, rng(seed)).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn stall_forces_restart() {
        // fitness is the number of true variables, so every flip to false helps
        let f = Formula::new((1..=4).map(|x| Clause::new(vec![p(x)])));
        let config = Config {
            max_iterations: 100,
            max_stall: 1,
        };
        let mut solver = Solver::new(&f, config, rng(11)).unwrap();
        solver.set_current(vec![true; 4]);

        assert_eq!(solver.step(), Step::Moved { from: 4, to: 3 });
        assert_eq!(solver.step(), Step::Moved { from: 3, to: 2 });
        assert_eq!(solver.step(), Step::Restarted(RestartReason::Stalled));
        assert_eq!(solver.stats().iterations, 2);
        assert_eq!(solver.stats().restarts, 1);
    }

    #[test]
    fn local_optimum_forces_restart() {
        // from (1, 2) only the first clause survives, and each single flip revives
        // the second clause or leaves the first alone; (!1, !2) needs two flips
        let f = Formula::new(vec![Clause::new(vec![p(1)]), Clause::new(vec![n(1), p(2)])]);
        let mut solver = Solver::new(&f, Config::default(), rng(4)).unwrap();
        solver.set_current(vec![true, true]);
        assert_eq!(solver.fitness_of_current(), 1);
        assert_eq!(solver.step(), Step::Restarted(RestartReason::NoImprovingMove));
        assert_eq!(solver.stats().iterations, 1);
        assert_eq!(solver.stats().restarts, 1);

        let f = Formula::new(vec![Clause::new(vec![p(1)]), Clause::new(vec![n(1)])]);
        let mut solver = Solver::new(&f, Config::default(), rng(4)).unwrap();
        assert_eq!(solver.step(), Step::Restarted(RestartReason::NoImprovingMove));
        assert_eq!(solver.stats().iterations, 1);
    }

    #[test]
    fn ties_are_broken_fairly() {
        // from all-true, flipping any one of the three variables falsifies the clause
        let f = Formula::new(vec![Clause::new(vec![p(1), p(2), p(3)])]);
        let mut counts = [0usize; 3];
        for seed in 0..3000 {
            let mut solver = Solver::new(&f, Config::default(), rng(seed)).unwrap();
            solver.set_current(vec![true; 3]);
            assert_eq!(solver.step(), Step::Moved { from: 1, to: 0 });
            let flipped = solver.state.current.iter().position(|&v| !v).unwrap();
            counts[flipped] += 1;
        }
        for &count in &counts {
            assert!(count > 850 && count < 1150, "{:?}", counts);
        }
    }

    proptest! {
        #[test]
        fn moves_strictly_improve(f in small_dnf_strategy(), seed in any::<u64>()) {
            let config = Config { max_iterations: 200, max_stall: 3 };
            let mut solver = Solver::new(&f, config, rng(seed)).unwrap();
            let mut last = solver.fitness_of_current();
            loop {
                match solver.step() {
                    Step::Moved { from, to } => {
                        prop_assert!(to < from);
                        prop_assert_eq!(from, last);
                        last = to;
                    }
                    Step::Restarted(_) => last = solver.fitness_of_current(),
                    Step::Falsified => {
                        prop_assert_eq!(last, 0);
                        prop_assert!(f.is_falsified_by(&solver.model().to_assignment()));
                        break;
                    }
                    Step::BudgetExhausted => {
                        prop_assert_eq!(solver.stats().iterations, 200);
                        break;
                    }
                }
            }
        }
    }
}
