//! The soup: a population of expressions reacting pairwise.
//!
//! One round picks two distinct members and collides them. What happens to
//! the population afterwards depends on the reactor's [`Replacement`]:
//! `Parent` and `Random` write the products over existing members and
//! conserve size, while `Additive` takes both parents out, adds the products,
//! and may trim the population or return the parents.
//!
//! Rounds that fail (reduction limit, size limit, or a discard filter) add
//! nothing. A round is a *collision* when it brings no new distinct rendered
//! form into the soup.

use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

use crate::collider::{Collider, Reaction};
use crate::config::{Reactor, Replacement, Selection};
use crate::error::{CollisionError, ConfigError, ParseError};
use crate::expression::Expression;
use crate::parse::parse;
use crate::term::Term;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoupState {
    Empty,
    Populated,
}

/// A soup together with snapshots taken while it was simulated.
#[derive(Debug, Clone)]
pub struct Tape {
    soup: Soup,
    history: Vec<Soup>,
    polling_interval: usize,
}

impl Tape {
    /// The soup as it was when recording stopped.
    pub fn final_state(&self) -> &Soup {
        &self.soup
    }

    /// Snapshots in round order, one every `polling_interval` rounds.
    pub fn history(&self) -> &[Soup] {
        &self.history
    }

    pub fn polling_interval(&self) -> usize {
        self.polling_interval
    }
}

#[derive(Debug, Clone)]
pub struct Soup {
    pub(crate) expressions: Vec<Expression>,
    reactor: Reactor,
    collider: Collider,
    seed: [u8; 32],
    rng: ChaCha8Rng,

    n_rounds: usize,
    n_reactions: usize,
    n_collisions: usize,
    n_self_collisions: usize,
    failures: IndexMap<CollisionError, usize>,
}

impl Soup {
    /// An empty soup with the default reactor.
    pub fn new() -> Self {
        Self::build(Reactor::default())
    }

    pub fn from_config(reactor: &Reactor) -> Result<Self, ConfigError> {
        reactor.validate()?;
        Ok(Self::build(reactor.clone()))
    }

    fn build(reactor: Reactor) -> Self {
        let (seed, rng) = reactor.seed.rng();
        debug!(
            reduction_limit = reactor.reduction_limit,
            size_limit = reactor.size_limit,
            rules = reactor.rules.len(),
            selection = ?reactor.selection,
            replacement = ?reactor.replacement,
            "soup created"
        );
        Soup {
            expressions: Vec::new(),
            collider: Collider::from_reactor(&reactor),
            reactor,
            seed,
            rng,
            n_rounds: 0,
            n_reactions: 0,
            n_collisions: 0,
            n_self_collisions: 0,
            failures: IndexMap::new(),
        }
    }

    /// Introduce all expressions into the soup, without reduction.
    /// Expressions are re-rendered with the reactor's standardization.
    pub fn perturb(&mut self, expressions: impl IntoIterator<Item = Expression>) {
        let standardization = self.reactor.standardization;
        let before = self.expressions.len();
        self.expressions
            .extend(expressions.into_iter().map(|e| e.standardize(standardization)));
        debug!(added = self.expressions.len() - before, len = self.expressions.len(), "perturbed");
    }

    pub fn perturb_terms(&mut self, terms: impl IntoIterator<Item = Term>) {
        let standardization = self.reactor.standardization;
        self.perturb(terms.into_iter().map(|t| Expression::new(t, standardization)));
    }

    /// Parse and introduce rendered expressions. Nothing is added unless every
    /// string parses.
    pub fn perturb_rendered<'a>(
        &mut self,
        rendered: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), ParseError> {
        let terms = rendered
            .into_iter()
            .map(parse)
            .collect::<Result<Vec<_>, _>>()?;
        self.perturb_terms(terms);
        Ok(())
    }

    /// Produce one reaction round. `None` when fewer than two members remain.
    pub fn react(&mut self) -> Option<Result<Reaction, CollisionError>> {
        self.round(false)
    }

    fn round(&mut self, verbose: bool) -> Option<Result<Reaction, CollisionError>> {
        if self.expressions.len() < 2 {
            return None;
        }
        let (i, j) = self.select_pair();
        let left = &self.expressions[i];
        let right = &self.expressions[j];
        if left.as_str() == right.as_str() {
            self.n_self_collisions += 1;
        }

        let result = self.collider.collide(left.term(), right.term());
        let introduced_new = match &result {
            Ok(reaction) => {
                self.n_reactions += 1;
                self.apply(i, j, &reaction.products)
            }
            Err(err) => {
                *self.failures.entry(*err).or_default() += 1;
                self.apply(i, j, &[])
            }
        };
        if !introduced_new {
            self.n_collisions += 1;
        }

        if verbose {
            match &result {
                Ok(reaction) => info!(round = self.n_rounds, "reaction successful with {}", reaction),
                Err(err) => info!(round = self.n_rounds, "reaction failed because {}", err),
            }
        } else {
            trace!(round = self.n_rounds, ok = result.is_ok(), "reaction");
        }
        self.n_rounds += 1;
        Some(result)
    }

    /// Two distinct positions: `(function, argument)`.
    fn select_pair(&mut self) -> (usize, usize) {
        let n = self.expressions.len();
        match self.reactor.selection {
            Selection::Uniform => {
                let i = self.rng.gen_range(0..n);
                let mut j = self.rng.gen_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                (i, j)
            }
            Selection::SizeWeighted => {
                let i = self.weighted_index(None);
                let j = self.weighted_index(Some(i));
                (i, j)
            }
        }
    }

    fn weighted_index(&mut self, exclude: Option<usize>) -> usize {
        let weight = |k: usize, e: &Expression| {
            if Some(k) == exclude {
                0
            } else {
                e.term().size()
            }
        };
        let total: usize = self
            .expressions
            .iter()
            .enumerate()
            .map(|(k, e)| weight(k, e))
            .sum();
        let mut target = self.rng.gen_range(0..total);
        for (k, e) in self.expressions.iter().enumerate() {
            let w = weight(k, e);
            if target < w {
                return k;
            }
            target -= w;
        }
        // Unreachable: target < total.
        self.expressions.len() - 1
    }

    /// Place the products of a round whose reactants sat at `left` and
    /// `right`. Returns whether a new distinct form entered the soup.
    fn apply(&mut self, left: usize, right: usize, products: &[Term]) -> bool {
        let standardization = self.reactor.standardization;
        let products: Vec<Expression> = products
            .iter()
            .map(|t| Expression::new(t.clone(), standardization))
            .collect();
        let introduced_new = products
            .iter()
            .any(|p| !self.expressions.iter().any(|e| e.as_str() == p.as_str()));

        match self.reactor.replacement {
            Replacement::Parent | Replacement::Random => {
                for (k, expr) in products.into_iter().enumerate() {
                    let target = self.target(k, right);
                    self.expressions[target] = expr;
                }
            }
            Replacement::Additive {
                maintain_constant_population_size,
                discard_parents,
            } => {
                // Remove the higher position first so the lower one stays valid.
                let (first, second) = (left.max(right), left.min(right));
                let a = self.expressions.swap_remove(first);
                let b = self.expressions.swap_remove(second);
                let (left_expr, right_expr) = if first == left { (a, b) } else { (b, a) };

                let added = products.len();
                self.expressions.extend(products);
                if maintain_constant_population_size {
                    for _ in 0..added {
                        if self.expressions.is_empty() {
                            break;
                        }
                        let k = self.rng.gen_range(0..self.expressions.len());
                        self.expressions.swap_remove(k);
                    }
                }
                if !discard_parents {
                    self.expressions.push(left_expr);
                    self.expressions.push(right_expr);
                }
            }
        }
        introduced_new
    }

    /// Position overwritten by the `k`-th product of a size-conserving round.
    fn target(&mut self, k: usize, argument: usize) -> usize {
        match self.reactor.replacement {
            Replacement::Parent if k == 0 => argument,
            _ => self.rng.gen_range(0..self.expressions.len()),
        }
    }

    /// Simulate for up to `n` rounds. Stops early when fewer than two members
    /// remain. Returns the number of rounds executed.
    pub fn simulate_for(&mut self, n: usize, verbose: bool) -> usize {
        self.simulate_until(n, verbose, &AtomicBool::new(false))
    }

    /// Like [`Soup::simulate_for`], checking `cancel` between rounds.
    pub fn simulate_until(&mut self, n: usize, verbose: bool, cancel: &AtomicBool) -> usize {
        let mut executed = 0;
        let reactions_before = self.n_reactions;
        for _ in 0..n {
            if cancel.load(Ordering::Relaxed) {
                debug!(executed, "simulation cancelled");
                break;
            }
            if self.round(verbose).is_none() {
                break;
            }
            executed += 1;
        }
        debug!(
            requested = n,
            executed,
            successful = self.n_reactions - reactions_before,
            collisions = self.n_collisions,
            "simulation finished"
        );
        executed
    }

    /// Simulate for up to `n` rounds, sampling `poller` after every
    /// `polling_interval`-th round (starting with the first).
    pub fn simulate_and_poll<F, R>(
        &mut self,
        n: usize,
        polling_interval: usize,
        verbose: bool,
        mut poller: F,
    ) -> Vec<R>
    where
        F: FnMut(&Self) -> R,
    {
        self.simulate_and_poll_until(n, polling_interval, verbose, |soup| (poller(soup), false))
    }

    /// Like [`Soup::simulate_and_poll`], but the poller also decides whether
    /// to stop. The run ends right after the first sample that asks to stop.
    pub fn simulate_and_poll_until<F, R>(
        &mut self,
        n: usize,
        polling_interval: usize,
        verbose: bool,
        mut poller: F,
    ) -> Vec<R>
    where
        F: FnMut(&Self) -> (R, bool),
    {
        let interval = polling_interval.max(1);
        let mut data = Vec::with_capacity(n / interval + 1);
        for i in 0..n {
            if self.round(verbose).is_none() {
                break;
            }
            if i % interval == 0 {
                let (datum, stop) = poller(self);
                data.push(datum);
                if stop {
                    debug!(round = i, "simulation stopped by poller");
                    break;
                }
            }
        }
        data
    }

    /// Simulate for up to `n` rounds, keeping a copy of the soup every
    /// `polling_interval` rounds.
    pub fn simulate_and_record(&mut self, n: usize, polling_interval: usize, verbose: bool) -> Tape {
        let history = self.simulate_and_poll(n, polling_interval, verbose, Soup::clone);
        Tape {
            soup: self.clone(),
            history,
            polling_interval: polling_interval.max(1),
        }
    }

    pub fn state(&self) -> SoupState {
        if self.expressions.is_empty() {
            SoupState::Empty
        } else {
            SoupState::Populated
        }
    }

    /// Rendered members in population order, duplicates included.
    pub fn expressions(&self) -> impl ExactSizeIterator<Item = &str> {
        self.expressions.iter().map(Expression::as_str)
    }

    pub fn members(&self) -> &[Expression] {
        &self.expressions
    }

    /// Get the number of expressions in the soup.
    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// Rounds that introduced no new distinct form. Never decreases.
    pub fn collisions(&self) -> usize {
        self.n_collisions
    }

    /// Rounds whose two reactants rendered identically.
    pub fn self_collisions(&self) -> usize {
        self.n_self_collisions
    }

    /// Successful reactions.
    pub fn reactions(&self) -> usize {
        self.n_reactions
    }

    /// All rounds executed over the soup's lifetime.
    pub fn rounds(&self) -> usize {
        self.n_rounds
    }

    /// Failed rounds by reason, in order of first occurrence.
    pub fn failure_counts(&self) -> &IndexMap<CollisionError, usize> {
        &self.failures
    }

    pub fn reactor(&self) -> &Reactor {
        &self.reactor
    }

    pub fn seed(&self) -> [u8; 32] {
        self.seed
    }
}

impl Default for Soup {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Seed, TreeGenConfig};
    use crate::generator::{Generator, TreeGenerator};
    use crate::standardize::Standardization;
    use proptest::prelude::*;

    fn seeded_reactor(seed: u64) -> Reactor {
        Reactor {
            seed: Seed::from_u64(seed),
            ..Default::default()
        }
    }

    fn tree_exprs(n: usize, seed: u64) -> Vec<Expression> {
        TreeGenerator::from_config(&TreeGenConfig {
            size: 6,
            freevar_probability: 0.3,
            max_free_vars: 3,
            standardization: Standardization::Prefix,
            seed: Seed::from_u64(seed),
        })
        .unwrap()
        .generate_n(n)
    }

    #[test]
    fn test_new_soups_are_empty() {
        let soup = Soup::new();
        assert_eq!(soup.len(), 0);
        assert_eq!(soup.state(), SoupState::Empty);
        assert!(soup.unique_expressions().is_empty());

        let soup = Soup::from_config(&Reactor::new()).unwrap();
        assert_eq!(soup.len(), 0);
        assert!(soup.unique_expressions().is_empty());
    }

    #[test]
    fn test_invalid_reactor() {
        let reactor = Reactor {
            rules: Vec::new(),
            ..Default::default()
        };
        assert!(Soup::from_config(&reactor).is_err());
    }

    #[test]
    fn test_perturb_keeps_duplicates() {
        let mut soup = Soup::new();
        let batch = vec![Expression::from(Term::identity()); 3];
        soup.perturb(batch);
        soup.perturb_terms([Term::identity(), Term::free(0)]);
        assert_eq!(soup.len(), 5);
        assert_eq!(soup.state(), SoupState::Populated);
        assert_eq!(soup.unique_expressions(), vec!["λ.0", "#0"]);
        assert_eq!(soup.expression_counts(), vec![("λ.0", 4), ("#0", 1)]);
    }

    #[test]
    fn test_perturb_restandardizes() {
        let reactor = Reactor {
            standardization: Standardization::Postfix,
            ..Default::default()
        };
        let mut soup = Soup::from_config(&reactor).unwrap();
        soup.perturb([Expression::new(Term::free(2), Standardization::Prefix)]);
        assert_eq!(soup.expressions().collect::<Vec<_>>(), vec!["2#"]);
    }

    #[test]
    fn test_perturb_rendered_is_all_or_nothing() {
        let mut soup = Soup::new();
        assert!(soup.perturb_rendered(["λ.0", "(λ.0"]).is_err());
        assert!(soup.is_empty());
        soup.perturb_rendered(["λ.0", "\\.\\.1"]).unwrap();
        assert_eq!(soup.expressions().collect::<Vec<_>>(), vec!["λ.0", "λ.λ.1"]);
    }

    #[test]
    fn test_too_small_to_react() {
        let mut soup = Soup::new();
        assert_eq!(soup.simulate_for(10, false), 0);
        assert!(soup.react().is_none());
        soup.perturb_terms([Term::identity()]);
        assert_eq!(soup.simulate_for(10, false), 0);
        assert_eq!(soup.len(), 1);
        assert_eq!(soup.collisions(), 0);
    }

    #[test]
    fn test_end_to_end() {
        let mut soup = Soup::new();
        soup.perturb(tree_exprs(10, 0));
        assert_eq!(soup.len(), 10);

        let steps = soup.simulate_for(25, false);
        assert!(steps <= 25);
        assert_eq!(steps, 25);
        assert_eq!(soup.len(), 10);
        assert_eq!(soup.expressions().len(), 10);
        let total: usize = soup.expression_counts().iter().map(|(_, c)| c).sum();
        assert_eq!(total, soup.len());
        assert_eq!(soup.rounds(), 25);
        assert_eq!(
            soup.reactions() + soup.failure_counts().values().sum::<usize>(),
            25
        );
    }

    #[test]
    fn test_verbose_does_not_change_outcome() {
        let mut quiet = Soup::from_config(&seeded_reactor(5)).unwrap();
        let mut loud = Soup::from_config(&seeded_reactor(5)).unwrap();
        quiet.perturb(tree_exprs(12, 1));
        loud.perturb(tree_exprs(12, 1));

        assert_eq!(quiet.simulate_for(40, false), loud.simulate_for(40, true));
        assert_eq!(
            quiet.expressions().collect::<Vec<_>>(),
            loud.expressions().collect::<Vec<_>>()
        );
        assert_eq!(quiet.collisions(), loud.collisions());
    }

    #[test]
    fn test_same_seed_same_history() {
        let run = |seed| {
            let mut soup = Soup::from_config(&seeded_reactor(seed)).unwrap();
            soup.perturb(tree_exprs(20, 3));
            soup.simulate_for(100, false);
            soup.expressions().map(str::to_string).collect::<Vec<_>>()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn test_identical_members_always_self_collide() {
        let mut soup = Soup::from_config(&seeded_reactor(1)).unwrap();
        soup.perturb_terms(vec![Term::identity(); 4]);
        assert_eq!(soup.simulate_for(10, false), 10);
        // id id → id, so nothing new ever appears
        assert_eq!(soup.self_collisions(), 10);
        assert_eq!(soup.collisions(), 10);
        assert_eq!(soup.unique_expressions(), vec!["λ.0"]);
    }

    #[test]
    fn test_failed_rounds_leave_population_unchanged() {
        let reactor = Reactor {
            reduction_limit: 16,
            seed: Seed::from_u64(2),
            ..Default::default()
        };
        let mut soup = Soup::from_config(&reactor).unwrap();
        let w = Term::abs(Term::app(Term::var(0), Term::var(0)));
        soup.perturb_terms(vec![w; 3]);
        let before: Vec<String> = soup.expressions().map(str::to_string).collect();

        assert_eq!(soup.simulate_for(5, false), 5);
        assert_eq!(soup.expressions().map(str::to_string).collect::<Vec<_>>(), before);
        assert_eq!(soup.reactions(), 0);
        assert_eq!(
            soup.failure_counts().get(&CollisionError::ExceedsReductionLimit),
            Some(&5)
        );
        assert_eq!(soup.collisions(), 5);
    }

    #[test]
    fn test_parent_replacement_overwrites_argument() {
        // K applied to anything yields a constant function of it: K x → λ.x
        let reactor = Reactor {
            seed: Seed::from_u64(4),
            ..Default::default()
        };
        let mut soup = Soup::from_config(&reactor).unwrap();
        let k = Term::abs(Term::abs(Term::var(1)));
        soup.perturb_terms([k.clone(), k]);
        let result = soup.react().unwrap().unwrap();
        assert_eq!(result.products, vec![Term::abs(Term::abs(Term::abs(Term::var(1))))]);
        assert_eq!(soup.len(), 2);
        // One parent survives, the other was overwritten by the product.
        let mut members: Vec<&str> = soup.expressions().collect();
        members.sort_unstable();
        assert_eq!(members, vec!["λ.λ.1", "λ.λ.λ.1"]);
        assert_eq!(soup.collisions(), 0);
    }

    #[test]
    fn test_cancellation() {
        let mut soup = Soup::from_config(&seeded_reactor(6)).unwrap();
        soup.perturb(tree_exprs(8, 2));
        let cancel = AtomicBool::new(true);
        assert_eq!(soup.simulate_until(50, false, &cancel), 0);
        assert_eq!(soup.rounds(), 0);
    }

    #[test]
    fn test_simulate_and_poll() {
        let mut soup = Soup::from_config(&seeded_reactor(8)).unwrap();
        soup.perturb(tree_exprs(10, 4));
        let lens = soup.simulate_and_poll(30, 10, false, |s| s.len());
        assert_eq!(lens, vec![10, 10, 10]);
    }

    #[test]
    fn test_random_replacement_and_weighted_selection_conserve_size() {
        let reactor = Reactor {
            selection: Selection::SizeWeighted,
            replacement: Replacement::Random,
            rules: vec![
                Term::abs(Term::abs(Term::app(Term::var(1), Term::var(0)))),
                Term::abs(Term::abs(Term::app(Term::var(0), Term::var(1)))),
            ],
            seed: Seed::from_u64(10),
            ..Default::default()
        };
        let mut soup = Soup::from_config(&reactor).unwrap();
        soup.perturb(tree_exprs(15, 5));
        assert_eq!(soup.simulate_for(60, false), 60);
        assert_eq!(soup.len(), 15);
    }

    #[test]
    fn test_simulate_and_poll_until_stops_on_first_true() {
        let mut soup = Soup::from_config(&seeded_reactor(12)).unwrap();
        soup.perturb(tree_exprs(10, 6));
        let rounds = soup.simulate_and_poll_until(100, 5, false, |s| (s.rounds(), s.rounds() >= 11));
        // Samples after rounds 1, 6 and 11; the third asks to stop.
        assert_eq!(rounds, vec![1, 6, 11]);
        assert_eq!(soup.rounds(), 11);
    }

    #[test]
    fn test_simulate_and_poll_until_on_entropy() {
        // Identity reacting with itself never changes the population.
        let mut soup = Soup::from_config(&seeded_reactor(13)).unwrap();
        soup.perturb_terms(vec![Term::identity(); 5]);
        let entropies = soup.simulate_and_poll_until(50, 1, false, |s| {
            let entropy = s.population_entropy();
            (entropy, entropy == 0.0)
        });
        assert_eq!(entropies, vec![0.0]);
        assert_eq!(soup.rounds(), 1);
    }

    #[test]
    fn test_simulate_and_record() {
        let mut soup = Soup::from_config(&seeded_reactor(14)).unwrap();
        soup.perturb(tree_exprs(10, 7));
        let tape = soup.simulate_and_record(30, 10, false);

        assert_eq!(tape.polling_interval(), 10);
        assert_eq!(tape.history().len(), 3);
        let recorded: Vec<usize> = tape.history().iter().map(Soup::rounds).collect();
        assert_eq!(recorded, vec![1, 11, 21]);
        assert_eq!(tape.final_state().rounds(), 30);
        assert_eq!(
            tape.final_state().expressions().collect::<Vec<_>>(),
            soup.expressions().collect::<Vec<_>>()
        );

        // Snapshots are independent copies.
        let copy = tape.clone();
        soup.simulate_for(5, false);
        assert_eq!(copy.final_state().rounds(), 30);
    }

    fn additive(maintain: bool, discard: bool, seed: u64) -> Reactor {
        Reactor {
            replacement: Replacement::Additive {
                maintain_constant_population_size: maintain,
                discard_parents: discard,
            },
            seed: Seed::from_u64(seed),
            ..Default::default()
        }
    }

    #[test]
    fn test_additive_soup_grows() {
        let mut soup = Soup::from_config(&additive(false, false, 20)).unwrap();
        soup.perturb_terms(vec![Term::identity(); 4]);
        assert_eq!(soup.simulate_for(10, false), 10);
        // id id → id succeeds every round and adds one product.
        assert_eq!(soup.len(), 14);
        assert_eq!(soup.unique_expressions(), vec!["λ.0"]);
    }

    #[test]
    fn test_additive_soup_conserves_size_when_maintained() {
        let mut soup = Soup::from_config(&additive(true, false, 21)).unwrap();
        soup.perturb(tree_exprs(12, 8));
        assert_eq!(soup.simulate_for(50, false), 50);
        assert_eq!(soup.len(), 12);
    }

    #[test]
    fn test_additive_soup_drains_to_empty() {
        let mut soup = Soup::from_config(&additive(true, true, 22)).unwrap();
        soup.perturb_terms(vec![Term::identity(); 6]);
        // Each round consumes both parents and trims one member per product.
        assert_eq!(soup.simulate_for(10, false), 3);
        assert_eq!(soup.len(), 0);
        assert_eq!(soup.state(), SoupState::Empty);
        assert!(soup.react().is_none());
    }

    #[test]
    fn test_discarded_parents_are_lost_on_failure() {
        let reactor = Reactor {
            reduction_limit: 8,
            ..additive(false, true, 23)
        };
        let mut soup = Soup::from_config(&reactor).unwrap();
        let w = Term::abs(Term::app(Term::var(0), Term::var(0)));
        soup.perturb_terms(vec![w; 5]);
        assert_eq!(soup.simulate_for(10, false), 2);
        assert_eq!(soup.len(), 1);
        assert_eq!(soup.reactions(), 0);
    }

    fn big_among_small(selection: Selection) -> Soup {
        let reactor = Reactor {
            selection,
            seed: Seed::from_u64(30),
            ..Default::default()
        };
        let mut soup = Soup::from_config(&reactor).unwrap();
        let big = (0..40).fold(Term::free(0), |body, _| Term::abs(body));
        soup.perturb_terms([big]);
        soup.perturb_terms(vec![Term::free(1); 9]);
        soup
    }

    #[test]
    fn test_size_weighted_selection_favours_large_terms() {
        // Weights are 41 against nine 1s.
        let mut weighted = big_among_small(Selection::SizeWeighted);
        let picked = (0..1000)
            .filter(|_| {
                let (i, j) = weighted.select_pair();
                assert_ne!(i, j);
                i == 0 || j == 0
            })
            .count();
        assert!(picked > 750, "{}", picked);

        let mut uniform = big_among_small(Selection::Uniform);
        let picked = (0..1000)
            .filter(|_| {
                let (i, j) = uniform.select_pair();
                i == 0 || j == 0
            })
            .count();
        assert!(picked < 300, "{}", picked);
    }

    #[test]
    fn test_replacement_targets() {
        let mut parent = Soup::from_config(&seeded_reactor(31)).unwrap();
        parent.perturb_terms(vec![Term::identity(); 10]);
        assert!((0..100).all(|_| parent.target(0, 3) == 3));

        let reactor = Reactor {
            replacement: Replacement::Random,
            ..seeded_reactor(31)
        };
        let mut random = Soup::from_config(&reactor).unwrap();
        random.perturb_terms(vec![Term::identity(); 10]);
        let targets: Vec<usize> = (0..100).map(|_| random.target(0, 3)).collect();
        assert!(targets.iter().all(|&t| t < 10));
        assert!(targets.iter().any(|&t| t != 3));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn simulation_invariants(
            n in 2usize..20,
            steps in 0usize..40,
            gen_seed in any::<u64>(),
            soup_seed in any::<u64>(),
        ) {
            let mut soup = Soup::from_config(&seeded_reactor(soup_seed)).unwrap();
            soup.perturb(tree_exprs(n, gen_seed));

            let collisions_before = soup.collisions();
            let executed = soup.simulate_for(steps, false);
            prop_assert!(executed <= steps);
            prop_assert_eq!(soup.len(), n);
            prop_assert!(soup.collisions() >= collisions_before);

            let again = soup.collisions();
            soup.simulate_for(steps, false);
            prop_assert!(soup.collisions() >= again);

            let unique = soup.unique_expressions().len();
            let entropy = soup.population_entropy();
            if unique <= 1 {
                prop_assert_eq!(entropy, 0.0);
            } else {
                prop_assert!(entropy > 0.0);
                prop_assert!(entropy <= (unique as f64).ln() + 1e-9);
            }
        }
    }
}
