//! Population statistics over a [`Soup`].

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::CollisionError;
use crate::soup::Soup;

/// Summary of a soup at one point in its history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoupSnapshot {
    pub len: usize,
    pub unique: usize,
    pub entropy: f64,
    pub rounds: usize,
    pub reactions: usize,
    pub collisions: usize,
    pub self_collisions: usize,
    /// Failed rounds by reason.
    pub failures: IndexMap<CollisionError, usize>,
    /// Most frequent forms with their counts.
    pub top: Vec<(String, usize)>,
}

impl Soup {
    fn counts(&self) -> IndexMap<&str, usize> {
        let mut counts = IndexMap::new();
        for expr in &self.expressions {
            *counts.entry(expr.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Distinct rendered forms, in order of first occurrence.
    pub fn unique_expressions(&self) -> Vec<&str> {
        self.counts().into_keys().collect()
    }

    /// Each distinct form with its multiplicity, in order of first occurrence.
    /// The counts sum to [`Soup::len`].
    pub fn expression_counts(&self) -> Vec<(&str, usize)> {
        self.counts().into_iter().collect()
    }

    /// Shannon entropy (natural log) of the distribution of distinct forms.
    /// Zero for a soup with at most one distinct form.
    pub fn population_entropy(&self) -> f64 {
        let n = self.len() as f64;
        let counts = self.counts();
        if counts.len() <= 1 {
            return 0.0;
        }
        counts
            .values()
            .map(|&c| {
                let p = c as f64 / n;
                -p * p.ln()
            })
            .sum()
    }

    /// The `k` most frequent forms. Ties keep first-occurrence order.
    pub fn k_most_frequent(&self, k: usize) -> Vec<(&str, usize)> {
        let mut counts = self.expression_counts();
        // Stable sort, so equal counts stay in first-occurrence order.
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(k);
        counts
    }

    /// Multiset Jaccard index of two populations: the sum of per-form minimum
    /// counts over the sum of per-form maximum counts. Two empty soups are
    /// identical.
    pub fn jaccard_index(&self, other: &Soup) -> f64 {
        let ours = self.counts();
        let theirs: HashMap<&str, usize> = other.counts().into_iter().collect();

        let mut intersection = 0;
        let mut union = 0;
        for (form, &a) in &ours {
            let b = theirs.get(form).copied().unwrap_or(0);
            intersection += a.min(b);
            union += a.max(b);
        }
        union += theirs
            .iter()
            .filter(|(form, _)| !ours.contains_key(*form))
            .map(|(_, &b)| b)
            .sum::<usize>();

        if union == 0 {
            1.0
        } else {
            intersection as f64 / union as f64
        }
    }

    pub fn snapshot(&self, top: usize) -> SoupSnapshot {
        SoupSnapshot {
            len: self.len(),
            unique: self.unique_expressions().len(),
            entropy: self.population_entropy(),
            rounds: self.rounds(),
            reactions: self.reactions(),
            collisions: self.collisions(),
            self_collisions: self.self_collisions(),
            failures: self.failure_counts().clone(),
            top: self
                .k_most_frequent(top)
                .into_iter()
                .map(|(form, count)| (form.to_string(), count))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{Reactor, Seed};
    use crate::error::CollisionError;
    use crate::soup::Soup;
    use crate::term::Term;

    fn soup(forms: &[&str]) -> Soup {
        let mut soup = Soup::new();
        soup.perturb_rendered(forms.iter().copied()).unwrap();
        soup
    }

    #[test]
    fn test_counts_in_first_occurrence_order() {
        let soup = soup(&["λ.λ.1", "λ.0", "λ.λ.1", "#0", "λ.0", "λ.λ.1"]);
        assert_eq!(soup.unique_expressions(), vec!["λ.λ.1", "λ.0", "#0"]);
        assert_eq!(
            soup.expression_counts(),
            vec![("λ.λ.1", 3), ("λ.0", 2), ("#0", 1)]
        );
    }

    #[test]
    fn test_entropy() {
        assert_eq!(Soup::new().population_entropy(), 0.0);
        assert_eq!(soup(&["λ.0", "λ.0", "λ.0"]).population_entropy(), 0.0);

        let even = soup(&["λ.0", "λ.λ.0", "λ.λ.1", "#0"]);
        assert!((even.population_entropy() - 4f64.ln()).abs() < 1e-12);

        let skewed = soup(&["λ.0", "λ.0", "λ.0", "#0"]);
        let expected = -(0.75f64 * 0.75f64.ln() + 0.25 * 0.25f64.ln());
        assert!((skewed.population_entropy() - expected).abs() < 1e-12);
        assert!(skewed.population_entropy() < 2f64.ln());
    }

    #[test]
    fn test_k_most_frequent() {
        let soup = soup(&["#0", "λ.0", "λ.λ.1", "λ.0", "λ.λ.1", "#1"]);
        assert_eq!(soup.k_most_frequent(2), vec![("λ.0", 2), ("λ.λ.1", 2)]);
        assert_eq!(soup.k_most_frequent(3)[2], ("#0", 1));
        assert_eq!(soup.k_most_frequent(10).len(), 4);
        assert!(soup.k_most_frequent(0).is_empty());
    }

    #[test]
    fn test_jaccard_index() {
        let a = soup(&["λ.0", "λ.0", "#0"]);
        let b = soup(&["λ.0", "λ.λ.1"]);
        // min: λ.0 → 1; max: λ.0 → 2, #0 → 1, λ.λ.1 → 1
        assert!((a.jaccard_index(&b) - 0.25).abs() < 1e-12);
        assert!((b.jaccard_index(&a) - 0.25).abs() < 1e-12);
        assert_eq!(a.jaccard_index(&a), 1.0);
        assert_eq!(Soup::new().jaccard_index(&Soup::new()), 1.0);
        assert_eq!(a.jaccard_index(&Soup::new()), 0.0);
    }

    #[test]
    fn test_snapshot() {
        let mut soup = Soup::new();
        soup.perturb_terms(vec![Term::identity(); 3]);
        soup.simulate_for(4, false);
        let snapshot = soup.snapshot(1);
        assert_eq!(snapshot.len, 3);
        assert_eq!(snapshot.unique, 1);
        assert_eq!(snapshot.entropy, 0.0);
        assert_eq!(snapshot.rounds, 4);
        assert_eq!(snapshot.reactions, 4);
        assert_eq!(snapshot.collisions, 4);
        assert_eq!(snapshot.top, vec![("λ.0".to_string(), 3)]);
        assert!(snapshot.failures.is_empty());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["len"], 3);
        assert_eq!(json["top"][0][0], "λ.0");
    }

    #[test]
    fn test_snapshot_reports_failures() {
        let reactor = Reactor {
            reduction_limit: 8,
            seed: Seed::from_u64(3),
            ..Default::default()
        };
        let mut soup = Soup::from_config(&reactor).unwrap();
        // ω ω never reaches a normal form.
        soup.perturb_rendered(["λ.0 0", "λ.0 0"]).unwrap();
        soup.simulate_for(3, false);

        let snapshot = soup.snapshot(0);
        assert_eq!(snapshot.failures.get(&CollisionError::ExceedsReductionLimit), Some(&3));
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["failures"]["exceeds_reduction_limit"], 3);
    }
}
