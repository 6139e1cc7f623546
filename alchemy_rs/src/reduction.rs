//! Classical normal-order β-reduction (leftmost-outermost strategy).
//!
//! Pure tree-based reduction with no sharing. Reduction stops at normal form,
//! after `max_steps` contractions, or as soon as the term grows past
//! `max_size` nodes.

use serde::{Deserialize, Serialize};

use crate::term::Term;

/// Why reduction stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    NormalForm,
    StepLimit,
    SizeLimit,
}

/// Reduction result with metrics
#[derive(Debug, Clone)]
pub struct Reduction {
    pub term: Term,
    pub steps: usize,
    pub outcome: Outcome,
}

/// Normal-order reducer
#[derive(Debug, Clone, Copy)]
pub struct Reducer {
    max_steps: usize,
    max_size: usize,
}

impl Reducer {
    pub fn new(max_steps: usize, max_size: usize) -> Self {
        Reducer {
            max_steps,
            max_size,
        }
    }

    /// Reduce term towards normal form
    pub fn reduce(&self, term: Term) -> Reduction {
        let mut current = term;
        let mut steps = 0;

        while let Some(path) = find_redex(&current) {
            if steps == self.max_steps {
                return Reduction {
                    term: current,
                    steps,
                    outcome: Outcome::StepLimit,
                };
            }
            current = reduce_at_path(current, &path);
            steps += 1;

            if current.size() > self.max_size {
                return Reduction {
                    term: current,
                    steps,
                    outcome: Outcome::SizeLimit,
                };
            }
        }

        Reduction {
            term: current,
            steps,
            outcome: Outcome::NormalForm,
        }
    }
}

/// Find leftmost-outermost redex (normal-order)
pub fn find_redex(term: &Term) -> Option<Vec<usize>> {
    fn search(term: &Term, path: &mut Vec<usize>) -> bool {
        match term {
            Term::App(func, arg) => {
                if matches!(**func, Term::Abs(_)) {
                    return true;
                }

                path.push(0);
                if search(func, path) {
                    return true;
                }
                path.pop();

                path.push(1);
                if search(arg, path) {
                    return true;
                }
                path.pop();

                false
            }
            Term::Abs(body) => {
                path.push(0);
                if search(body, path) {
                    return true;
                }
                path.pop();
                false
            }
            Term::Var(_) | Term::Free(_) => false,
        }
    }

    let mut path = Vec::new();
    search(term, &mut path).then_some(path)
}

/// Apply β-reduction at specific path
fn reduce_at_path(term: Term, path: &[usize]) -> Term {
    let Some((&direction, rest)) = path.split_first() else {
        return beta_reduce(term);
    };

    match term {
        Term::Abs(body) => Term::Abs(Box::new(reduce_at_path(*body, rest))),
        Term::App(func, arg) => {
            if direction == 0 {
                Term::App(Box::new(reduce_at_path(*func, rest)), arg)
            } else {
                Term::App(func, Box::new(reduce_at_path(*arg, rest)))
            }
        }
        other => other,
    }
}

/// Perform β-reduction: (λ.body) arg → body[0 := arg]
fn beta_reduce(term: Term) -> Term {
    match term {
        Term::App(func, arg) => match *func {
            Term::Abs(body) => substitute(*body, 0, &arg),
            func => Term::App(Box::new(func), arg),
        },
        other => other,
    }
}

/// Substitute `replacement` for `var`, lowering the indices bound above it.
/// `replacement` is expressed relative to the redex and shifted by the
/// number of binders crossed on the way down.
fn substitute(term: Term, var: u32, replacement: &Term) -> Term {
    match term {
        Term::Var(idx) => {
            if idx == var {
                shift(replacement.clone(), var, 0)
            } else if idx > var {
                Term::Var(idx - 1)
            } else {
                Term::Var(idx)
            }
        }
        Term::Free(id) => Term::Free(id),
        Term::Abs(body) => Term::Abs(Box::new(substitute(*body, var + 1, replacement))),
        Term::App(func, arg) => Term::App(
            Box::new(substitute(*func, var, replacement)),
            Box::new(substitute(*arg, var, replacement)),
        ),
    }
}

/// Shift bound indices at or above `cutoff` up by `delta`.
fn shift(term: Term, delta: u32, cutoff: u32) -> Term {
    if delta == 0 {
        return term;
    }
    match term {
        Term::Var(idx) if idx >= cutoff => Term::Var(idx + delta),
        Term::Abs(body) => Term::Abs(Box::new(shift(*body, delta, cutoff + 1))),
        Term::App(func, arg) => Term::App(
            Box::new(shift(*func, delta, cutoff)),
            Box::new(shift(*arg, delta, cutoff)),
        ),
        other => other,
    }
}
