use std::fmt::Debug;
use std::hash::Hash;

use num_traits::SaturatingAdd;
use smallvec::SmallVec;

pub trait Action: Copy + Clone + Debug + PartialEq + Eq {}
pub trait State: Copy + Clone + Debug + PartialEq + Eq + Hash {}
pub trait Cost:
    Copy
    + Clone
    + Debug
    + std::fmt::Display
    + PartialEq
    + Eq
    + PartialOrd
    + Ord
    + SaturatingAdd
    + num_traits::Zero
    + num_traits::One
    + num_traits::bounds::UpperBounded
    + std::ops::Add<Self, Output = Self>
{
    #[inline(always)]
    fn valid(&self) -> bool {
        *self != Self::max_value()
    }
}

/// The expansion of a State, `(action, next_state)` in generation order.
///
/// Grids never have more than 4 neighbours, so these stay on the stack.
pub type Neighbours<St, A> = SmallVec<[(A, St); 4]>;

/// A path from a start State.
///
/// `actions[i]` leads into `states[i]`, so both are start-exclusive and
/// end-inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub start: St,
    pub cost: C,
    pub actions: Vec<A>,
    pub states: Vec<St>,
}

impl<St, A, C> Path<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    pub fn new_from_start(start: St) -> Self {
        Self {
            start,
            cost: C::zero(),
            actions: vec![],
            states: vec![],
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.actions.len(), self.states.len());
        self.actions.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The last State reached, which is the start on empty paths.
    #[inline(always)]
    pub fn end(&self) -> St {
        self.states.last().copied().unwrap_or(self.start)
    }

    #[inline(always)]
    pub fn append(&mut self, step: (A, St), c: C) {
        let (a, s) = step;
        self.actions.push(a);
        self.states.push(s);
        self.cost = self.cost.saturating_add(&c);
    }

    /// Iterates over `(action, state)` pairs from start to end.
    pub fn steps(&self) -> impl Iterator<Item = (A, St)> + '_ {
        self.actions.iter().copied().zip(self.states.iter().copied())
    }

    /// Runs sanity checks
    #[inline(always)]
    pub fn seems_valid(&self) -> bool {
        self.actions.len() == self.states.len() && self.cost.valid()
    }
}

impl<St, A, C> std::fmt::Display for Path<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Path({}, {:?}:{:?}:{:?})",
            self.cost,
            self.start,
            self.actions.iter().take(20).collect::<Vec<_>>(),
            self.end()
        )
    }
}

/// An implicit graph the search engine can walk.
pub trait Space<St, A, C>: std::fmt::Debug
where
    St: State,
    A: Action,
    C: Cost,
{
    /// The `(height, width)` of the space.
    fn dimensions(&self) -> (usize, usize);

    /// Whether a State is in bounds and not blocked.
    fn is_open(&self, s: &St) -> bool;

    fn cost(&self, _s: &St, _a: &A) -> C {
        C::one()
    }

    /// Expands a State into its open neighbours.
    ///
    /// The order is part of the contract, searches break ties with it.
    fn neighbours(&self, s: &St) -> Neighbours<St, A>;

    /// Checks that every step of the path is a valid expansion of the
    /// previous State, and that its cost adds up.
    fn valid_path(&self, p: &Path<St, A, C>) -> bool {
        if !p.seems_valid() || !self.is_open(&p.start) {
            return false;
        }

        let mut state = p.start;
        let mut cost = C::zero();
        for (a, s) in p.steps() {
            if !self.neighbours(&state).contains(&(a, s)) {
                return false;
            }
            cost = cost.saturating_add(&self.cost(&state, &a));
            state = s;
        }
        cost == p.cost
    }
}

/// An estimate of the cost between two States.
pub trait ObjectiveHeuristic<St, C>: std::fmt::Debug
where
    St: State,
    C: Cost,
{
    fn h(s: &St, goal: &St) -> C;
}

/// The blind heuristic, for searches that don't rank by cost.
#[derive(Debug)]
pub struct ZeroHeuristic;

impl<St, C> ObjectiveHeuristic<St, C> for ZeroHeuristic
where
    St: State,
    C: Cost,
{
    #[inline(always)]
    fn h(_s: &St, _goal: &St) -> C {
        C::zero()
    }
}
