use crate::space::Action;
use crate::space::Cost;
use crate::space::Space;
use crate::space::State;

/// A single-start, single-goal search problem over a Space.
pub trait Problem<Sp, St, A, C>: std::fmt::Debug
where
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    fn space(&self) -> &Sp;
    fn start(&self) -> St;
    fn goal(&self) -> St;

    #[inline(always)]
    fn is_goal(&self, s: &St) -> bool {
        *s == self.goal()
    }
}
