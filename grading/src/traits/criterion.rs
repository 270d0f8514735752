use crate::criteria::evaluator::Observations;

/// A node of a criteria tree that can be decided against entered marks.
///
/// Implementations must be total: a node that refers to data missing from
/// `observations` is simply not satisfied.
pub trait Criterion {
    fn is_satisfied(&self, observations: &Observations<'_>) -> bool;
}
