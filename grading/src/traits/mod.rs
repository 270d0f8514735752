//!
//! Traits Module
//!
//! - [`criterion`]: the recursive "does this part of the criteria tree hold?" contract
//!   shared by conditions, groups and branches.

pub mod criterion;
