//! Ownership Authorization Module
//!
//! Decides whether a caller may act on a batch. Identity resolution happens
//! upstream; this module only compares the resolved identity against the
//! batch's recorded owner.

mod guard;

#[cfg(test)]
mod tests;

pub use guard::OwnershipGuard;
