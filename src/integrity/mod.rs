//! Integrity Sealing Module
//!
//! The tracker stores an opaque integrity token on every batch and refreshes
//! it on every mutation, but never interprets it. Sealing goes through the
//! `IntegritySealer` trait so deployments can substitute their own scheme;
//! `Sha256Sealer` is the implementation shipped here.

mod sealer;

pub use sealer::{IntegritySealer, Sha256Sealer};
