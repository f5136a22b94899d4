//! Pure simulation logic for PiPet.
//!
//! This crate holds the pet model and every rule that changes it. Functions
//! take plain data and return results, with no clock, file system or
//! display involved, so they are unit-testable and can back any front end.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`actions`] | User actions, preconditions, stat deltas |
//! | [`config`] | Immutable tunables: decay rates, thresholds, evolution rules |
//! | [`decay`] | Boundary-exact stat decay over simulated time |
//! | [`lifecycle`] | Death, sickness, neglect and evolution evaluation |
//! | [`stage`] | Life stages, branches, the one-way transition table |
//! | [`state`] | Non-numeric pet state (stage, liveness, sleep, age) |
//! | [`stats`] | Bounded stats with clamped mutation |

pub mod actions;
pub mod config;
pub mod decay;
pub mod lifecycle;
pub mod stage;
pub mod state;
pub mod stats;
