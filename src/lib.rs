//! Headless engine for a classroom exam flow: timed attempts with
//! crash-safe answer persistence, sequential unlocking of exams inside a
//! group with a wall-clock cooldown, exam authoring, and teacher remarking.
//!
//! The embedding shell owns rendering and navigation. It builds a
//! [`core::context::FlowContext`] when a student enters a group's flow and
//! hands clones of it to the controllers in [`attempt`], [`flow`] and
//! [`remarking`].

pub mod attempt;
pub mod authoring;
pub mod core;
pub mod flow;
pub mod remarking;
pub mod schemas;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;
