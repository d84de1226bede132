pub mod controller;
pub mod reducer;

pub use controller::{
    AttemptController, AttemptPhase, SubmitError, SubmitOutcome, SubmitTrigger, TickOutcome,
};
pub use reducer::{reduce, AttemptAction};
