pub mod reducer;
pub mod validate;

pub use reducer::{reduce, DraftQuestion, EditAction, ExamDraft};
pub use validate::{publish_payload, validate_for_publish, PublishError};
