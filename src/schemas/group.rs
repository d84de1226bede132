use serde::{Deserialize, Serialize};

use crate::schemas::exam::ExamDefinition;

/// An exam group. `await_time` is the cooldown in seconds between one exam
/// being completed and the next one unlocking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamGroup {
    pub id: i64,
    pub name: String,
    pub await_time: u32,
    #[serde(default)]
    pub start_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    Locked,
    Unlocking,
    Unlocked,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamWithStatus {
    pub exam: ExamDefinition,
    pub status: ExamStatus,
}
