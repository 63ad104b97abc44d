use crate::store::StoreError;
use serde::{Deserialize, Serialize};

pub type TaskId = i64;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
}

/// Tasks and journal text stored under one day key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayRecord {
    pub tasks: Vec<Task>,
    pub journal: String,
}

#[derive(thiserror::Error, Debug)]
pub enum PlannerError {
    #[error("encoding task list: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Task {
    pub fn new(id: TaskId, text: impl Into<String>) -> Self {
        Task {
            id,
            text: text.into(),
            completed: false,
        }
    }
}
