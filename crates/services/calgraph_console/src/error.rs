// --- File: crates/services/calgraph_console/src/error.rs ---
use calgraph_common::CalgraphError;
use calgraph_graph::ScheduleError;
use inquire::InquireError;
use thiserror::Error;

/// Everything a menu action can fail with.
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Input aborted: {0}")]
    Prompt(#[from] InquireError),
    #[error(transparent)]
    Calendar(#[from] CalgraphError),
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl From<ScheduleError> for ConsoleError {
    fn from(err: ScheduleError) -> Self {
        ConsoleError::Calendar(err.into())
    }
}
