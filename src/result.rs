// Uniform result envelopes returned to callers (CLI, HTTP glue, tests)

use serde::{Deserialize, Serialize};

use crate::error::ConsoleError;

/// Success-flag envelope used at the outer edge of every operation.
///
/// Service APIs return `Result<T, ConsoleError>` internally; this envelope
/// is the uniform shape handed to whoever drove the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeaterResult<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> RepeaterResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: String::new(),
            data: Some(data),
        }
    }

    pub fn ok_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

impl<T> From<Result<T, ConsoleError>> for RepeaterResult<T> {
    fn from(result: Result<T, ConsoleError>) -> Self {
        match result {
            Ok(data) => RepeaterResult::ok(data),
            Err(e) => RepeaterResult::fail(e.to_string()),
        }
    }
}

/// Page envelope for catalog queries. Page semantics (index, filtering,
/// ordering) belong to the store collaborator, not to the services.
///
/// An empty page carries `success = false`; the checker and the push
/// distributor both key off that flag to detect "nothing registered".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub success: bool,
    pub page_index: usize,
    pub page_size: usize,
    pub count: u64,
    pub total_page: usize,
    pub data: Vec<T>,
}

impl<T> PageResult<T> {
    pub fn empty(page_index: usize, page_size: usize) -> Self {
        Self {
            success: false,
            page_index,
            page_size,
            count: 0,
            total_page: 0,
            data: Vec::new(),
        }
    }
}
