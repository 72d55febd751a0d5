//! Scripted mock `ModelEndpoint` - queued, pre-configured responses.
//!
//! Grounded on the teacher's `MockAIProvider`: a FIFO queue of canned
//! responses, consumed in order, with call tracking for test assertions.
//! Unlike the teacher's version there is no streaming half — the Section
//! Generator (C3) only ever needs one request/response per section.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::ports::{InvocationRequest, InvocationResponse, ModelEndpoint};

/// A single scripted outcome, keyed by `section_id` or consumed in FIFO order
/// when no key matches.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Success(String),
    Failure(String),
}

/// Mock model endpoint driven by a pre-loaded script of responses.
pub struct ScriptedMockModelEndpoint {
    by_section: Mutex<HashMap<String, VecDeque<ScriptedOutcome>>>,
    default_queue: Mutex<VecDeque<ScriptedOutcome>>,
    calls: Mutex<Vec<InvocationRequest>>,
}

impl Default for ScriptedMockModelEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedMockModelEndpoint {
    pub fn new() -> Self {
        Self {
            by_section: Mutex::new(HashMap::new()),
            default_queue: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a response for a specific section id (by its string form).
    pub fn with_section_response(self, section_id: impl Into<String>, outcome: ScriptedOutcome) -> Self {
        self.by_section
            .lock()
            .unwrap()
            .entry(section_id.into())
            .or_default()
            .push_back(outcome);
        self
    }

    /// Queue a response consumed when no section-specific script matches.
    pub fn with_default_response(self, outcome: ScriptedOutcome) -> Self {
        self.default_queue.lock().unwrap().push_back(outcome);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_outcome(&self, section_key: &str) -> ScriptedOutcome {
        if let Some(queue) = self.by_section.lock().unwrap().get_mut(section_key) {
            if let Some(outcome) = queue.pop_front() {
                return outcome;
            }
        }
        self.default_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ScriptedOutcome::Success("scripted default content".to_string()))
    }
}

#[async_trait]
impl ModelEndpoint for ScriptedMockModelEndpoint {
    async fn invoke(&self, request: InvocationRequest) -> InvocationResponse {
        let key = request.section_id.to_string();
        self.calls.lock().unwrap().push(request);

        match self.next_outcome(&key) {
            ScriptedOutcome::Success(content) => InvocationResponse::success(content),
            ScriptedOutcome::Failure(message) => InvocationResponse::failure(message),
        }
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        (text.len() / 4).max(1) as u32
    }
}
