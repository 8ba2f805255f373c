use std::fmt;

/// Carries enough of a failed model exchange to debug it after the fact:
/// which stage broke and the raw output that broke it.
#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LLM error (stage={}): {}", self.stage, self.detail)
    }
}

impl std::error::Error for LlmDiagnosticsError {}
