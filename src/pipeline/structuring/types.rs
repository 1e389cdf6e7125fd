use super::StructuringError;

/// Chat-completion style LLM client abstraction (allows mocking).
///
/// Implementations own transport, timeouts and status handling; callers only
/// see the completion text or a `StructuringError`.
pub trait LlmClient {
    fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, StructuringError>;
}
