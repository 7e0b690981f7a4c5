// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// Appended to extraction prompts so the model answers with bare JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "Only return the valid JSON.";

/// Appended to free-text prompts so the model does not narrate around its answer.
pub const NO_PREAMBLE_INSTRUCTION: &str = "Do not provide a preamble.";
