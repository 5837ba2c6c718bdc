//! OpenTelemetry GenAI Semantic Convention attribute names.
//!
//! Chat turns are recorded in a span named `chat` carrying these fields.
//! `tracing` span macros need field names as literal tokens, so spans spell
//! them out inline; the constants here name the same keys for exporters,
//! dashboards and tests.

/// The name of the operation being performed (e.g., "chat").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g., "anthropic", "mock").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

/// The model ID requested.
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

/// The maximum number of output tokens requested.
pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The finish reason for the response (e.g., "end_turn", "max_tokens").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

/// Span name and operation value for a chat turn.
pub const OP_CHAT: &str = "chat";

/// Every attribute a chat span declares.
pub const CHAT_SPAN_FIELDS: [&str; 7] = [
    GEN_AI_OPERATION_NAME,
    GEN_AI_PROVIDER_NAME,
    GEN_AI_REQUEST_MODEL,
    GEN_AI_REQUEST_MAX_TOKENS,
    GEN_AI_USAGE_INPUT_TOKENS,
    GEN_AI_USAGE_OUTPUT_TOKENS,
    GEN_AI_RESPONSE_FINISH_REASONS,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_names_are_namespaced() {
        for name in CHAT_SPAN_FIELDS {
            assert!(name.starts_with("gen_ai."), "{name}");
        }
    }
}
