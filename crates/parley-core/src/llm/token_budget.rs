//! Token budget management for conversation history.
//!
//! Bounds the history submitted with each turn so long conversations stay
//! inside the model's context window. Truncation keeps question/answer
//! pairs together and prefers the most recent exchanges.

use parley_types::chat::ChatMessage;
use parley_types::config::ChatConfig;
use parley_types::llm::Message;
use tracing::{debug, info};

/// Advisory inserted at the head of a truncated history.
pub const TRUNCATION_NOTICE: &str =
    "Note: Some older messages have been removed to maintain conversation length.";

/// Rough token estimate: one token per four characters, rounded up.
///
/// Not a tokenizer. Only monotonicity in text length can be relied on.
pub fn estimate_tokens(text: &str) -> u32 {
    text.chars().count().div_ceil(4) as u32
}

/// The placeholder message that marks a truncated submission.
pub fn truncation_placeholder() -> Message {
    Message::assistant(TRUNCATION_NOTICE)
}

/// Budget for the history portion of a model submission.
///
/// - `max_tokens`: histories up to this estimated size pass through untouched
/// - `target_tokens`: size a longer history is cut down to (placeholder included)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    pub max_tokens: u32,
    pub target_tokens: u32,
}

impl TokenBudget {
    pub fn new(max_tokens: u32, target_tokens: u32) -> Self {
        Self {
            max_tokens,
            target_tokens,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.max_tokens, config.target_tokens)
    }

    /// Bound `history` to this budget.
    ///
    /// Below `max_tokens` the history is returned as-is. Above it, the
    /// result is the placeholder followed by the newest message pairs that
    /// fit under `target_tokens`. Pairs are walked newest-first and taken
    /// whole; the walk stops at the first pair that does not fit, even if an
    /// older pair would.
    pub fn truncate(&self, history: &[ChatMessage]) -> Vec<Message> {
        let total: u32 = history.iter().map(|m| estimate_tokens(&m.content)).sum();
        info!(
            total_tokens = total,
            messages = history.len(),
            "Conversation has approximately {total} tokens"
        );

        if total <= self.max_tokens {
            return history.iter().map(project).collect();
        }

        let placeholder = truncation_placeholder();
        let mut used = estimate_tokens(&placeholder.content);
        // Accepted messages, newest first; reversed at the end.
        let mut kept: Vec<Message> = Vec::new();

        let mut i = history.len() as isize - 1;
        while i >= 0 {
            let current = &history[i as usize];
            let previous = if i >= 1 {
                Some(&history[(i - 1) as usize])
            } else {
                None
            };

            let pair_tokens = estimate_tokens(&current.content)
                + previous.map_or(0, |m| estimate_tokens(&m.content));

            if used + pair_tokens > self.target_tokens {
                debug!(
                    index = i,
                    pair_tokens,
                    used,
                    "Pair does not fit target, stopping"
                );
                break;
            }

            kept.push(project(current));
            if let Some(previous) = previous {
                kept.push(project(previous));
            }
            used += pair_tokens;
            i -= 2;
        }

        info!(
            kept_messages = kept.len(),
            dropped_messages = history.len() - kept.len(),
            "Truncated conversation to approximately {used} tokens"
        );

        let mut out = Vec::with_capacity(kept.len() + 1);
        out.push(placeholder);
        out.extend(kept.into_iter().rev());
        out
    }
}

fn project(message: &ChatMessage) -> Message {
    Message {
        role: message.role,
        content: message.content.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::llm::MessageRole;

    fn msg(role: MessageRole, tokens: usize, tag: char) -> ChatMessage {
        ChatMessage::new(role, tag.to_string().repeat(tokens * 4), 0)
    }

    /// Alternating user/assistant history, each message sized to `tokens`.
    fn history(sizes: &[usize]) -> Vec<ChatMessage> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, &tokens)| {
                let role = if i % 2 == 0 {
                    MessageRole::User
                } else {
                    MessageRole::Assistant
                };
                msg(role, tokens, (b'a' + i as u8) as char)
            })
            .collect()
    }

    fn budget() -> TokenBudget {
        TokenBudget::new(16_000, 12_000)
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_estimate_tokens_counts_chars_not_bytes() {
        // Four multi-byte characters are one token.
        assert_eq!(estimate_tokens("ééée"), 1);
    }

    #[test]
    fn test_empty_history_passes_through() {
        let out = budget().truncate(&[]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_history_under_budget_is_unchanged() {
        let h = history(&[100, 200, 300]);
        let out = budget().truncate(&h);
        assert_eq!(out.len(), 3);
        for (orig, projected) in h.iter().zip(&out) {
            assert_eq!(orig.role, projected.role);
            assert_eq!(orig.content, projected.content);
        }
    }

    #[test]
    fn test_history_exactly_at_max_is_unchanged() {
        let h = history(&[8_000, 8_000]);
        let out = budget().truncate(&h);
        assert_eq!(out.len(), 2);
        assert_ne!(out[0].content, TRUNCATION_NOTICE);
    }

    #[test]
    fn test_four_large_messages_keep_newest_pair() {
        let h = history(&[5_000, 5_000, 5_000, 5_000]);
        let out = budget().truncate(&h);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0], truncation_placeholder());
        assert_eq!(out[1].content, h[2].content);
        assert_eq!(out[2].content, h[3].content);
    }

    #[test]
    fn test_truncated_output_starts_with_placeholder() {
        let h = history(&[20_000]);
        let out = budget().truncate(&h);
        assert_eq!(out, vec![truncation_placeholder()]);
    }

    #[test]
    fn test_stops_at_first_pair_that_does_not_fit() {
        // Newest pair (1+1) fits, the next pair (9000+9000) does not, and the
        // oldest pair (1+1) would fit but must not be considered.
        let h = history(&[1, 1, 9_000, 9_000, 1, 1]);
        let out = budget().truncate(&h);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0], truncation_placeholder());
        assert_eq!(out[1].content, h[4].content);
        assert_eq!(out[2].content, h[5].content);
    }

    #[test]
    fn test_never_exceeds_target() {
        let h = history(&[3_000, 3_000, 3_000, 3_000, 3_000, 3_000]);
        let out = budget().truncate(&h);
        let total: u32 = out.iter().map(|m| estimate_tokens(&m.content)).sum();
        assert!(total <= 12_000);
        // Placeholder + one pair; a second pair would reach 12_000 + placeholder.
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_odd_history_pairs_oldest_message_alone() {
        // Five messages: pairs are (3,4), (1,2), then (0) alone.
        let h = history(&[6_000, 100, 100, 100, 100]);
        let b = TokenBudget::new(5_000, 12_000);
        let out = b.truncate(&h);

        // Everything fits under target: placeholder + all five, in order.
        assert_eq!(out.len(), 6);
        assert_eq!(out[0], truncation_placeholder());
        for (i, m) in h.iter().enumerate() {
            assert_eq!(out[i + 1].content, m.content);
            assert_eq!(out[i + 1].role, m.role);
        }
    }

    #[test]
    fn test_retained_messages_keep_chronological_order() {
        let h = history(&[8_000, 8_000, 1_000, 1_000, 1_000, 1_000]);
        let out = budget().truncate(&h);
        let kept: Vec<&str> = out[1..].iter().map(|m| m.content.as_str()).collect();
        let expected: Vec<&str> = h[2..].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn test_from_config() {
        let b = TokenBudget::from_config(&ChatConfig::default());
        assert_eq!(b, TokenBudget::new(16_000, 12_000));
    }
}
