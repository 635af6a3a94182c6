use crate::agents::AirlineAgentContext;
use crate::guardrails::{OutputGuardrail, OutputVerdict};
use crate::types::Result;
use crate::utils::text::{
    find_pattern_in_text, normalize_text, remove_markdown_links, strip_markdown,
};
use async_trait::async_trait;

/// Deterministic output guardrail that strips markdown and HTML so replies
/// render cleanly in plain-text channels.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextGuardrail;

impl PlainTextGuardrail {
    pub const NAME: &'static str = "Plain Text Guardrail";
}

/// Text without any of these needs no cleaning.
const MARKUP_MARKERS: &[&str] = &["*", "_", "#", "[", "<", "\r"];

#[async_trait]
impl OutputGuardrail for PlainTextGuardrail {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn review(&self, _context: &AirlineAgentContext, text: &str) -> Result<OutputVerdict> {
        if find_pattern_in_text(MARKUP_MARKERS, text).is_none() {
            return Ok(OutputVerdict::unchanged("already plain text"));
        }

        let cleaned = normalize_text(&strip_markdown(&remove_markdown_links(text)));
        if cleaned == text {
            Ok(OutputVerdict::unchanged("already plain text"))
        } else {
            Ok(OutputVerdict::rewrite(cleaned, "removed markdown/HTML formatting"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_text_is_untouched() {
        let verdict = PlainTextGuardrail
            .review(&AirlineAgentContext::default(), "Gate A10, on time.")
            .await
            .unwrap();
        assert!(verdict.rewritten_text.is_none());
    }

    #[tokio::test]
    async fn test_markdown_is_rewritten() {
        let verdict = PlainTextGuardrail
            .review(&AirlineAgentContext::default(), "**Flight FLT-123** is <i>on time</i>")
            .await
            .unwrap();
        assert_eq!(
            verdict.rewritten_text.as_deref(),
            Some("Flight FLT-123 is on time")
        );
        assert!(!verdict.triggered);
    }

    #[tokio::test]
    async fn test_links_keep_only_their_title() {
        let verdict = PlainTextGuardrail
            .review(
                &AirlineAgentContext::default(),
                "See [our baggage policy](https://example.com/bags) for details.",
            )
            .await
            .unwrap();
        assert_eq!(
            verdict.rewritten_text.as_deref(),
            Some("See our baggage policy for details.")
        );
    }

    #[tokio::test]
    async fn test_snake_case_is_not_rewritten() {
        let verdict = PlainTextGuardrail
            .review(&AirlineAgentContext::default(), "Your seat_number is 12A.")
            .await
            .unwrap();
        assert!(verdict.rewritten_text.is_none());
    }
}
