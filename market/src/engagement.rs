// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! Comments and view counts.
//!
//! Engagement never touches supply, funding, or the balance. It shares the
//! per-token lock with the lifecycle operations so a snapshot never shows a
//! half-appended comment.

use chrono::Utc;

use crate::error::MarketError;
use crate::lifecycle::Market;
use crate::token::{Comment, Token};

impl Market {
    /// Appends a comment to a token.
    ///
    /// # Errors
    ///
    /// [`MarketError::MissingField`] for a blank author or text, or
    /// [`MarketError::NotFound`].
    pub fn add_comment(
        &self,
        token_id: &str,
        author: &str,
        text: &str,
    ) -> Result<Comment, MarketError> {
        let author = author.trim();
        let text = text.trim();
        if author.is_empty() {
            return Err(MarketError::MissingField("author"));
        }
        if text.is_empty() {
            return Err(MarketError::MissingField("text"));
        }

        self.with_token(token_id, |token| {
            let comment = Comment {
                author: author.to_string(),
                text: text.to_string(),
                created_at: Utc::now(),
            };
            token.comments.push(comment.clone());

            tracing::debug!(
                token_id = %token.id,
                author = %comment.author,
                comments = token.comments.len(),
                "comment added"
            );
            Ok(comment)
        })
    }

    /// Comments on a token, oldest first.
    pub fn comments(&self, token_id: &str) -> Result<Vec<Comment>, MarketError> {
        self.with_token(token_id, |token| Ok(token.comments.clone()))
    }

    /// Counts one view of a token and returns the token.
    pub fn record_view(&self, token_id: &str) -> Result<Token, MarketError> {
        self.with_token(token_id, |token| {
            token.view_count = token.view_count.saturating_add(1);
            Ok(token.clone())
        })
    }
}
