use std::collections::VecDeque;

use tracing::warn;

/// Value produced when a token is not an integer or is missing.
///
/// The spectator is a passive observer, so a bad token is not fatal: the
/// sentinel flows into whatever record it belonged to.
pub const INVALID_INT: i64 = i64::MIN;

/// Ordered queue of tokens received from the engine.
///
/// Turn frames are read with [`TokenBuffer::peek_int`] and released with one
/// [`TokenBuffer::discard_prefix`] call, so the hot path never pops token by
/// token.
#[derive(Debug, Default, Clone)]
pub struct TokenBuffer {
    tokens: VecDeque<String>,
    total_received: u64,
}

impl TokenBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every whitespace-delimited token in `text`.
    pub fn receive(&mut self, text: &str) {
        let before = self.tokens.len();
        self.tokens.extend(text.split_whitespace().map(str::to_string));
        self.total_received += (self.tokens.len() - before) as u64;
    }

    pub fn count(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens received over the lifetime of the buffer.
    pub fn total_received(&self) -> u64 {
        self.total_received
    }

    pub fn peek(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn peek_int(&self, index: usize) -> i64 {
        match self.tokens.get(index) {
            Some(raw) => parse_int(raw, index),
            None => {
                warn!(
                    target: "halite::stream",
                    index,
                    available = self.tokens.len(),
                    "token.missing"
                );
                INVALID_INT
            }
        }
    }

    /// Like [`TokenBuffer::peek_int`] but without logging.
    pub fn try_peek_int(&self, index: usize) -> Option<i64> {
        self.tokens.get(index)?.parse().ok()
    }

    pub fn take_token(&mut self) -> Option<String> {
        self.tokens.pop_front()
    }

    pub fn take_int(&mut self) -> i64 {
        match self.tokens.pop_front() {
            Some(raw) => parse_int(&raw, 0),
            None => {
                warn!(target: "halite::stream", "token.missing");
                INVALID_INT
            }
        }
    }

    /// Drops the first `count` tokens in one operation.
    pub fn discard_prefix(&mut self, count: usize) {
        let count = count.min(self.tokens.len());
        self.tokens.drain(..count);
    }
}

fn parse_int(raw: &str, index: usize) -> i64 {
    match raw.parse::<i64>() {
        Ok(value) => value,
        Err(err) => {
            warn!(
                target: "halite::stream",
                index,
                token = %raw,
                error = %err,
                "token.not_numeric"
            );
            INVALID_INT
        }
    }
}
