// ABOUTME: History persistence for llm-council.
// ABOUTME: Append-only JSONL log of debate records with write-time timestamps.

pub mod history;

pub use history::{HistoryError, HistoryLog};
