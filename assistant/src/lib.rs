//! Streaming assistant gateway for the project tracker
//!
//! Wraps an OpenAI-compatible chat-completions API behind a small seam:
//! features render a prompt pair through [`prompt::stream_prompt`] and
//! consume a [`CompletionStream`] of text deltas with an explicit
//! terminal marker. The API key is session-scoped and passed per call;
//! this crate never persists it. Assistant output is always a draft for
//! a human to review, so nothing in here writes to the tracker.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod client;
pub mod context;
pub mod errors;
pub mod prompt;
pub mod prompts;
pub mod stream;
pub mod tasklines;

pub use client::ChatCompletionsClient;
pub use client::ChatMessage;
pub use client::CompletionClient;
pub use errors::AssistantError;
pub use errors::Result;
pub use prompt::render;
pub use prompt::stream_prompt;
pub use prompts::MentorPreset;
pub use stream::CompletionEvent;
pub use stream::CompletionStream;
pub use tasklines::TaskDraft;
pub use tasklines::parse_task_lines;
