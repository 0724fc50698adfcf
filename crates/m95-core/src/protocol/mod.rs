//! Protocol implementations
//!
//! This module contains the M95 command sequences: single command frames,
//! status polling and page-split writes.

pub mod m95;

pub use m95::{page_chunks, PageChunk, PageChunks, PollPolicy};
