// src/title/mod.rs
// =============================================================================
// Title extraction.
//
// Submodules:
// - tokenizer: feeds body bytes into html5ever and watches for <title>
// - extract: turns the tokenizer state into the one-line title result
// =============================================================================

mod extract;
mod tokenizer;

pub use extract::{extract_title, extract_title_from_bytes, TitleScanner, TITLE_MISSING};
pub use tokenizer::{ChunkDecoder, TitleSink, TitleState, TitleTokenizer};
