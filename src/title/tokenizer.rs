// src/title/tokenizer.rs
// =============================================================================
// Feeds raw body bytes into html5ever's streaming tokenizer.
//
// html5ever does the actual HTML work (tags, comments, character references,
// <script>/<style> contents). This file only adds the two things a body that
// arrives in pieces needs:
// - ChunkDecoder: turns byte chunks into text, keeping a UTF-8 sequence that
//   was cut in half by a chunk boundary until the rest of it shows up
// - TitleSink: the html5ever TokenSink that watches the token stream for the
//   first <title> element and records its text
//
// Rust concepts:
// - TokenSink is html5ever's callback trait: the tokenizer calls
//   process_token() once per token while we feed it input
// - The tokenizer only borrows the sink immutably, so the sink keeps its
//   state in a RefCell
// =============================================================================

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::cell::RefCell;

/// Where the sink is in the token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleState {
    /// No <title> start tag seen yet
    Scanning,
    /// Inside the first <title>, text collected so far
    InTitle(String),
    /// The title element ended; its raw (not yet normalized) text
    Closed(String),
}

/// Receives tokens from html5ever and keeps the text of the first <title>.
#[derive(Debug)]
pub struct TitleSink {
    state: RefCell<TitleState>,
}

impl Default for TitleSink {
    fn default() -> Self {
        Self {
            state: RefCell::new(TitleState::Scanning),
        }
    }
}

impl TitleSink {
    pub fn state(&self) -> TitleState {
        self.state.borrow().clone()
    }

    pub fn is_closed(&self) -> bool {
        matches!(*self.state.borrow(), TitleState::Closed(_))
    }
}

impl TokenSink for TitleSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let mut state = self.state.borrow_mut();

        match &mut *state {
            TitleState::Closed(_) => TokenSinkResult::Continue,

            TitleState::Scanning => match token {
                Token::TagToken(tag) if tag.kind == TagKind::StartTag => {
                    if &*tag.name == "title" {
                        *state = TitleState::InTitle(String::new());
                    }
                    raw_text_switch(&tag.name)
                }
                _ => TokenSinkResult::Continue,
            },

            TitleState::InTitle(text) => {
                match token {
                    Token::CharacterTokens(chars) => text.push_str(&chars),
                    Token::NullCharacterToken => text.push('\u{FFFD}'),
                    // Recoverable markup problems, the tokenizer already fixed them up
                    Token::ParseError(_) => {}
                    // </title>, or anything else that ends the text run
                    _ => {
                        let raw = std::mem::take(text);
                        *state = TitleState::Closed(raw);
                    }
                }
                TokenSinkResult::Continue
            }
        }
    }
}

// Without a tree builder behind it, the tokenizer does not know that the
// contents of <script>, <style> or <title> are text and not markup. A browser's
// tree builder tells it by switching the tokenizer state right after the start
// tag; we do the same, so a "<title>" inside a script is not mistaken for one.
fn raw_text_switch(name: &str) -> TokenSinkResult<()> {
    match name {
        "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => {
            TokenSinkResult::RawData(RawKind::Rawtext)
        }
        "script" => TokenSinkResult::RawData(RawKind::ScriptData),
        "plaintext" => TokenSinkResult::Plaintext,
        _ => TokenSinkResult::Continue,
    }
}

/// Turns body chunks into text without breaking multi-byte characters.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    // At most three bytes: the start of a UTF-8 sequence the chunk cut off
    pending: Vec<u8>,
}

impl ChunkDecoder {
    /// Decodes one chunk. Invalid bytes become U+FFFD.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        // Only an incomplete sequence at the very end is worth waiting for;
        // everything else is decoded now, lossily
        let complete = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => self.pending.len(),
        };

        let tail = self.pending.split_off(complete);
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending = tail;
        text
    }

    /// Whatever is still pending once the stream ended.
    pub fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

/// An html5ever tokenizer wired to a TitleSink, fed with raw bytes.
pub struct TitleTokenizer {
    tokenizer: Tokenizer<TitleSink>,
    input: BufferQueue,
    decoder: ChunkDecoder,
    ended: bool,
}

impl Default for TitleTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleTokenizer {
    pub fn new() -> Self {
        Self {
            tokenizer: Tokenizer::new(TitleSink::default(), TokenizerOpts::default()),
            input: BufferQueue::default(),
            decoder: ChunkDecoder::default(),
            ended: false,
        }
    }

    /// Tokenizes one more chunk of the body.
    pub fn feed(&mut self, chunk: &[u8]) {
        let text = self.decoder.decode(chunk);
        self.push_text(text);
    }

    /// No more bytes are coming: flush the tokenizer so a title that was
    /// still open at the end of the body gets closed too.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;

        let rest = self.decoder.finish();
        self.push_text(rest);
        self.tokenizer.end();
    }

    pub fn sink(&self) -> &TitleSink {
        &self.tokenizer.sink
    }

    fn push_text(&mut self, text: String) {
        // Once the title is closed nothing later can change it
        if text.is_empty() || self.tokenizer.sink.is_closed() {
            return;
        }
        self.input.push_back(StrTendril::from_slice(&text));
        // The sink never asks the tokenizer to pause for a script, so one
        // call consumes the whole queue
        let _ = self.tokenizer.feed(&self.input);
    }
}

impl std::fmt::Debug for TitleTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TitleTokenizer")
            .field("state", &self.sink().state())
            .field("ended", &self.ended)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why not scraper::Html like a normal HTML page?
//    - scraper needs the whole document before it can build its DOM
//    - the title usually sits in the first few kilobytes, so we tokenize as
//      the bytes arrive and stop as soon as the title is known
//
// 2. Why are the tokenizer types not Send?
//    - html5ever stores text in StrTendril, a non-atomic reference counted
//      buffer, so a tokenizer must stay on the thread that created it
//    - extract.rs therefore runs it on a blocking thread and sends it chunks
//
// 3. What happens to a huge page without a title?
//    - plain text is handed to the sink as it is tokenized and dropped there,
//      nothing is held back waiting for a "<"
//    - the result is simply "title tag missing"
// -----------------------------------------------------------------------------
