//! Console transcript of the conversation with the machine
//!
//! Inbound text arrives in arbitrary fragments; fragments are joined into the
//! current remote line until a newline is seen. Each outbound command is an
//! entry of its own.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default number of entries kept
pub const DEFAULT_SCROLLBACK: usize = 120;

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    /// Sent by us
    Local,
    /// Received from the machine
    Remote,
}

/// One line of the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub source: EntrySource,
    /// Printable text; control characters are shown as `\x<hex>`
    pub text: String,
    /// Remote line consisting of exactly `ok`
    pub is_pure_ack: bool,
}

impl TranscriptEntry {
    fn new(source: EntrySource) -> Self {
        Self {
            source,
            text: String::new(),
            is_pure_ack: false,
        }
    }
}

/// Render control characters (below 0x20) as `\x<hex>`
pub fn make_human_readable(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if (c as u32) < 32 {
            out.push_str(&format!("\\x{:x}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

/// Bounded transcript, oldest entries evicted first
///
/// An entry with empty text is the open line left by a trailing newline; the
/// next text of either direction fills it.
#[derive(Debug, Clone)]
pub struct TranscriptLog {
    entries: VecDeque<TranscriptEntry>,
    capacity: usize,
    last_inbound_char: Option<char>,
}

impl Default for TranscriptLog {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLLBACK)
    }
}

impl TranscriptLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_SCROLLBACK)),
            capacity,
            last_inbound_char: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entry the next text of `source` is appended to
    fn target_entry(&mut self, source: EntrySource) -> usize {
        let continues_remote = source == EntrySource::Remote
            && self.last_inbound_char != Some('\n')
            && self
                .entries
                .back()
                .is_some_and(|e| e.source == EntrySource::Remote);

        if !continues_remote {
            match self.entries.back_mut() {
                Some(last) if last.text.is_empty() => last.source = source,
                _ => self.entries.push_back(TranscriptEntry::new(source)),
            }
        }
        self.entries.len() - 1
    }

    /// Record text sent (`Local`) or received (`Remote`)
    pub fn record(&mut self, text: &str, source: EntrySource) {
        let mut index = self.target_entry(source);
        if source == EntrySource::Remote {
            if let Some(c) = text.chars().last() {
                self.last_inbound_char = Some(c);
            }
        }

        let mut lines = text.split('\n').peekable();
        while let Some(line) = lines.next() {
            let entry = &mut self.entries[index];
            entry.text.push_str(&make_human_readable(&line.replace('\r', "")));
            if source == EntrySource::Remote {
                entry.is_pure_ack = entry.text == "ok";
            }
            if lines.peek().is_some() {
                self.entries.push_back(TranscriptEntry::new(source));
                index += 1;
            }
        }

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter()
    }

    /// Entries with text, skipping the open line
    pub fn lines(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter().filter(|e| !e.text.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_inbound_char = None;
    }
}
