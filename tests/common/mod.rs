#![allow(dead_code)]

//! Shared test elements: plain integers and small text chunks

use std::mem;

use memchr::memchr_iter;
use tiny_rope::{Element, Metric, Rope, Summary};
use tracing_subscriber::EnvFilter;

/// Installs a test subscriber when `RUST_LOG` is set.
pub fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

// === Integers ===

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Int(pub u64);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntSummary {
    pub count: usize,
    pub sum: u64,
}

impl Summary for IntSummary {
    fn zero() -> Self {
        Self::default()
    }

    fn add_summary(&mut self, other: &Self) {
        self.count += other.count;
        self.sum += other.sum;
    }

    fn subtract_summary(&mut self, other: &Self) {
        self.count -= other.count;
        self.sum -= other.sum;
    }
}

impl Element for Int {
    type Summary = IntSummary;
    type Index = ();

    fn summary(&self) -> IntSummary {
        IntSummary {
            count: 1,
            sum: self.0,
        }
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn is_undersized(&self) -> bool {
        false
    }

    fn rebalance_next(&mut self, _next: &mut Self) -> bool {
        false
    }

    fn rebalance_prev(&mut self, _prev: &mut Self) -> bool {
        false
    }

    fn split_at(&mut self, _index: ()) -> Self {
        unreachable!("integers are atomic")
    }
}

/// Addresses integers by position.
pub struct Count;

impl Metric<Int> for Count {
    fn size(&self, summary: &IntSummary) -> usize {
        summary.count
    }

    fn index(&self, _offset: usize, _element: &Int) {}
}

pub fn ints(range: std::ops::Range<u64>) -> Rope<Int> {
    range.map(Int).collect()
}

pub fn values(rope: &Rope<Int>) -> Vec<u64> {
    rope.iter().map(|int| int.0).collect()
}

// === Text chunks ===

pub const MIN_CHUNK: usize = 4;
pub const MAX_CHUNK: usize = 16;

/// A short run of text; undersized below `MIN_CHUNK` bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk(pub String);

impl Chunk {
    pub fn new(text: &str) -> Self {
        Chunk(text.to_string())
    }

    /// Splits `combined` near its middle, on a char boundary.
    fn halve(mut combined: String) -> (String, String) {
        let mut mid = combined.len() / 2;
        while !combined.is_char_boundary(mid) {
            mid += 1;
        }
        let tail = combined.split_off(mid);
        (combined, tail)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextSummary {
    pub bytes: usize,
    pub chars: usize,
    pub lines: usize,
    pub chunks: usize,
}

impl Summary for TextSummary {
    fn zero() -> Self {
        Self::default()
    }

    fn add_summary(&mut self, other: &Self) {
        self.bytes += other.bytes;
        self.chars += other.chars;
        self.lines += other.lines;
        self.chunks += other.chunks;
    }

    fn subtract_summary(&mut self, other: &Self) {
        self.bytes -= other.bytes;
        self.chars -= other.chars;
        self.lines -= other.lines;
        self.chunks -= other.chunks;
    }
}

impl Element for Chunk {
    type Summary = TextSummary;
    /// Byte offset inside the chunk
    type Index = usize;

    fn summary(&self) -> TextSummary {
        TextSummary {
            bytes: self.0.len(),
            chars: self.0.chars().count(),
            lines: bytecount::count(self.0.as_bytes(), b'\n'),
            chunks: 1,
        }
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn is_undersized(&self) -> bool {
        self.0.len() < MIN_CHUNK
    }

    fn rebalance_next(&mut self, next: &mut Self) -> bool {
        if !self.is_undersized() && !next.is_undersized() {
            return false;
        }
        if self.0.len() + next.0.len() <= MAX_CHUNK {
            self.0.push_str(&next.0);
            next.0.clear();
            return true;
        }
        let combined = mem::take(&mut self.0) + &next.0;
        let (head, tail) = Self::halve(combined);
        self.0 = head;
        next.0 = tail;
        false
    }

    fn rebalance_prev(&mut self, prev: &mut Self) -> bool {
        if !self.is_undersized() && !prev.is_undersized() {
            return false;
        }
        let combined = mem::take(&mut prev.0) + &self.0;
        if combined.len() <= MAX_CHUNK {
            self.0 = combined;
            return true;
        }
        let (head, tail) = Self::halve(combined);
        prev.0 = head;
        self.0 = tail;
        false
    }

    fn split_at(&mut self, index: usize) -> Self {
        Chunk(self.0.split_off(index))
    }
}

pub struct Bytes;

impl Metric<Chunk> for Bytes {
    fn size(&self, summary: &TextSummary) -> usize {
        summary.bytes
    }

    fn index(&self, offset: usize, _chunk: &Chunk) -> usize {
        offset
    }
}

pub struct Chars;

impl Metric<Chunk> for Chars {
    fn size(&self, summary: &TextSummary) -> usize {
        summary.chars
    }

    fn index(&self, offset: usize, chunk: &Chunk) -> usize {
        chunk
            .0
            .char_indices()
            .nth(offset)
            .map_or(chunk.0.len(), |(byte, _)| byte)
    }
}

/// Counts newlines; `index` lands just after the `offset`-th newline.
pub struct Lines;

impl Metric<Chunk> for Lines {
    fn size(&self, summary: &TextSummary) -> usize {
        summary.lines
    }

    fn index(&self, offset: usize, chunk: &Chunk) -> usize {
        if offset == 0 {
            return 0;
        }
        memchr_iter(b'\n', chunk.0.as_bytes())
            .nth(offset - 1)
            .map_or(chunk.0.len(), |byte| byte + 1)
    }
}

/// Builds a text rope from one-char chunks so the builder has to merge them.
pub fn text_rope(text: &str) -> Rope<Chunk> {
    let mut buf = [0u8; 4];
    text.chars()
        .map(|ch| Chunk::new(ch.encode_utf8(&mut buf)))
        .collect()
}

pub fn text(rope: &Rope<Chunk>) -> String {
    rope.iter().map(|chunk| chunk.0.as_str()).collect()
}

pub fn sample_text(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("line {} of the sample, ünïcödé\n", i))
        .collect()
}
