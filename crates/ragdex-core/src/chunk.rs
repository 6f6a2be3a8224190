//! Line-boundary text chunker.
//!
//! Packs document text into segments of at most `max_chars` characters
//! without ever splitting a line. Lines are accumulated greedily; when the
//! next line would push the buffer past the budget, the buffer is flushed
//! (trimmed) and a new one starts with that line.
//!
//! A single line longer than `max_chars` is not split further: it becomes
//! its own chunk, unchanged apart from surrounding whitespace.
//!
//! Line boundaries are `\n`, `\r\n`, a lone `\r`, vertical tab, form feed,
//! the file/group/record separators (`\x1c`..`\x1e`), NEL (`\u{85}`) and
//! the Unicode line and paragraph separators.
//!
//! # Example
//!
//! ```rust
//! use ragdex_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("alpha beta gamma", 800);
//! assert_eq!(chunks, vec!["alpha beta gamma".to_string()]);
//! ```

/// Split `text` into trimmed, non-empty chunks of at most `max_chars` characters.
///
/// Character counts are Unicode scalar values, not bytes. Each buffered line
/// is followed by a newline, and that newline counts against the budget.
///
/// # Guarantees
///
/// - Empty or whitespace-only input yields no chunks.
/// - No chunk exceeds `max_chars` unless it consists of one over-long line.
/// - Concatenating the chunks reproduces every word of the input in order.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_chars = 0usize;

    for line in split_lines(text) {
        let line_chars = line.chars().count();

        if buf_chars + line_chars + 1 > max_chars {
            flush(&mut chunks, &buf);
            buf.clear();
            buf_chars = 0;
        }

        buf.push_str(line);
        buf.push('\n');
        buf_chars += line_chars + 1;
    }

    flush(&mut chunks, &buf);
    chunks
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\x0b'
            | '\x0c'
            | '\x1c'
            | '\x1d'
            | '\x1e'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

/// Lines of `text` without their terminators. `\r\n` is one boundary and a
/// trailing terminator does not produce an empty final line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                start = j + 1;
            }
        }
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn flush(chunks: &mut Vec<String>, buf: &str) {
    let trimmed = buf.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
