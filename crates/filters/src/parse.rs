use oxiguard_domain::DomainError;
use std::io::{BufReader, Read};

/// How much of the stream head is scanned for HTML markers.
const HEAD_CHECK_SIZE: usize = 4 * 1024;

/// Printable text with CR, LF and TAB. Bytes >= 0x80 are presumed printable;
/// downloaded lists are not required to be strict UTF-8.
fn is_printable_text(data: &[u8]) -> bool {
    data.iter()
        .all(|&c| (c >= b' ' && c != 0x7f) || c == b'\n' || c == b'\r' || c == b'\t')
}

fn looks_like_html(head: &[u8]) -> bool {
    let s = String::from_utf8_lossy(head).to_lowercase();
    s.contains("<html") || s.contains("<!doctype")
}

/// A rule is a non-empty line that is not a `#` or `!` comment.
fn is_rule(line: &[u8]) -> bool {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    !(line.is_empty() || line.starts_with('#') || line.starts_with('!'))
}

/// Streaming validator for filter-list downloads.
///
/// Feed the raw byte stream chunk by chunk with [`push`](Self::push), then
/// call [`finish`](Self::finish) to obtain the rule count. The same bytes are
/// expected to be written to the staging file by the caller; on error the
/// staging file must be discarded.
pub struct ListValidator {
    head: Vec<u8>,
    head_checked: bool,
    pending: Vec<u8>,
    rule_count: u64,
}

impl ListValidator {
    pub fn new() -> Self {
        Self {
            head: Vec::with_capacity(HEAD_CHECK_SIZE),
            head_checked: false,
            pending: Vec::new(),
            rule_count: 0,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) -> Result<(), DomainError> {
        if !is_printable_text(chunk) {
            return Err(DomainError::NotPlainText);
        }

        if !self.head_checked {
            let room = HEAD_CHECK_SIZE - self.head.len();
            let take = room.min(chunk.len());
            self.head.extend_from_slice(&chunk[..take]);
            if self.head.len() == HEAD_CHECK_SIZE {
                if looks_like_html(&self.head) {
                    return Err(DomainError::HtmlContent);
                }
                self.head_checked = true;
                self.head = Vec::new();
            }
        }

        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.pending.extend_from_slice(&rest[..pos]);
            if is_rule(&self.pending) {
                self.rule_count += 1;
            }
            self.pending.clear();
            rest = &rest[pos + 1..];
        }
        self.pending.extend_from_slice(rest);

        Ok(())
    }

    pub fn finish(mut self) -> Result<u64, DomainError> {
        // Short bodies never fill the head buffer; check what we have.
        if !self.head_checked && looks_like_html(&self.head) {
            return Err(DomainError::HtmlContent);
        }
        if is_rule(&self.pending) {
            self.rule_count += 1;
        }
        Ok(self.rule_count)
    }
}

impl Default for ListValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Count the rules in an already-validated on-disk filter file.
pub fn count_rules<R: Read>(reader: R) -> std::io::Result<u64> {
    use std::io::BufRead;

    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    let mut count = 0u64;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if is_rule(&line) {
            count += 1;
        }
    }
    Ok(count)
}
