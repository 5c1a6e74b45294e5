use std::str;

const REPLACEMENT: char = '\u{FFFD}';

/// Incremental UTF-8 decoder for a chunked response body.
///
/// Holds back an incomplete trailing sequence until the next chunk arrives, so
/// the concatenated output never depends on where the transport split the bytes.
/// Invalid sequences become U+FFFD instead of failing the stream.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`. With `more == false` any held-back bytes are flushed
    /// as a replacement character.
    pub fn decode(&mut self, chunk: &[u8], more: bool) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;

        loop {
            match str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    // `valid_up_to` marks a prefix that is always valid.
                    out.push_str(str::from_utf8(valid).unwrap_or_default());

                    match err.error_len() {
                        Some(bad) => {
                            out.push(REPLACEMENT);
                            rest = &tail[bad..];
                        }
                        None => {
                            rest = tail;
                            break;
                        }
                    }
                }
            }
        }

        let held = rest.len();
        let consumed = self.pending.len() - held;
        self.pending.drain(..consumed);

        if !more && !self.pending.is_empty() {
            out.push(REPLACEMENT);
            self.pending.clear();
        }

        out
    }

    /// Bytes currently held back waiting for the rest of a character.
    #[cfg(test)]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ascii_in_one_chunk() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"hello", true), "hello");
        assert_eq!(d.pending_len(), 0);
    }

    #[test]
    fn holds_back_split_multibyte_character() {
        let bytes = "héllo 🦉".as_bytes();
        // split inside the two-byte 'é'
        let mut d = Utf8Decoder::new();
        let a = d.decode(&bytes[..2], true);
        assert_eq!(a, "h");
        assert_eq!(d.pending_len(), 1);
        let b = d.decode(&bytes[2..], true);
        assert_eq!(format!("{a}{b}"), "héllo 🦉");
    }

    #[test]
    fn any_split_yields_same_text() {
        let text = "Grüße, 世界! 🦉 done";
        let bytes = text.as_bytes();
        for cut in 0..=bytes.len() {
            let mut d = Utf8Decoder::new();
            let mut out = d.decode(&bytes[..cut], true);
            out.push_str(&d.decode(&bytes[cut..], false));
            assert_eq!(out, text, "split at {cut}");
        }
    }

    #[test]
    fn byte_at_a_time_matches_whole() {
        let text = "ünïcödé ✓ 🦉";
        let mut d = Utf8Decoder::new();
        let mut out = String::new();
        for b in text.as_bytes() {
            out.push_str(&d.decode(std::slice::from_ref(b), true));
        }
        out.push_str(&d.decode(&[], false));
        assert_eq!(out, text);
    }

    #[test]
    fn invalid_bytes_become_replacement() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"a\xFFb", true), "a\u{FFFD}b");
    }

    #[test]
    fn truncated_tail_flushes_as_replacement() {
        let mut d = Utf8Decoder::new();
        let owl = "🦉".as_bytes();
        assert_eq!(d.decode(&owl[..2], true), "");
        assert_eq!(d.decode(&[], false), "\u{FFFD}");
        assert_eq!(d.pending_len(), 0);
    }
}
