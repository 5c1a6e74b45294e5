/// Splits decoded text into newline-terminated records.
///
/// The pending buffer never contains a `\n`: it is whatever followed the last
/// record boundary seen so far.
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: String,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` and return every record it completed, in order.
    ///
    /// Whitespace-only records are skipped. A trailing `\r` is stripped so
    /// CRLF upstreams frame the same way as LF ones.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        // pending holds no newline, so only the new text can hold the last one
        let Some(nl) = text.rfind('\n') else {
            self.pending.push_str(text);
            return Vec::new();
        };

        let last_nl = self.pending.len() + nl;
        self.pending.push_str(text);

        let tail = self.pending.split_off(last_nl + 1);
        let complete = std::mem::replace(&mut self.pending, tail);

        complete
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !line.trim().is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// The incomplete trailing record, if any.
    #[cfg(test)]
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Consume the framer, returning the unterminated residue.
    pub fn into_residual(self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_complete_records_and_keeps_tail() {
        let mut f = LineFramer::new();
        let records = f.push("one\ntwo\nthr");
        assert_eq!(records, vec!["one", "two"]);
        assert_eq!(f.pending(), "thr");

        let records = f.push("ee\n");
        assert_eq!(records, vec!["three"]);
        assert_eq!(f.pending(), "");
    }

    #[test]
    fn no_newline_means_no_records() {
        let mut f = LineFramer::new();
        assert!(f.push("{\"message\":").is_empty());
        assert!(f.push("{\"content\":\"x\"}}").is_empty());
        assert_eq!(f.pending(), "{\"message\":{\"content\":\"x\"}}");
    }

    #[test]
    fn skips_blank_and_whitespace_records() {
        let mut f = LineFramer::new();
        let records = f.push("\n\n   \n\t\nreal\n\n");
        assert_eq!(records, vec!["real"]);
    }

    #[test]
    fn strips_carriage_return() {
        let mut f = LineFramer::new();
        assert_eq!(f.push("a\r\nb\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn pending_never_holds_a_newline() {
        let mut f = LineFramer::new();
        for piece in ["x", "y\nz", "\n", "\nw"] {
            f.push(piece);
            assert!(!f.pending().contains('\n'));
        }
        assert_eq!(f.into_residual().as_deref(), Some("w"));
    }

    #[test]
    fn long_record_fed_a_char_at_a_time() {
        let record = format!("{{\"response\":\"{}\"}}", "ab".repeat(4096));
        let mut f = LineFramer::new();
        for c in record.chars() {
            assert!(f.push(c.encode_utf8(&mut [0; 4])).is_empty());
        }
        assert_eq!(f.pending().len(), record.len());

        assert_eq!(f.push("\nnext"), vec![record]);
        assert_eq!(f.pending(), "next");
    }

    #[test]
    fn empty_residual_is_none() {
        let mut f = LineFramer::new();
        f.push("done\n");
        assert_eq!(f.into_residual(), None);
    }
}
