//! Splits a raw SCPI command line into header and data tokens.
//!
//! Tokens are borrowed views into the caller's buffer; nothing is copied.
//! The split follows the classic instrument grammar
//! `<header>[:<header>]*[ <data>[,<data>]*]`: colons separate the command
//! path, the first space starts the argument list, commas separate
//! arguments.

use tracing::trace;

/// Classification of a token produced by [`tokenize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A colon-delimited path segment identifying a command node.
    Header,
    /// A comma-delimited argument following the command path.
    Data,
}

/// A typed, zero-copy slice of the input line.
///
/// A `Token` is only valid while the buffer it was cut from is alive. Use
/// [`Token::to_owned`] or [`detach`] to keep tokens past that scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    kind: TokenKind,
    text: &'a [u8],
}

impl<'a> Token<'a> {
    /// Builds a token over an existing byte slice.
    pub fn new(kind: TokenKind, text: &'a [u8]) -> Self {
        Self { kind, text }
    }

    /// Returns the token classification.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Returns the raw bytes of the token.
    pub fn text(&self) -> &'a [u8] {
        self.text
    }

    /// Returns the token text as UTF-8, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&'a str> {
        core::str::from_utf8(self.text).ok()
    }

    /// Returns the token length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` for a zero-length token.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns `true` for a [`TokenKind::Header`] token.
    pub fn is_header(&self) -> bool {
        self.kind == TokenKind::Header
    }

    /// Returns `true` for a [`TokenKind::Data`] token.
    pub fn is_data(&self) -> bool {
        self.kind == TokenKind::Data
    }

    /// Copies the token into an [`OwnedToken`] that outlives the buffer.
    pub fn to_owned(&self) -> OwnedToken {
        OwnedToken {
            kind: self.kind,
            text: self.text.to_vec(),
        }
    }
}

/// A token whose text has been copied out of the input buffer.
///
/// This is the detached counterpart of [`Token`] for callbacks that need to
/// keep arguments after the command line itself has gone away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedToken {
    kind: TokenKind,
    text: Vec<u8>,
}

impl OwnedToken {
    /// Returns the token classification.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Returns the copied bytes of the token.
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Returns the token text as UTF-8, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.text).ok()
    }
}

/// Copies a (sub)sequence of tokens into owned storage.
///
/// Slicing a token sequence releases its prefix; `detach` takes care of the
/// other half of the lifecycle, turning the retained suffix into tokens
/// that remain usable after the input buffer goes out of scope.
pub fn detach(tokens: &[Token<'_>]) -> Vec<OwnedToken> {
    tokens.iter().map(Token::to_owned).collect()
}

/// Splits a command line into an ordered sequence of typed tokens.
///
/// Phase 1 emits a [`TokenKind::Header`] token at every `':'`, at the first
/// `' '`, and at the last byte of the buffer. A delimiter byte that is also
/// the last byte of the buffer is included in the emitted token; this
/// off-by-one is part of the contract and keeps inputs without a trailing
/// separator terminating correctly.
///
/// Phase 2 runs only when a space was seen. It skips leading whitespace in
/// each segment and emits a [`TokenKind::Data`] token at every `','` and at
/// the last byte, with the same inclusive-last-byte adjustment. A segment
/// that contains only whitespace yields a zero-length token bounded by its
/// delimiter (or the buffer end); this is documented behavior, not a bug.
///
/// An empty buffer yields an empty sequence.
pub fn tokenize(buffer: &[u8]) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let len = buffer.len();

    let mut token_start = 0usize;
    let mut i = 0usize;

    // Header phase: split on ':' and stop at the first ' '.
    while i < len {
        let byte = buffer[i];
        if byte == b':' || byte == b' ' || i == len - 1 {
            let end = if i == len - 1 { i + 1 } else { i };
            tokens.push(Token::new(TokenKind::Header, &buffer[token_start..end]));
            token_start = i + 1;

            if byte == b' ' {
                break;
            }
        }
        i += 1;
    }

    // Data phase: only reached when the header phase broke on a space.
    let mut segment_start: Option<usize> = None;
    i += 1;
    while i < len {
        let byte = buffer[i];
        if segment_start.is_none() && !byte.is_ascii_whitespace() {
            segment_start = Some(i);
        }

        if byte == b',' || i == len - 1 {
            let end = if i == len - 1 { i + 1 } else { i };
            // All-whitespace segment: zero-length token at the boundary.
            let start = segment_start.unwrap_or(end);
            tokens.push(Token::new(TokenKind::Data, &buffer[start..end]));
            segment_start = None;
        }
        i += 1;
    }

    trace!(tokens = tokens.len(), "tokenized command line");
    tokens
}

#[cfg(test)]
mod tokenizer_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts<'a>(tokens: &'a [Token<'a>]) -> Vec<(TokenKind, &'a str)> {
        tokens
            .iter()
            .map(|t| (t.kind(), t.as_str().unwrap()))
            .collect()
    }

    // ==================== HEADER PHASE TESTS ====================

    #[test]
    fn test_single_header() {
        let tokens = tokenize(b"MEASURE");
        assert_eq!(texts(&tokens), vec![(TokenKind::Header, "MEASURE")]);
    }

    #[test]
    fn test_header_path_without_data() {
        let tokens = tokenize(b"MEASURE:VOLTAGE?");
        assert_eq!(
            texts(&tokens),
            vec![
                (TokenKind::Header, "MEASURE"),
                (TokenKind::Header, "VOLTAGE?"),
            ]
        );
    }

    #[test]
    fn test_headers_and_data() {
        let tokens = tokenize(b"MEASURE:VOLTAGE CH1,CH2");
        assert_eq!(
            texts(&tokens),
            vec![
                (TokenKind::Header, "MEASURE"),
                (TokenKind::Header, "VOLTAGE"),
                (TokenKind::Data, "CH1"),
                (TokenKind::Data, "CH2"),
            ]
        );
    }

    #[test]
    fn test_leading_colon_emits_empty_header() {
        let tokens = tokenize(b":MEASURE:VOLTAGE CH1,CH2");
        assert_eq!(
            texts(&tokens),
            vec![
                (TokenKind::Header, ""),
                (TokenKind::Header, "MEASURE"),
                (TokenKind::Header, "VOLTAGE"),
                (TokenKind::Data, "CH1"),
                (TokenKind::Data, "CH2"),
            ]
        );
    }

    #[test]
    fn test_empty_buffer() {
        assert!(tokenize(b"").is_empty());
    }

    #[test]
    fn test_trailing_colon_is_included_in_last_header() {
        // ':' at the last byte triggers the inclusive-last-byte adjustment.
        let tokens = tokenize(b"MEAS:");
        assert_eq!(texts(&tokens), vec![(TokenKind::Header, "MEAS:")]);
    }

    #[test]
    fn test_trailing_space_is_included_in_last_header() {
        let tokens = tokenize(b"MEAS ");
        assert_eq!(texts(&tokens), vec![(TokenKind::Header, "MEAS ")]);
    }

    // ==================== DATA PHASE TESTS ====================

    #[test]
    fn test_leading_whitespace_excluded_from_data() {
        let tokens = tokenize(b"OUTPUT   ON");
        assert_eq!(
            texts(&tokens),
            vec![(TokenKind::Header, "OUTPUT"), (TokenKind::Data, "ON")]
        );
    }

    #[test]
    fn test_inter_argument_whitespace_excluded() {
        let tokens = tokenize(b"SOURCE:VOLTAGE 1.5, 2.5");
        assert_eq!(
            texts(&tokens),
            vec![
                (TokenKind::Header, "SOURCE"),
                (TokenKind::Header, "VOLTAGE"),
                (TokenKind::Data, "1.5"),
                (TokenKind::Data, "2.5"),
            ]
        );
    }

    #[test]
    fn test_internal_whitespace_kept_in_data() {
        // Only leading whitespace per segment is skipped.
        let tokens = tokenize(b"DISPLAY:TEXT hello world");
        assert_eq!(
            texts(&tokens),
            vec![
                (TokenKind::Header, "DISPLAY"),
                (TokenKind::Header, "TEXT"),
                (TokenKind::Data, "hello world"),
            ]
        );
    }

    #[test]
    fn test_all_whitespace_tail_yields_empty_data_token() {
        let tokens = tokenize(b"CMD   ");
        assert_eq!(
            texts(&tokens),
            vec![(TokenKind::Header, "CMD"), (TokenKind::Data, "")]
        );
    }

    #[test]
    fn test_empty_segment_between_commas() {
        let tokens = tokenize(b"CMD a,,b");
        assert_eq!(
            texts(&tokens),
            vec![
                (TokenKind::Header, "CMD"),
                (TokenKind::Data, "a"),
                (TokenKind::Data, ""),
                (TokenKind::Data, "b"),
            ]
        );
    }

    #[test]
    fn test_trailing_comma_included_in_last_data_token() {
        // ',' at the last byte triggers the inclusive-last-byte adjustment.
        let tokens = tokenize(b"A 1,2,");
        assert_eq!(
            texts(&tokens),
            vec![
                (TokenKind::Header, "A"),
                (TokenKind::Data, "1"),
                (TokenKind::Data, "2,"),
            ]
        );
    }

    // ==================== DETACH TESTS ====================

    #[test]
    fn test_detach_outlives_buffer() {
        let owned;
        {
            let line = Vec::from(&b"SOURCE:VOLTAGE 1.5,2.5"[..]);
            let tokens = tokenize(&line);
            owned = detach(&tokens[2..]);
        }
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0].as_str(), Some("1.5"));
        assert_eq!(owned[1].as_str(), Some("2.5"));
        assert_eq!(owned[1].kind(), TokenKind::Data);
    }
}
