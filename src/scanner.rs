//! Lexical scanner for C-family and Dart source text.
//!
//! Yields the structural delimiters `( ) [ ] { } ;` that appear outside
//! strings and comments. Understands `//` and nesting `/* */` comments,
//! single, double and triple quoted strings, `r`-prefixed raw strings, and
//! `${...}` interpolation (whose contents are scanned as code).

/// A structural delimiter found in code position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delim {
    /// One of `)`, `]`, `}`.
    Close(char),
    /// One of `(`, `[`, `{`.
    Open(char),
    /// `;`
    Semicolon,
}

/// A delimiter and its byte offset in the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// What was found.
    pub delim: Delim,
    /// Byte offset of the delimiter.
    pub offset: usize,
}

/// A string or comment that did not terminate where it should.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unterminated {
    /// Byte offset where the construct starts.
    pub offset: usize,
    /// "string" or "block comment".
    pub what: &'static str,
}

/// Result of scanning a piece of text.
#[derive(Debug, Default)]
pub struct Scan {
    /// Delimiters in order of appearance.
    pub events: Vec<Event>,
    /// Strings or comments that never closed.
    pub unterminated: Vec<Unterminated>,
}

/// Lexical context on the scanner's stack.
enum Mode {
    /// Block comment; Dart block comments nest.
    BlockComment { depth: usize, start: usize },
    /// Code, either top level or inside a `${...}` interpolation.
    /// `braces` counts `{` opened inside the interpolation.
    Code { braces: usize, interpolation: bool },
    /// String literal.
    Str { quote: u8, raw: bool, start: usize, triple: bool },
}

/// Map a delimiter byte to its event, if it is one.
const fn delim_for(byte: u8) -> Option<Delim> {
    return match byte {
        b'(' => Some(Delim::Open('(')),
        b'[' => Some(Delim::Open('[')),
        b'{' => Some(Delim::Open('{')),
        b')' => Some(Delim::Close(')')),
        b']' => Some(Delim::Close(']')),
        b'}' => Some(Delim::Close('}')),
        b';' => Some(Delim::Semicolon),
        _ => None,
    };
}

/// The opener matching a closer.
pub const fn opener_for(close: char) -> char {
    return match close {
        ')' => '(',
        ']' => '[',
        _ => '{',
    };
}

/// Whether a byte can be part of an identifier.
const fn is_ident_byte(byte: u8) -> bool {
    return byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$';
}

/// Scan `text` and collect structural delimiters outside strings and comments.
///
/// Scanning works on bytes. Every byte the scanner reacts to is ASCII, and
/// UTF-8 continuation bytes never collide with ASCII, so offsets always land
/// on char boundaries.
pub fn scan(text: &str) -> Scan {
    let bytes = text.as_bytes();
    let mut out = Scan::default();
    let mut stack = vec![Mode::Code { braces: 0, interpolation: false }];
    let mut i = 0_usize;

    while let Some(&byte) = bytes.get(i) {
        let next = bytes.get(i.saturating_add(1)).copied();
        let Some(mode) = stack.last_mut() else {
            break;
        };

        match mode {
            Mode::BlockComment { depth, .. } => {
                if byte == b'/' && next == Some(b'*') {
                    *depth = depth.saturating_add(1);
                    i = i.saturating_add(2);
                    continue;
                }
                if byte == b'*' && next == Some(b'/') {
                    *depth = depth.saturating_sub(1);
                    if *depth == 0 {
                        stack.pop();
                    }
                    i = i.saturating_add(2);
                    continue;
                }
                i = i.saturating_add(1);
            },

            Mode::Str { quote, raw, start, triple } => {
                let (quote, raw, start, triple) = (*quote, *raw, *start, *triple);
                if !raw && byte == b'\\' {
                    i = i.saturating_add(2);
                    continue;
                }
                if !raw && byte == b'$' && next == Some(b'{') {
                    stack.push(Mode::Code { braces: 0, interpolation: true });
                    i = i.saturating_add(2);
                    continue;
                }
                if byte == quote {
                    let closes = !triple
                        || (bytes.get(i.saturating_add(1)) == Some(&quote)
                            && bytes.get(i.saturating_add(2)) == Some(&quote));
                    if closes {
                        stack.pop();
                        i = i.saturating_add(if triple { 3 } else { 1 });
                        continue;
                    }
                }
                if byte == b'\n' && !triple {
                    // Single-line strings cannot span lines: report and recover here.
                    out.unterminated.push(Unterminated { offset: start, what: "string" });
                    stack.pop();
                }
                i = i.saturating_add(1);
            },

            Mode::Code { braces, interpolation } => {
                if byte == b'/' && next == Some(b'/') {
                    i = bytes
                        .iter()
                        .skip(i)
                        .position(|&b| return b == b'\n')
                        .map_or(bytes.len(), |p| return i.saturating_add(p));
                    continue;
                }
                if byte == b'/' && next == Some(b'*') {
                    stack.push(Mode::BlockComment { depth: 1, start: i });
                    i = i.saturating_add(2);
                    continue;
                }
                if byte == b'\'' || byte == b'"' {
                    let raw = i
                        .checked_sub(1)
                        .and_then(|p| return bytes.get(p))
                        .is_some_and(|&b| return b == b'r')
                        && i.checked_sub(2)
                            .and_then(|p| return bytes.get(p))
                            .is_none_or(|&b| return !is_ident_byte(b));
                    let triple = bytes.get(i.saturating_add(1)) == Some(&byte)
                        && bytes.get(i.saturating_add(2)) == Some(&byte);
                    stack.push(Mode::Str { quote: byte, raw, start: i, triple });
                    i = i.saturating_add(if triple { 3 } else { 1 });
                    continue;
                }
                if byte == b'}' && *interpolation && *braces == 0 {
                    stack.pop();
                    i = i.saturating_add(1);
                    continue;
                }
                if let Some(delim) = delim_for(byte) {
                    if *interpolation {
                        match delim {
                            Delim::Open('{') => *braces = braces.saturating_add(1),
                            Delim::Close('}') => *braces = braces.saturating_sub(1),
                            _ => {},
                        }
                    }
                    out.events.push(Event { delim, offset: i });
                }
                i = i.saturating_add(1);
            },
        }
    }

    for mode in stack.iter().rev() {
        match mode {
            Mode::BlockComment { start, .. } => {
                out.unterminated.push(Unterminated { offset: *start, what: "block comment" });
            },
            Mode::Str { start, .. } => {
                out.unterminated.push(Unterminated { offset: *start, what: "string" });
            },
            Mode::Code { .. } => {},
        }
    }

    return out;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delims(text: &str) -> String {
        return scan(text)
            .events
            .iter()
            .map(|e| {
                return match e.delim {
                    Delim::Open(c) | Delim::Close(c) => c,
                    Delim::Semicolon => ';',
                };
            })
            .collect();
    }

    #[test]
    fn plain_code_yields_all_delimiters() {
        assert_eq!(delims("void f(int a) { g[0]; }"), "(){[];}");
    }

    #[test]
    fn strings_and_comments_are_skipped() {
        let src = "f() { // }\n  /* { */ s = '}'; t = \"(\"; }";
        assert_eq!(delims(src), "(){;;}");
        assert!(scan(src).unterminated.is_empty());
    }

    #[test]
    fn nested_block_comments() {
        assert_eq!(delims("/* a /* b */ } */ {}"), "{}");
    }

    #[test]
    fn escaped_quote_stays_in_string() {
        assert_eq!(delims(r"x = 'it\'s {'; }"), ";}");
    }

    #[test]
    fn raw_string_ignores_backslash_and_interpolation() {
        assert_eq!(delims(r"x = r'\' ; y = r'${';"), ";;");
    }

    #[test]
    fn interpolation_is_scanned_as_code() {
        // The `{}` of the map literal inside the interpolation balance out
        // and the interpolation's own braces produce no events.
        assert_eq!(delims("s = 'a ${m[{}]} b';"), "[{}];");
        assert_eq!(delims("s = \"${x.map((e) => '}')}\";"), "(());");
    }

    #[test]
    fn triple_quoted_strings_span_lines() {
        let src = "s = '''\n{ ' \n''';\n{}";
        assert_eq!(delims(src), ";{}");
        assert!(scan(src).unterminated.is_empty());
    }

    #[test]
    fn reports_unterminated_block_comment() {
        let scanned = scan("a /* never closed");
        assert_eq!(
            scanned.unterminated,
            vec![Unterminated { offset: 2, what: "block comment" }]
        );
    }

    #[test]
    fn single_line_string_recovers_at_newline() {
        let scanned = scan("x = 'oops\n{}");
        assert_eq!(scanned.unterminated.len(), 1);
        assert_eq!(delims("x = 'oops\n{}"), "{}");
    }

    #[test]
    fn identifier_ending_in_r_is_not_raw_prefix() {
        // `bar'` is not a raw string prefix, so the backslash escapes the quote.
        assert_eq!(delims(r"bar'\'{'; }"), ";}");
    }
}
