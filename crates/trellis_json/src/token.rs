//! The pull-based JSON token stream.
//!
//! The tokenizer tracks just enough container context to tell object keys
//! apart from plain strings and to emit both delimiter kinds, so parsers
//! see the full structural token vocabulary without re-deriving it.

use core::{error, fmt};
use std::borrow::Cow;

// -----------------------------------------------------------------------------
// TokenKind

/// The lexical classification of one token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    /// A string in value position.
    Str,
    /// A number with a leading `-` and no fraction or exponent.
    SignedInt,
    /// A number with no sign, fraction, or exponent.
    UnsignedInt,
    /// A number with a fraction or exponent.
    Float,
    True,
    False,
    Null,
    /// A string in key position inside an object.
    Key,
    /// `:`
    PairDelim,
    /// `,`
    ValueDelim,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BeginObject => "`{`",
            Self::EndObject => "`}`",
            Self::BeginArray => "`[`",
            Self::EndArray => "`]`",
            Self::Str => "string",
            Self::SignedInt => "signed integer",
            Self::UnsignedInt => "unsigned integer",
            Self::Float => "float",
            Self::True => "`true`",
            Self::False => "`false`",
            Self::Null => "`null`",
            Self::Key => "object key",
            Self::PairDelim => "`:`",
            Self::ValueDelim => "`,`",
        })
    }
}

// -----------------------------------------------------------------------------
// Token

/// One lexical unit of a JSON document.
///
/// `text` carries the decoded string for `Str`/`Key` (owned only when
/// escape decoding was required) and the raw literal for numbers; it is
/// empty for structural tokens.
#[derive(Clone, Debug)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: Cow<'src, str>,
    /// Byte offset of the token's first character.
    pub pos: usize,
}

impl<'src> Token<'src> {
    fn bare(kind: TokenKind, pos: usize) -> Self {
        Self {
            kind,
            text: Cow::Borrowed(""),
            pos,
        }
    }
}

// -----------------------------------------------------------------------------
// SyntaxError

/// A malformed-document error from the token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub pos: usize,
    pub kind: SyntaxErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    UnexpectedCharacter(char),
    UnexpectedEnd,
    BadEscape,
    BadNumber,
    BadLiteral,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason: &dyn fmt::Display = match &self.kind {
            SyntaxErrorKind::UnexpectedCharacter(c) => return write!(
                f,
                "malformed JSON at byte {}: unexpected character `{c}`",
                self.pos
            ),
            SyntaxErrorKind::UnexpectedEnd => &"unexpected end of input",
            SyntaxErrorKind::BadEscape => &"invalid string escape",
            SyntaxErrorKind::BadNumber => &"invalid number literal",
            SyntaxErrorKind::BadLiteral => &"invalid literal",
        };
        write!(f, "malformed JSON at byte {}: {reason}", self.pos)
    }
}

impl error::Error for SyntaxError {}

// -----------------------------------------------------------------------------
// Tokenizer

#[derive(Clone, Copy)]
struct Frame {
    object: bool,
    awaiting_key: bool,
}

/// A pull tokenizer over a complete JSON text.
pub struct Tokenizer<'src> {
    input: &'src str,
    pos: usize,
    frames: Vec<Frame>,
}

impl<'src> Tokenizer<'src> {
    /// Creates a tokenizer over `input`.
    pub fn new(input: &'src str) -> Self {
        Self {
            input,
            pos: 0,
            frames: Vec::new(),
        }
    }

    /// Current byte position.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether only whitespace remains.
    pub fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.input.as_bytes();
        while let Some(b) = bytes.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
    }

    fn error(&self, pos: usize, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError { pos, kind }
    }

    /// Pulls the next token.
    pub fn next_token(&mut self) -> Result<Token<'src>, SyntaxError> {
        self.skip_whitespace();
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let Some(&byte) = bytes.get(self.pos) else {
            return Err(self.error(start, SyntaxErrorKind::UnexpectedEnd));
        };

        match byte {
            b'{' => {
                self.pos += 1;
                self.frames.push(Frame {
                    object: true,
                    awaiting_key: true,
                });
                Ok(Token::bare(TokenKind::BeginObject, start))
            }
            b'}' => {
                self.pos += 1;
                self.frames.pop();
                Ok(Token::bare(TokenKind::EndObject, start))
            }
            b'[' => {
                self.pos += 1;
                self.frames.push(Frame {
                    object: false,
                    awaiting_key: false,
                });
                Ok(Token::bare(TokenKind::BeginArray, start))
            }
            b']' => {
                self.pos += 1;
                self.frames.pop();
                Ok(Token::bare(TokenKind::EndArray, start))
            }
            b':' => {
                self.pos += 1;
                Ok(Token::bare(TokenKind::PairDelim, start))
            }
            b',' => {
                self.pos += 1;
                if let Some(frame) = self.frames.last_mut()
                    && frame.object
                {
                    frame.awaiting_key = true;
                }
                Ok(Token::bare(TokenKind::ValueDelim, start))
            }
            b'"' => {
                let is_key = match self.frames.last_mut() {
                    Some(frame) if frame.object && frame.awaiting_key => {
                        frame.awaiting_key = false;
                        true
                    }
                    _ => false,
                };
                let text = self.lex_string()?;
                Ok(Token {
                    kind: if is_key { TokenKind::Key } else { TokenKind::Str },
                    text,
                    pos: start,
                })
            }
            b'-' | b'0'..=b'9' => self.lex_number(),
            b't' => self.lex_literal("true", TokenKind::True),
            b'f' => self.lex_literal("false", TokenKind::False),
            b'n' => self.lex_literal("null", TokenKind::Null),
            other => Err(self.error(start, SyntaxErrorKind::UnexpectedCharacter(other as char))),
        }
    }

    fn lex_literal(&mut self, literal: &str, kind: TokenKind) -> Result<Token<'src>, SyntaxError> {
        let start = self.pos;
        if self.input[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            Ok(Token::bare(kind, start))
        } else {
            Err(self.error(start, SyntaxErrorKind::BadLiteral))
        }
    }

    fn lex_number(&mut self) -> Result<Token<'src>, SyntaxError> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let signed = bytes[self.pos] == b'-';
        if signed {
            self.pos += 1;
        }

        let digits_start = self.pos;
        while matches!(bytes.get(self.pos), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.pos == digits_start {
            return Err(self.error(start, SyntaxErrorKind::BadNumber));
        }

        let mut float = false;
        if matches!(bytes.get(self.pos), Some(b'.')) {
            float = true;
            self.pos += 1;
            let frac_start = self.pos;
            while matches!(bytes.get(self.pos), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
            if self.pos == frac_start {
                return Err(self.error(start, SyntaxErrorKind::BadNumber));
            }
        }
        if matches!(bytes.get(self.pos), Some(b'e' | b'E')) {
            float = true;
            self.pos += 1;
            if matches!(bytes.get(self.pos), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            let exp_start = self.pos;
            while matches!(bytes.get(self.pos), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
            if self.pos == exp_start {
                return Err(self.error(start, SyntaxErrorKind::BadNumber));
            }
        }

        let kind = if float {
            TokenKind::Float
        } else if signed {
            TokenKind::SignedInt
        } else {
            TokenKind::UnsignedInt
        };
        Ok(Token {
            kind,
            text: Cow::Borrowed(&self.input[start..self.pos]),
            pos: start,
        })
    }

    fn lex_string(&mut self) -> Result<Cow<'src, str>, SyntaxError> {
        let bytes = self.input.as_bytes();
        // Past the opening quote.
        self.pos += 1;
        let content_start = self.pos;

        // Fast path: no escapes, borrow the slice.
        loop {
            match bytes.get(self.pos) {
                None => return Err(self.error(self.pos, SyntaxErrorKind::UnexpectedEnd)),
                Some(b'"') => {
                    let text = &self.input[content_start..self.pos];
                    self.pos += 1;
                    return Ok(Cow::Borrowed(text));
                }
                Some(b'\\') => break,
                Some(b) if *b < 0x20 => {
                    return Err(self.error(
                        self.pos,
                        SyntaxErrorKind::UnexpectedCharacter(*b as char),
                    ));
                }
                Some(_) => self.pos += 1,
            }
        }

        // Escape path: decode into an owned buffer.
        let mut decoded = String::from(&self.input[content_start..self.pos]);
        loop {
            match bytes.get(self.pos) {
                None => return Err(self.error(self.pos, SyntaxErrorKind::UnexpectedEnd)),
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(Cow::Owned(decoded));
                }
                Some(b'\\') => {
                    let escape_pos = self.pos;
                    self.pos += 1;
                    let Some(&escape) = bytes.get(self.pos) else {
                        return Err(self.error(escape_pos, SyntaxErrorKind::UnexpectedEnd));
                    };
                    self.pos += 1;
                    match escape {
                        b'"' => decoded.push('"'),
                        b'\\' => decoded.push('\\'),
                        b'/' => decoded.push('/'),
                        b'b' => decoded.push('\u{0008}'),
                        b'f' => decoded.push('\u{000C}'),
                        b'n' => decoded.push('\n'),
                        b'r' => decoded.push('\r'),
                        b't' => decoded.push('\t'),
                        b'u' => {
                            let unit = self.lex_hex4(escape_pos)?;
                            let c = if (0xD800..0xDC00).contains(&unit) {
                                // High surrogate; the low half must follow.
                                if !self.input[self.pos..].starts_with("\\u") {
                                    return Err(
                                        self.error(escape_pos, SyntaxErrorKind::BadEscape)
                                    );
                                }
                                self.pos += 2;
                                let low = self.lex_hex4(escape_pos)?;
                                if !(0xDC00..0xE000).contains(&low) {
                                    return Err(
                                        self.error(escape_pos, SyntaxErrorKind::BadEscape)
                                    );
                                }
                                let combined = 0x10000
                                    + ((u32::from(unit) - 0xD800) << 10)
                                    + (u32::from(low) - 0xDC00);
                                char::from_u32(combined)
                                    .ok_or(self.error(escape_pos, SyntaxErrorKind::BadEscape))?
                            } else {
                                char::from_u32(u32::from(unit))
                                    .ok_or(self.error(escape_pos, SyntaxErrorKind::BadEscape))?
                            };
                            decoded.push(c);
                        }
                        _ => return Err(self.error(escape_pos, SyntaxErrorKind::BadEscape)),
                    }
                }
                Some(b) if *b < 0x20 => {
                    return Err(self.error(
                        self.pos,
                        SyntaxErrorKind::UnexpectedCharacter(*b as char),
                    ));
                }
                Some(_) => {
                    // Copy one full character, not one byte.
                    let rest = &self.input[self.pos..];
                    let c = rest.chars().next().expect("in-bounds char");
                    decoded.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
    }

    fn lex_hex4(&mut self, escape_pos: usize) -> Result<u16, SyntaxError> {
        let digits = self
            .input
            .get(self.pos..self.pos + 4)
            .ok_or(self.error(escape_pos, SyntaxErrorKind::UnexpectedEnd))?;
        let unit = u16::from_str_radix(digits, 16)
            .map_err(|_| self.error(escape_pos, SyntaxErrorKind::BadEscape))?;
        self.pos += 4;
        Ok(unit)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{SyntaxErrorKind, TokenKind, Tokenizer};

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut tok = Tokenizer::new(input);
        let mut out = Vec::new();
        while !tok.at_end() {
            out.push(tok.next_token().unwrap().kind);
        }
        out
    }

    #[test]
    fn keys_and_strings_are_distinct() {
        use TokenKind::*;
        assert_eq!(
            kinds(r#"{"a": "b", "c": ["d"]}"#),
            vec![
                BeginObject,
                Key,
                PairDelim,
                Str,
                ValueDelim,
                Key,
                PairDelim,
                BeginArray,
                Str,
                EndArray,
                EndObject,
            ]
        );
    }

    #[test]
    fn number_classification() {
        use TokenKind::*;
        assert_eq!(kinds("[1, -2, 3.5, 1e3, -0.5]"),
            vec![BeginArray, UnsignedInt, ValueDelim, SignedInt, ValueDelim, Float, ValueDelim, Float, ValueDelim, Float, EndArray]);
    }

    #[test]
    fn escape_decoding() {
        let mut tok = Tokenizer::new(r#""a\nbA😀""#);
        let token = tok.next_token().unwrap();
        assert_eq!(token.text.as_ref(), "a\nbA\u{1F600}");
    }

    #[test]
    fn borrowed_without_escapes() {
        let mut tok = Tokenizer::new(r#""plain""#);
        let token = tok.next_token().unwrap();
        assert!(matches!(token.text, std::borrow::Cow::Borrowed("plain")));
    }

    #[test]
    fn truncated_input_fails() {
        let mut tok = Tokenizer::new(r#"{"a": "#);
        for _ in 0..3 {
            tok.next_token().unwrap();
        }
        let err = tok.next_token().unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedEnd);
    }
}
