//! The low-level structural writer.
//!
//! Instructors talk to [`StructuralWriter`] in structural primitives; the
//! concrete [`JsonTextWriter`] renders them as JSON text through a
//! pluggable [`WhitespaceStyle`] and [`KeyNormalizer`].

use core::fmt;

use crate::error::SerializeError;

// -----------------------------------------------------------------------------
// KeyNormalizer

/// Normalizes member names before they are written as keys or matched
/// against slots.
///
/// Both sides of the engine share one normalizer, so whatever a writer
/// emits, the reader's slot lookup reproduces.
pub trait KeyNormalizer: Send + Sync {
    fn normalize(&self, key: &str) -> String;
}

/// The default normalizer: strip non-alphanumerics, lowercase the first
/// letter.
///
/// `user_name` normalizes to `username` and `UserName` to `userName`;
/// the transformation is shape-preserving past the first character.
pub struct DefaultKeyNormalizer;

impl KeyNormalizer for DefaultKeyNormalizer {
    fn normalize(&self, key: &str) -> String {
        let mut out = String::with_capacity(key.len());
        for c in key.chars() {
            if !c.is_alphanumeric() {
                continue;
            }
            if out.is_empty() {
                out.extend(c.to_lowercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

// -----------------------------------------------------------------------------
// WhitespaceStyle

/// Pluggable whitespace around structural positions.
pub trait WhitespaceStyle: Send + Sync {
    /// Before a key or array element, at the given nesting depth.
    fn entry_break(&self, out: &mut dyn fmt::Write, depth: usize) -> fmt::Result;

    /// Before a closing bracket of a non-empty container.
    fn close_break(&self, out: &mut dyn fmt::Write, depth: usize) -> fmt::Result;

    /// After the `:` separating a key from its value.
    fn after_pair_delim(&self, out: &mut dyn fmt::Write) -> fmt::Result;
}

/// Compact output: every hook is a no-op.
pub struct CompactStyle;

impl WhitespaceStyle for CompactStyle {
    fn entry_break(&self, _out: &mut dyn fmt::Write, _depth: usize) -> fmt::Result {
        Ok(())
    }

    fn close_break(&self, _out: &mut dyn fmt::Write, _depth: usize) -> fmt::Result {
        Ok(())
    }

    fn after_pair_delim(&self, _out: &mut dyn fmt::Write) -> fmt::Result {
        Ok(())
    }
}

/// Pretty-printed output with one indentation unit per nesting level.
pub struct IndentStyle {
    pub indent: &'static str,
}

impl WhitespaceStyle for IndentStyle {
    fn entry_break(&self, out: &mut dyn fmt::Write, depth: usize) -> fmt::Result {
        out.write_char('\n')?;
        for _ in 0..depth {
            out.write_str(self.indent)?;
        }
        Ok(())
    }

    fn close_break(&self, out: &mut dyn fmt::Write, depth: usize) -> fmt::Result {
        self.entry_break(out, depth)
    }

    fn after_pair_delim(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_char(' ')
    }
}

// -----------------------------------------------------------------------------
// StructuralWriter

/// Structural write primitives over a JSON sink.
pub trait StructuralWriter {
    fn begin_object(&mut self) -> Result<(), SerializeError>;
    fn end_object(&mut self) -> Result<(), SerializeError>;
    fn begin_array(&mut self) -> Result<(), SerializeError>;
    fn end_array(&mut self) -> Result<(), SerializeError>;

    /// Writes an object key; `should_normalize` runs the key normalizer
    /// over the text first (member names do, data-bearing keys do not).
    fn key(&mut self, text: &str, should_normalize: bool) -> Result<(), SerializeError>;

    fn pair_delimiter(&mut self) -> Result<(), SerializeError>;
    fn value_delimiter(&mut self) -> Result<(), SerializeError>;

    /// Writes raw primitive text: numbers, booleans.
    fn primitive(&mut self, text: &str) -> Result<(), SerializeError>;

    /// Writes an escaped, quoted string.
    fn string(&mut self, text: &str) -> Result<(), SerializeError>;

    fn null(&mut self) -> Result<(), SerializeError>;
}

// -----------------------------------------------------------------------------
// JsonTextWriter

struct Container {
    object: bool,
    has_entries: bool,
}

/// The standard [`StructuralWriter`] over any [`fmt::Write`] sink.
pub struct JsonTextWriter<'a, W: fmt::Write> {
    out: W,
    style: &'a dyn WhitespaceStyle,
    normalizer: &'a dyn KeyNormalizer,
    stack: Vec<Container>,
}

impl<'a, W: fmt::Write> JsonTextWriter<'a, W> {
    pub fn new(out: W, style: &'a dyn WhitespaceStyle, normalizer: &'a dyn KeyNormalizer) -> Self {
        Self {
            out,
            style,
            normalizer,
            stack: Vec::new(),
        }
    }

    /// Returns the sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Break before an array element; object entries break at their key.
    fn begin_value(&mut self) -> fmt::Result {
        let depth = self.stack.len();
        if let Some(top) = self.stack.last_mut()
            && !top.object
        {
            top.has_entries = true;
            self.style.entry_break(&mut self.out, depth)?;
        }
        Ok(())
    }

    fn close(&mut self, bracket: char) -> fmt::Result {
        let container = self.stack.pop().expect("balanced writer calls");
        if container.has_entries {
            self.style.close_break(&mut self.out, self.stack.len())?;
        }
        self.out.write_char(bracket)
    }

    fn write_escaped(&mut self, text: &str) -> fmt::Result {
        self.out.write_char('"')?;
        for c in text.chars() {
            match c {
                '"' => self.out.write_str("\\\"")?,
                '\\' => self.out.write_str("\\\\")?,
                '\n' => self.out.write_str("\\n")?,
                '\r' => self.out.write_str("\\r")?,
                '\t' => self.out.write_str("\\t")?,
                '\u{0008}' => self.out.write_str("\\b")?,
                '\u{000C}' => self.out.write_str("\\f")?,
                c if (c as u32) < 0x20 => write!(self.out, "\\u{:04x}", c as u32)?,
                c => self.out.write_char(c)?,
            }
        }
        self.out.write_char('"')
    }
}

impl<W: fmt::Write> StructuralWriter for JsonTextWriter<'_, W> {
    fn begin_object(&mut self) -> Result<(), SerializeError> {
        self.begin_value()?;
        self.out.write_char('{')?;
        self.stack.push(Container {
            object: true,
            has_entries: false,
        });
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), SerializeError> {
        self.close('}')?;
        Ok(())
    }

    fn begin_array(&mut self) -> Result<(), SerializeError> {
        self.begin_value()?;
        self.out.write_char('[')?;
        self.stack.push(Container {
            object: false,
            has_entries: false,
        });
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), SerializeError> {
        self.close(']')?;
        Ok(())
    }

    fn key(&mut self, text: &str, should_normalize: bool) -> Result<(), SerializeError> {
        let depth = self.stack.len();
        if let Some(top) = self.stack.last_mut() {
            top.has_entries = true;
        }
        self.style.entry_break(&mut self.out, depth)?;
        if should_normalize {
            let normalized = self.normalizer.normalize(text);
            self.write_escaped(&normalized)?;
        } else {
            self.write_escaped(text)?;
        }
        Ok(())
    }

    fn pair_delimiter(&mut self) -> Result<(), SerializeError> {
        self.out.write_char(':')?;
        self.style.after_pair_delim(&mut self.out)?;
        Ok(())
    }

    fn value_delimiter(&mut self) -> Result<(), SerializeError> {
        self.out.write_char(',')?;
        Ok(())
    }

    fn primitive(&mut self, text: &str) -> Result<(), SerializeError> {
        self.begin_value()?;
        self.out.write_str(text)?;
        Ok(())
    }

    fn string(&mut self, text: &str) -> Result<(), SerializeError> {
        self.begin_value()?;
        self.write_escaped(text)?;
        Ok(())
    }

    fn null(&mut self) -> Result<(), SerializeError> {
        self.begin_value()?;
        self.out.write_str("null")?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{CompactStyle, DefaultKeyNormalizer, IndentStyle, JsonTextWriter, KeyNormalizer, StructuralWriter};

    #[test]
    fn default_normalizer() {
        let n = DefaultKeyNormalizer;
        assert_eq!(n.normalize("UserName"), "userName");
        assert_eq!(n.normalize("user_name"), "username");
        assert_eq!(n.normalize("age"), "age");
        assert_eq!(n.normalize("$ref"), "ref");
    }

    #[test]
    fn compact_object() {
        let mut w = JsonTextWriter::new(String::new(), &CompactStyle, &DefaultKeyNormalizer);
        w.begin_object().unwrap();
        w.key("Name", true).unwrap();
        w.pair_delimiter().unwrap();
        w.string("Ada").unwrap();
        w.value_delimiter().unwrap();
        w.key("$id", false).unwrap();
        w.pair_delimiter().unwrap();
        w.primitive("1").unwrap();
        w.end_object().unwrap();
        assert_eq!(w.into_inner(), r#"{"name":"Ada","$id":1}"#);
    }

    #[test]
    fn pretty_array() {
        let style = IndentStyle { indent: "  " };
        let mut w = JsonTextWriter::new(String::new(), &style, &DefaultKeyNormalizer);
        w.begin_array().unwrap();
        w.primitive("1").unwrap();
        w.value_delimiter().unwrap();
        w.primitive("2").unwrap();
        w.end_array().unwrap();
        assert_eq!(w.into_inner(), "[\n  1,\n  2\n]");
    }

    #[test]
    fn escapes() {
        let mut w = JsonTextWriter::new(String::new(), &CompactStyle, &DefaultKeyNormalizer);
        w.string("a\"b\\c\nd").unwrap();
        assert_eq!(w.into_inner(), r#""a\"b\\c\nd""#);
    }
}
