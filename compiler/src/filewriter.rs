use std::io::{self, Write};

use crate::error::NidlError;

/// One unit of indentation.
pub const INDENT: &str = "\t";

pub const DIVIDER: &str =
    "//------------------------------------------------------------------------------";

/// A sequential text sink with a logical indent level.
///
/// Indentation is applied when a write begins at column zero. A single write
/// containing embedded newlines has every newline except a trailing one
/// followed by the current indentation, so multi-line template blocks stay
/// aligned with the code around them.
pub struct FileWriter<W: Write> {
    writer: W,
    indent: usize,
    column: usize,
    scopes: Vec<String>,
}

impl<W: Write> FileWriter<W> {
    pub fn new(writer: W) -> Self {
        FileWriter {
            writer,
            indent: 0,
            column: 0,
            scopes: Vec::new(),
        }
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Current column in characters, counting each indent unit as one.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn increase_indent(&mut self) {
        self.indent += 1;
    }

    /// Decreasing below zero is a no-op.
    pub fn decrease_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn write(&mut self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        if self.column == 0 && !text.starts_with('\n') {
            self.write_indent()?;
        }

        let mut rest = text;
        while let Some(i) = rest.find('\n') {
            let (line, tail) = rest.split_at(i + 1);
            self.writer.write_all(line.as_bytes())?;
            self.column = 0;
            rest = tail;
            if !rest.is_empty() {
                self.write_indent()?;
            }
        }
        if !rest.is_empty() {
            self.writer.write_all(rest.as_bytes())?;
            self.column += rest.chars().count();
        }
        Ok(())
    }

    /// Write `text` and end the line. An empty `text` produces a bare blank
    /// line without indentation.
    pub fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.write(text)?;
        self.writer.write_all(b"\n")?;
        self.column = 0;
        Ok(())
    }

    /// The standard divider block placed above every definition.
    pub fn write_divider(&mut self) -> io::Result<()> {
        self.write_line(DIVIDER)?;
        self.write_line("/**")?;
        self.write_line("*/")
    }

    /// A one-line comment framed by dividers.
    pub fn write_boxed_comment(&mut self, text: &str) -> io::Result<()> {
        self.write_line(DIVIDER)?;
        self.write_line(&format!("// {}", text))?;
        self.write_line(DIVIDER)
    }

    pub(crate) fn push_scope(&mut self, name: &str) {
        self.scopes.push(name.to_string());
    }

    pub(crate) fn pop_scope(&mut self, expected: &str) -> Result<(), NidlError> {
        match self.scopes.pop() {
            Some(ref name) if name == expected => Ok(()),
            Some(name) => Err(NidlError::UnbalancedNamespace(format!(
                "closing {} while {} is open",
                expected, name
            ))),
            None => Err(NidlError::UnbalancedNamespace(format!(
                "closing {} with no open namespace",
                expected
            ))),
        }
    }

    /// Flush and hand back the underlying writer. Fails if a namespace opened
    /// through the document helpers was never closed.
    pub fn finish(mut self) -> Result<W, NidlError> {
        if !self.scopes.is_empty() {
            return Err(NidlError::UnbalancedNamespace(self.scopes.join(", ")));
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_indent(&mut self) -> io::Result<()> {
        for _ in 0..self.indent {
            self.writer.write_all(INDENT.as_bytes())?;
        }
        self.column += self.indent;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut FileWriter<Vec<u8>>) -> io::Result<()>) -> String {
        let mut out = FileWriter::new(Vec::new());
        f(&mut out).unwrap();
        String::from_utf8(out.finish().unwrap()).unwrap()
    }

    fn at_depth(depth: usize, text: &str) -> String {
        render(|out| {
            for _ in 0..depth {
                out.increase_indent();
            }
            out.write(text)
        })
    }

    #[test]
    fn no_embedded_newline() {
        assert_eq!(at_depth(0, "int x;"), "int x;");
        assert_eq!(at_depth(1, "int x;"), "\tint x;");
        assert_eq!(at_depth(3, "int x;"), "\t\t\tint x;");
    }

    #[test]
    fn one_embedded_newline() {
        assert_eq!(at_depth(0, "a\nb"), "a\nb");
        assert_eq!(at_depth(1, "a\nb"), "\ta\n\tb");
        assert_eq!(at_depth(3, "a\nb"), "\t\t\ta\n\t\t\tb");
    }

    #[test]
    fn several_embedded_newlines() {
        assert_eq!(at_depth(0, "a\nb\nc"), "a\nb\nc");
        assert_eq!(at_depth(1, "a\nb\nc"), "\ta\n\tb\n\tc");
        assert_eq!(at_depth(3, "a\nb\nc"), "\t\t\ta\n\t\t\tb\n\t\t\tc");
    }

    #[test]
    fn trailing_newline_is_not_indented() {
        assert_eq!(at_depth(1, "a\nb\n"), "\ta\n\tb\n");
        assert_eq!(at_depth(3, "a\n"), "\t\t\ta\n");
    }

    #[test]
    fn mid_line_writes_do_not_reindent() {
        let text = render(|out| {
            out.increase_indent();
            out.write("int ")?;
            out.write("x")?;
            out.write_line(";")?;
            out.write_line("y;")
        });
        assert_eq!(text, "\tint x;\n\ty;\n");
    }

    #[test]
    fn nested_block_with_multiline_string() {
        let text = render(|out| {
            out.write_line("{")?;
            out.increase_indent();
            out.write_line("{")?;
            out.increase_indent();
            out.write("first();\nsecond();\nthird();\n")?;
            out.decrease_indent();
            out.write_line("}")?;
            out.decrease_indent();
            out.write_line("}")
        });
        assert_eq!(
            text,
            "{\n\t{\n\t\tfirst();\n\t\tsecond();\n\t\tthird();\n\t}\n}\n"
        );
    }

    #[test]
    fn decrease_is_floored_at_zero() {
        let text = render(|out| {
            out.decrease_indent();
            out.decrease_indent();
            assert_eq!(out.indent(), 0);
            out.increase_indent();
            out.write_line("x")
        });
        assert_eq!(text, "\tx\n");
    }

    #[test]
    fn blank_lines_carry_no_indent() {
        let text = render(|out| {
            out.increase_indent();
            out.write_line("a")?;
            out.write_line("")?;
            out.write_line("b")
        });
        assert_eq!(text, "\ta\n\n\tb\n");
    }

    #[test]
    fn column_tracking() {
        let mut out = FileWriter::new(Vec::new());
        out.increase_indent();
        out.write("abc").unwrap();
        assert_eq!(out.column(), 4);
        out.write("\nxy").unwrap();
        assert_eq!(out.column(), 3);
        out.write_line("").unwrap();
        assert_eq!(out.column(), 0);
    }

    #[test]
    fn divider_helpers() {
        let text = render(|out| {
            out.write_divider()?;
            out.write_boxed_comment("Enums")
        });
        assert_eq!(
            text,
            format!("{d}\n/**\n*/\n{d}\n// Enums\n{d}\n", d = DIVIDER)
        );
    }

    #[test]
    fn unbalanced_scopes_fail_on_finish() {
        let mut out = FileWriter::new(Vec::new());
        out.push_scope("Game");
        assert!(matches!(out.finish(), Err(NidlError::UnbalancedNamespace(_))));

        let mut out = FileWriter::new(Vec::new());
        out.push_scope("Game");
        out.push_scope("Details");
        assert!(out.pop_scope("Game").is_err());
    }
}
