//! Code generation targets.
//!
//! Every target renders the same [`Model`] and writes through a
//! [`FileWriter`], so adding a binding language means adding one more
//! [`Backend`] implementation.

use std::io::{self, Write};

use crate::{
    document::Document,
    error::NidlError,
    filewriter::{FileWriter, DIVIDER},
    types::Model,
};

pub mod cpp_header;
pub mod cpp_source;
pub mod csharp;

pub use cpp_header::CppHeader;
pub use cpp_source::CppSource;
pub use csharp::CSharp;

/// The sink every backend writes into.
pub type Output<'w> = FileWriter<&'w mut dyn Write>;

pub trait Backend {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    fn emit(&self, document: &Document, model: &Model, out: &mut Output<'_>) -> Result<(), NidlError>;
}

/// Divider block with an optional description inside the doc comment.
pub(crate) fn write_doc_block<W: Write>(out: &mut FileWriter<W>, description: Option<&str>) -> io::Result<()> {
    match description {
        None => out.write_divider(),
        Some(text) => {
            out.write_line(DIVIDER)?;
            out.write_line("/**")?;
            out.increase_indent();
            for line in text.lines() {
                out.write_line(line)?;
            }
            out.decrease_indent();
            out.write_line("*/")
        }
    }
}

/// `/// ` comment lines, one per line of `text`.
pub(crate) fn write_line_comments<W: Write>(out: &mut FileWriter<W>, text: &str) -> io::Result<()> {
    for line in text.lines() {
        out.write_line(format!("/// {}", line).trim_end())?;
    }
    Ok(())
}

/// A fourcc as a C++ multi-character literal, `0` when absent.
pub(crate) fn fourcc_literal(fourcc: Option<&str>) -> String {
    match fourcc {
        Some(tag) => format!("'{}'", tag),
        None => "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_block_indents_description() {
        let mut out = FileWriter::new(Vec::new());
        write_doc_block(&mut out, Some("Line one\nLine two")).unwrap();
        let text = String::from_utf8(out.finish().unwrap()).unwrap();
        assert_eq!(text, format!("{}\n/**\n\tLine one\n\tLine two\n*/\n", DIVIDER));
    }

    #[test]
    fn line_comments_split_multi_line_text() {
        let mut out = FileWriter::new(Vec::new());
        out.increase_indent();
        write_line_comments(&mut out, "Light range\n\nin meters").unwrap();
        let text = String::from_utf8(out.finish().unwrap()).unwrap();
        assert_eq!(text, "\t/// Light range\n\t///\n\t/// in meters\n");
    }

    #[test]
    fn fourcc_literals() {
        assert_eq!(fourcc_literal(Some("LRAD")), "'LRAD'");
        assert_eq!(fourcc_literal(None), "0");
    }
}
