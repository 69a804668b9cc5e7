//! RcDoc-based pretty-printer with termcolor annotations for [`Expression`].
//!
//! Role
//! - Convert an expression into an annotated document suitable for width-aware rendering.
//! - Provide colored output for terminals (TTY-aware) and plain strings for logs/tests.
//!
//! The flat layout is exactly [`Expression::string`]: no spaces, parentheses around every
//! non-root function node. Narrow widths only add line breaks after binary operators.
//!
//! Performance
//! - Building the doc is O(n) in expression size; rendering respects line widths with
//!   linear-time layout in the size of the resulting document.

use std::io::{self, Write};

use pretty::{RcDoc, RenderAnnotated};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::expr::Expression;
use crate::term::{Operation, TermType};

/// Styles used to annotate parts of the pretty-printed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Parentheses are colored by nesting depth so matching pairs share a color.
    Paren(u8),
    Operator, // >, |, *, +, =
    Negation, // leaf `!`
    Variable,
    Constant,
}

impl Style {
    fn to_color_spec(self) -> ColorSpec {
        let mut s = ColorSpec::new();
        match self {
            Style::Paren(depth) => {
                let fg = match depth % 6 {
                    0 => Color::Blue,
                    1 => Color::Green,
                    2 => Color::White,
                    3 => Color::Yellow,
                    4 => Color::Red,
                    _ => Color::Magenta,
                };
                s.set_fg(Some(fg)).set_dimmed(true);
            }
            Style::Operator => {
                s.set_fg(Some(Color::Yellow)).set_bold(true);
            }
            Style::Negation => {
                s.set_fg(Some(Color::Red)).set_bold(true);
            }
            Style::Variable => {
                s.set_fg(Some(Color::Green)).set_bold(true);
            }
            Style::Constant => {
                s.set_fg(Some(Color::Cyan)).set_bold(true);
            }
        }
        s
    }
}

#[inline]
fn lparen(depth: u8) -> RcDoc<'static, Style> {
    RcDoc::as_string("(").annotate(Style::Paren(depth))
}

#[inline]
fn rparen(depth: u8) -> RcDoc<'static, Style> {
    RcDoc::as_string(")").annotate(Style::Paren(depth))
}

fn op(op: Operation) -> RcDoc<'static, Style> {
    RcDoc::as_string(op.symbol()).annotate(Style::Operator)
}

fn to_doc_with_depth(e: &Expression, index: usize, depth: u8) -> RcDoc<'static, Style> {
    let node = &e.nodes()[index];
    let term = node.term;
    match term.kind {
        TermType::Function => {
            let nested = index != 0;
            let inner_depth = if nested { depth.wrapping_add(1) } else { depth };
            let body = to_doc_with_depth(e, node.relation.left(), inner_depth)
                .append(op(term.op))
                .append(RcDoc::line_())
                .append(to_doc_with_depth(e, node.relation.right(), inner_depth));
            if nested {
                lparen(depth).append(body).append(rparen(depth)).group()
            } else {
                body.group()
            }
        }
        TermType::Variable | TermType::Constant => {
            let style = if term.kind == TermType::Constant {
                Style::Constant
            } else {
                Style::Variable
            };
            let mut plain = term;
            plain.op = Operation::Nop;
            let leaf = RcDoc::as_string(plain).annotate(style);
            if term.is_negated() {
                RcDoc::as_string(Operation::Negation.symbol())
                    .annotate(Style::Negation)
                    .append(leaf)
            } else {
                leaf
            }
        }
        TermType::None => RcDoc::as_string(term),
    }
}

fn to_doc(e: &Expression) -> RcDoc<'static, Style> {
    if e.is_empty() {
        RcDoc::text("empty")
    } else {
        to_doc_with_depth(e, 0, 0)
    }
}

// A writer that maps Style annotations to termcolor ColorSpec on a WriteColor sink.
struct ColorWriter<'w, W: WriteColor + Write> {
    out: &'w mut W,
}

impl<'a, 'w, W: WriteColor + Write> RenderAnnotated<'a, Style> for ColorWriter<'w, W> {
    fn push_annotation(&mut self, ann: &'a Style) -> io::Result<()> {
        self.out.set_color(&ann.to_color_spec())
    }
    fn pop_annotation(&mut self) -> io::Result<()> {
        self.out.reset()
    }
}

impl<'w, W: WriteColor + Write> pretty::Render for ColorWriter<'w, W> {
    type Error = io::Error;
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.out.write_all(s.as_bytes())?;
        Ok(s.len())
    }
    fn write_str_all(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }
    fn fail_doc(&self) -> Self::Error {
        io::Error::other("render failed")
    }
}

/// Render a document to a `termcolor::WriteColor` with width-aware layout.
fn render_to<W: WriteColor + Write>(
    doc: &RcDoc<'_, Style>,
    width: usize,
    out: &mut W,
) -> io::Result<()> {
    let mut cw = ColorWriter { out };
    doc.render_raw(width, &mut cw)
}

/// Convenience: print to stdout with colors if supported, followed by a newline.
fn print_colored(e: &Expression, width: usize) -> io::Result<()> {
    let stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut stdout = stdout.lock();
    render_to(&to_doc(e), width, &mut stdout)?;
    writeln!(stdout)
}

/// Convenience: retrieve the width of the terminal, or 80 if it cannot be determined.
fn terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Pretty-printing conveniences for [`Expression`].
pub trait PrettyExpression {
    /// Build an RcDoc representation of this expression with style annotations.
    fn pretty_doc(&self) -> RcDoc<'static, Style>;

    /// Render this expression with colors to any termcolor writer at the given width.
    fn pretty_render_to<W: WriteColor + Write>(&self, width: usize, out: &mut W) -> io::Result<()>;

    /// Print this expression to stdout with colors (TTY-aware), at auto-detected width.
    fn pretty_print(&self) -> io::Result<()>;

    /// Single-line plain rendering; identical to [`Expression::string`].
    fn pretty_string(&self) -> String;
}

impl PrettyExpression for Expression {
    #[inline]
    fn pretty_doc(&self) -> RcDoc<'static, Style> {
        to_doc(self)
    }

    #[inline]
    fn pretty_render_to<W: WriteColor + Write>(&self, width: usize, out: &mut W) -> io::Result<()> {
        render_to(&self.pretty_doc(), width, out)
    }

    #[inline]
    fn pretty_print(&self) -> io::Result<()> {
        print_colored(self, terminal_width())
    }

    fn pretty_string(&self) -> String {
        // The flat layout is exactly as long as the canonical string, so it always fits.
        let width = self.string().len().max(80);
        let mut buf = String::new();
        let _ = self.pretty_doc().render_fmt(width, &mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use termcolor::{Buffer, NoColor};

    #[test]
    fn plain_rendering_matches_string() {
        for text in ["a", "!a", "a>b", "(a>b)>((b>c)>(a>c))", "!a*(b|!c)", "a=(b+c)"] {
            let mut e = parse(text).unwrap();
            assert_eq!(e.pretty_string(), e.string());
            e.make_constant();
            assert_eq!(e.pretty_string(), e.string());
        }
    }

    #[test]
    fn narrow_width_breaks_after_operators() {
        let e = parse("(a>b)>((b>c)>(a>c))").unwrap();
        let mut out = NoColor::new(Vec::new());
        e.pretty_render_to(4, &mut out).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.lines().count() > 1);
        assert_eq!(text.replace('\n', ""), e.string());
    }

    #[test]
    fn colored_rendering_emits_escapes() {
        let e = parse("a>!b").unwrap();
        let mut out = Buffer::ansi();
        e.pretty_render_to(80, &mut out).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains('\u{1b}'));
        assert!(text.contains('>'));
    }
}
