//! Contains the common [`ErrorKind`] trait used by all errors to display user-facing error
//! messages.
//!
//! Errors raised by the engine point into the rendered text of the expression being processed.
//! The spans stored in an [`Error`] are byte ranges into that text, so a caller can print a
//! report with the same string it got from formatting the expression.

use ariadne::{Color, Label, Report, ReportKind};
use std::{fmt::Debug, ops::Range};

/// The color to use to highlight expressions.
pub const EXPR: Color = Color::RGB(52, 235, 152);

/// Represents any kind of error that can occur during some operation.
pub trait ErrorKind: Debug + Send {
    /// Builds the report for this error.
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<'a, (&'a str, Range<usize>)>;
}

/// Builds a report with one label per span.
///
/// Labels are paired with spans in order; an empty label string highlights its span without a
/// message. If there are more labels than spans, the extra labels are dropped. If `spans` is
/// empty, the report is anchored at offset zero and carries no labels.
pub fn build_report<'a>(
    src_id: &'a str,
    spans: &[Range<usize>],
    message: impl ToString,
    labels: impl IntoIterator<Item = String>,
    help: Option<String>,
) -> Report<'a, (&'a str, Range<usize>)> {
    let offset = spans.first().map_or(0, |span| span.start);
    let mut builder = Report::build(ReportKind::Error, src_id, offset)
        .with_message(message)
        .with_labels(
            labels
                .into_iter()
                .zip(spans)
                .map(|(label_str, span)| {
                    let mut label = Label::new((src_id, span.clone())).with_color(EXPR);

                    if !label_str.is_empty() {
                        label = label.with_message(label_str);
                    }

                    label
                })
                .collect::<Vec<_>>(),
        );

    if let Some(help) = help {
        builder.set_help(help);
    }
    builder.finish()
}

/// An error associated with regions of an expression's rendered text that can be highlighted.
#[derive(Debug)]
pub struct Error {
    /// The regions of the rendered expression that this error originated from.
    pub spans: Vec<Range<usize>>,

    /// The kind of error that occurred.
    pub kind: Box<dyn ErrorKind>,
}

impl Error {
    /// Creates a new error with the given spans and kind.
    pub fn new(spans: Vec<Range<usize>>, kind: impl ErrorKind + 'static) -> Self {
        Self { spans, kind: Box::new(kind) }
    }

    /// Creates a new error that is not yet associated with any region. The caller that knows the
    /// rendered expression is expected to fill in the spans with [`Error::with_spans`].
    pub fn unlocated(kind: impl ErrorKind + 'static) -> Self {
        Self::new(Vec::new(), kind)
    }

    /// Replaces the spans of this error if it has none yet.
    pub fn with_spans(mut self, spans: impl FnOnce() -> Vec<Range<usize>>) -> Self {
        if self.spans.is_empty() {
            self.spans = spans();
        }
        self
    }

    /// Build a report from this error kind.
    pub fn build_report<'a>(&self, src_id: &'a str) -> Report<'a, (&'a str, Range<usize>)> {
        self.kind.build_report(src_id, &self.spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ariadne::Source;

    #[derive(Debug)]
    struct NotDifferentiable {
        name: String,
    }

    impl ErrorKind for NotDifferentiable {
        fn build_report<'a>(
            &self,
            src_id: &'a str,
            spans: &[Range<usize>],
        ) -> Report<'a, (&'a str, Range<usize>)> {
            build_report(
                src_id,
                spans,
                format!("`{}` cannot be differentiated here", self.name),
                ["this call".to_string()],
                Some("rewrite it with differentiable functions".to_string()),
            )
        }
    }

    fn render(err: &Error, src: &str) -> String {
        let mut buf = Vec::new();
        err.build_report("input")
            .write(("input", Source::from(src)), &mut buf)
            .unwrap();
        String::from_utf8(strip_ansi_escapes::strip(buf)).unwrap()
    }

    #[test]
    fn report_contains_message_and_help() {
        let src = "abs(x0)";
        let err = Error::new(vec![0..7], NotDifferentiable { name: "abs".to_string() });
        let out = render(&err, src);

        assert!(out.contains("`abs` cannot be differentiated here"), "{out}");
        assert!(out.contains("this call"), "{out}");
        assert!(out.contains("rewrite it with differentiable functions"), "{out}");
    }

    #[test]
    fn spans_are_filled_only_once() {
        let err = Error::unlocated(NotDifferentiable { name: "abs".to_string() })
            .with_spans(|| vec![0..3])
            .with_spans(|| vec![4..6]);
        assert_eq!(err.spans, vec![0..3]);
    }

    #[test]
    fn unlocated_report_still_builds() {
        let err = Error::unlocated(NotDifferentiable { name: "abs".to_string() });
        let out = render(&err, "abs(x0)");
        assert!(out.contains("cannot be differentiated"), "{out}");
    }
}
