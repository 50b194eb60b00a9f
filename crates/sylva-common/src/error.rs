/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */
use std::{error::Error, fmt::Debug};

use ariadne::{Label, Report, ReportBuilder};
use backtrace::Backtrace;
use smallvec::{smallvec, SmallVec};

use crate::{report, Details, Diagnostic, ErrorKind, Span};

pub fn error_reporter<'a>(err: impl ToString, span: Span) -> ReportBuilder<'a, Span> {
    Report::build(ariadne::ReportKind::Error, span.file.clone(), span.byte_start)
        .with_config(ariadne::Config::default().with_index_type(ariadne::IndexType::Byte))
        .with_message(err)
}

///Common error type for sylva modules. Allows you to build a base error from any
/// type `E: Error`. The span and labels are printed when using [SylvaError::report].
///
/// You are encouraged to use [thiserror] to derive your `E` type, and use [SylvaError] only to embedded your error.
pub struct SylvaError<E: Error> {
    pub error: E,
    pub source_span: Option<Span>,
    ///All labels that might be attached to the error.
    pub labels: SmallVec<[Label<Span>; 4]>,
    ///Captured if `SYLVA_BACKTRACE` is set.
    pub backtrace: Option<Backtrace>,
}

impl<E: Error> SylvaError<E> {
    pub fn new(error: E) -> Self {
        SylvaError {
            error,
            source_span: None,
            labels: SmallVec::new(),
            backtrace: capture_backtrace(),
        }
    }

    ///Creates an error that reports `message` at the given `span`.
    pub fn error_here(error: E, span: Span, message: impl ToString) -> Self {
        Self {
            error,
            source_span: Some(span.clone()),
            labels: smallvec![Label::new(span).with_message(message)],
            backtrace: capture_backtrace(),
        }
    }

    ///Reports the full error, using `source` as the content of the span's file.
    pub fn report(&self, source: &str) {
        let span = self.source_span.clone().unwrap_or_else(Span::empty);
        let file = span.file.clone();
        let reporter = error_reporter(self.error.to_string(), span).with_labels(self.labels.clone());
        report(reporter.finish(), &file, source);
        if let Some(bt) = &self.backtrace {
            eprintln!("{bt:?}");
        }
    }
}

fn capture_backtrace() -> Option<Backtrace> {
    if std::env::var("SYLVA_BACKTRACE").is_ok() {
        Some(Backtrace::new())
    } else {
        None
    }
}

impl<E: Error> Debug for SylvaError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(src_span) = &self.source_span {
            if let Some(file) = src_span.get_file() {
                write!(
                    f,
                    "{} [{}:{}..{}:{}]: {}",
                    file,
                    src_span.from.0,
                    src_span.from.1,
                    src_span.to.0,
                    src_span.to.1,
                    self.error
                )
            } else {
                write!(
                    f,
                    "[{}:{}..{}:{}]: {}",
                    src_span.from.0, src_span.from.1, src_span.to.0, src_span.to.1, self.error
                )
            }
        } else {
            write!(f, "{}", self.error)
        }
    }
}

impl<E: Error> std::fmt::Display for SylvaError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl<E: Error> Error for SylvaError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.error.source()
    }
}

impl<E: Diagnostic> Diagnostic for SylvaError<E> {
    fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    fn details(&self) -> Details {
        let mut details = self.error.details();
        if let Some(span) = &self.source_span {
            let pos = span.position();
            details
                .entry("line")
                .or_insert_with(|| pos.line.into());
            details
                .entry("column")
                .or_insert_with(|| pos.column.into());
            details
                .entry("offset")
                .or_insert_with(|| pos.offset.into());
            if let Some(file) = span.get_file() {
                details
                    .entry("filename")
                    .or_insert_with(|| file.to_owned().into());
            }
        }
        details
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("unexpected token")]
    struct Unexpected;

    impl Diagnostic for Unexpected {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Parse
        }
    }

    #[test]
    fn span_details_are_attached() {
        let span = Span {
            file: "input.py".to_owned(),
            from: (2, 4),
            to: (2, 7),
            byte_start: 20,
            byte_end: 23,
        };
        let err = SylvaError::error_here(Unexpected, span, "here");
        let details = err.details();
        assert_eq!(details["line"], 3);
        assert_eq!(details["column"], 4);
        assert_eq!(details["offset"], 20);
        assert_eq!(details["filename"], "input.py");
        assert_eq!(format!("{err:?}"), "input.py [2:4..2:7]: unexpected token");
    }
}
