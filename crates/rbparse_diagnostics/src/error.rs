use crate::{Diagnostic, DiagnosticCategory, DiagnosticMessage};
use rbparse_core::text::SourceSpan;
use std::fmt;

/// Category of a fatal parse problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemId {
    /// Unexpected token reported by the automaton.
    Syntax,
    /// Error-recovery exhausted the stack or hit end of input.
    Irrecoverable,
    /// Malformed token from the lexer.
    Lexical,
    BadIdentifier,
    CannotChangeSelf,
    InvalidAssignment,
    DynamicConstantAssignment,
    ConstantReassignment,
    MultipleAssignmentInConditional,
    BlockArgUnexpected,
    BlockArgAndBlockGiven,
    BlockGivenToYield,
    DuplicateArgumentName,
    FormalArgument,
    BeginInMethod,
    EndInMethod,
    ClassInMethod,
    ModuleInMethod,
    SingletonLiteral,
    OddHashList,
    NthRefAlias,
    VoidValueExpression,
}

impl ProblemId {
    /// Stable lower-case name for reporting.
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemId::Syntax => "syntax",
            ProblemId::Irrecoverable => "irrecoverable",
            ProblemId::Lexical => "lexical",
            ProblemId::BadIdentifier => "bad-identifier",
            ProblemId::CannotChangeSelf => "cannot-change-self",
            ProblemId::InvalidAssignment => "invalid-assignment",
            ProblemId::DynamicConstantAssignment => "dynamic-constant-assignment",
            ProblemId::ConstantReassignment => "constant-reassignment",
            ProblemId::MultipleAssignmentInConditional => "multiple-assignment-in-conditional",
            ProblemId::BlockArgUnexpected => "block-arg-unexpected",
            ProblemId::BlockArgAndBlockGiven => "block-arg-and-block-given",
            ProblemId::BlockGivenToYield => "block-given-to-yield",
            ProblemId::DuplicateArgumentName => "duplicate-argument-name",
            ProblemId::FormalArgument => "formal-argument",
            ProblemId::BeginInMethod => "begin-in-method",
            ProblemId::EndInMethod => "end-in-method",
            ProblemId::ClassInMethod => "class-in-method",
            ProblemId::ModuleInMethod => "module-in-method",
            ProblemId::SingletonLiteral => "singleton-literal",
            ProblemId::OddHashList => "odd-hash-list",
            ProblemId::NthRefAlias => "nth-ref-alias",
            ProblemId::VoidValueExpression => "void-value-expression",
        }
    }
}

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single fatal error kind produced by a parse.
///
/// Displays as `file:line: message` with a 1-based line.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{file}:{line}: {message}")]
pub struct SyntaxError {
    /// Problem category.
    pub pid: ProblemId,
    /// Name of the source being parsed.
    pub file: String,
    /// 1-based line of the offending construct.
    pub line: u32,
    /// Exact location, when one is known.
    pub span: Option<SourceSpan>,
    /// Human-readable description.
    pub message: String,
    /// Terminal names the automaton could have shifted (syntax errors only).
    pub expected: Vec<String>,
    /// Name of the offending token (syntax errors only).
    pub found: Option<String>,
}

impl SyntaxError {
    /// Create an error at `span`.
    pub fn new(pid: ProblemId, file: &str, span: SourceSpan, message: impl Into<String>) -> Self {
        Self {
            pid,
            file: file.to_string(),
            line: span.start_line + 1,
            span: Some(span),
            message: message.into(),
            expected: Vec::new(),
            found: None,
        }
    }

    /// Create an error from a message template.
    pub fn from_message(
        pid: ProblemId,
        file: &str,
        span: SourceSpan,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self::new(pid, file, span, message.format(args))
    }

    /// Attach the expected/found token names of an automaton error.
    pub fn with_tokens(mut self, expected: Vec<String>, found: Option<String>) -> Self {
        self.expected = expected;
        self.found = found;
        self
    }

    /// This error as an error-category diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic {
            file: Some(self.file.clone()),
            span: self.span,
            message_text: self.message.clone(),
            code: 0,
            category: DiagnosticCategory::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages;
    use rbparse_core::StringInterner;

    #[test]
    fn test_syntax_error_display_uses_one_based_line() {
        let interner = StringInterner::new();
        let span = SourceSpan::new(interner.intern("foo.rb"), 4, 4, 30, 33);
        let err = SyntaxError::from_message(
            ProblemId::Syntax,
            "foo.rb",
            span,
            &messages::SYNTAX_ERROR_UNEXPECTED,
            &["kEND"],
        );
        assert_eq!(err.to_string(), "foo.rb:5: syntax error, unexpected kEND");
        assert_eq!(err.line, 5);
        assert!(err.to_diagnostic().is_error());
    }
}
