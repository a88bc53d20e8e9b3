//! rbparse_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Warnings travel through a `WarningSink` as `Diagnostic` values. Fatal
//! problems are a single error type, `SyntaxError`, tagged with a
//! `ProblemId` so callers can tell categories apart.

mod error;
mod sink;

pub use error::{ProblemId, SyntaxError};
pub use sink::{WarningSink, Warnings};

use rbparse_core::text::SourceSpan;
use std::fmt;

/// Diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Warning => write!(f, "warning"),
            DiagnosticCategory::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message template with a code and category.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    /// The diagnostic code.
    pub code: u32,
    /// The category of this diagnostic.
    pub category: DiagnosticCategory,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

impl DiagnosticMessage {
    /// The message with its placeholders filled in.
    pub fn format(&self, args: &[&str]) -> String {
        format_message(self.message, args)
    }
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The file path where this diagnostic occurred, if any.
    pub file: Option<String>,
    /// The source span where this diagnostic occurred, if any.
    pub span: Option<SourceSpan>,
    /// The resolved message.
    pub message_text: String,
    /// The diagnostic code.
    pub code: u32,
    /// The category.
    pub category: DiagnosticCategory,
}

impl Diagnostic {
    /// Create a new diagnostic without location info.
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            file: None,
            span: None,
            message_text: message.format(args),
            code: message.code,
            category: message.category,
        }
    }

    /// Create a new diagnostic with file and span info.
    pub fn with_location(
        file: &str,
        span: SourceSpan,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            file: Some(file.to_string()),
            span: Some(span),
            message_text: message.format(args),
            code: message.code,
            category: message.category,
        }
    }

    /// Whether this is an error diagnostic.
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    /// The 1-based line of this diagnostic, if it has a location.
    pub fn line(&self) -> Option<u32> {
        self.span.map(|s| s.start_line + 1)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}", file)?;
            if let Some(line) = self.line() {
                write!(f, ":{}", line)?;
            }
            write!(f, ": ")?;
        }
        write!(f, "{}: {}", self.category, self.message_text)
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// A collection of diagnostics accumulated during a parse.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }

    /// Sort diagnostics by file and position.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            let file_cmp = a.file.cmp(&b.file);
            if file_cmp != std::cmp::Ordering::Equal {
                return file_cmp;
            }
            let a_pos = a.span.map(|s| s.start_offset).unwrap_or(0);
            let b_pos = b.span.map(|s| s.start_offset).unwrap_or(0);
            a_pos.cmp(&b_pos)
        });
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Warning, message: $msg }
        };
    }

    // ========================================================================
    // Lexer errors (1000-1099)
    // ========================================================================
    pub const UNTERMINATED_STRING: DiagnosticMessage = diag!(1000, Error, "unterminated string meets end of file");
    pub const UNTERMINATED_REGEXP: DiagnosticMessage = diag!(1001, Error, "unterminated regexp meets end of file");
    pub const UNTERMINATED_QUOTED_STRING: DiagnosticMessage = diag!(1002, Error, "unterminated quoted string meets end of file");
    pub const UNTERMINATED_HEREDOC: DiagnosticMessage = diag!(1003, Error, "can't find string \"{0}\" anywhere before EOF");
    pub const EMBEDDED_DOCUMENT_MEETS_EOF: DiagnosticMessage = diag!(1004, Error, "embedded document meets end of file");
    pub const INVALID_CHAR: DiagnosticMessage = diag!(1005, Error, "Invalid char '{0}' in expression");
    pub const NUMERIC_LITERAL_WITHOUT_DIGITS: DiagnosticMessage = diag!(1006, Error, "numeric literal without digits");
    pub const TRAILING_CHARACTER_IN_NUMBER: DiagnosticMessage = diag!(1007, Error, "trailing `{0}' in number");
    pub const ILLEGAL_OCTAL_DIGIT: DiagnosticMessage = diag!(1008, Error, "Illegal octal digit");
    pub const UNKNOWN_REGEXP_OPTIONS: DiagnosticMessage = diag!(1009, Error, "unknown regexp options - {0}");
    pub const INCOMPLETE_CHARACTER_SYNTAX: DiagnosticMessage = diag!(1010, Error, "incomplete character syntax");
    pub const UNKNOWN_PERCENT_STRING: DiagnosticMessage = diag!(1011, Error, "unknown type of %string");
    pub const IVAR_WITHOUT_IDENTIFIER: DiagnosticMessage = diag!(1012, Error, "`@' without identifiers is not allowed as an instance variable name");
    pub const CVAR_WITHOUT_IDENTIFIER: DiagnosticMessage = diag!(1013, Error, "`@@' without identifiers is not allowed as a class variable name");
    pub const INVALID_IVAR_NAME: DiagnosticMessage = diag!(1014, Error, "`{0}' is not allowed as an instance variable name");
    pub const INVALID_CVAR_NAME: DiagnosticMessage = diag!(1015, Error, "`{0}' is not allowed as a class variable name");
    pub const INVALID_ESCAPE: DiagnosticMessage = diag!(1016, Error, "Invalid escape character syntax");
    pub const UNTERMINATED_HEREDOC_IDENTIFIER: DiagnosticMessage = diag!(1017, Error, "unterminated here document identifier");
    pub const NO_DOT_DIGIT_FLOAT: DiagnosticMessage = diag!(1018, Error, "no .<digit> floating literal anymore; put 0 before dot");

    // ========================================================================
    // Parser errors (2000-2099)
    // ========================================================================
    pub const SYNTAX_ERROR_UNEXPECTED: DiagnosticMessage = diag!(2000, Error, "syntax error, unexpected {0}");
    pub const SYNTAX_ERROR_UNEXPECTED_EXPECTING: DiagnosticMessage = diag!(2001, Error, "syntax error, unexpected {0}, expecting {1}");
    pub const IRRECOVERABLE_SYNTAX_ERROR: DiagnosticMessage = diag!(2002, Error, "irrecoverable syntax error");
    pub const CANNOT_CHANGE_SELF: DiagnosticMessage = diag!(2003, Error, "Can't change the value of self");
    pub const CANNOT_ASSIGN_TO: DiagnosticMessage = diag!(2004, Error, "Can't assign to {0}");
    pub const CANNOT_SET_VARIABLE: DiagnosticMessage = diag!(2005, Error, "Can't set variable {0}");
    pub const DYNAMIC_CONSTANT_ASSIGNMENT: DiagnosticMessage = diag!(2006, Error, "dynamic constant assignment");
    pub const CONSTANT_REASSIGNMENT: DiagnosticMessage = diag!(2007, Error, "constant re-assignment");
    pub const MULTIPLE_ASSIGNMENT_IN_CONDITIONAL: DiagnosticMessage = diag!(2008, Error, "multiple assignment in conditional");
    pub const BLOCK_ARG_AND_BLOCK_GIVEN: DiagnosticMessage = diag!(2009, Error, "Both block arg and actual block given.");
    pub const BLOCK_GIVEN_TO_YIELD: DiagnosticMessage = diag!(2010, Error, "block given to yield");
    pub const BLOCK_ARG_UNEXPECTED: DiagnosticMessage = diag!(2011, Error, "block argument should not be given");
    pub const DUPLICATED_ARGUMENT_NAME: DiagnosticMessage = diag!(2012, Error, "duplicated argument name");
    pub const BEGIN_IN_METHOD: DiagnosticMessage = diag!(2013, Error, "BEGIN in method");
    pub const END_IN_METHOD: DiagnosticMessage = diag!(2014, Error, "END in method; use at_exit");
    pub const CLASS_DEFINITION_IN_METHOD: DiagnosticMessage = diag!(2015, Error, "class definition in method body");
    pub const MODULE_DEFINITION_IN_METHOD: DiagnosticMessage = diag!(2016, Error, "module definition in method body");
    pub const SINGLETON_FOR_LITERAL: DiagnosticMessage = diag!(2017, Error, "can't define singleton method for literals.");
    pub const SINGLETON_FOR_EMPTY: DiagnosticMessage = diag!(2018, Error, "can't define singleton method for ().");
    pub const ODD_NUMBER_LIST_FOR_HASH: DiagnosticMessage = diag!(2019, Error, "odd number list for Hash");
    pub const NTH_REF_ALIAS: DiagnosticMessage = diag!(2020, Error, "can't make alias for the number variables");
    pub const FORMAL_ARGUMENT_CONSTANT: DiagnosticMessage = diag!(2021, Error, "formal argument cannot be a constant");
    pub const FORMAL_ARGUMENT_IVAR: DiagnosticMessage = diag!(2022, Error, "formal argument cannot be an instance variable");
    pub const FORMAL_ARGUMENT_GVAR: DiagnosticMessage = diag!(2023, Error, "formal argument cannot be a global variable");
    pub const FORMAL_ARGUMENT_CVAR: DiagnosticMessage = diag!(2024, Error, "formal argument cannot be a class variable");
    pub const CLASS_NAME_MUST_BE_CONSTANT: DiagnosticMessage = diag!(2025, Error, "class/module name must be CONSTANT");
    pub const SUPERCLASS_EXPECTED: DiagnosticMessage = diag!(2026, Error, "superclass must be a Constant");
    pub const VOID_VALUE_EXPRESSION: DiagnosticMessage = diag!(2027, Error, "void value expression");
    pub const EMPTY_SYMBOL_LITERAL: DiagnosticMessage = diag!(2028, Error, "empty symbol literal");

    // ========================================================================
    // Warnings (3000-3099)
    // ========================================================================
    pub const USELESS_USE_IN_VOID_CONTEXT: DiagnosticMessage = diag!(3000, Warning, "Useless use of {0} in void context.");
    pub const STATEMENT_NOT_REACHED: DiagnosticMessage = diag!(3001, Warning, "Statement not reached.");
    pub const ASSIGNMENT_IN_CONDITIONAL: DiagnosticMessage = diag!(3002, Warning, "Found '=' in conditional, should be '=='.");
    pub const REGEX_LITERAL_IN_CONDITION: DiagnosticMessage = diag!(3003, Warning, "regex literal in condition");
    pub const RANGE_LITERAL_IN_CONDITION: DiagnosticMessage = diag!(3004, Warning, "range literal in condition");
    pub const STRING_LITERAL_IN_CONDITION: DiagnosticMessage = diag!(3006, Warning, "string literal in condition");
    pub const ELSE_WITHOUT_RESCUE: DiagnosticMessage = diag!(3007, Warning, "else without rescue is useless");
    pub const PARENTHESIZE_ARGUMENTS: DiagnosticMessage = diag!(3008, Warning, "parenthesize argument(s) for future version");
    pub const SPACE_BEFORE_PARENTHESES: DiagnosticMessage = diag!(3009, Warning, "don't put space before argument parentheses");
    pub const GROUPED_EXPRESSION: DiagnosticMessage = diag!(3010, Warning, "(...) interpreted as grouped expression");
    pub const AMBIGUOUS_FIRST_ARGUMENT: DiagnosticMessage = diag!(3011, Warning, "ambiguous first argument; put parentheses or even spaces");
    pub const ARGUMENT_PREFIX: DiagnosticMessage = diag!(3012, Warning, "`{0}' interpreted as argument prefix");
    pub const INVALID_CHARACTER_SYNTAX: DiagnosticMessage = diag!(3013, Warning, "invalid character syntax; use ?\\{0}");
    pub const FLOAT_OUT_OF_RANGE: DiagnosticMessage = diag!(3014, Warning, "Float {0} out of range");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbparse_core::StringInterner;

    #[test]
    fn test_format_message() {
        let msg = messages::USELESS_USE_IN_VOID_CONTEXT.format(&["a literal"]);
        assert_eq!(msg, "Useless use of a literal in void context.");
    }

    #[test]
    fn test_diagnostic_display() {
        let interner = StringInterner::new();
        let span = SourceSpan::new(interner.intern("t.rb"), 2, 2, 20, 21);
        let d = Diagnostic::with_location("t.rb", span, &messages::STATEMENT_NOT_REACHED, &[]);
        assert_eq!(d.to_string(), "t.rb:3: warning: Statement not reached.");
        assert!(!d.is_error());
    }

    #[test]
    fn test_diagnostic_collection_sort() {
        let interner = StringInterner::new();
        let f = interner.intern("x");
        let mut collection = DiagnosticCollection::new();
        collection.add(Diagnostic::with_location(
            "b.rb",
            SourceSpan::new(f, 0, 0, 10, 11),
            &messages::SYNTAX_ERROR_UNEXPECTED,
            &["kEND"],
        ));
        collection.add(Diagnostic::with_location(
            "a.rb",
            SourceSpan::new(f, 0, 0, 5, 6),
            &messages::ELSE_WITHOUT_RESCUE,
            &[],
        ));
        collection.sort();
        assert_eq!(collection.diagnostics()[0].file.as_deref(), Some("a.rb"));
        assert_eq!(collection.error_count(), 1);
        assert!(collection.has_errors());
    }
}
