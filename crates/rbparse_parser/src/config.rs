//! Options for one parse.

use rbparse_scope::DynamicScope;

/// How a source is parsed. Immutable for the duration of a parse.
#[derive(Debug, Clone, Default)]
pub struct ParserConfiguration {
    /// Line number of the first source line, 0-based.
    pub line_number: u32,
    /// The source came from `-e` or an inline string rather than a file.
    /// Only inline sources compare integer flip-flop ends against `$.`.
    pub inline_source: bool,
    /// Parsing code for `eval`; usually paired with `existing_scope`.
    pub eval_parse: bool,
    /// Keep every newline marker, even between statements of a block.
    pub extra_position_information: bool,
    /// Variables already visible to the code, innermost scope first.
    pub existing_scope: Option<DynamicScope>,
    /// Continue after syntax errors, reporting each to the warning sink.
    /// The first error is still returned when the parse ends.
    pub recover_errors: bool,
    /// Produce verbose-only warnings even when the sink is quiet.
    pub verbose: bool,
}

impl ParserConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for an `eval` of code that sees `scope`.
    pub fn for_eval(scope: DynamicScope) -> Self {
        Self::default().with_eval_parse(true).with_existing_scope(Some(scope))
    }

    pub fn with_line_number(mut self, line: u32) -> Self {
        self.line_number = line;
        self
    }

    pub fn with_inline_source(mut self, inline: bool) -> Self {
        self.inline_source = inline;
        self
    }

    pub fn with_eval_parse(mut self, eval: bool) -> Self {
        self.eval_parse = eval;
        self
    }

    pub fn with_extra_position_information(mut self, extra: bool) -> Self {
        self.extra_position_information = extra;
        self
    }

    pub fn with_existing_scope(mut self, scope: Option<DynamicScope>) -> Self {
        self.existing_scope = scope;
        self
    }

    pub fn with_recover_errors(mut self, recover: bool) -> Self {
        self.recover_errors = recover;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let config = ParserConfiguration::new()
            .with_line_number(4)
            .with_inline_source(true)
            .with_recover_errors(true);
        assert_eq!(config.line_number, 4);
        assert!(config.inline_source);
        assert!(config.recover_errors);
        assert!(!config.eval_parse);
        assert!(config.existing_scope.is_none());
    }

    #[test]
    fn test_for_eval() {
        let config = ParserConfiguration::for_eval(DynamicScope::new_local(["a"]));
        assert!(config.eval_parse);
        assert_eq!(config.existing_scope.map(|s| s.len()), Some(1));
    }
}
