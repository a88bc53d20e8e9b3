use crate::{Diagnostic, DiagnosticCollection, DiagnosticMessage};
use rbparse_core::text::SourceSpan;

/// Receiver for non-fatal parse diagnostics.
pub trait WarningSink {
    /// Whether verbose-only warnings should be produced.
    fn is_verbose(&self) -> bool;

    /// Accept one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);

    /// Report a warning unconditionally.
    fn warn(&mut self, file: &str, span: SourceSpan, message: &DiagnosticMessage, args: &[&str]) {
        self.report(Diagnostic::with_location(file, span, message, args));
    }

    /// Report a warning only in verbose mode.
    fn warning(&mut self, file: &str, span: SourceSpan, message: &DiagnosticMessage, args: &[&str]) {
        if self.is_verbose() {
            self.warn(file, span, message, args);
        }
    }
}

/// A sink that keeps every diagnostic it receives.
#[derive(Debug, Clone, Default)]
pub struct Warnings {
    verbose: bool,
    collected: DiagnosticCollection,
}

impl Warnings {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            collected: DiagnosticCollection::new(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.collected.diagnostics()
    }

    pub fn into_collection(self) -> DiagnosticCollection {
        self.collected
    }

    pub fn len(&self) -> usize {
        self.collected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }

    pub fn clear(&mut self) {
        self.collected.clear();
    }
}

impl WarningSink for Warnings {
    fn is_verbose(&self) -> bool {
        self.verbose
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.collected.add(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages;
    use rbparse_core::StringInterner;

    #[test]
    fn test_verbose_only_warnings() {
        let interner = StringInterner::new();
        let span = SourceSpan::empty(interner.intern("t.rb"), 0, 0);

        let mut quiet = Warnings::new(false);
        quiet.warning("t.rb", span, &messages::STATEMENT_NOT_REACHED, &[]);
        quiet.warn("t.rb", span, &messages::ELSE_WITHOUT_RESCUE, &[]);
        assert_eq!(quiet.len(), 1);

        let mut loud = Warnings::new(true);
        loud.warning("t.rb", span, &messages::STATEMENT_NOT_REACHED, &[]);
        assert_eq!(loud.diagnostics()[0].message_text, "Statement not reached.");
    }
}
