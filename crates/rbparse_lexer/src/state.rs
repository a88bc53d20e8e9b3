//! Lexer modes and the state the parser saves and restores around them.

use bitflags::bitflags;

/// What the lexer expects next; decides how ambiguous characters lex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexState {
    /// Beginning of an expression.
    Beg,
    /// After a complete expression.
    End,
    /// After a method name that may take arguments.
    Arg,
    /// After a method name in command position.
    CmdArg,
    /// After the closing paren of `foo (args)`.
    EndArg,
    /// After `return`, `break`, `next` and `rescue` modifiers.
    Mid,
    /// Expecting a method name (`def`, `alias`, `undef`, `:sym`).
    Fname,
    /// After `.` or `::`.
    Dot,
    /// After `class`.
    Class,
}

impl LexState {
    /// `Arg` or `CmdArg`.
    #[inline]
    pub fn is_arg(self) -> bool {
        matches!(self, LexState::Arg | LexState::CmdArg)
    }

    /// The state after an operator: `Arg` after a method-name context, else `Beg`.
    #[inline]
    pub fn after_operator(self) -> LexState {
        match self {
            LexState::Fname | LexState::Dot => LexState::Arg,
            _ => LexState::Beg,
        }
    }
}

/// A stack of booleans packed into the bits of a `u64`.
///
/// Used for the condition stack (`while x do`) and the command-argument
/// stack (`foo a do ... end`). Bit 0 is the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StackState(u64);

impl StackState {
    pub fn new() -> Self {
        Self(0)
    }

    /// Restore a previously saved value.
    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    /// Push `value` on top.
    pub fn push(&mut self, value: bool) {
        self.0 = (self.0 << 1) | u64::from(value);
    }

    /// Drop the top entry.
    pub fn pop(&mut self) {
        self.0 >>= 1;
    }

    /// Pop, folding the popped value into the new top.
    pub fn lexpop(&mut self) {
        self.0 = (self.0 >> 1) | (self.0 & 1);
    }

    /// Whether the top entry is set.
    pub fn is_set(self) -> bool {
        self.0 & 1 == 1
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

bitflags! {
    /// How the body of a string-like literal is scanned.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StrFunc: u8 {
        /// Keep backslashes before escapes (regexps).
        const ESCAPE = 0x01;
        /// Process escapes and interpolation.
        const EXPAND = 0x02;
        const REGEXP = 0x04;
        /// Whitespace separates words.
        const QWORDS = 0x08;
        const SYMBOL = 0x10;
        /// `<<-` heredoc: terminator may be indented.
        const INDENT = 0x20;

        const SQUOTE = 0;
        const DQUOTE = Self::EXPAND.bits();
        const XQUOTE = Self::EXPAND.bits();
        const REGEXP_LITERAL = Self::REGEXP.bits() | Self::ESCAPE.bits() | Self::EXPAND.bits();
        const SWORD = Self::QWORDS.bits();
        const DWORD = Self::QWORDS.bits() | Self::EXPAND.bits();
        const SSYM = Self::SYMBOL.bits();
        const DSYM = Self::SYMBOL.bits() | Self::EXPAND.bits();
    }
}

/// The string literal the lexer is currently inside.
///
/// The parser takes this out while it parses an interpolated expression and
/// puts it back afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum StrTerm {
    Literal {
        func: StrFunc,
        /// Closing delimiter.
        term: u8,
        /// Opening delimiter for bracket pairs, else 0.
        paren: u8,
        /// Unclosed nested `paren`s.
        nest: u32,
        /// A word list has emitted its final separator.
        finished: bool,
    },
    Heredoc {
        func: StrFunc,
        /// Terminator line text.
        id: String,
        /// Where lexing resumes once the body ends.
        resume_pos: usize,
        resume_line: u32,
    },
}

impl StrTerm {
    pub fn literal(func: StrFunc, term: u8, paren: u8) -> Self {
        StrTerm::Literal {
            func,
            term,
            paren,
            nest: 0,
            finished: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_push_pop() {
        let mut stack = StackState::new();
        stack.push(true);
        assert!(stack.is_set());
        stack.push(false);
        assert!(!stack.is_set());
        stack.pop();
        assert!(stack.is_set());
        stack.pop();
        assert!(!stack.is_set());
    }

    #[test]
    fn test_stack_lexpop_keeps_set_bit() {
        let mut stack = StackState::new();
        stack.push(false);
        stack.push(true);
        stack.lexpop();
        assert!(stack.is_set());
        assert_eq!(stack.bits(), 1);

        let saved = stack.bits();
        stack.push(true);
        stack = StackState::from_bits(saved);
        assert_eq!(stack.bits(), 1);
    }

    #[test]
    fn test_after_operator() {
        assert_eq!(LexState::Fname.after_operator(), LexState::Arg);
        assert_eq!(LexState::End.after_operator(), LexState::Beg);
        assert!(LexState::CmdArg.is_arg());
        assert!(!LexState::Mid.is_arg());
    }
}
