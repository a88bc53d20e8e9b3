//! The parser entry point: lexer, tables and actions wired together.

use crate::config::ParserConfiguration;
use crate::lalr::{Driver, Engine, Rhs, SymbolId};
use crate::result::ParseResult;
use crate::rules::RubyTables;
use crate::support::ParserSupport;
use crate::value::Value;
use rbparse_ast::{NodeKind, NodeRef};
use rbparse_core::text::SourceSpan;
use rbparse_core::{ParserArena, StringInterner};
use rbparse_diagnostics::{messages, ProblemId, SyntaxError, WarningSink};
use rbparse_lexer::Lexer;
use rbparse_scope::ScopeTable;
use std::sync::Mutex;

/// Feeds one source through the engine.
pub(crate) struct RubyDriver<'a, 's> {
    pub(crate) lexer: Lexer<'s>,
    pub(crate) support: ParserSupport<'a, 's>,
    tables: &'static RubyTables,
    /// First error reported while recovering.
    first_error: Option<SyntaxError>,
    last_span: SourceSpan,
}

impl<'a, 's> RubyDriver<'a, 's> {
    fn drain_lexer_warnings(&mut self) {
        for warning in self.lexer.take_warnings() {
            let args: Vec<&str> = warning.args.iter().map(String::as_str).collect();
            if warning.verbose_only {
                self.support.warning(warning.span, warning.message, &args);
            } else {
                self.support.warn(warning.span, warning.message, &args);
            }
        }
    }

    fn symbol_name(&self, symbol: SymbolId) -> String {
        self.tables.tables.symbol_name(symbol).to_string()
    }
}

impl<'a, 's> Driver for RubyDriver<'a, 's> {
    type Value = Value<'a>;
    type Error = SyntaxError;

    fn next_token(&mut self) -> Result<(SymbolId, Value<'a>), SyntaxError> {
        let support = &self.support;
        let result = self.lexer.next_token(&|name| support.is_local(name));
        self.drain_lexer_warnings();
        match result {
            Ok(token) => {
                self.last_span = token.span;
                Ok((token.kind.index() as SymbolId, Value::Token(token)))
            }
            Err(err) => Err(SyntaxError::new(ProblemId::Lexical, self.support.file(), err.span, err.message)),
        }
    }

    fn reduce(&mut self, production: u32, rhs: Rhs<'_, Value<'a>>) -> Result<Value<'a>, SyntaxError> {
        let act = self.tables.action(production);
        self.run_action(act, rhs)
    }

    fn syntax_error(&mut self, expected: &[SymbolId], found: SymbolId) -> Result<(), SyntaxError> {
        let found = self.symbol_name(found);
        let expected: Vec<String> = expected.iter().map(|&t| self.symbol_name(t)).collect();
        let error = if (1..=4).contains(&expected.len()) {
            let alternatives = expected.join(" or ");
            self.support.error(
                ProblemId::Syntax,
                self.last_span,
                &messages::SYNTAX_ERROR_UNEXPECTED_EXPECTING,
                &[&found, &alternatives],
            )
        } else {
            self.support
                .error(ProblemId::Syntax, self.last_span, &messages::SYNTAX_ERROR_UNEXPECTED, &[&found])
        }
        .with_tokens(expected, Some(found));

        if !self.support.config().recover_errors {
            return Err(error);
        }
        log::debug!("recovering after: {}", error.message);
        self.support.report(&error);
        self.first_error.get_or_insert(error);
        Ok(())
    }

    fn irrecoverable(&mut self, found: SymbolId) -> SyntaxError {
        if let Some(first) = self.first_error.take() {
            return first;
        }
        log::debug!("irrecoverable at {}", self.symbol_name(found));
        self.support.error(
            ProblemId::Irrecoverable,
            self.last_span,
            &messages::IRRECOVERABLE_SYNTAX_ERROR,
            &[],
        )
    }
}

/// A reusable Ruby parser.
///
/// One parse runs at a time; call [`RubyParser::reset`] (or go through a
/// [`ParserPool`]) before handing an instance to other code.
#[derive(Debug, Default)]
pub struct RubyParser {
    interner: StringInterner,
    scopes: ScopeTable,
}

impl RubyParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser sharing file-name interning with others.
    pub fn with_interner(interner: StringInterner) -> Self {
        Self {
            interner,
            scopes: ScopeTable::new(),
        }
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    /// Drop all state a previous parse left behind.
    pub fn reset(&mut self) {
        self.scopes.clear();
    }

    /// Parse `source`, allocating the tree in `arena`.
    pub fn parse<'a>(
        &mut self,
        file: &str,
        source: &str,
        config: &ParserConfiguration,
        sink: &mut dyn WarningSink,
        arena: &'a ParserArena,
    ) -> Result<ParseResult<'a>, SyntaxError> {
        let file_id = self.interner.intern(file);
        let start = SourceSpan::empty(file_id, config.line_number, 0);
        let tables = RubyTables::get().map_err(|err| {
            SyntaxError::new(ProblemId::Irrecoverable, file, start, format!("grammar tables: {err}"))
        })?;

        self.scopes.clear();
        let root = match &config.existing_scope {
            Some(existing) => self.scopes.seed(existing),
            None => self.scopes.new_local(None),
        };
        // New top-level names land in the nearest local scope, which for an
        // eval inside a block is an outer scope of the seed chain.
        let (local, _) = self.scopes.local_scope(root);
        let seeded = self.scopes.get(local).variable_count();
        log::debug!("parsing {file} from line {}", config.line_number + 1);

        let mut driver = RubyDriver {
            lexer: Lexer::new(source, file_id, config.line_number),
            support: ParserSupport::new(arena, &mut self.scopes, root, config, file, sink),
            tables,
            first_error: None,
            last_span: start,
        };
        let value = Engine::new(&tables.tables).parse(&mut driver);
        let first_error = driver.first_error.take();
        let end_seen = driver.lexer.end_seen();
        let begin_nodes = driver.support.take_begin_nodes();
        let end_nodes = driver.support.take_end_nodes();
        drop(driver);

        let value = value?;
        if let Some(error) = first_error {
            return Err(error);
        }
        let ast = root_node(value, arena, start, root);
        Ok(ParseResult::new(
            ast,
            begin_nodes,
            end_nodes,
            std::mem::take(&mut self.scopes),
            root,
            seeded,
            end_seen,
        ))
    }
}

fn root_node<'a>(value: Value<'a>, arena: &'a ParserArena, span: SourceSpan, scope: rbparse_ast::ScopeId) -> NodeRef<'a> {
    match value {
        Value::Node(node) if matches!(node.kind, NodeKind::Root { .. }) => node,
        Value::Node(node) => arena.alloc(rbparse_ast::Node::new(node.span, NodeKind::Root { body: Some(node), scope })),
        _ => arena.alloc(rbparse_ast::Node::new(span, NodeKind::Root { body: None, scope })),
    }
}

/// Parsers ready for reuse.
#[derive(Debug, Default)]
pub struct ParserPool {
    interner: StringInterner,
    idle: Mutex<Vec<RubyParser>>,
}

impl ParserPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// An idle parser, or a new one sharing the pool's interner.
    pub fn acquire(&self) -> RubyParser {
        let idle = self.idle.lock().ok().and_then(|mut idle| idle.pop());
        idle.unwrap_or_else(|| RubyParser::with_interner(self.interner.clone()))
    }

    /// Return a parser to the pool, resetting it first.
    pub fn release(&self, mut parser: RubyParser) {
        parser.reset();
        if let Ok(mut idle) = self.idle.lock() {
            idle.push(parser);
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }
}
