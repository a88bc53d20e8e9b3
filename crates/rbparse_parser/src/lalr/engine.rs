//! The table-driven shift/reduce loop.

use super::grammar::{SymbolId, END, ERROR};
use super::tables::ParseTables;

/// Values of the right-hand side of the production being reduced,
/// leftmost first.
pub struct Rhs<'v, V> {
    values: &'v mut [V],
}

impl<'v, V: Default> Rhs<'v, V> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Move value `i` out, leaving a default behind.
    pub fn take(&mut self, i: usize) -> V {
        std::mem::take(&mut self.values[i])
    }

    pub fn get(&self, i: usize) -> &V {
        &self.values[i]
    }
}

/// Supplies tokens and semantic actions to an [`Engine`].
pub trait Driver {
    type Value: Default;
    type Error;

    /// The next terminal and its value. End of input is terminal 0.
    fn next_token(&mut self) -> Result<(SymbolId, Self::Value), Self::Error>;

    /// Run the action of `production` and produce the value of its
    /// left-hand side.
    fn reduce(&mut self, production: u32, rhs: Rhs<'_, Self::Value>) -> Result<Self::Value, Self::Error>;

    /// A token had no action. Returning an error stops the parse;
    /// returning `Ok` lets recovery through `error` productions begin.
    fn syntax_error(&mut self, expected: &[SymbolId], found: SymbolId) -> Result<(), Self::Error>;

    /// The error the parse fails with once recovery is exhausted.
    fn irrecoverable(&mut self, found: SymbolId) -> Self::Error;
}

/// Parallel state and value stacks over a set of tables.
pub struct Engine<'t, V> {
    tables: &'t ParseTables,
    states: Vec<u32>,
    values: Vec<V>,
    /// Tokens still to shift before new errors are reported.
    error_flag: u8,
}

impl<'t, V: Default> Engine<'t, V> {
    pub fn new(tables: &'t ParseTables) -> Self {
        Self {
            tables,
            states: Vec::with_capacity(256),
            values: Vec::with_capacity(256),
            error_flag: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.states.len()
    }

    fn push(&mut self, state: u32, value: V) {
        self.states.push(state);
        self.values.push(value);
        debug_assert_eq!(self.states.len(), self.values.len());
    }

    fn top(&self) -> u32 {
        self.states.last().copied().unwrap_or(0)
    }

    pub fn parse<D>(&mut self, driver: &mut D) -> Result<V, D::Error>
    where
        D: Driver<Value = V>,
    {
        self.states.clear();
        self.values.clear();
        self.error_flag = 0;
        self.push(0, V::default());

        let mut lookahead: Option<(SymbolId, V)> = None;
        loop {
            let state = self.top();

            if let Some(production) = self.tables.default_reduction(state) {
                self.reduce(driver, production)?;
                continue;
            }

            let token = match &lookahead {
                Some((token, _)) => *token,
                None => {
                    let next = driver.next_token()?;
                    log::trace!("state {state}: read {}", self.tables.symbol_name(next.0));
                    let token = next.0;
                    lookahead = Some(next);
                    token
                }
            };

            if state == self.tables.final_state && token == END {
                log::trace!("accept");
                return Ok(self.values.pop().unwrap_or_default());
            }

            if let Some(target) = self.tables.shift(state, token) {
                log::trace!("state {state}: shift {} to {target}", self.tables.symbol_name(token));
                let value = lookahead.take().map(|(_, v)| v).unwrap_or_default();
                self.push(target, value);
                self.error_flag = self.error_flag.saturating_sub(1);
                continue;
            }

            if let Some(production) = self.tables.reduce(state, token) {
                self.reduce(driver, production)?;
                continue;
            }

            // No action for this token.
            if self.error_flag == 0 {
                let expected = self.tables.expected(state);
                driver.syntax_error(&expected, token)?;
            }
            if self.error_flag < 3 {
                self.error_flag = 3;
                loop {
                    let state = self.top();
                    if let Some(target) = self.tables.shift(state, ERROR) {
                        log::trace!("state {state}: recover, shift error to {target}");
                        self.push(target, V::default());
                        break;
                    }
                    if self.states.len() <= 1 {
                        return Err(driver.irrecoverable(token));
                    }
                    log::trace!("state {state}: recover, pop");
                    self.states.pop();
                    self.values.pop();
                }
            } else {
                if token == END {
                    return Err(driver.irrecoverable(token));
                }
                log::trace!("discard {}", self.tables.symbol_name(token));
                lookahead = None;
            }
        }
    }

    fn reduce<D>(&mut self, driver: &mut D, production: u32) -> Result<(), D::Error>
    where
        D: Driver<Value = V>,
    {
        let len = self.tables.len[production as usize] as usize;
        // The bottom state is never popped by a reduction.
        let Some(base) = self.states.len().checked_sub(len).filter(|b| *b > 0) else {
            return Err(driver.irrecoverable(END));
        };
        let value = driver.reduce(production, Rhs { values: &mut self.values[base..] })?;
        self.states.truncate(base);
        self.values.truncate(base);

        let nt = self.tables.lhs[production as usize];
        let target = self.tables.goto(self.top(), nt);
        log::trace!(
            "reduce {} ({production}), goto {target}",
            self.tables.lhs_name(production)
        );
        self.push(target, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lalr::grammar::{Grammar, GrammarBuilder};

    // ========================================================================
    // A calculator over a fixed token list
    // ========================================================================

    const TERMINALS: &[&str] = &[
        "$end", "error", "tNUM", "'+'", "'-'", "'*'", "'^'", "'('", "')'", "';'", "tUMINUS",
    ];

    fn calculator() -> Grammar {
        GrammarBuilder::new(TERMINALS.iter().copied())
            .left(&["'+'", "'-'"])
            .left(&["'*'"])
            .right(&["'^'"])
            .nonassoc(&["tUMINUS"])
            .rules(
                "list: stmt                  => First
                     | list ';' stmt          => Append
                 stmt: e                     => Stmt
                     | error                  => Recovered
                 e: e '+' e                  => Add
                  | e '-' e                  => Sub
                  | e '*' e                  => Mul
                  | e '^' e                  => Pow
                  | '-' e %prec tUMINUS      => Neg
                  | '(' e ')'                => Paren
                  | tNUM",
            )
            .build()
            .unwrap()
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    enum Val {
        #[default]
        None,
        Num(i64),
        List(Vec<Option<i64>>),
    }

    impl Val {
        fn num(&self) -> i64 {
            match self {
                Val::Num(n) => *n,
                _ => 0,
            }
        }
    }

    struct Calc<'g> {
        grammar: &'g Grammar,
        tokens: Vec<(SymbolId, Val)>,
        pos: usize,
        errors: Vec<String>,
        stop_at_first: bool,
    }

    impl<'g> Calc<'g> {
        fn new(grammar: &'g Grammar, source: &str) -> Self {
            let sym = |name: &str| grammar.symbol(name).unwrap();
            let tokens = source
                .split_whitespace()
                .map(|word| match word.parse::<i64>() {
                    Ok(n) => (sym("tNUM"), Val::Num(n)),
                    Err(_) => (sym(&format!("'{word}'")), Val::None),
                })
                .collect();
            Self {
                grammar,
                tokens,
                pos: 0,
                errors: Vec::new(),
                stop_at_first: false,
            }
        }
    }

    impl Driver for Calc<'_> {
        type Value = Val;
        type Error = String;

        fn next_token(&mut self) -> Result<(SymbolId, Val), String> {
            let token = self.tokens.get(self.pos).cloned().unwrap_or((END, Val::None));
            self.pos += 1;
            Ok(token)
        }

        fn reduce(&mut self, production: u32, mut rhs: Rhs<'_, Val>) -> Result<Val, String> {
            let action = self.grammar.production(production).action.as_deref();
            Ok(match action {
                Some("First") => match rhs.take(0) {
                    Val::List(items) => Val::List(items),
                    _ => Val::List(Vec::new()),
                },
                Some("Append") => {
                    let mut list = match rhs.take(0) {
                        Val::List(items) => items,
                        _ => Vec::new(),
                    };
                    if let Val::List(mut more) = rhs.take(2) {
                        list.append(&mut more);
                    }
                    Val::List(list)
                }
                Some("Stmt") => Val::List(vec![Some(rhs.get(0).num())]),
                Some("Recovered") => Val::List(vec![None]),
                Some("Add") => Val::Num(rhs.get(0).num() + rhs.get(2).num()),
                Some("Sub") => Val::Num(rhs.get(0).num() - rhs.get(2).num()),
                Some("Mul") => Val::Num(rhs.get(0).num() * rhs.get(2).num()),
                Some("Pow") => Val::Num(rhs.get(0).num().pow(rhs.get(2).num() as u32)),
                Some("Neg") => Val::Num(-rhs.get(1).num()),
                Some("Paren") => rhs.take(1),
                _ if rhs.is_empty() => Val::None,
                _ => rhs.take(0),
            })
        }

        fn syntax_error(&mut self, _expected: &[SymbolId], found: SymbolId) -> Result<(), String> {
            let message = format!("unexpected {}", self.grammar.name(found));
            self.errors.push(message.clone());
            if self.stop_at_first {
                Err(message)
            } else {
                Ok(())
            }
        }

        fn irrecoverable(&mut self, found: SymbolId) -> String {
            format!("cannot recover at {}", self.grammar.name(found))
        }
    }

    fn eval(source: &str) -> Vec<Option<i64>> {
        let grammar = calculator();
        let tables = ParseTables::build(&grammar);
        let mut calc = Calc::new(&grammar, source);
        match Engine::new(&tables).parse(&mut calc) {
            Ok(Val::List(items)) => items,
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(eval("1 + 2 * 3"), vec![Some(7)]);
        assert_eq!(eval("10 - 4 - 3"), vec![Some(3)]);
        assert_eq!(eval("2 ^ 3 ^ 2"), vec![Some(512)]);
        assert_eq!(eval("- 2 ^ 2"), vec![Some(4)]);
        assert_eq!(eval("( 1 + 2 ) * 3"), vec![Some(9)]);
    }

    #[test]
    fn test_precedence_resolves_every_conflict() {
        let tables = ParseTables::build(&calculator());
        assert_eq!(tables.stats.shift_reduce, 0);
        assert_eq!(tables.stats.reduce_reduce, 0);
    }

    #[test]
    fn test_error_production_resynchronizes() {
        assert_eq!(eval("1 + ; 2 * 2 ; 3"), vec![None, Some(4), Some(3)]);
    }

    #[test]
    fn test_stop_at_first_error() {
        let grammar = calculator();
        let tables = ParseTables::build(&grammar);
        let mut calc = Calc::new(&grammar, "1 + + 2 ; 3 3");
        calc.stop_at_first = true;
        let result = Engine::new(&tables).parse(&mut calc);
        assert_eq!(result, Err("unexpected '+'".to_string()));
        assert_eq!(calc.errors.len(), 1);
    }

    #[test]
    fn test_expected_terminals() {
        let grammar = calculator();
        let tables = ParseTables::build(&grammar);
        let expected: Vec<&str> = tables.expected(0).iter().map(|t| grammar.name(*t)).collect();
        assert_eq!(expected, vec!["tNUM", "'-'", "'('"]);
    }

    #[test]
    fn test_dangling_else_prefers_shift() {
        let grammar = GrammarBuilder::new(["$end", "error", "kIF", "kELSE", "tX"])
            .rules(
                "s: kIF s           => If
                  | kIF s kELSE s    => IfElse
                  | tX",
            )
            .build()
            .unwrap();
        let tables = ParseTables::build(&grammar);
        assert_eq!(tables.stats.shift_reduce, 1);

        struct Tokens(Vec<SymbolId>, Vec<String>);
        impl Driver for Tokens {
            type Value = String;
            type Error = String;
            fn next_token(&mut self) -> Result<(SymbolId, String), String> {
                Ok((if self.0.is_empty() { END } else { self.0.remove(0) }, String::new()))
            }
            fn reduce(&mut self, production: u32, mut rhs: Rhs<'_, String>) -> Result<String, String> {
                Ok(match production {
                    1 => format!("(if {})", rhs.take(1)),
                    2 => format!("(if {} else {})", rhs.take(1), rhs.take(3)),
                    _ => {
                        self.1.push("x".into());
                        "x".to_string()
                    }
                })
            }
            fn syntax_error(&mut self, _: &[SymbolId], _: SymbolId) -> Result<(), String> {
                Err("syntax error".into())
            }
            fn irrecoverable(&mut self, _: SymbolId) -> String {
                "irrecoverable".into()
            }
        }

        let (kif, kelse, x) = (2, 3, 4);
        let mut tokens = Tokens(vec![kif, kif, x, kelse, x], Vec::new());
        let tree = Engine::new(&tables).parse(&mut tokens).unwrap();
        assert_eq!(tree, "(if (if x else x))");
    }

    #[test]
    fn test_mid_rule_action_runs_before_rest() {
        let grammar = GrammarBuilder::new(["$end", "error", "tA", "tB"])
            .rules("s: tA @Mark tB => Done")
            .build()
            .unwrap();
        let tables = ParseTables::build(&grammar);

        struct Order<'g>(&'g Grammar, Vec<SymbolId>, Vec<String>);
        impl Driver for Order<'_> {
            type Value = u8;
            type Error = ();
            fn next_token(&mut self) -> Result<(SymbolId, u8), ()> {
                let token = if self.1.is_empty() { END } else { self.1.remove(0) };
                self.2.push(format!("read {}", self.0.name(token)));
                Ok((token, 0))
            }
            fn reduce(&mut self, production: u32, rhs: Rhs<'_, u8>) -> Result<u8, ()> {
                let action = self.0.production(production).action.clone().unwrap_or_default();
                self.2.push(format!("{action}/{}", rhs.len()));
                Ok(1)
            }
            fn syntax_error(&mut self, _: &[SymbolId], _: SymbolId) -> Result<(), ()> {
                Err(())
            }
            fn irrecoverable(&mut self, _: SymbolId) {}
        }

        let mut driver = Order(&grammar, vec![2, 3], Vec::new());
        Engine::new(&tables).parse(&mut driver).unwrap();
        assert_eq!(driver.2, vec!["read tA", "Mark/0", "read tB", "Done/3", "read $end"]);
    }
}
