//! Context-free grammars with precedence, read from a compact rule text.
//!
//! The rule text looks like
//!
//! ```text
//! expr: expr '+' expr         => Add
//!     | '-' expr %prec tUMINUS => Neg
//!     | @Enter tINTEGER       => Literal
//!     |
//! ```
//!
//! A line starting with `name:` opens the productions of `name`, `|` adds
//! another. `@Name` is a mid-rule action: it becomes a fresh nonterminal
//! with one empty production carrying the action `Name`. Quoted
//! characters are terminals whose name includes the quotes. `#` starts a
//! comment outside quotes.

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Symbols are numbered with every terminal before every nonterminal.
pub type SymbolId = u32;

/// The end-of-input terminal.
pub const END: SymbolId = 0;
/// The error pseudo-terminal used by recovery productions.
pub const ERROR: SymbolId = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    NonAssoc,
}

/// Binding strength of a terminal or production. Higher binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precedence {
    pub level: u16,
    pub assoc: Assoc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: SymbolId,
    pub rhs: Vec<SymbolId>,
    pub precedence: Option<Precedence>,
    /// Name of the semantic action, if the production has one.
    pub action: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: unknown symbol `{name}'")]
    UnknownSymbol { line: usize, name: String },

    #[error("terminal `{0}' listed twice")]
    DuplicateTerminal(String),

    #[error("start symbol `{0}' is not a nonterminal")]
    BadStart(String),

    #[error("grammar has no productions")]
    Empty,

    #[error("no semantic action named `{0}'")]
    UnknownAction(String),
}

/// An augmented grammar. Production 0 is `$accept: start`.
#[derive(Debug, Clone)]
pub struct Grammar {
    names: Vec<String>,
    terminal_count: usize,
    productions: Vec<Production>,
    by_lhs: Vec<Vec<u32>>,
    terminal_precedence: Vec<Option<Precedence>>,
    start: SymbolId,
}

impl Grammar {
    pub fn terminal_count(&self) -> usize {
        self.terminal_count
    }

    pub fn symbol_count(&self) -> usize {
        self.names.len()
    }

    pub fn nonterminal_count(&self) -> usize {
        self.names.len() - self.terminal_count
    }

    #[inline]
    pub fn is_terminal(&self, symbol: SymbolId) -> bool {
        (symbol as usize) < self.terminal_count
    }

    pub fn name(&self, symbol: SymbolId) -> &str {
        &self.names[symbol as usize]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn symbol(&self, name: &str) -> Option<SymbolId> {
        self.names.iter().position(|n| n == name).map(|i| i as SymbolId)
    }

    pub fn start(&self) -> SymbolId {
        self.start
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, index: u32) -> &Production {
        &self.productions[index as usize]
    }

    /// Productions whose left-hand side is the nonterminal `symbol`.
    pub fn productions_of(&self, symbol: SymbolId) -> &[u32] {
        &self.by_lhs[symbol as usize - self.terminal_count]
    }

    pub fn terminal_precedence(&self, terminal: SymbolId) -> Option<Precedence> {
        self.terminal_precedence[terminal as usize]
    }
}

struct Alternative {
    line: usize,
    symbols: Vec<String>,
    prec: Option<String>,
    action: Option<String>,
}

struct Rule {
    lhs: String,
    alternatives: Vec<Alternative>,
}

/// Collects terminals, precedence declarations and rules, then resolves
/// them into a [`Grammar`].
pub struct GrammarBuilder {
    terminals: Vec<String>,
    precedence: Vec<(Assoc, Vec<String>)>,
    rules: Vec<Rule>,
    start: Option<String>,
    errors: Vec<GrammarError>,
    lines: usize,
}

impl GrammarBuilder {
    /// `terminals` gives the terminal names in index order. The first two
    /// are taken as end-of-input and `error`.
    pub fn new<I, S>(terminals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terminals: terminals.into_iter().map(Into::into).collect(),
            precedence: Vec::new(),
            rules: Vec::new(),
            start: None,
            errors: Vec::new(),
            lines: 0,
        }
    }

    /// Declare a precedence level binding tighter than every earlier one.
    pub fn precedence(&mut self, assoc: Assoc, terminals: &[&str]) -> &mut Self {
        self.precedence
            .push((assoc, terminals.iter().map(|t| t.to_string()).collect()));
        self
    }

    pub fn left(&mut self, terminals: &[&str]) -> &mut Self {
        self.precedence(Assoc::Left, terminals)
    }

    pub fn right(&mut self, terminals: &[&str]) -> &mut Self {
        self.precedence(Assoc::Right, terminals)
    }

    pub fn nonassoc(&mut self, terminals: &[&str]) -> &mut Self {
        self.precedence(Assoc::NonAssoc, terminals)
    }

    /// The start symbol. Defaults to the first rule's left-hand side.
    pub fn start(&mut self, name: &str) -> &mut Self {
        self.start = Some(name.to_string());
        self
    }

    /// Add rules written in the rule text notation.
    pub fn rules(&mut self, text: &str) -> &mut Self {
        for raw in text.lines() {
            self.lines += 1;
            let line = self.lines;
            match tokenize(raw) {
                Ok(words) => self.add_line(line, words),
                Err(message) => self.errors.push(GrammarError::Syntax { line, message }),
            }
        }
        self
    }

    fn add_line(&mut self, line: usize, words: Vec<String>) {
        let mut words = words.into_iter().peekable();
        let Some(first) = words.peek().cloned() else {
            return;
        };
        if first == "|" {
            words.next();
            if self.rules.is_empty() {
                self.errors.push(GrammarError::Syntax {
                    line,
                    message: "`|' before any rule".into(),
                });
                return;
            }
        } else if let Some(lhs) = first.strip_suffix(':') {
            words.next();
            self.rules.push(Rule {
                lhs: lhs.to_string(),
                alternatives: Vec::new(),
            });
        } else {
            self.errors.push(GrammarError::Syntax {
                line,
                message: format!("expected `name:' or `|', found `{first}'"),
            });
            return;
        }

        let mut alternative = Alternative {
            line,
            symbols: Vec::new(),
            prec: None,
            action: None,
        };
        while let Some(word) = words.next() {
            match word.as_str() {
                "%prec" => alternative.prec = words.next(),
                "=>" => alternative.action = words.next(),
                _ => alternative.symbols.push(word),
            }
        }
        if let Some(rule) = self.rules.last_mut() {
            rule.alternatives.push(alternative);
        }
    }

    pub fn build(&self) -> Result<Grammar, GrammarError> {
        if let Some(error) = self.errors.first() {
            return Err(error.clone());
        }
        if self.rules.is_empty() {
            return Err(GrammarError::Empty);
        }

        let mut names: Vec<String> = Vec::with_capacity(self.terminals.len() * 2);
        let mut index: FxHashMap<String, SymbolId> = FxHashMap::default();
        for terminal in &self.terminals {
            if index.insert(terminal.clone(), names.len() as SymbolId).is_some() {
                return Err(GrammarError::DuplicateTerminal(terminal.clone()));
            }
            names.push(terminal.clone());
        }
        let terminal_count = names.len();

        let mut terminal_precedence = vec![None; terminal_count];
        for (level, (assoc, members)) in self.precedence.iter().enumerate() {
            for member in members {
                let Some(&sym) = index.get(member) else {
                    return Err(GrammarError::UnknownSymbol {
                        line: 0,
                        name: member.clone(),
                    });
                };
                terminal_precedence[sym as usize] = Some(Precedence {
                    level: level as u16 + 1,
                    assoc: *assoc,
                });
            }
        }

        // Nonterminals: $accept, then every left-hand side in order of
        // first appearance, then mid-rule actions.
        let accept = names.len() as SymbolId;
        names.push("$accept".to_string());
        for rule in &self.rules {
            if !index.contains_key(&rule.lhs) {
                index.insert(rule.lhs.clone(), names.len() as SymbolId);
                names.push(rule.lhs.clone());
            }
        }

        let start_name = self.start.clone().unwrap_or_else(|| self.rules[0].lhs.clone());
        let start = match index.get(&start_name) {
            Some(&sym) if sym as usize >= terminal_count => sym,
            _ => return Err(GrammarError::BadStart(start_name)),
        };

        let mut productions = vec![Production {
            lhs: accept,
            rhs: vec![start],
            precedence: None,
            action: None,
        }];
        let mut mid_rules = Vec::new();

        for rule in &self.rules {
            let lhs = index[&rule.lhs];
            for alt in &rule.alternatives {
                let mut rhs = Vec::with_capacity(alt.symbols.len());
                for word in &alt.symbols {
                    if let Some(action) = word.strip_prefix('@') {
                        let sym = names.len() as SymbolId;
                        names.push(format!("@{}", mid_rules.len() + 1));
                        mid_rules.push(Production {
                            lhs: sym,
                            rhs: Vec::new(),
                            precedence: None,
                            action: Some(action.to_string()),
                        });
                        rhs.push(sym);
                        continue;
                    }
                    match index.get(word) {
                        Some(&sym) => rhs.push(sym),
                        None => {
                            return Err(GrammarError::UnknownSymbol {
                                line: alt.line,
                                name: word.clone(),
                            })
                        }
                    }
                }
                let precedence = match &alt.prec {
                    Some(name) => {
                        let sym = index.get(name).copied().filter(|s| (*s as usize) < terminal_count);
                        match sym {
                            Some(sym) => terminal_precedence[sym as usize],
                            None => {
                                return Err(GrammarError::UnknownSymbol {
                                    line: alt.line,
                                    name: name.clone(),
                                })
                            }
                        }
                    }
                    None => rhs
                        .iter()
                        .rev()
                        .find(|s| (**s as usize) < terminal_count)
                        .and_then(|s| terminal_precedence[*s as usize]),
                };
                productions.push(Production {
                    lhs,
                    rhs,
                    precedence,
                    action: alt.action.clone(),
                });
            }
        }
        productions.extend(mid_rules);

        let mut by_lhs = vec![Vec::new(); names.len() - terminal_count];
        for (i, p) in productions.iter().enumerate() {
            by_lhs[p.lhs as usize - terminal_count].push(i as u32);
        }

        log::debug!(
            "grammar: {} terminals, {} nonterminals, {} productions",
            terminal_count,
            names.len() - terminal_count,
            productions.len()
        );

        Ok(Grammar {
            names,
            terminal_count,
            productions,
            by_lhs,
            terminal_precedence,
            start,
        })
    }
}

/// Split one line into words, keeping quoted characters whole.
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut chars = line.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' {
            break;
        }
        if c == '\'' {
            chars.next();
            match chars.next() {
                Some((_, '\\')) => {
                    chars.next();
                }
                Some(_) => {}
                None => return Err("unterminated character terminal".into()),
            }
            match chars.next() {
                Some((end, '\'')) => words.push(line[start..=end].to_string()),
                _ => return Err("unterminated character terminal".into()),
            }
            continue;
        }
        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() || c == '\'' || c == '#' {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        words.push(line[start..end].to_string());
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminals() -> Vec<&'static str> {
        vec!["$end", "error", "'+'", "'*'", "tNUM", "' '", "'\\n'"]
    }

    #[test]
    fn test_tokenize_quoted_terminals() {
        let words = tokenize(r"a: b ' ' '\n' '+' # trailing").unwrap();
        assert_eq!(words, vec!["a:", "b", "' '", r"'\n'", "'+'"]);
    }

    #[test]
    fn test_build_assigns_production_precedence() {
        let grammar = GrammarBuilder::new(terminals())
            .left(&["'+'"])
            .left(&["'*'"])
            .rules(
                "e: e '+' e => Add
                   | e '*' e => Mul
                   | tNUM",
            )
            .build()
            .unwrap();

        assert_eq!(grammar.productions().len(), 4);
        let add = grammar.production(1);
        let mul = grammar.production(2);
        assert_eq!(add.action.as_deref(), Some("Add"));
        assert!(add.precedence.unwrap().level < mul.precedence.unwrap().level);
        assert_eq!(grammar.production(3).action, None);
        assert_eq!(grammar.name(grammar.start()), "e");
    }

    #[test]
    fn test_mid_rule_action_becomes_empty_production() {
        let grammar = GrammarBuilder::new(terminals())
            .rules("s: tNUM @Mark tNUM => Pair")
            .build()
            .unwrap();
        let pair = grammar.production(1);
        assert_eq!(pair.rhs.len(), 3);
        let marker = grammar.productions_of(pair.rhs[1]);
        assert_eq!(marker.len(), 1);
        let empty = grammar.production(marker[0]);
        assert!(empty.rhs.is_empty());
        assert_eq!(empty.action.as_deref(), Some("Mark"));
    }

    #[test]
    fn test_unknown_symbol_is_reported() {
        let err = GrammarBuilder::new(terminals())
            .rules("s: tMISSING")
            .build()
            .unwrap_err();
        assert!(matches!(err, GrammarError::UnknownSymbol { ref name, .. } if name == "tMISSING"));
    }

    #[test]
    fn test_alternative_before_rule_is_rejected() {
        let err = GrammarBuilder::new(terminals())
            .rules("| tNUM")
            .build()
            .unwrap_err();
        assert!(matches!(err, GrammarError::Syntax { line: 1, .. }));
    }
}
