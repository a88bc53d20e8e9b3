//! Packed parse tables.
//!
//! Shift, reduce and goto rows are overlaid in one `table`/`check` pair.
//! A row with base `b` maps key `k` to `table[b + k]` when
//! `check[b + k] == k`; a base of zero means the row is empty. Keys are
//! terminals for action rows and states for goto rows.

use super::grammar::{Assoc, Grammar, SymbolId, END, ERROR};
use super::states::Automaton;
use rustc_hash::{FxHashMap, FxHashSet};

/// Generator statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableStats {
    pub states: usize,
    pub productions: usize,
    /// Shift/reduce conflicts resolved in favour of the shift.
    pub shift_reduce: usize,
    /// Reduce/reduce conflicts resolved in favour of the earlier production.
    pub reduce_reduce: usize,
    /// Length of the packed table.
    pub table_size: usize,
}

#[derive(Debug, Clone)]
pub struct ParseTables {
    /// Production to reduce without looking at the next token, or 0.
    pub defred: Vec<u32>,
    pub sindex: Vec<i32>,
    pub rindex: Vec<i32>,
    pub gindex: Vec<i32>,
    /// Goto target used when a goto row has no entry for a state.
    pub dgoto: Vec<u32>,
    pub table: Vec<u32>,
    pub check: Vec<i32>,
    /// Right-hand side length of each production.
    pub len: Vec<u16>,
    /// Nonterminal number (symbol minus terminal count) of each left-hand side.
    pub lhs: Vec<u16>,
    /// State reached from state 0 on the start symbol.
    pub final_state: u32,
    pub terminal_count: usize,
    names: Vec<String>,
    pub stats: TableStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Shift(u32),
    Reduce(u32),
    Error,
}

type Row = Vec<(u32, u32)>;

impl ParseTables {
    pub fn build(grammar: &Grammar) -> Self {
        let automaton = Automaton::build(grammar);
        let terminals = grammar.terminal_count();
        let mut stats = TableStats {
            states: automaton.len(),
            productions: grammar.productions().len(),
            ..TableStats::default()
        };

        let mut defred = vec![0u32; automaton.len()];
        let mut shift_rows: Vec<Row> = Vec::with_capacity(automaton.len());
        let mut reduce_rows: Vec<Row> = Vec::with_capacity(automaton.len());
        let mut goto_columns: Vec<Row> = vec![Vec::new(); grammar.nonterminal_count()];

        for (s, state) in automaton.states.iter().enumerate() {
            let mut actions: Vec<Option<Action>> = vec![None; terminals];
            for &(sym, target) in &state.transitions {
                if grammar.is_terminal(sym) {
                    actions[sym as usize] = Some(Action::Shift(target));
                } else {
                    goto_columns[sym as usize - terminals].push((s as u32, target));
                }
            }
            for (prod, lookahead) in &state.reductions {
                if *prod == 0 {
                    continue;
                }
                for t in lookahead.iter() {
                    actions[t] = Some(resolve(grammar, actions[t], *prod, t as SymbolId, &mut stats));
                }
            }

            defred[s] = sole_reduction(&actions);
            let mut shifts = Row::new();
            let mut reduces = Row::new();
            for (t, action) in actions.iter().enumerate() {
                match action {
                    Some(Action::Shift(target)) => shifts.push((t as u32, *target)),
                    Some(Action::Reduce(p)) if *p != defred[s] => reduces.push((t as u32, *p)),
                    _ => {}
                }
            }
            shift_rows.push(shifts);
            reduce_rows.push(reduces);
        }

        let mut dgoto = vec![0u32; goto_columns.len()];
        for (nt, column) in goto_columns.iter_mut().enumerate() {
            let mut counts: FxHashMap<u32, usize> = FxHashMap::default();
            for (_, target) in column.iter() {
                *counts.entry(*target).or_default() += 1;
            }
            // Most frequent target, lowest state number on ties.
            if let Some((&default, _)) = counts
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            {
                dgoto[nt] = default;
                column.retain(|(_, target)| *target != default);
            }
        }

        let mut packer = Packer::default();
        let mut rows: Vec<(usize, &Row)> = Vec::new();
        rows.extend(shift_rows.iter().enumerate().map(|(i, r)| (i, r)));
        rows.extend(reduce_rows.iter().enumerate().map(|(i, r)| (shift_rows.len() + i, r)));
        let goto_offset = shift_rows.len() + reduce_rows.len();
        rows.extend(goto_columns.iter().enumerate().map(|(i, r)| (goto_offset + i, r)));
        rows.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(&b.0)));

        let mut bases = vec![0i32; goto_offset + goto_columns.len()];
        for (slot, row) in rows {
            if !row.is_empty() {
                bases[slot] = packer.place(row);
            }
        }
        let gindex = bases.split_off(goto_offset);
        let rindex = bases.split_off(shift_rows.len());
        let sindex = bases;

        let (len, lhs) = grammar
            .productions()
            .iter()
            .map(|p| (p.rhs.len() as u16, (p.lhs as usize - terminals) as u16))
            .unzip();

        let final_state = automaton
            .goto(0, grammar.start())
            .unwrap_or_default();

        stats.table_size = packer.table.len();
        log::debug!(
            "tables: {} states, {} shift/reduce, {} reduce/reduce, table size {}",
            stats.states,
            stats.shift_reduce,
            stats.reduce_reduce,
            stats.table_size
        );

        Self {
            defred,
            sindex,
            rindex,
            gindex,
            dgoto,
            table: packer.table,
            check: packer.check,
            len,
            lhs,
            final_state,
            terminal_count: terminals,
            names: grammar.names().to_vec(),
            stats,
        }
    }

    #[inline]
    fn probe(&self, base: i32, key: u32) -> Option<u32> {
        if base == 0 {
            return None;
        }
        let at = base as usize + key as usize;
        match self.check.get(at) {
            Some(&k) if k == key as i32 => Some(self.table[at]),
            _ => None,
        }
    }

    #[inline]
    pub fn default_reduction(&self, state: u32) -> Option<u32> {
        match self.defred[state as usize] {
            0 => None,
            p => Some(p),
        }
    }

    #[inline]
    pub fn shift(&self, state: u32, terminal: SymbolId) -> Option<u32> {
        self.probe(self.sindex[state as usize], terminal)
    }

    #[inline]
    pub fn reduce(&self, state: u32, terminal: SymbolId) -> Option<u32> {
        self.probe(self.rindex[state as usize], terminal)
    }

    /// State entered after reducing to nonterminal number `nt` on top of `state`.
    #[inline]
    pub fn goto(&self, state: u32, nt: u16) -> u32 {
        self.probe(self.gindex[nt as usize], state)
            .unwrap_or(self.dgoto[nt as usize])
    }

    /// Terminals with an action in `state`, excluding `error`.
    pub fn expected(&self, state: u32) -> Vec<SymbolId> {
        (0..self.terminal_count as SymbolId)
            .filter(|&t| t != ERROR)
            .filter(|&t| {
                self.shift(state, t).is_some()
                    || self.reduce(state, t).is_some()
                    || (t == END && state == self.final_state)
            })
            .collect()
    }

    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        self.names.get(symbol as usize).map(String::as_str).unwrap_or("?")
    }

    /// Name of the left-hand side of `production`.
    pub fn lhs_name(&self, production: u32) -> &str {
        let nt = self.lhs[production as usize] as usize;
        self.symbol_name((self.terminal_count + nt) as SymbolId)
    }
}

/// Choose between the action already recorded for `terminal` and a
/// reduction by `prod`.
fn resolve(
    grammar: &Grammar,
    current: Option<Action>,
    prod: u32,
    terminal: SymbolId,
    stats: &mut TableStats,
) -> Action {
    match current {
        None => Action::Reduce(prod),
        Some(Action::Reduce(earlier)) => {
            stats.reduce_reduce += 1;
            log::trace!("reduce/reduce on {}: {} over {}", grammar.name(terminal), earlier, prod);
            Action::Reduce(earlier)
        }
        Some(Action::Shift(target)) => {
            let rule = grammar.production(prod).precedence;
            let token = grammar.terminal_precedence(terminal);
            match (rule, token) {
                (Some(rule), Some(token)) if token.level > rule.level => Action::Shift(target),
                (Some(rule), Some(token)) if token.level < rule.level => Action::Reduce(prod),
                (Some(rule), Some(_)) => match rule.assoc {
                    Assoc::Left => Action::Reduce(prod),
                    Assoc::Right => Action::Shift(target),
                    Assoc::NonAssoc => Action::Error,
                },
                _ => {
                    stats.shift_reduce += 1;
                    log::trace!(
                        "shift/reduce on {}: shift over production {}",
                        grammar.name(terminal),
                        prod
                    );
                    Action::Shift(target)
                }
            }
        }
        Some(Action::Error) => Action::Error,
    }
}

/// The production a state may reduce without consulting the lookahead:
/// no shifts, a single production, and at least one real terminal.
fn sole_reduction(actions: &[Option<Action>]) -> u32 {
    let mut rule = 0;
    let mut count = 0;
    for (t, action) in actions.iter().enumerate() {
        match action {
            Some(Action::Shift(_)) => return 0,
            Some(Action::Reduce(p)) => {
                if rule != 0 && *p != rule {
                    return 0;
                }
                rule = *p;
                if t as SymbolId != ERROR {
                    count += 1;
                }
            }
            _ => {}
        }
    }
    if count == 0 {
        0
    } else {
        rule
    }
}

#[derive(Default)]
struct Packer {
    table: Vec<u32>,
    check: Vec<i32>,
    used: FxHashSet<i32>,
    placed: FxHashMap<Row, i32>,
    lowest_free: usize,
}

impl Packer {
    fn is_free(&self, at: usize) -> bool {
        self.check.get(at).map_or(true, |k| *k < 0)
    }

    fn place(&mut self, row: &Row) -> i32 {
        if let Some(&base) = self.placed.get(row) {
            return base;
        }
        let first = row[0].0 as i64;
        let mut base = (self.lowest_free as i64 - first).max(1);
        loop {
            if !self.used.contains(&(base as i32))
                && row.iter().all(|(k, _)| self.is_free(base as usize + *k as usize))
            {
                break;
            }
            base += 1;
        }
        for &(key, value) in row {
            let at = base as usize + key as usize;
            if at >= self.check.len() {
                self.check.resize(at + 1, -1);
                self.table.resize(at + 1, 0);
            }
            self.check[at] = key as i32;
            self.table[at] = value;
        }
        self.used.insert(base as i32);
        self.placed.insert(row.clone(), base as i32);
        while !self.is_free(self.lowest_free) || self.lowest_free == 0 {
            self.lowest_free += 1;
        }
        base as i32
    }
}
