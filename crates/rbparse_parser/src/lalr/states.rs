//! LR(0) item sets with LALR(1) lookaheads.
//!
//! Lookaheads are computed by spontaneous generation and propagation over
//! the LR(0) automaton, using a marker bit in place of a concrete
//! lookahead while closing each kernel item.

use super::bitset::BitSet;
use super::grammar::{Grammar, SymbolId, END};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Items are numbered densely: the item `(p, d)` is `base[p] + d`.
struct Items {
    base: Vec<u32>,
    production: Vec<u32>,
    dot: Vec<u32>,
}

impl Items {
    fn new(grammar: &Grammar) -> Self {
        let mut base = Vec::with_capacity(grammar.productions().len());
        let mut production = Vec::new();
        let mut dot = Vec::new();
        for (p, prod) in grammar.productions().iter().enumerate() {
            base.push(production.len() as u32);
            for d in 0..=prod.rhs.len() {
                production.push(p as u32);
                dot.push(d as u32);
            }
        }
        Self { base, production, dot }
    }

    fn len(&self) -> usize {
        self.production.len()
    }

    fn next_symbol(&self, grammar: &Grammar, item: u32) -> Option<SymbolId> {
        let prod = grammar.production(self.production[item as usize]);
        prod.rhs.get(self.dot[item as usize] as usize).copied()
    }
}

#[derive(Debug, Clone)]
pub struct State {
    /// Kernel item ids, sorted.
    kernel: Vec<u32>,
    /// Outgoing edges sorted by symbol.
    pub transitions: Vec<(SymbolId, u32)>,
    /// Completed productions with their lookahead terminals.
    pub reductions: Vec<(u32, BitSet)>,
}

/// The LALR(1) automaton of a grammar.
#[derive(Debug, Clone)]
pub struct Automaton {
    pub states: Vec<State>,
}

struct Builder<'g> {
    grammar: &'g Grammar,
    items: Items,
    /// FIRST of the symbols after the one following the dot, and whether
    /// they can all derive the empty string.
    tails: Vec<(BitSet, bool)>,
    /// Lookahead width: every terminal plus the propagation marker.
    width: usize,
    marker: usize,
}

impl Automaton {
    pub fn build(grammar: &Grammar) -> Self {
        let builder = Builder::new(grammar);
        let mut states = builder.lr0();
        builder.lookaheads(&mut states);
        log::debug!("automaton: {} states", states.len());
        Self { states }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Target of the edge from `state` on `symbol`.
    pub fn goto(&self, state: u32, symbol: SymbolId) -> Option<u32> {
        let edges = &self.states[state as usize].transitions;
        edges
            .binary_search_by_key(&symbol, |(s, _)| *s)
            .ok()
            .map(|i| edges[i].1)
    }
}

impl<'g> Builder<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let items = Items::new(grammar);
        let width = grammar.terminal_count() + 1;
        let (first, nullable) = first_sets(grammar, width);

        let mut tails = vec![(BitSet::new(width), false); items.len()];
        for (p, prod) in grammar.productions().iter().enumerate() {
            let mut acc = BitSet::new(width);
            let mut acc_nullable = true;
            for d in (0..prod.rhs.len()).rev() {
                tails[items.base[p] as usize + d] = (acc.clone(), acc_nullable);
                let sym = prod.rhs[d];
                if grammar.is_terminal(sym) {
                    acc = BitSet::new(width);
                    acc.insert(sym as usize);
                    acc_nullable = false;
                } else {
                    let nt = sym as usize - grammar.terminal_count();
                    let mut next = first[nt].clone();
                    if nullable[nt] {
                        next.union_with(&acc);
                    }
                    acc = next;
                    acc_nullable &= nullable[nt];
                }
            }
        }

        Self {
            grammar,
            items,
            tails,
            width,
            marker: width - 1,
        }
    }

    fn nonterminal_after_dot(&self, item: u32) -> Option<SymbolId> {
        self.items
            .next_symbol(self.grammar, item)
            .filter(|s| !self.grammar.is_terminal(*s))
    }

    fn closure(&self, kernel: &[u32]) -> Vec<u32> {
        let mut items = kernel.to_vec();
        let mut added = BitSet::new(self.grammar.nonterminal_count());
        let mut i = 0;
        while i < items.len() {
            if let Some(nt) = self.nonterminal_after_dot(items[i]) {
                if added.insert(nt as usize - self.grammar.terminal_count()) {
                    for &p in self.grammar.productions_of(nt) {
                        items.push(self.items.base[p as usize]);
                    }
                }
            }
            i += 1;
        }
        items
    }

    fn lr0(&self) -> Vec<State> {
        let mut states = vec![State {
            kernel: vec![self.items.base[0]],
            transitions: Vec::new(),
            reductions: Vec::new(),
        }];
        let mut index: FxHashMap<Vec<u32>, u32> = FxHashMap::default();
        index.insert(states[0].kernel.clone(), 0);

        let mut next = 0;
        while next < states.len() {
            let closure = self.closure(&states[next].kernel);
            let mut edges: BTreeMap<SymbolId, Vec<u32>> = BTreeMap::new();
            for &item in &closure {
                if let Some(sym) = self.items.next_symbol(self.grammar, item) {
                    edges.entry(sym).or_default().push(item + 1);
                }
            }
            let mut transitions = Vec::with_capacity(edges.len());
            for (sym, mut kernel) in edges {
                kernel.sort_unstable();
                kernel.dedup();
                let target = match index.get(&kernel) {
                    Some(&t) => t,
                    None => {
                        let t = states.len() as u32;
                        index.insert(kernel.clone(), t);
                        states.push(State {
                            kernel,
                            transitions: Vec::new(),
                            reductions: Vec::new(),
                        });
                        t
                    }
                };
                transitions.push((sym, target));
            }
            states[next].transitions = transitions;
            next += 1;
        }
        states
    }

    /// LR(1) closure of items carrying lookahead sets.
    fn closure1(&self, seeds: impl IntoIterator<Item = (u32, BitSet)>) -> FxHashMap<u32, BitSet> {
        let mut map: FxHashMap<u32, BitSet> = FxHashMap::default();
        let mut work = Vec::new();
        for (item, la) in seeds {
            map.entry(item)
                .or_insert_with(|| BitSet::new(self.width))
                .union_with(&la);
            work.push(item);
        }
        while let Some(item) = work.pop() {
            let Some(nt) = self.nonterminal_after_dot(item) else {
                continue;
            };
            let (tail, nullable) = &self.tails[item as usize];
            let mut la = tail.clone();
            if *nullable {
                if let Some(own) = map.get(&item) {
                    la.union_with(own);
                }
            }
            for &p in self.grammar.productions_of(nt) {
                let child = self.items.base[p as usize];
                let mut fresh = false;
                let entry = map.entry(child).or_insert_with(|| {
                    fresh = true;
                    BitSet::new(self.width)
                });
                if entry.union_with(&la) || fresh {
                    work.push(child);
                }
            }
        }
        map
    }

    fn lookaheads(&self, states: &mut [State]) {
        // Lookahead set of every kernel item, flattened by state.
        let mut offsets = Vec::with_capacity(states.len());
        let mut total = 0;
        for state in states.iter() {
            offsets.push(total);
            total += state.kernel.len();
        }
        let mut sets = vec![BitSet::new(self.width); total];
        let mut propagate: Vec<Vec<usize>> = vec![Vec::new(); total];
        sets[0].insert(END as usize);

        for (s, state) in states.iter().enumerate() {
            for (k, &kernel_item) in state.kernel.iter().enumerate() {
                let mut seed = BitSet::new(self.width);
                seed.insert(self.marker);
                let closure = self.closure1([(kernel_item, seed)]);
                for (item, la) in closure {
                    let Some(sym) = self.items.next_symbol(self.grammar, item) else {
                        continue;
                    };
                    let Some(target) = goto_of(&state.transitions, sym) else {
                        continue;
                    };
                    let target_kernel = &states[target as usize].kernel;
                    let Ok(ti) = target_kernel.binary_search(&(item + 1)) else {
                        continue;
                    };
                    let slot = offsets[target as usize] + ti;
                    let mut spontaneous = la.clone();
                    if spontaneous.contains(self.marker) {
                        spontaneous.remove(self.marker);
                        propagate[offsets[s] + k].push(slot);
                    }
                    sets[slot].union_with(&spontaneous);
                }
            }
        }

        let mut work: Vec<usize> = (0..total).filter(|i| !sets[*i].is_empty()).collect();
        while let Some(from) = work.pop() {
            let source = sets[from].clone();
            for &to in &propagate[from] {
                if sets[to].union_with(&source) {
                    work.push(to);
                }
            }
        }

        for (s, state) in states.iter_mut().enumerate() {
            let seeds = state
                .kernel
                .iter()
                .enumerate()
                .map(|(k, &item)| (item, sets[offsets[s] + k].clone()));
            let closure = self.closure1(seeds);
            let mut reductions: Vec<(u32, BitSet)> = closure
                .into_iter()
                .filter(|(item, _)| self.items.next_symbol(self.grammar, *item).is_none())
                .map(|(item, mut la)| {
                    la.remove(self.marker);
                    (self.items.production[item as usize], la)
                })
                .collect();
            reductions.sort_by_key(|(p, _)| *p);
            state.reductions = reductions;
        }
    }
}

fn goto_of(edges: &[(SymbolId, u32)], symbol: SymbolId) -> Option<u32> {
    edges
        .binary_search_by_key(&symbol, |(s, _)| *s)
        .ok()
        .map(|i| edges[i].1)
}

/// FIRST sets and nullability of every nonterminal.
fn first_sets(grammar: &Grammar, width: usize) -> (Vec<BitSet>, Vec<bool>) {
    let nts = grammar.nonterminal_count();
    let terminals = grammar.terminal_count();
    let mut first = vec![BitSet::new(width); nts];
    let mut nullable = vec![false; nts];
    let mut changed = true;
    while changed {
        changed = false;
        for prod in grammar.productions() {
            let lhs = prod.lhs as usize - terminals;
            let mut all_nullable = true;
            for &sym in &prod.rhs {
                if grammar.is_terminal(sym) {
                    changed |= first[lhs].insert(sym as usize);
                    all_nullable = false;
                    break;
                }
                let nt = sym as usize - terminals;
                if nt != lhs {
                    let other = first[nt].clone();
                    changed |= first[lhs].union_with(&other);
                }
                if !nullable[nt] {
                    all_nullable = false;
                    break;
                }
            }
            if all_nullable && !nullable[lhs] {
                nullable[lhs] = true;
                changed = true;
            }
        }
    }
    (first, nullable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lalr::grammar::GrammarBuilder;

    #[test]
    fn test_lalr_lookaheads_for_assignment_grammar() {
        // The classic grammar that is LALR(1) but not SLR(1).
        let grammar = GrammarBuilder::new(["$end", "error", "'='", "'*'", "tID"])
            .rules(
                "s: l '=' r
                   | r
                 l: '*' r
                   | tID
                 r: l",
            )
            .build()
            .unwrap();
        let automaton = Automaton::build(&grammar);
        let eq = grammar.symbol("'='").unwrap();
        let l = grammar.symbol("l").unwrap();

        // After `l` from the start state: shift `=` or reduce `r: l` on $end.
        let after_l = automaton.goto(0, l).unwrap();
        let state = &automaton.states[after_l as usize];
        assert!(state.transitions.iter().any(|(s, _)| *s == eq));
        let (prod, la) = &state.reductions[0];
        assert_eq!(grammar.name(grammar.production(*prod).lhs), "r");
        assert!(la.contains(END as usize));
        assert!(!la.contains(eq as usize));
    }

    #[test]
    fn test_first_sets_see_through_nullable() {
        let grammar = GrammarBuilder::new(["$end", "error", "tA", "tB"])
            .rules(
                "s: o tB
                 o:
                  | tA",
            )
            .build()
            .unwrap();
        let (first, nullable) = first_sets(&grammar, grammar.terminal_count() + 1);
        let s = grammar.symbol("s").unwrap() as usize - grammar.terminal_count();
        let o = grammar.symbol("o").unwrap() as usize - grammar.terminal_count();
        assert!(nullable[o]);
        assert!(!nullable[s]);
        assert_eq!(first[s].iter().collect::<Vec<_>>(), vec![2, 3]);
    }
}
