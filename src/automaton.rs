/*!
 * Multi-pattern matcher over normalized keyword phrases.
 *
 * An Aho–Corasick automaton stored as an arena: every node lives in one
 * `Vec` and refers to its children and its failure target by index only.
 * Once built the automaton is read-only, so a single instance can be shared
 * behind an `Arc` by any number of concurrent scans.
 *
 * Pattern `i` of the automaton is rule `i` of the `RuleSet` it was built from.
 */

use std::collections::HashMap;

use crate::app_config::MatchingConfig;
use crate::keywords::RuleSet;
use crate::normalize::normalize_text;

const ROOT: usize = 0;

#[derive(Debug, Clone, Default)]
struct Node {
    children: HashMap<char, usize>,
    fail: usize,
    /// Patterns ending here, longest first: the node's own pattern followed
    /// by everything reachable through failure links.
    outputs: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct PatternInfo {
    /// Length in chars
    len: usize,
    single_word: bool,
}

/// One occurrence of a pattern in a scanned text.
///
/// Offsets are char offsets into the normalized text; `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomatonMatch {
    pub rule_index: usize,
    pub start: usize,
    pub end: usize,
}

/// Compiled keyword matcher
#[derive(Debug, Clone)]
pub struct PatternAutomaton {
    nodes: Vec<Node>,
    patterns: Vec<PatternInfo>,
}

impl PatternAutomaton {
    /// Compile a rule set. An empty rule set gives an automaton that never matches.
    pub fn build(rules: &RuleSet) -> Self {
        let mut nodes = vec![Node::default()];
        let mut patterns = Vec::with_capacity(rules.len());

        for (index, rule) in rules.rules().iter().enumerate() {
            let mut current = ROOT;
            let mut len = 0;
            for c in rule.phrase().chars() {
                len += 1;
                current = match nodes[current].children.get(&c) {
                    Some(&next) => next,
                    None => {
                        nodes.push(Node::default());
                        let next = nodes.len() - 1;
                        nodes[current].children.insert(c, next);
                        next
                    }
                };
            }
            nodes[current].outputs.push(index);
            patterns.push(PatternInfo {
                len,
                single_word: rule.is_single_word(),
            });
        }

        Self::link_failures(&mut nodes);

        Self { nodes, patterns }
    }

    /// Breadth-first pass that sets each node's failure link to the longest
    /// proper suffix of its prefix that is also a trie prefix, and extends
    /// its outputs with the outputs found along that link.
    fn link_failures(nodes: &mut [Node]) {
        let mut queue = std::collections::VecDeque::new();

        let root_children: Vec<usize> = nodes[ROOT].children.values().copied().collect();
        for child in root_children {
            nodes[child].fail = ROOT;
            queue.push_back(child);
        }

        while let Some(parent) = queue.pop_front() {
            let edges: Vec<(char, usize)> = nodes[parent].children.iter().map(|(&c, &n)| (c, n)).collect();

            for (c, child) in edges {
                let mut fallback = nodes[parent].fail;
                let fail = loop {
                    if let Some(&next) = nodes[fallback].children.get(&c) {
                        break next;
                    }
                    if fallback == ROOT {
                        break ROOT;
                    }
                    fallback = nodes[fallback].fail;
                };

                nodes[child].fail = fail;
                let inherited = nodes[fail].outputs.clone();
                nodes[child].outputs.extend(inherited);
                queue.push_back(child);
            }
        }
    }

    /// Number of trie nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of compiled patterns
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Find every occurrence of every pattern in `text`.
    ///
    /// The text is normalized once; matches come out ordered by end offset,
    /// and by start offset for matches that end together.
    pub fn search(&self, text: &str) -> Vec<AutomatonMatch> {
        let chars: Vec<char> = normalize_text(text).chars().collect();
        self.search_chars(&chars)
    }

    /// Like `search`, but keeps only matches that satisfy the boundary
    /// policy: single-word patterns must not touch a word character on
    /// either side, multi-word phrases are accepted as plain substrings.
    pub fn find_accepted(&self, text: &str, matching: &MatchingConfig) -> Vec<AutomatonMatch> {
        let chars: Vec<char> = normalize_text(text).chars().collect();
        self.search_chars(&chars)
            .into_iter()
            .filter(|m| !self.patterns[m.rule_index].single_word || has_word_boundaries(&chars, m, matching))
            .collect()
    }

    fn search_chars(&self, chars: &[char]) -> Vec<AutomatonMatch> {
        let mut matches = Vec::new();
        if self.patterns.is_empty() {
            return matches;
        }

        let mut state = ROOT;
        for (position, c) in chars.iter().enumerate() {
            state = self.step(state, *c);
            let end = position + 1;
            for &rule_index in &self.nodes[state].outputs {
                matches.push(AutomatonMatch {
                    rule_index,
                    start: end - self.patterns[rule_index].len,
                    end,
                });
            }
        }

        matches
    }

    fn step(&self, mut state: usize, c: char) -> usize {
        loop {
            if let Some(&next) = self.nodes[state].children.get(&c) {
                return next;
            }
            if state == ROOT {
                return ROOT;
            }
            state = self.nodes[state].fail;
        }
    }
}

fn has_word_boundaries(chars: &[char], m: &AutomatonMatch, matching: &MatchingConfig) -> bool {
    let before_ok = m.start == 0 || !matching.is_word_char(chars[m.start - 1]);
    let after_ok = chars.get(m.end).is_none_or(|&c| !matching.is_word_char(c));
    before_ok && after_ok
}
