/*!
 * Keyword dictionary loading.
 *
 * Turns raw `(phrase, categories, severity)` rows into an immutable
 * `RuleSet`. Each row is validated on its own: a bad row is skipped and
 * counted, it never fails the load. Only an unreadable source as a whole
 * produces a `ModerationError::Configuration`.
 */

use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Read;

use crate::app_config::{DuplicatePolicy, KeywordSourceConfig};
use crate::errors::ModerationError;
use crate::normalize::normalize_phrase;
use crate::severity::Severity;

/// One raw row as read from the keyword source
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawKeywordRow {
    /// Keyword or phrase, not yet normalized
    pub phrase: String,
    /// Serialized category list, e.g. `['violence', 'threat']`
    pub categories: String,
    /// LOW, MEDIUM or HIGH
    pub severity: String,
}

impl RawKeywordRow {
    pub fn new(phrase: &str, categories: &str, severity: &str) -> Self {
        Self {
            phrase: phrase.to_string(),
            categories: categories.to_string(),
            severity: severity.to_string(),
        }
    }
}

/// A validated, normalized keyword rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    phrase: String,
    categories: Vec<String>,
    severity: Severity,
}

impl KeywordRule {
    /// Build a rule from already-parsed parts.
    ///
    /// The phrase is normalized; categories are de-duplicated keeping first
    /// occurrence order.
    pub fn new<S: AsRef<str>>(phrase: &str, categories: &[S], severity: Severity) -> Result<Self, ModerationError> {
        let phrase = normalize_phrase(phrase);
        if phrase.is_empty() {
            return Err(ModerationError::Validation("keyword phrase must not be empty".to_string()));
        }

        let mut ordered = Vec::with_capacity(categories.len());
        for category in categories {
            push_unique(&mut ordered, category.as_ref());
        }

        Ok(Self {
            phrase,
            categories: ordered,
            severity,
        })
    }

    /// Parse and validate a raw row
    fn from_raw(row: &RawKeywordRow) -> Result<Self, String> {
        let phrase = normalize_phrase(&row.phrase);
        if phrase.is_empty() {
            return Err("empty phrase".to_string());
        }
        let categories = parse_category_list(&row.categories)?;
        let severity = row.severity.parse::<Severity>()?;
        Ok(Self {
            phrase,
            categories,
            severity,
        })
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Single-token phrases are subject to the word-boundary check
    pub fn is_single_word(&self) -> bool {
        !self.phrase.contains(char::is_whitespace)
    }

    /// Fold a later duplicate of this phrase into the rule
    fn merge(&mut self, other: KeywordRule, policy: DuplicatePolicy) {
        match policy {
            DuplicatePolicy::LastRow => *self = other,
            DuplicatePolicy::HighestSeverity => {
                self.severity = self.severity.max(other.severity);
                for category in &other.categories {
                    push_unique(&mut self.categories, category);
                }
            }
        }
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

/// Immutable set of rules with unique normalized phrases.
///
/// The position of a rule in the set is its index in the compiled
/// automaton.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleSet {
    rules: Vec<KeywordRule>,
}

impl RuleSet {
    /// Rule set that matches nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a rule set, merging duplicate phrases with the highest-severity policy
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self::with_policy(rules, DuplicatePolicy::HighestSeverity).0
    }

    /// Build a rule set with an explicit duplicate policy.
    /// Returns the set and how many rules were merged away.
    pub fn with_policy(rules: Vec<KeywordRule>, policy: DuplicatePolicy) -> (Self, usize) {
        let mut merged: Vec<KeywordRule> = Vec::with_capacity(rules.len());
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut duplicates = 0;

        for rule in rules {
            match positions.get(rule.phrase()) {
                Some(&pos) => {
                    debug!("Duplicate keyword '{}' merged ({})", rule.phrase(), policy);
                    merged[pos].merge(rule, policy);
                    duplicates += 1;
                }
                None => {
                    positions.insert(rule.phrase().to_string(), merged.len());
                    merged.push(rule);
                }
            }
        }

        (Self { rules: merged }, duplicates)
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn get(&self, index: usize) -> Option<&KeywordRule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn single_word_count(&self) -> usize {
        self.rules.iter().filter(|r| r.is_single_word()).count()
    }

    pub fn phrase_count(&self) -> usize {
        self.rules.len() - self.single_word_count()
    }

    /// SHA-256 over the normalized rules, in order.
    ///
    /// Two rule sets with the same fingerprint compile to the same automaton.
    /// Every field is length-prefixed so no phrase or category text can
    /// imitate a field boundary.
    pub fn fingerprint(&self) -> String {
        fn update_field(hasher: &mut Sha256, field: &str) {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }

        let mut hasher = Sha256::new();
        hasher.update((self.rules.len() as u64).to_le_bytes());
        for rule in &self.rules {
            update_field(&mut hasher, &rule.phrase);
            hasher.update((rule.categories.len() as u64).to_le_bytes());
            for category in &rule.categories {
                update_field(&mut hasher, category);
            }
            update_field(&mut hasher, rule.severity.as_str());
        }
        format!("{:x}", hasher.finalize())
    }
}

/// A row that was rejected during loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based position among the data rows
    pub row_number: usize,
    pub reason: String,
}

/// Outcome of a dictionary load
#[derive(Debug, Clone)]
pub struct DictionaryLoad {
    pub rules: RuleSet,
    pub skipped_rows: usize,
    pub duplicate_rows: usize,
    pub skipped: Vec<SkippedRow>,
}

/// Keyword dictionary loader
pub struct KeywordDictionary;

impl KeywordDictionary {
    /// Validate and normalize rows into a rule set. Never fails.
    pub fn load<I>(rows: I, policy: DuplicatePolicy) -> DictionaryLoad
    where
        I: IntoIterator<Item = RawKeywordRow>,
    {
        let mut accepted = Vec::new();
        let mut skipped = Vec::new();

        for (i, row) in rows.into_iter().enumerate() {
            let row_number = i + 1;
            match KeywordRule::from_raw(&row) {
                Ok(rule) => accepted.push(rule),
                Err(reason) => {
                    warn!("Skipping keyword row {}: {}", row_number, reason);
                    skipped.push(SkippedRow { row_number, reason });
                }
            }
        }

        let (rules, duplicate_rows) = RuleSet::with_policy(accepted, policy);
        debug!(
            "Keyword dictionary loaded: {} rules ({} single words, {} phrases), {} skipped, {} duplicates",
            rules.len(),
            rules.single_word_count(),
            rules.phrase_count(),
            skipped.len(),
            duplicate_rows
        );

        DictionaryLoad {
            rules,
            skipped_rows: skipped.len(),
            duplicate_rows,
            skipped,
        }
    }

    /// Read rows from CSV and load them
    pub fn load_csv<R: Read>(reader: R, source: &KeywordSourceConfig) -> Result<DictionaryLoad, ModerationError> {
        let rows = read_csv_rows(reader, source)?;
        Ok(Self::load(rows, source.duplicate_policy))
    }
}

/// Read keyword rows from a CSV stream with a header line.
///
/// Fails only when the stream cannot be read or the header lacks the phrase
/// column. Missing categories or severity columns read as empty cells.
pub fn read_csv_rows<R: Read>(reader: R, source: &KeywordSourceConfig) -> Result<Vec<RawKeywordRow>, ModerationError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .byte_headers()
        .map_err(|e| ModerationError::Configuration(format!("Failed to read keyword header: {}", e)))?
        .clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| String::from_utf8_lossy(h).trim().trim_start_matches('\u{feff}') == name)
    };

    let phrase_idx = column(&source.phrase_column).ok_or_else(|| {
        ModerationError::Configuration(format!(
            "Keyword source has no '{}' column",
            source.phrase_column
        ))
    })?;
    let categories_idx = column(&source.categories_column);
    let severity_idx = column(&source.severity_column);

    if categories_idx.is_none() {
        warn!("Keyword source has no '{}' column; categories will be empty", source.categories_column);
    }
    if severity_idx.is_none() {
        warn!("Keyword source has no '{}' column; every row will be skipped", source.severity_column);
    }

    let mut rows = Vec::new();
    for record in csv_reader.byte_records() {
        let record = record
            .map_err(|e| ModerationError::Configuration(format!("Failed to read keyword rows: {}", e)))?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default()
        };
        rows.push(RawKeywordRow {
            phrase: cell(Some(phrase_idx)),
            categories: cell(categories_idx),
            severity: cell(severity_idx),
        });
    }

    Ok(rows)
}

/// Parse a serialized category list such as `['hate', "slur"]`.
///
/// The grammar is deliberately small: a bracketed, comma-separated list of
/// single- or double-quoted string literals with an optional trailing comma.
/// An empty cell is the empty list. Nothing is ever evaluated.
pub fn parse_category_list(input: &str) -> Result<Vec<String>, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut chars = trimmed.chars().peekable();
    if chars.next() != Some('[') {
        return Err(format!("category list must start with '[': {}", trimmed));
    }

    let mut categories: Vec<String> = Vec::new();
    let mut expect_item = true;

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        match chars.next() {
            Some(']') => break,
            Some(quote @ ('\'' | '"')) if expect_item => {
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some(c @ ('\\' | '\'' | '"')) => value.push(c),
                            Some(c) => return Err(format!("unsupported escape '\\{}' in category list", c)),
                            None => return Err("unterminated escape in category list".to_string()),
                        },
                        Some(c) if c == quote => break,
                        Some(c) => value.push(c),
                        None => return Err("unterminated string in category list".to_string()),
                    }
                }
                push_unique(&mut categories, &value);
                expect_item = false;
            }
            Some(',') if !expect_item => expect_item = true,
            Some(c) => return Err(format!("unexpected '{}' in category list", c)),
            None => return Err("category list is missing ']'".to_string()),
        }
    }

    if chars.any(|c| !c.is_whitespace()) {
        return Err("trailing characters after category list".to_string());
    }

    Ok(categories)
}
