//! Declarative intent matching for learner input.
//!
//! A lab step does not demand an exact command line. It describes the intent
//! with an [`IntentRule`] (required phrases, flags, mentions, forbidden words)
//! and [`matches`] decides whether the raw input carries that intent.

use std::sync::LazyLock;

use regex::Regex;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]*)"|'([^']*)'|(\S+)"#).unwrap());

/// A single condition inside an [`IntentRule`].
#[derive(Debug, Clone)]
pub enum Term {
    /// Contiguous token sequence, e.g. `git commit`.
    Phrase(Vec<String>),
    /// Flag token such as `-m` or `--soft`.
    Flag(String),
    /// Substring anywhere in the normalized input.
    Mention(String),
    /// Regular expression over the normalized input.
    Pattern(Regex),
}

/// Expected-command predicate for one lab step.
#[derive(Debug, Clone, Default)]
pub struct IntentRule {
    canonical: String,
    all: Vec<Term>,
    any: Vec<Term>,
    none: Vec<Term>,
    exact: Option<String>,
    case_sensitive: bool,
}

impl IntentRule {
    /// Start a rule whose hint shows `canonical`.
    ///
    /// A rule without terms accepts any input.
    pub fn command(canonical: impl Into<String>) -> Self {
        Self {
            canonical: canonical.into(),
            ..Self::default()
        }
    }

    /// Rule for "press ENTER" pauses: anything is accepted.
    pub fn anything() -> Self {
        Self::default()
    }

    pub fn phrase(mut self, phrase: &str) -> Self {
        let tokens = tokenize(phrase, self.case_sensitive);
        self.all.push(Term::Phrase(tokens));
        self
    }

    pub fn flag(mut self, flag: &str) -> Self {
        self.all.push(Term::Flag(self.fold(flag)));
        self
    }

    pub fn mention(mut self, text: &str) -> Self {
        self.all.push(Term::Mention(self.fold(text)));
        self
    }

    /// At least one of `texts` must be mentioned.
    pub fn any_of(mut self, texts: &[&str]) -> Self {
        for text in texts {
            self.any.push(Term::Mention(self.fold(text)));
        }
        self
    }

    pub fn forbid(mut self, text: &str) -> Self {
        self.none.push(Term::Mention(self.fold(text)));
        self
    }

    pub fn forbid_flag(mut self, flag: &str) -> Self {
        self.none.push(Term::Flag(self.fold(flag)));
        self
    }

    pub fn pattern(mut self, re: Regex) -> Self {
        self.all.push(Term::Pattern(re));
        self
    }

    /// Whole normalized input must equal `command`.
    pub fn exact(mut self, command: &str) -> Self {
        self.exact = Some(tokenize(command, self.case_sensitive).join(" "));
        self
    }

    /// Keep letter case significant. Call before adding terms.
    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Corrective hint shown after a rejected input.
    pub fn hint(&self) -> String {
        if self.canonical.is_empty() {
            "Press ENTER to continue.".to_string()
        } else {
            format!("Type: {}", self.canonical)
        }
    }

    pub fn accepts_anything(&self) -> bool {
        self.all.is_empty() && self.any.is_empty() && self.none.is_empty() && self.exact.is_none()
    }

    fn fold(&self, text: &str) -> String {
        if self.case_sensitive {
            text.trim().to_string()
        } else {
            text.trim().to_lowercase()
        }
    }
}

/// Classify `raw` against `rule`. Pure; never has side effects.
pub fn matches(raw: &str, rule: &IntentRule) -> bool {
    if rule.accepts_anything() {
        return true;
    }
    let tokens = tokenize(raw, rule.case_sensitive);
    let normalized = tokens.join(" ");

    if let Some(exact) = &rule.exact
        && &normalized != exact
    {
        return false;
    }
    if !rule
        .all
        .iter()
        .all(|term| term_holds(term, &tokens, &normalized))
    {
        return false;
    }
    if !rule.any.is_empty()
        && !rule
            .any
            .iter()
            .any(|term| term_holds(term, &tokens, &normalized))
    {
        return false;
    }
    !rule
        .none
        .iter()
        .any(|term| term_holds(term, &tokens, &normalized))
}

/// Split input shell-style: quotes group words and are stripped.
pub fn tokenize(raw: &str, case_sensitive: bool) -> Vec<String> {
    TOKEN_RE
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| {
            if case_sensitive {
                m.as_str().to_string()
            } else {
                m.as_str().to_lowercase()
            }
        })
        .collect()
}

/// Return the argument following any of `flags` in the case-preserved input.
///
/// Handles `-m msg`, `--message=msg` and bundled short flags like `-am msg`.
pub fn flag_value(raw: &str, flags: &[&str]) -> Option<String> {
    let tokens = tokenize(raw, true);
    let mut iter = tokens.iter().peekable();
    while let Some(token) = iter.next() {
        for flag in flags {
            if let Some(value) = token
                .strip_prefix(flag)
                .and_then(|rest| rest.strip_prefix('='))
                .filter(|_| flag.starts_with("--"))
            {
                return non_empty(value);
            }
            if token == flag || bundles_short_flag(token, flag) {
                return iter.peek().and_then(|value| non_empty(value));
            }
        }
    }
    None
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn term_holds(term: &Term, tokens: &[String], normalized: &str) -> bool {
    match term {
        Term::Phrase(phrase) => contains_sequence(tokens, phrase),
        Term::Flag(flag) => tokens.iter().any(|token| flag_present(token, flag)),
        Term::Mention(text) => normalized.contains(text.as_str()),
        Term::Pattern(re) => re.is_match(normalized),
    }
}

fn contains_sequence(tokens: &[String], phrase: &[String]) -> bool {
    if phrase.is_empty() {
        return true;
    }
    tokens.windows(phrase.len()).any(|window| window == phrase)
}

fn flag_present(token: &str, flag: &str) -> bool {
    if token == flag {
        return true;
    }
    if flag.starts_with("--") {
        return token
            .strip_prefix(flag)
            .is_some_and(|rest| rest.starts_with('='));
    }
    bundles_short_flag(token, flag)
}

/// `-am` bundles `-a` and `-m`.
fn bundles_short_flag(token: &str, flag: &str) -> bool {
    let Some(letter) = flag.strip_prefix('-') else {
        return false;
    };
    if letter.len() != 1 || letter.starts_with('-') {
        return false;
    }
    match token.strip_prefix('-') {
        Some(bundle) if !bundle.starts_with('-') && bundle.len() > 1 => {
            bundle.chars().all(|c| c.is_ascii_alphabetic()) && bundle.contains(letter)
        }
        _ => false,
    }
}
