//! Text normalization applied to journal text before it reaches the classifier.
//!
//! Policy (applied in this order):
//! - Lowercase.
//! - Drop URLs, e-mail addresses, `[bracketed]` annotations and `r/` / `u/` handles.
//! - Expand contractions from a fixed, ordered table.
//! - Replace anything that is not a letter, digit, `_`, whitespace, `!` or `?` with
//!   a space (connector punctuation and combining marks included).
//! - Cap `!`/`?` runs at two, cap repeated word characters at two.
//! - Drop standalone numbers, collapse whitespace, trim.
//!
//! The output is what the model was trained on, so keep this single-sourced.
//! An empty result means there is nothing to classify.

use once_cell::sync::Lazy;
use regex::Regex;

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("static regex"));
static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("static regex"));
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").expect("static regex"));
static HANDLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"r/\w+|u/\w+").expect("static regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}_\s!?]").expect("static regex"));
static BANGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"!{2,}").expect("static regex"));
static QUESTIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?{2,}").expect("static regex"));
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\b").expect("static regex"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Contraction expansions, applied top to bottom as plain substring replacement.
///
/// Longer patterns come before any pattern they contain (`she's` before `he's`).
pub const CONTRACTIONS: &[(&str, &str)] = &[
    ("shouldn't", "should not"),
    ("couldn't", "could not"),
    ("wouldn't", "would not"),
    ("doesn't", "does not"),
    ("haven't", "have not"),
    ("weren't", "were not"),
    ("they're", "they are"),
    ("they've", "they have"),
    ("there's", "there is"),
    ("didn't", "did not"),
    ("wasn't", "was not"),
    ("hasn't", "has not"),
    ("hadn't", "had not"),
    ("aren't", "are not"),
    ("you're", "you are"),
    ("you've", "you have"),
    ("you'll", "you will"),
    ("that's", "that is"),
    ("what's", "what is"),
    ("won't", "will not"),
    ("can't", "cannot"),
    ("don't", "do not"),
    ("isn't", "is not"),
    ("she's", "she is"),
    ("we're", "we are"),
    ("we've", "we have"),
    ("let's", "let us"),
    ("he's", "he is"),
    ("it's", "it is"),
    ("i'm", "i am"),
    ("i've", "i have"),
    ("i'll", "i will"),
    ("i'd", "i would"),
];

/// Normalize raw journal text for classification. Pure and idempotent.
pub fn normalize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let mut text = raw.to_lowercase();
    text = URL.replace_all(&text, "").into_owned();
    text = EMAIL.replace_all(&text, "").into_owned();
    text = BRACKETED.replace_all(&text, "").into_owned();
    text = HANDLE.replace_all(&text, "").into_owned();

    for (pattern, expansion) in CONTRACTIONS {
        if text.contains(pattern) {
            text = text.replace(pattern, expansion);
        }
    }

    text = NON_WORD.replace_all(&text, " ").into_owned();
    text = BANGS.replace_all(&text, "!!").into_owned();
    text = QUESTIONS.replace_all(&text, "??").into_owned();
    text = collapse_repeats(&text);
    text = NUMBER.replace_all(&text, "").into_owned();
    // Dropping a number can join two runs ("!!5!!").
    text = BANGS.replace_all(&text, "!!").into_owned();
    text = QUESTIONS.replace_all(&text, "??").into_owned();

    SPACES.replace_all(&text, " ").trim().to_string()
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Cap runs of the same word character at two (`soooo` -> `soo`).
fn collapse_repeats(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev: Option<char> = None;
    let mut run = 0usize;
    for ch in s.chars() {
        if Some(ch) == prev {
            run += 1;
        } else {
            prev = Some(ch);
            run = 1;
        }
        if run <= 2 || !is_word(ch) {
            out.push(ch);
        }
    }
    out
}
