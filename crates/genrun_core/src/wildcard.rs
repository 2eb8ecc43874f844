//! Wildcard template expansion.
//!
//! A template mixes literal text with two kinds of placeholders:
//! - `__name__` picks a random entry of category `name`;
//! - `{a|b|c}` picks one of the inline alternatives.
//!
//! Category entries may contain placeholders themselves; nesting is
//! expanded up to [`MAX_DEPTH`] levels. Unknown categories stay verbatim.

use std::collections::{BTreeMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub const MAX_DEPTH: usize = 5;
/// Attempts per requested prompt before giving up on a restrictive template.
pub const ATTEMPTS_PER_PROMPT: usize = 20;

const EXAMPLES: &[&str] = &[
    "A __color__ __animal__ in a __place__, __style__",
    "Portrait of a __animal__ wearing a {hat|scarf|crown}, __lighting__",
    "__style__ landscape of a __place__ at {dawn|dusk|midnight}",
    "A {small|giant} __color__ ball on a table, __lighting__",
    "A __animal__ reading a book in a __place__, __style__, __lighting__",
];

fn default_categories() -> BTreeMap<String, Vec<String>> {
    let table: &[(&str, &[&str])] = &[
        ("color", &["red", "blue", "green", "golden", "violet", "teal"]),
        ("animal", &["cat", "fox", "owl", "otter", "wolf", "heron"]),
        (
            "style",
            &["watercolor", "oil painting", "pixel art", "ink sketch", "photograph"],
        ),
        (
            "lighting",
            &["soft light", "rim light", "golden hour", "neon glow", "overcast"],
        ),
        ("place", &["forest", "desert", "harbor", "library", "mountain pass"]),
    ];
    table
        .iter()
        .map(|(name, values)| {
            (
                (*name).to_string(),
                values.iter().map(|v| (*v).to_string()).collect(),
            )
        })
        .collect()
}

pub struct WildcardExpander {
    categories: BTreeMap<String, Vec<String>>,
    rng: StdRng,
}

impl Default for WildcardExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl WildcardExpander {
    /// Expander with the built-in categories and an entropy-seeded rng.
    pub fn new() -> Self {
        Self {
            categories: default_categories(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic expander for reproducible batches.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            categories: default_categories(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Adds or replaces a category.
    pub fn set_category(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.categories.insert(name.into(), values);
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Generates up to `count` distinct prompts from `template`, in generation order.
    ///
    /// Returns fewer than `count` items when the template cannot produce
    /// enough distinct strings within the attempt budget.
    pub fn generate_prompts(&mut self, template: &str, count: usize) -> Vec<String> {
        let max_attempts = count.saturating_mul(ATTEMPTS_PER_PROMPT).max(ATTEMPTS_PER_PROMPT);
        let mut seen = HashSet::new();
        let mut prompts = Vec::with_capacity(count);
        let mut attempts = 0;
        while prompts.len() < count && attempts < max_attempts {
            attempts += 1;
            let candidate = self.expand(template, 0);
            if seen.insert(candidate.clone()) {
                prompts.push(candidate);
            }
        }
        prompts
    }

    pub fn random_example(&mut self) -> String {
        EXAMPLES
            .choose(&mut self.rng)
            .map(|example| (*example).to_string())
            .unwrap_or_default()
    }

    fn expand(&mut self, template: &str, depth: usize) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while !rest.is_empty() {
            if let Some((name, after)) = split_category(rest) {
                match self.pick_category(name) {
                    Some(value) if depth < MAX_DEPTH => {
                        out.push_str(&self.expand(&value, depth + 1))
                    }
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("__");
                        out.push_str(name);
                        out.push_str("__");
                    }
                }
                rest = after;
            } else if let Some((choices, after)) = split_choice(rest) {
                let alternatives = split_alternatives(choices);
                let picked = alternatives
                    .choose(&mut self.rng)
                    .map(|s| (*s).to_string())
                    .unwrap_or_default();
                if depth < MAX_DEPTH {
                    out.push_str(&self.expand(&picked, depth + 1));
                } else {
                    out.push_str(&picked);
                }
                rest = after;
            } else {
                let mut chars = rest.chars();
                if let Some(ch) = chars.next() {
                    out.push(ch);
                }
                rest = chars.as_str();
            }
        }
        out
    }

    fn pick_category(&mut self, name: &str) -> Option<String> {
        self.categories
            .get(name)
            .and_then(|values| values.choose(&mut self.rng))
            .cloned()
    }
}

/// Splits `__name__rest` into `(name, rest)`.
fn split_category(input: &str) -> Option<(&str, &str)> {
    let body = input.strip_prefix("__")?;
    let end = body.find("__")?;
    let name = &body[..end];
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then(|| (name, &body[end + 2..]))
}

/// Splits `{a|b}rest` into `("a|b", rest)`, matching nested braces.
fn split_choice(input: &str) -> Option<(&str, &str)> {
    let body = input.strip_prefix('{')?;
    let mut depth = 0usize;
    let mut top_level_pipe = false;
    for (index, ch) in body.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' if depth == 0 => {
                let choices = &body[..index];
                return top_level_pipe.then(|| (choices, &body[index + 1..]));
            }
            '}' => depth -= 1,
            '|' if depth == 0 => top_level_pipe = true,
            _ => {}
        }
    }
    None
}

/// Splits `a|{b|c}` on pipes outside nested groups.
fn split_alternatives(choices: &str) -> Vec<&str> {
    let mut alternatives = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, ch) in choices.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                alternatives.push(&choices[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    alternatives.push(&choices[start..]);
    alternatives
}

#[cfg(test)]
mod tests {
    use super::{split_alternatives, split_category, split_choice};

    #[test]
    fn category_token_is_split() {
        assert_eq!(split_category("__hair_color__ rest"), Some(("hair_color", " rest")));
        assert_eq!(split_category("__ __"), None);
        assert_eq!(split_category("plain"), None);
    }

    #[test]
    fn choice_group_requires_pipe() {
        assert_eq!(split_choice("{a|b} end"), Some(("a|b", " end")));
        assert_eq!(split_choice("{json}"), None);
    }

    #[test]
    fn nested_choice_group_is_matched_whole() {
        assert_eq!(split_choice("{x|{y|z}} end"), Some(("x|{y|z}", " end")));
        assert_eq!(split_choice("{{y|z}}"), None);
        assert_eq!(split_choice("{x|{y}"), None);
        assert_eq!(split_alternatives("x|{y|z}|w"), vec!["x", "{y|z}", "w"]);
    }
}
