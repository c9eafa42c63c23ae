//! `{name}` placeholder rendering for command templates.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::errors::{Result, StagehandError};

#[allow(clippy::expect_used)]
fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
    })
}

/// Returns the placeholder names used by `template`, in order of first use.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for capture in placeholder_pattern().captures_iter(template) {
        let name = &capture[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Substitutes every `{name}` in `template` with its value from `vars`.
///
/// # Errors
///
/// Returns a template error naming the first placeholder without a value.
pub fn render(template: &str, vars: &HashMap<String, String>) -> Result<String> {
    if let Some(missing) = placeholders(template)
        .into_iter()
        .find(|name| !vars.contains_key(name))
    {
        return Err(StagehandError::template(
            template,
            format!("no value for placeholder `{{{missing}}}'"),
        ));
    }

    Ok(placeholder_pattern()
        .replace_all(template, |capture: &regex::Captures<'_>| vars[&capture[1]].clone())
        .into_owned())
}
