use std::sync::LazyLock;

use regex::Regex;

/// Failures while expanding placeholders in raw config text
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExpandError {
    /// Placeholder names a variable that is unset and has no default
    #[error("environment variable not found: `{0}`")]
    MissingVar(String),

    /// Placeholder is not scoped with `env.`
    #[error("only variables scoped with 'env.' are supported: `{0}`")]
    UnsupportedScope(String),
}

// `{{ env.VAR }}` with an optional `| default("fallback")`
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*([a-zA-Z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#).expect("must be valid regex")
});

/// Expand `{{ env.VAR }}` placeholders in raw TOML text
///
/// `{{ env.VAR | default("x") }}` falls back to `x` when the variable is
/// unset. Comment lines pass through untouched.
///
/// # Errors
///
/// Returns an error for an unset variable without a default, or a
/// placeholder outside the `env.` scope
pub fn expand_env(input: &str) -> Result<String, ExpandError> {
    let mut output = String::with_capacity(input.len());

    for (i, line) in input.lines().enumerate() {
        if i > 0 {
            output.push('\n');
        }

        if line.trim_start().starts_with('#') {
            output.push_str(line);
        } else {
            expand_line(line, &mut output)?;
        }
    }

    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}

fn expand_line(line: &str, output: &mut String) -> Result<(), ExpandError> {
    let mut last_end = 0;

    for captures in PLACEHOLDER_RE.captures_iter(line) {
        let (Some(overall), Some(key)) = (captures.get(0), captures.get(1)) else {
            continue;
        };

        output.push_str(&line[last_end..overall.start()]);

        let var_name = match key.as_str().split_once('.') {
            Some(("env", name)) if !name.is_empty() && !name.contains('.') => name,
            _ => return Err(ExpandError::UnsupportedScope(key.as_str().to_owned())),
        };

        match (std::env::var(var_name), captures.get(2)) {
            (Ok(value), _) => output.push_str(&value),
            (Err(_), Some(default)) => output.push_str(default.as_str()),
            (Err(_), None) => return Err(ExpandError::MissingVar(var_name.to_owned())),
        }

        last_end = overall.end();
    }

    output.push_str(&line[last_end..]);
    Ok(())
}
