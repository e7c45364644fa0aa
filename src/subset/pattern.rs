//! Case-insensitive wildcard patterns for resource types
//!
//! Supports `*` (any run), `?` (one character) and `[...]` classes
//! (`[!...]` negates). Everything else matches literally.

use regex::{Regex, RegexBuilder};

/// A compiled type pattern
#[derive(Debug, Clone)]
pub struct TypePattern {
    source: String,
    regex: Regex,
}

impl TypePattern {
    /// Compile a wildcard pattern; fails on malformed classes
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&translate(pattern)?)
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

fn translate(pattern: &str) -> Result<String, regex::Error> {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut class = String::from("[");
                if matches!(chars.peek(), Some('!') | Some('^')) {
                    chars.next();
                    class.push('^');
                }
                let mut closed = false;
                let mut first = true;
                while let Some(c) = chars.next() {
                    match c {
                        // A leading ']' is literal
                        ']' if !first => {
                            closed = true;
                            break;
                        }
                        '\\' | '[' | ']' | '&' | '~' => {
                            class.push('\\');
                            class.push(c);
                        }
                        _ => class.push(c),
                    }
                    first = false;
                }
                if !closed {
                    return Err(regex::Error::Syntax(format!(
                        "unclosed character class in '{}'",
                        pattern
                    )));
                }
                class.push(']');
                out.push_str(&class);
            }
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }

    out.push('$');
    Ok(out)
}
