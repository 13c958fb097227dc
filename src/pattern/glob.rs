//! Glob tokenizer and regex translation

use serde::{Deserialize, Serialize};

/// How literal glob characters are carried into the generated regex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSyntax {
    /// Literal runs are escaped, so `.` or `+` in a glob only match themselves
    #[default]
    Escaped,
    /// Literal characters are copied through verbatim and keep their regex meaning
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobToken {
    Literal(String),
    /// `?`
    AnyChar,
    /// `*`
    AnySegment,
    /// `**`, swallowing a directly following `/`
    AnyPath,
}

/// Split a glob into literal runs and wildcard tokens.
pub fn tokenize(glob: &str) -> Vec<GlobToken> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = glob.chars().peekable();

    while let Some(c) = chars.next() {
        let token = match c {
            '?' => GlobToken::AnyChar,
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    if chars.peek() == Some(&'/') {
                        chars.next();
                    }
                    GlobToken::AnyPath
                } else {
                    GlobToken::AnySegment
                }
            }
            other => {
                literal.push(other);
                continue;
            }
        };

        if !literal.is_empty() {
            tokens.push(GlobToken::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(token);
    }

    if !literal.is_empty() {
        tokens.push(GlobToken::Literal(literal));
    }

    tokens
}

/// Translate a single include glob into regex source (unanchored).
pub fn glob_to_regex(glob: &str, syntax: PatternSyntax) -> String {
    let normalized = glob.replace('\\', "/");
    let mut regex = String::with_capacity(normalized.len() * 2);

    for token in tokenize(&normalized) {
        match token {
            GlobToken::Literal(text) => regex.push_str(&literal(&text, syntax)),
            GlobToken::AnyChar => regex.push('.'),
            GlobToken::AnySegment => regex.push_str("[^/]*"),
            GlobToken::AnyPath => regex.push_str(".*"),
        }
    }

    regex
}

pub(crate) fn literal(text: &str, syntax: PatternSyntax) -> String {
    match syntax {
        PatternSyntax::Escaped => regex::escape(text),
        PatternSyntax::Legacy => text.to_string(),
    }
}
