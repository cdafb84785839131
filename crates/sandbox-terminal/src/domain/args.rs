//! Command-line tokenizing and flag scanning
//!
//! Deliberately simple: whitespace splitting, one level of matching quotes,
//! and a per-command flag table. Unknown flags are skipped.

/// Split a command line into tokens.
///
/// A token that starts with `'` or `"` and has a matching closing quote
/// (followed by whitespace or the end of the line) is unquoted once and may
/// contain whitespace. Unbalanced quotes are kept as ordinary characters.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = line.trim_start();

    while let Some(first) = rest.chars().next() {
        if first == '"' || first == '\'' {
            if let Some(end) = closing_quote(&rest[1..], first) {
                tokens.push(rest[1..=end].to_string());
                rest = rest[end + 2..].trim_start();
                continue;
            }
        }

        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        tokens.push(rest[..end].to_string());
        rest = rest[end..].trim_start();
    }

    tokens
}

/// Byte offset of the quote that closes a quoted token, if any.
fn closing_quote(body: &str, quote: char) -> Option<usize> {
    body.char_indices()
        .find(|&(index, c)| {
            c == quote
                && body[index + c.len_utf8()..]
                    .chars()
                    .next()
                    .map_or(true, char::is_whitespace)
        })
        .map(|(index, _)| index)
}

/// One flag a command understands.
#[derive(Clone, Copy, Debug)]
pub struct FlagSpec {
    /// Spellings; the first is canonical.
    pub names: &'static [&'static str],
    /// Whether the next token is the flag's value.
    pub takes_value: bool,
}

impl FlagSpec {
    pub const fn value(names: &'static [&'static str]) -> Self {
        Self {
            names,
            takes_value: true,
        }
    }

    pub const fn switch(names: &'static [&'static str]) -> Self {
        Self {
            names,
            takes_value: false,
        }
    }

    fn canonical(&self) -> &'static str {
        self.names[0]
    }
}

/// Result of scanning tokens against a flag table.
#[derive(Debug, Default)]
pub struct ParsedArgs {
    values: Vec<(&'static str, String)>,
    switches: Vec<&'static str>,
    positionals: Vec<String>,
}

impl ParsedArgs {
    /// Scan `tokens` (program name excluded).
    ///
    /// A value flag at the end of the line has no value and is treated as
    /// absent. When a flag repeats, the last value wins.
    pub fn scan(tokens: &[String], specs: &[FlagSpec]) -> Self {
        let mut parsed = Self::default();
        let mut iter = tokens.iter();

        while let Some(token) = iter.next() {
            let spec = specs
                .iter()
                .find(|spec| spec.names.contains(&token.as_str()));

            match spec {
                Some(spec) if spec.takes_value => {
                    if let Some(value) = iter.next() {
                        parsed.values.retain(|(name, _)| *name != spec.canonical());
                        parsed.values.push((spec.canonical(), value.clone()));
                    }
                }
                Some(spec) => parsed.switches.push(spec.canonical()),
                None if token.starts_with('-') => {}
                None => parsed.positionals.push(token.clone()),
            }
        }

        parsed
    }

    /// Value of a flag, by canonical name.
    pub fn value(&self, flag: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| *name == flag)
            .map(|(_, value)| value.as_str())
    }

    /// Whether a switch was given, by canonical name.
    pub fn switch(&self, flag: &str) -> bool {
        self.switches.contains(&flag)
    }

    /// Tokens that are neither flags nor flag values.
    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }
}
