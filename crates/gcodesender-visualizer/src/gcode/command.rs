//! Command splitting and parameter extraction
//!
//! Parsing is permissive: a malformed numeric suffix reads as
//! `0` and nothing here ever returns an error.

use std::collections::HashMap;

/// Split a command into tokens such as `["G1", "X10", "F200"]`
///
/// A token is one non-whitespace character followed by any run of digits,
/// `.` or `-`. Spaces and tabs are skipped entirely, so `"X 10"` yields
/// `"X10"`.
pub fn split(command: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for c in command.chars() {
        if c == ' ' || c == '\t' {
            continue;
        }
        if !current.is_empty() && (c.is_ascii_digit() || c == '.' || c == '-') {
            current.push(c);
            continue;
        }
        if !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        current.push(c);
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn skip_digits(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    i
}

/// Length of the longest prefix of `text` that reads as a decimal number:
/// optional sign, digits with at most one `.`, optional exponent
fn numeric_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));

    let int_end = skip_digits(bytes, sign);
    let mut end = int_end;
    let mut has_digits = int_end > sign;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = skip_digits(bytes, end + 1);
        has_digits |= frac_end > end + 1;
        end = frac_end;
    }
    if !has_digits {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let exp_sign = end + 1 + usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_end = skip_digits(bytes, exp_sign);
        if exp_end > exp_sign {
            end = exp_end;
        }
    }
    end
}

/// Parse the longest numeric prefix of `text`, or `0` when there is none
pub fn parse_value(text: &str) -> f64 {
    let value = text[..numeric_prefix_len(text)]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);
    // -0 reads as 0
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

/// Parse the leading integer of `text` (optional sign, then digits)
pub fn parse_code_number(text: &str) -> Option<i64> {
    let bytes = text.as_bytes();
    let sign_len = usize::from(matches!(bytes.first(), Some(b'-') | Some(b'+')));
    let digits = bytes[sign_len..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }
    text[..sign_len + digits].parse().ok()
}

/// Parameters of one command, keyed by uppercase letter
///
/// A letter given twice keeps its last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    values: HashMap<char, f64>,
}

impl ParameterSet {
    /// Build a parameter set from parameter tokens (the tag excluded)
    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let mut values = HashMap::new();
        for token in tokens {
            let mut chars = token.chars();
            if let Some(letter) = chars.next() {
                values.insert(letter.to_ascii_uppercase(), parse_value(chars.as_str()));
            }
        }
        Self { values }
    }

    pub fn get(&self, letter: char) -> Option<f64> {
        self.values.get(&letter).copied()
    }

    pub fn contains(&self, letter: char) -> bool {
        self.values.contains_key(&letter)
    }

    /// True when any of the given letters is present
    pub fn contains_any(&self, letters: &[char]) -> bool {
        letters.iter().any(|l| self.contains(*l))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A command split into its tag and parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    /// First token, e.g. `"G1"` or `"M104"`
    pub tag: String,
    /// Tag letter, e.g. `'G'`
    pub letter: char,
    /// Tag number; `None` when the tag has no leading integer
    pub number: Option<i64>,
    pub params: ParameterSet,
}

impl ParsedCommand {
    /// Split and parse a command; `None` for a blank command
    pub fn parse(command: &str) -> Option<Self> {
        let parts = split(command);
        let (tag, rest) = parts.split_first()?;
        let mut chars = tag.chars();
        let letter = chars.next()?;
        Some(Self {
            tag: tag.clone(),
            letter,
            number: parse_code_number(chars.as_str()),
            params: ParameterSet::from_tokens(rest.iter().map(String::as_str)),
        })
    }

    /// True for a `G` command with the given number
    pub fn is_g(&self, number: i64) -> bool {
        self.letter == 'G' && self.number == Some(number)
    }
}
