//! POSIX shell word expansion for env files.
//!
//! This is the subset of the shell needed to `source` an env file without
//! running a shell: quoting, parameter and arithmetic expansion, comments and
//! word splitting. Command substitution is rejected. Each resulting word is
//! handed to `dotenvy` as a `KEY=VALUE` assignment.

use super::Lookup;

/// Errors produced while expanding or parsing a line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShellError {
    /// A quote, `${` or `$((` was opened but never closed.
    #[error("unterminated {0}")]
    Unterminated(&'static str),

    /// A `${...}` form that is not valid parameter expansion.
    #[error("bad substitution: ${{{0}}}")]
    BadSubstitution(String),

    /// A construct that would require executing commands.
    #[error("{0} is not supported")]
    Unsupported(&'static str),

    /// `${NAME:?message}` on an unset or empty parameter.
    #[error("{name}: {message}")]
    ParameterUnset {
        /// Parameter name
        name: String,
        /// Message from the expansion, or a default one
        message: String,
    },

    /// A `$((...))` expression that cannot be evaluated.
    #[error("arithmetic expansion: {0}")]
    Arithmetic(String),

    /// A word that is not a `KEY=VALUE` assignment.
    #[error("malformed assignment: {0}")]
    MalformedAssignment(String),
}

type Result<T> = std::result::Result<T, ShellError>;

/// One shell word after expansion and quote removal.
///
/// The word remembers which of its characters were quoted (or produced by an
/// expansion), since only unquoted text can form the key of an assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Word {
    segments: Vec<(String, bool)>,
}

impl Word {
    fn push(&mut self, text: &str, quoted: bool) {
        if let Some((last, q)) = self.segments.last_mut() {
            if *q == quoted {
                last.push_str(text);
                return;
            }
        }
        self.segments.push((text.to_string(), quoted));
    }

    /// The word's text with quotes removed.
    pub fn text(&self) -> String {
        self.segments.iter().map(|(text, _)| text.as_str()).collect()
    }

    fn is_unquoted(&self, literal: &str) -> bool {
        matches!(self.segments.as_slice(), [(text, false)] if text == literal)
    }

    /// Render the word as a dotenv line: unquoted plain characters as they
    /// are, everything else inside escaped double quotes.
    fn to_dotenv(&self) -> String {
        let mut out = String::new();
        let mut open = false;
        for (text, quoted) in &self.segments {
            for c in text.chars() {
                let raw = !quoted && is_plain(c);
                if raw == open {
                    out.push('"');
                    open = !open;
                }
                match c {
                    '\\' | '"' | '$' if open => {
                        out.push('\\');
                        out.push(c);
                    }
                    '\n' => out.push_str("\\n"),
                    _ => out.push(c),
                }
            }
        }
        if open {
            out.push('"');
        }
        out
    }
}

/// Expand `input` the way a POSIX shell expands a command line, resolving
/// parameters through `lookup`, and split it into words at unquoted
/// whitespace. Results of expansions are not split further.
///
/// Unset parameters expand to the empty string.
pub fn split_words<L: Lookup + ?Sized>(input: &str, lookup: &L) -> Result<Vec<Word>> {
    Expander::new(input, lookup, true).words()
}

/// Expand `input` and join its words with single spaces.
pub fn expand<L: Lookup + ?Sized>(input: &str, lookup: &L) -> Result<String> {
    let words = split_words(input, lookup)?;
    Ok(words.iter().map(Word::text).collect::<Vec<_>>().join(" "))
}

/// Expand one env-file line and parse each of its words as an assignment.
///
/// A leading unquoted `export` is ignored. `A="x" B='y z'` yields two
/// assignments; quoted whitespace is kept as written.
pub fn parse_line<L: Lookup + ?Sized>(input: &str, lookup: &L) -> Result<Vec<(String, String)>> {
    let words = split_words(input, lookup)?;
    let words = match words.split_first() {
        Some((first, rest)) if first.is_unquoted("export") => rest,
        _ => words.as_slice(),
    };
    words.iter().map(parse_assignment).collect()
}

/// Parse one expanded word as a `KEY=VALUE` assignment.
///
/// The key must be an unquoted shell identifier; the value may be empty.
pub fn parse_assignment(word: &Word) -> Result<(String, String)> {
    let line = word.to_dotenv();
    let mut pairs = dotenvy::from_read_iter(line.as_bytes());
    match (pairs.next(), pairs.next()) {
        (Some(Ok((key, value))), None) if is_identifier(&key) => Ok((key, value)),
        (Some(Err(e)), _) => Err(ShellError::MalformedAssignment(format!(
            "{}: {}",
            word.text(),
            e
        ))),
        _ => Err(ShellError::MalformedAssignment(word.text())),
    }
}

fn is_plain(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '\\' | '\'' | '"' | '$' | '#')
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_name_start(c) => chars.all(is_name_char),
        _ => false,
    }
}

fn is_name_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_name_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

fn is_special_parameter(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '@' | '*' | '#' | '?' | '$' | '!' | '-')
}

struct Expander<'a, L: ?Sized> {
    chars: Vec<char>,
    pos: usize,
    lookup: &'a L,
    // Comments and word splitting only apply to the top-level line, not to
    // `${x:-...}` operands or `$((...))` bodies.
    top_level: bool,
}

impl<'a, L: Lookup + ?Sized> Expander<'a, L> {
    fn new(input: &str, lookup: &'a L, top_level: bool) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            lookup,
            top_level,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn words(mut self) -> Result<Vec<Word>> {
        let mut words = Vec::new();
        let mut word = Word::default();
        let mut in_word = false;

        while let Some(c) = self.bump() {
            match c {
                c if c.is_whitespace() && self.top_level => {
                    if in_word {
                        words.push(std::mem::take(&mut word));
                        in_word = false;
                    }
                    continue;
                }
                '#' if self.top_level && !in_word => break,
                '\'' => word.push(&self.single_quoted()?, true),
                '"' => word.push(&self.double_quoted()?, true),
                '\\' => match self.bump() {
                    Some('\n') => continue,
                    Some(escaped) => word.push(escaped.encode_utf8(&mut [0; 4]), true),
                    None => word.push("\\", false),
                },
                '$' => word.push(&self.dollar()?, true),
                '`' => return Err(ShellError::Unsupported("command substitution")),
                other => word.push(other.encode_utf8(&mut [0; 4]), false),
            }
            in_word = true;
        }

        if in_word {
            words.push(word);
        }
        Ok(words)
    }

    /// Expand without splitting, for operands and arithmetic bodies.
    fn text(self) -> Result<String> {
        Ok(self.words()?.iter().map(Word::text).collect())
    }

    fn single_quoted(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\'') => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(ShellError::Unterminated("single quote")),
            }
        }
    }

    fn double_quoted(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some(c @ ('$' | '`' | '"' | '\\')) => out.push(c),
                    Some('\n') => {}
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                    None => return Err(ShellError::Unterminated("double quote")),
                },
                Some('$') => out.push_str(&self.dollar()?),
                Some('`') => return Err(ShellError::Unsupported("command substitution")),
                Some(c) => out.push(c),
                None => return Err(ShellError::Unterminated("double quote")),
            }
        }
    }

    /// Expand whatever follows a `$` that has already been consumed.
    fn dollar(&mut self) -> Result<String> {
        match self.peek() {
            Some('{') => {
                self.pos += 1;
                self.braced()
            }
            Some('(') if self.peek_at(1) == Some('(') => {
                self.pos += 2;
                self.arithmetic()
            }
            Some('(') => Err(ShellError::Unsupported("command substitution")),
            Some(c) if is_name_start(c) => {
                let name = self.name();
                Ok(self.lookup.lookup(&name).unwrap_or_default())
            }
            Some(c) if is_special_parameter(c) => {
                self.pos += 1;
                Ok(String::new())
            }
            _ => Ok("$".to_string()),
        }
    }

    fn name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !is_name_char(c) {
                break;
            }
            name.push(c);
            self.pos += 1;
        }
        name
    }

    /// Expand `${...}`, the opening brace already consumed.
    fn braced(&mut self) -> Result<String> {
        let start = self.pos;

        let length = self.peek() == Some('#') && self.peek_at(1).is_some_and(is_name_start);
        if length {
            self.pos += 1;
        }

        let name = match self.peek() {
            Some(c) if is_name_start(c) => self.name(),
            Some(c) if is_special_parameter(c) => {
                self.pos += 1;
                c.to_string()
            }
            Some(_) => return Err(self.bad_substitution(start)),
            None => return Err(ShellError::Unterminated("parameter expansion")),
        };
        let special = !name.starts_with(is_name_start);
        let value = if special {
            None
        } else {
            self.lookup.lookup(&name)
        };

        if length {
            return match self.bump() {
                Some('}') => Ok(value.unwrap_or_default().chars().count().to_string()),
                Some(_) => Err(self.bad_substitution(start)),
                None => Err(ShellError::Unterminated("parameter expansion")),
            };
        }

        let colon = self.peek() == Some(':');
        if colon {
            self.pos += 1;
        }
        let op = match self.bump() {
            Some('}') if !colon => return Ok(value.unwrap_or_default()),
            Some(op @ ('-' | '=' | '+' | '?')) => op,
            Some(_) => return Err(self.bad_substitution(start)),
            None => return Err(ShellError::Unterminated("parameter expansion")),
        };
        let operand = self.operand()?;

        // With a colon, an empty value counts as unset.
        let is_set = match &value {
            Some(v) => !(colon && v.is_empty()),
            None => false,
        };

        match op {
            '-' | '=' => {
                if is_set {
                    Ok(value.unwrap_or_default())
                } else {
                    self.expand_operand(&operand)
                }
            }
            '+' => {
                if is_set {
                    self.expand_operand(&operand)
                } else {
                    Ok(String::new())
                }
            }
            _ => {
                if is_set {
                    Ok(value.unwrap_or_default())
                } else {
                    let message = self.expand_operand(&operand)?;
                    Err(ShellError::ParameterUnset {
                        name,
                        message: if message.is_empty() {
                            "parameter null or not set".to_string()
                        } else {
                            message
                        },
                    })
                }
            }
        }
    }

    /// Collect the raw word of `${name<op>word}` up to its closing brace,
    /// honouring quotes and nested expansions.
    fn operand(&mut self) -> Result<String> {
        let mut raw = String::new();
        let mut depth = 0usize;
        loop {
            let c = self
                .bump()
                .ok_or(ShellError::Unterminated("parameter expansion"))?;
            match c {
                '}' if depth == 0 => return Ok(raw),
                '}' => depth -= 1,
                '{' if raw.ends_with('$') => depth += 1,
                '\\' => {
                    raw.push(c);
                    match self.bump() {
                        Some(next) => raw.push(next),
                        None => return Err(ShellError::Unterminated("parameter expansion")),
                    }
                    continue;
                }
                '\'' | '"' => {
                    raw.push(c);
                    loop {
                        let q = self
                            .bump()
                            .ok_or(ShellError::Unterminated("parameter expansion"))?;
                        raw.push(q);
                        if q == '\\' && c == '"' {
                            if let Some(next) = self.bump() {
                                raw.push(next);
                            }
                            continue;
                        }
                        if q == c {
                            break;
                        }
                    }
                    continue;
                }
                _ => {}
            }
            raw.push(c);
        }
    }

    fn expand_operand(&self, operand: &str) -> Result<String> {
        Expander::new(operand, self.lookup, false).text()
    }

    /// Evaluate `$((...))`, the opening `$((` already consumed.
    fn arithmetic(&mut self) -> Result<String> {
        let mut body = String::new();
        let mut depth = 0usize;
        loop {
            match self.bump() {
                Some(')') if depth == 0 => {
                    return match self.bump() {
                        Some(')') => {
                            let expanded = self.expand_operand(&body)?;
                            Ok(Arithmetic::new(&expanded, self.lookup).evaluate()?.to_string())
                        }
                        _ => Err(ShellError::Arithmetic(format!("unbalanced parentheses in {}", body))),
                    };
                }
                Some(')') => {
                    depth -= 1;
                    body.push(')');
                }
                Some('(') => {
                    depth += 1;
                    body.push('(');
                }
                Some(c) => body.push(c),
                None => return Err(ShellError::Unterminated("arithmetic expansion")),
            }
        }
    }

    fn bad_substitution(&self, start: usize) -> ShellError {
        let end = self.chars[start..]
            .iter()
            .position(|&c| c == '}')
            .map_or(self.chars.len(), |i| start + i);
        ShellError::BadSubstitution(self.chars[start..end].iter().collect())
    }
}

/// Integer evaluation of `+ - * / %`, unary signs and parentheses over
/// decimal literals and variable names.
struct Arithmetic<'a, L: ?Sized> {
    chars: Vec<char>,
    pos: usize,
    lookup: &'a L,
}

impl<'a, L: Lookup + ?Sized> Arithmetic<'a, L> {
    fn new(input: &str, lookup: &'a L) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            lookup,
        }
    }

    fn evaluate(mut self) -> Result<i64> {
        let value = self.sum()?;
        self.skip_whitespace();
        match self.chars.get(self.pos) {
            None => Ok(value),
            Some(c) => Err(self.error(format!("unexpected {:?}", c))),
        }
    }

    fn error(&self, reason: impl Into<String>) -> ShellError {
        let input: String = self.chars.iter().collect();
        ShellError::Arithmetic(format!("{} in {:?}", reason.into(), input.trim()))
    }

    fn skip_whitespace(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn next_op(&mut self, ops: &[char]) -> Option<char> {
        self.skip_whitespace();
        let c = *self.chars.get(self.pos)?;
        if ops.contains(&c) {
            self.pos += 1;
            Some(c)
        } else {
            None
        }
    }

    fn sum(&mut self) -> Result<i64> {
        let mut value = self.product()?;
        while let Some(op) = self.next_op(&['+', '-']) {
            let rhs = self.product()?;
            value = match op {
                '+' => value.checked_add(rhs),
                _ => value.checked_sub(rhs),
            }
            .ok_or_else(|| self.error("overflow"))?;
        }
        Ok(value)
    }

    fn product(&mut self) -> Result<i64> {
        let mut value = self.unary()?;
        while let Some(op) = self.next_op(&['*', '/', '%']) {
            let rhs = self.unary()?;
            if op != '*' && rhs == 0 {
                return Err(self.error("division by zero"));
            }
            value = match op {
                '*' => value.checked_mul(rhs),
                '/' => value.checked_div(rhs),
                _ => value.checked_rem(rhs),
            }
            .ok_or_else(|| self.error("overflow"))?;
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<i64> {
        match self.next_op(&['+', '-']) {
            Some('-') => self
                .unary()?
                .checked_neg()
                .ok_or_else(|| self.error("overflow")),
            Some(_) => self.unary(),
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<i64> {
        self.skip_whitespace();
        match self.chars.get(self.pos).copied() {
            Some('(') => {
                self.pos += 1;
                let value = self.sum()?;
                match self.next_op(&[')']) {
                    Some(_) => Ok(value),
                    None => Err(self.error("missing )")),
                }
            }
            Some(c) if c.is_ascii_digit() => {
                let digits = self.take_while(|c| c.is_ascii_digit());
                digits
                    .parse()
                    .map_err(|_| self.error(format!("invalid number {}", digits)))
            }
            Some(c) if is_name_start(c) => {
                let name = self.take_while(is_name_char);
                let value = self.lookup.lookup(&name).unwrap_or_default();
                let value = value.trim();
                if value.is_empty() {
                    return Ok(0);
                }
                value
                    .parse()
                    .map_err(|_| self.error(format!("{} is not a number ({})", name, value)))
            }
            Some(c) => Err(self.error(format!("unexpected {:?}", c))),
            None => Err(self.error("missing operand")),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.chars.get(self.pos).is_some_and(|&c| pred(c)) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn expand_with(input: &str, pairs: &[(&str, &str)]) -> Result<String> {
        expand(input, &env(pairs))
    }

    fn parse_with(input: &str, pairs: &[(&str, &str)]) -> Result<Vec<(String, String)>> {
        parse_line(input, &env(pairs))
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        assert_eq!(expand_with("FOO=bar", &[]).unwrap(), "FOO=bar");
        assert_eq!(expand_with("FOO=hello world", &[]).unwrap(), "FOO=hello world");
    }

    #[test]
    fn test_simple_parameters() {
        let vars = [("HOME", "/root"), ("NAME", "db")];
        assert_eq!(expand_with("A=$HOME/x", &vars).unwrap(), "A=/root/x");
        assert_eq!(expand_with("A=${NAME}_backup", &vars).unwrap(), "A=db_backup");
        assert_eq!(expand_with("A=$MISSING", &vars).unwrap(), "A=");
    }

    #[test]
    fn test_quotes_are_removed() {
        let vars = [("X", "1")];
        assert_eq!(expand_with("A='$X'", &vars).unwrap(), "A=$X");
        assert_eq!(expand_with("A=\"$X y\"", &vars).unwrap(), "A=1 y");
        assert_eq!(expand_with("A=\"a\\\"b\"", &vars).unwrap(), "A=a\"b");
        assert_eq!(expand_with("A=\"a\\nb\"", &vars).unwrap(), "A=a\\nb");
        assert_eq!(expand_with("A=\\$X", &vars).unwrap(), "A=$X");
    }

    #[test]
    fn test_words_split_on_unquoted_whitespace() {
        let words = split_words("A=\"x y\"  B='z' C=$V", &env(&[("V", "1 2")])).unwrap();
        let texts: Vec<_> = words.iter().map(Word::text).collect();
        assert_eq!(texts, vec!["A=x y", "B=z", "C=1 2"]);
    }

    #[test]
    fn test_lone_dollar_is_literal() {
        assert_eq!(expand_with("A=cost$", &[]).unwrap(), "A=cost$");
        assert_eq!(expand_with("A=$ b", &[]).unwrap(), "A=$ b");
    }

    #[test]
    fn test_default_and_alternative_forms() {
        let vars = [("SET", "v"), ("EMPTY", "")];
        assert_eq!(expand_with("${UNSET:-d}", &vars).unwrap(), "d");
        assert_eq!(expand_with("${EMPTY:-d}", &vars).unwrap(), "d");
        assert_eq!(expand_with("${EMPTY-d}", &vars).unwrap(), "");
        assert_eq!(expand_with("${SET:-d}", &vars).unwrap(), "v");
        assert_eq!(expand_with("${UNSET:=d}", &vars).unwrap(), "d");
        assert_eq!(expand_with("${SET:+alt}", &vars).unwrap(), "alt");
        assert_eq!(expand_with("${EMPTY:+alt}", &vars).unwrap(), "");
        assert_eq!(expand_with("${EMPTY+alt}", &vars).unwrap(), "alt");
        assert_eq!(expand_with("${UNSET:-$SET/x}", &vars).unwrap(), "v/x");
        assert_eq!(expand_with("${UNSET:-${SET}}", &vars).unwrap(), "v");
        assert_eq!(expand_with("${UNSET:-'a}b'}", &vars).unwrap(), "a}b");
    }

    #[test]
    fn test_length() {
        assert_eq!(expand_with("${#NAME}", &[("NAME", "hello")]).unwrap(), "5");
        assert_eq!(expand_with("${#NAME}", &[]).unwrap(), "0");
    }

    #[test]
    fn test_required_parameter() {
        let err = expand_with("${NEEDED:?must be set}", &[]).unwrap_err();
        assert_eq!(
            err,
            ShellError::ParameterUnset {
                name: "NEEDED".to_string(),
                message: "must be set".to_string()
            }
        );
        assert_eq!(expand_with("${NEEDED?}", &[("NEEDED", "")]).unwrap(), "");
    }

    #[test]
    fn test_special_parameters_are_empty() {
        assert_eq!(expand_with("a$1b", &[]).unwrap(), "ab");
        assert_eq!(expand_with("a${2}b", &[]).unwrap(), "ab");
    }

    #[test]
    fn test_comments() {
        assert_eq!(expand_with("A=b # note", &[]).unwrap(), "A=b");
        assert_eq!(expand_with("A=b#c", &[]).unwrap(), "A=b#c");
        assert_eq!(expand_with("A='b # c'", &[]).unwrap(), "A=b # c");
    }

    #[test]
    fn test_arithmetic() {
        let vars = [("DAYS", "7"), ("BLANK", ""), ("WORD", "seven")];
        assert_eq!(expand_with("$((7*2))", &vars).unwrap(), "14");
        assert_eq!(expand_with("$(( DAYS * 2 + 1 ))", &vars).unwrap(), "15");
        assert_eq!(expand_with("$(($DAYS % 4))", &vars).unwrap(), "3");
        assert_eq!(expand_with("$(( (1 + 2) * -3 ))", &vars).unwrap(), "-9");
        assert_eq!(expand_with("$((10 / 3))", &vars).unwrap(), "3");
        assert_eq!(expand_with("$((UNSET + BLANK + 1))", &vars).unwrap(), "1");
        assert_eq!(expand_with("\"$((1+1)) days\"", &vars).unwrap(), "2 days");

        assert!(matches!(
            expand_with("$((1 / 0))", &vars),
            Err(ShellError::Arithmetic(_))
        ));
        assert!(matches!(
            expand_with("$((WORD + 1))", &vars),
            Err(ShellError::Arithmetic(_))
        ));
        assert!(matches!(expand_with("$((1 +))", &vars), Err(ShellError::Arithmetic(_))));
        assert_eq!(
            expand_with("$((1 + 1", &vars).unwrap_err(),
            ShellError::Unterminated("arithmetic expansion")
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            expand_with("A='open", &[]).unwrap_err(),
            ShellError::Unterminated("single quote")
        );
        assert_eq!(
            expand_with("A=\"open", &[]).unwrap_err(),
            ShellError::Unterminated("double quote")
        );
        assert_eq!(
            expand_with("A=${OPEN", &[]).unwrap_err(),
            ShellError::Unterminated("parameter expansion")
        );
        assert_eq!(
            expand_with("A=$(whoami)", &[]).unwrap_err(),
            ShellError::Unsupported("command substitution")
        );
        assert_eq!(
            expand_with("A=`whoami`", &[]).unwrap_err(),
            ShellError::Unsupported("command substitution")
        );
        assert!(matches!(
            expand_with("A=${X%y}", &[]).unwrap_err(),
            ShellError::BadSubstitution(_)
        ));
        assert!(matches!(
            expand_with("A=${}", &[]).unwrap_err(),
            ShellError::BadSubstitution(_)
        ));
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_with("FOO=bar", &[]).unwrap(), pairs(&[("FOO", "bar")]));
        assert_eq!(parse_with("export FOO=a=b", &[]).unwrap(), pairs(&[("FOO", "a=b")]));
        assert_eq!(parse_with("EMPTY=", &[]).unwrap(), pairs(&[("EMPTY", "")]));
        assert_eq!(parse_with("EMPTY=''", &[]).unwrap(), pairs(&[("EMPTY", "")]));
        assert_eq!(parse_with("   ", &[]).unwrap(), vec![]);
        assert_eq!(parse_with("# only a comment", &[]).unwrap(), vec![]);
    }

    #[test]
    fn test_parse_line_keeps_quoted_whitespace() {
        assert_eq!(
            parse_with("GPG_PASSPHRASE=\"  secret  \"", &[]).unwrap(),
            pairs(&[("GPG_PASSPHRASE", "  secret  ")])
        );
        assert_eq!(
            parse_with("A=' x '\"$PAD\"", &[("PAD", " y ")]).unwrap(),
            pairs(&[("A", " x  y ")])
        );
    }

    #[test]
    fn test_parse_line_multiple_assignments() {
        assert_eq!(
            parse_with("A=\"x\" B=\"y\"", &[]).unwrap(),
            pairs(&[("A", "x"), ("B", "y")])
        );
        assert_eq!(
            parse_with("export A=1 B='two words' C=$V # trailing", &[("V", "$HOME \"q\"")])
                .unwrap(),
            pairs(&[("A", "1"), ("B", "two words"), ("C", "$HOME \"q\"")])
        );
    }

    #[test]
    fn test_parse_line_rejects_malformed() {
        for line in [
            "just words",
            "1ABC=x",
            "=x",
            "exported-key=x",
            "\"A=b\"",
            "A.B=x",
            "A=1 stray",
        ] {
            assert!(
                matches!(parse_with(line, &[]), Err(ShellError::MalformedAssignment(_))),
                "{}",
                line
            );
        }
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn plain_words_expand_to_themselves(s in "[A-Za-z0-9_=/.,:@ -]{0,40}") {
                let empty: HashMap<String, String> = HashMap::new();
                let joined = s.split_whitespace().collect::<Vec<_>>().join(" ");
                prop_assert_eq!(expand(&s, &empty).unwrap(), joined);
            }

            #[test]
            fn single_quotes_protect_everything(s in "[^']{0,40}") {
                let empty: HashMap<String, String> = HashMap::new();
                let quoted = format!("A='{}'", s);
                prop_assert_eq!(expand(&quoted, &empty).unwrap(), format!("A={}", s));
            }

            #[test]
            fn expanded_values_reach_the_assignment_verbatim(value in "\\PC{0,30}") {
                let vars = env(&[("VALUE", value.as_str())]);
                prop_assert_eq!(
                    parse_line("KEY=\"$VALUE\"", &vars).unwrap(),
                    vec![("KEY".to_string(), value.clone())]
                );
            }
        }
    }
}
