//! Recursive-descent parser for the SavedVariables table-constructor
//! grammar.
//!
//! This is not a general Lua parser. It covers exactly what the game's
//! serializer emits: `nil`, booleans, numbers, quoted strings with
//! backslash escapes (including `\ddd` byte escapes), and nested table
//! constructors with `[int] =`, `["str"] =`, `name =` and positional
//! entries separated by `,` or `;`. `--` line comments are skipped.

use crate::{LuaValue, SavedVarsError, SavedVarsResult};

/// Parse a single value expression (usually a table constructor).
pub fn parse_value(text: &str) -> SavedVarsResult<LuaValue> {
    let mut p = Parser::new(text);
    let value = p.parse_expr()?;
    p.skip_trivia();
    if p.peek().is_some() {
        return Err(p.error_here());
    }
    Ok(value)
}

/// Parse a whole document: a series of `Name = <value>` global
/// assignments, each optionally terminated by `;`.
pub(crate) fn parse_globals(text: &str) -> SavedVarsResult<Vec<(String, LuaValue)>> {
    let mut p = Parser::new(text);
    let mut globals = Vec::new();
    loop {
        p.skip_trivia();
        if p.peek().is_none() {
            break;
        }
        let name = p.parse_ident()?;
        p.skip_trivia();
        p.expect('=')?;
        let value = p.parse_expr()?;
        p.skip_trivia();
        if p.peek() == Some(';') {
            p.bump();
        }
        globals.push((name, value));
    }
    Ok(globals)
}

/// A raw table entry before sequence/map classification.
enum RawEntry {
    Positional(LuaValue),
    IntKey(i64, LuaValue),
    NameKey(String, LuaValue),
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
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
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('-') if self.peek_at(1) == Some('-') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// The upcoming source text, trimmed for the error message.
    fn fragment(&self) -> String {
        let frag: String = self
            .chars
            .iter()
            .skip(self.pos)
            .take_while(|c| **c != '\n')
            .take(24)
            .collect();
        if frag.is_empty() {
            "<eof>".to_string()
        } else {
            frag
        }
    }

    fn error_here(&self) -> SavedVarsError {
        SavedVarsError::parse(self.line, self.fragment())
    }

    fn expect(&mut self, wanted: char) -> SavedVarsResult<()> {
        if self.peek() == Some(wanted) {
            self.bump();
            Ok(())
        } else {
            Err(self.error_here())
        }
    }

    fn parse_expr(&mut self) -> SavedVarsResult<LuaValue> {
        self.skip_trivia();
        match self.peek() {
            Some('{') => self.parse_table(),
            Some('"') | Some('\'') => self.parse_string(),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '.' => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => {
                let start = self.pos;
                let ident = self.parse_ident()?;
                match ident.as_str() {
                    "nil" => Ok(LuaValue::Nil),
                    "true" => Ok(LuaValue::Bool(true)),
                    "false" => Ok(LuaValue::Bool(false)),
                    _ => {
                        self.pos = start;
                        Err(self.error_here())
                    }
                }
            }
            _ => Err(self.error_here()),
        }
    }

    fn parse_ident(&mut self) -> SavedVarsResult<String> {
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => {}
            _ => return Err(self.error_here()),
        }
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Ok(ident)
    }

    fn parse_string(&mut self) -> SavedVarsResult<LuaValue> {
        let quote = self.bump().expect("caller checked quote");
        // Escapes are accumulated as bytes so \ddd sequences covering
        // multi-byte UTF-8 characters decode correctly.
        let mut bytes: Vec<u8> = Vec::new();
        loop {
            let c = match self.bump() {
                Some(c) => c,
                None => return Err(self.error_here()),
            };
            if c == quote {
                break;
            }
            if c != '\\' {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                continue;
            }
            let esc = match self.bump() {
                Some(e) => e,
                None => return Err(self.error_here()),
            };
            match esc {
                'n' => bytes.push(b'\n'),
                't' => bytes.push(b'\t'),
                'r' => bytes.push(b'\r'),
                'a' => bytes.push(0x07),
                'b' => bytes.push(0x08),
                'f' => bytes.push(0x0c),
                'v' => bytes.push(0x0b),
                '\\' => bytes.push(b'\\'),
                '"' => bytes.push(b'"'),
                '\'' => bytes.push(b'\''),
                '\n' => bytes.push(b'\n'),
                d if d.is_ascii_digit() => {
                    let mut num = d.to_digit(10).unwrap();
                    for _ in 0..2 {
                        match self.peek() {
                            Some(n) if n.is_ascii_digit() => {
                                num = num * 10 + n.to_digit(10).unwrap();
                                self.bump();
                            }
                            _ => break,
                        }
                    }
                    if num > 255 {
                        return Err(self.error_here());
                    }
                    bytes.push(num as u8);
                }
                _ => return Err(self.error_here()),
            }
        }
        Ok(LuaValue::Str(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    }

    fn parse_number(&mut self) -> SavedVarsResult<LuaValue> {
        let line = self.line;
        let mut text = String::new();
        if self.peek() == Some('-') {
            text.push('-');
            self.bump();
        }
        let mut prev = ' ';
        while let Some(c) = self.peek() {
            let is_part = c.is_ascii_alphanumeric()
                || c == '.'
                || ((c == '+' || c == '-') && (prev == 'e' || prev == 'E'));
            if !is_part {
                break;
            }
            text.push(c);
            prev = c;
            self.bump();
        }
        if text.is_empty() || text == "-" {
            return Err(self.error_here());
        }
        if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            return i64::from_str_radix(hex, 16)
                .map(LuaValue::Int)
                .map_err(|_| SavedVarsError::parse(line, text.clone()));
        }
        if !text.contains('.') && !text.contains('e') && !text.contains('E') {
            if let Ok(i) = text.parse::<i64>() {
                return Ok(LuaValue::Int(i));
            }
        }
        text.parse::<f64>()
            .map(LuaValue::Float)
            .map_err(|_| SavedVarsError::parse(line, text.clone()))
    }

    fn parse_table(&mut self) -> SavedVarsResult<LuaValue> {
        self.expect('{')?;
        let mut entries: Vec<RawEntry> = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Some('}') => {
                    self.bump();
                    break;
                }
                None => return Err(self.error_here()),
                _ => {}
            }
            entries.push(self.parse_entry()?);
            self.skip_trivia();
            match self.peek() {
                Some(',') | Some(';') => {
                    self.bump();
                }
                Some('}') => {}
                _ => return Err(self.error_here()),
            }
        }
        Ok(classify(entries))
    }

    fn parse_entry(&mut self) -> SavedVarsResult<RawEntry> {
        if self.peek() == Some('[') {
            self.bump();
            let key = self.parse_expr()?;
            self.skip_trivia();
            self.expect(']')?;
            self.skip_trivia();
            self.expect('=')?;
            let value = self.parse_expr()?;
            return match key {
                LuaValue::Int(i) => Ok(RawEntry::IntKey(i, value)),
                LuaValue::Float(f) if f.fract() == 0.0 => {
                    Ok(RawEntry::IntKey(f as i64, value))
                }
                LuaValue::Str(s) => Ok(RawEntry::NameKey(s, value)),
                _ => Err(self.error_here()),
            };
        }

        // `name = value` vs a positional bareword (`true`, `nil`, ...):
        // decided by looking for `=` after the identifier.
        if matches!(self.peek(), Some(c) if c.is_alphabetic() || c == '_') {
            let (save_pos, save_line) = (self.pos, self.line);
            let ident = self.parse_ident()?;
            self.skip_trivia();
            if self.peek() == Some('=') && self.peek_at(1) != Some('=') {
                self.bump();
                let value = self.parse_expr()?;
                return Ok(RawEntry::NameKey(ident, value));
            }
            self.pos = save_pos;
            self.line = save_line;
        }

        Ok(RawEntry::Positional(self.parse_expr()?))
    }
}

/// Classify raw table entries: contiguous 1..=N integer keys become an
/// ordered sequence, everything else a string-keyed map in source order.
fn classify(entries: Vec<RawEntry>) -> LuaValue {
    let mut keyed: Vec<(Key, LuaValue)> = Vec::with_capacity(entries.len());
    let mut next_positional = 1i64;
    for entry in entries {
        let (key, value) = match entry {
            RawEntry::Positional(v) => {
                let k = Key::Int(next_positional);
                next_positional += 1;
                (k, v)
            }
            RawEntry::IntKey(i, v) => (Key::Int(i), v),
            RawEntry::NameKey(n, v) => (Key::Name(n), v),
        };
        // Lua semantics: a repeated key overwrites, keeping first position.
        match keyed.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => keyed.push((key, value)),
        }
    }

    let all_ints = keyed.iter().all(|(k, _)| matches!(k, Key::Int(_)));
    if all_ints {
        let mut indexed: Vec<(i64, LuaValue)> = keyed
            .into_iter()
            .map(|(k, v)| match k {
                Key::Int(i) => (i, v),
                Key::Name(_) => unreachable!("all_ints checked"),
            })
            .collect();
        indexed.sort_by_key(|(i, _)| *i);
        let contiguous = indexed
            .iter()
            .enumerate()
            .all(|(pos, (i, _))| *i == pos as i64 + 1);
        if contiguous {
            return LuaValue::Seq(indexed.into_iter().map(|(_, v)| v).collect());
        }
        return LuaValue::Map(
            indexed
                .into_iter()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
        );
    }

    LuaValue::Map(
        keyed
            .into_iter()
            .map(|(k, v)| {
                let name = match k {
                    Key::Int(i) => i.to_string(),
                    Key::Name(n) => n,
                };
                (name, v)
            })
            .collect(),
    )
}

#[derive(PartialEq)]
enum Key {
    Int(i64),
    Name(String),
}
