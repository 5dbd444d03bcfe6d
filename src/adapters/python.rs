//! Reader for the legacy Python settings module (`config.py`).
//!
//! Only the subset of Python a settings module actually uses is understood:
//! top-level `NAME = <literal>` assignments and `class Name(Bases):` blocks
//! whose bodies hold such assignments. Literals are strings, numbers,
//! booleans, `None`, lists, tuples, dict displays, `dict(k=v)` calls, simple
//! arithmetic and references to names assigned earlier. Any other statement
//! is skipped and the attributes it would have defined are treated as absent.

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Str(String),
    Int(i64),
    Float(f64),
    Punct(&'static str),
    Other(String),
}

/// One physical-or-continued source line, split on top-level `;`.
#[derive(Debug)]
struct LogicalLine {
    number: usize,
    indent: usize,
    statements: Vec<Vec<Token>>,
}

/// Evaluate a settings module into a map of its top-level names. Classes
/// become nested objects holding their own and inherited attributes.
pub fn parse_module(text: &str) -> Result<Map<String, Value>, ParseError> {
    let lines = tokenize(text)?;
    let mut module = Map::new();
    let mut idx = 0;

    while idx < lines.len() {
        let line = &lines[idx];
        idx += 1;

        if line.indent > 0 {
            continue;
        }

        if let Some(header) = line.statements.first().and_then(|first| class_header(first)) {
            let mut attrs = Map::new();
            // Earlier bases win, as in the MRO of a flat hierarchy.
            for base in header.bases.iter().rev() {
                if let Some(Value::Object(inherited)) = module.get(base) {
                    attrs.extend(inherited.clone());
                }
            }

            let inline = line.statements[1..].iter().map(Vec::as_slice);
            for statement in std::iter::once(header.inline_body).chain(inline) {
                let binding = assignment(statement, &[&attrs, &module], line.number);
                bind(&mut attrs, binding);
            }

            let body_indent = lines.get(idx).map(|l| l.indent).filter(|&i| i > 0);
            while idx < lines.len() && lines[idx].indent > 0 {
                let body_line = &lines[idx];
                if Some(body_line.indent) == body_indent {
                    for statement in &body_line.statements {
                        let binding = assignment(statement, &[&attrs, &module], body_line.number);
                        bind(&mut attrs, binding);
                    }
                }
                idx += 1;
            }

            module.insert(header.name, Value::Object(attrs));
            continue;
        }

        for statement in &line.statements {
            let binding = assignment(statement, &[&module], line.number);
            bind(&mut module, binding);
        }
    }

    Ok(module)
}

/// A name bound by an assignment. `None` means the right-hand side could
/// not be evaluated and the name no longer has a known value.
type Binding = (String, Option<Value>);

fn bind(scope: &mut Map<String, Value>, binding: Option<Binding>) {
    match binding {
        Some((name, Some(value))) => {
            scope.insert(name, value);
        }
        Some((name, None)) => {
            scope.remove(&name);
        }
        None => {}
    }
}

/// `NAME = <expr>` evaluated against `scopes`, innermost first.
fn assignment(tokens: &[Token], scopes: &[&Map<String, Value>], line: usize) -> Option<Binding> {
    let (Some(Token::Name(name)), Some(Token::Punct("="))) = (tokens.first(), tokens.get(1)) else {
        return None;
    };

    let mut parser = Parser {
        tokens: &tokens[2..],
        pos: 0,
        scopes,
    };

    match parser.expr() {
        Some(value) if parser.at_end() => Some((name.clone(), Some(value))),
        _ => {
            tracing::debug!("Skipping unsupported assignment to {} on line {}", name, line);
            Some((name.clone(), None))
        }
    }
}

struct ClassHeader<'a> {
    name: String,
    bases: Vec<String>,
    inline_body: &'a [Token],
}

fn class_header(tokens: &[Token]) -> Option<ClassHeader<'_>> {
    let (Some(Token::Name(kw)), Some(Token::Name(name))) = (tokens.first(), tokens.get(1)) else {
        return None;
    };
    if kw != "class" {
        return None;
    }

    let mut bases = Vec::new();
    let mut pos = 2;
    if tokens.get(pos) == Some(&Token::Punct("(")) {
        pos += 1;
        let mut depth = 1;
        while depth > 0 {
            match tokens.get(pos)? {
                Token::Punct("(") => depth += 1,
                Token::Punct(")") => depth -= 1,
                Token::Name(base) if depth == 1 && tokens.get(pos + 1) != Some(&Token::Punct(".")) => {
                    bases.push(base.clone());
                }
                _ => {}
            }
            pos += 1;
        }
    }

    if tokens.get(pos) != Some(&Token::Punct(":")) {
        return None;
    }

    Some(ClassHeader {
        name: name.clone(),
        bases,
        inline_body: &tokens[pos + 1..],
    })
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    scopes: &'a [&'a Map<String, Value>],
}

impl Parser<'_> {
    fn at_end(&self) -> bool {
        self.pos == self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, punct: &str) -> bool {
        if matches!(self.peek(), Some(Token::Punct(p)) if *p == punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> Option<()> {
        self.eat(punct).then_some(())
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        self.scopes.iter().find_map(|scope| scope.get(name).cloned())
    }

    fn expr(&mut self) -> Option<Value> {
        let mut value = self.unary()?;
        loop {
            if self.eat("+") {
                value = add(value, self.unary()?)?;
            } else if self.eat("-") {
                value = subtract(value, self.unary()?)?;
            } else {
                return Some(value);
            }
        }
    }

    fn unary(&mut self) -> Option<Value> {
        if self.eat("-") {
            return negate(self.unary()?);
        }
        if self.eat("+") {
            return self.unary().filter(Value::is_number);
        }
        self.power()
    }

    fn power(&mut self) -> Option<Value> {
        let base = self.atom()?;
        if self.eat("**") {
            let exponent = self.unary()?;
            return pow(base, exponent);
        }
        Some(base)
    }

    fn atom(&mut self) -> Option<Value> {
        match self.next()? {
            Token::Str(mut s) => {
                while let Some(Token::Str(more)) = self.peek() {
                    s.push_str(more);
                    self.pos += 1;
                }
                Some(Value::String(s))
            }
            Token::Int(n) => Some(Value::Number(n.into())),
            Token::Float(f) => Number::from_f64(f).map(Value::Number),
            Token::Punct("[") => Some(Value::Array(self.sequence("]")?)),
            Token::Punct("(") => {
                if self.eat(")") {
                    return Some(Value::Array(Vec::new()));
                }
                let first = self.expr()?;
                if self.eat(")") {
                    return Some(first);
                }
                self.expect(",")?;
                let mut items = vec![first];
                items.extend(self.sequence(")")?);
                Some(Value::Array(items))
            }
            Token::Punct("{") => self.dict_display(),
            Token::Name(name) => self.name(&name),
            _ => None,
        }
    }

    fn name(&mut self, name: &str) -> Option<Value> {
        match name {
            "True" => return Some(Value::Bool(true)),
            "False" => return Some(Value::Bool(false)),
            "None" => return Some(Value::Null),
            "dict" if self.eat("(") => return self.dict_call(),
            _ => {}
        }

        let mut value = self.lookup(name)?;
        while self.eat(".") {
            let Some(Token::Name(attr)) = self.next() else {
                return None;
            };
            value = value.as_object()?.get(&attr)?.clone();
        }
        Some(value)
    }

    /// Comma separated expressions up to `close`, trailing comma allowed.
    fn sequence(&mut self, close: &str) -> Option<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Some(items);
            }
            items.push(self.expr()?);
            if !self.eat(",") {
                self.expect(close)?;
                return Some(items);
            }
        }
    }

    fn dict_display(&mut self) -> Option<Value> {
        let mut map = Map::new();
        loop {
            if self.eat("}") {
                return Some(Value::Object(map));
            }
            let key = json_key(self.expr()?)?;
            self.expect(":")?;
            map.insert(key, self.expr()?);
            if !self.eat(",") {
                self.expect("}")?;
                return Some(Value::Object(map));
            }
        }
    }

    fn dict_call(&mut self) -> Option<Value> {
        let mut map = Map::new();
        loop {
            if self.eat(")") {
                return Some(Value::Object(map));
            }
            let Some(Token::Name(key)) = self.next() else {
                return None;
            };
            self.expect("=")?;
            map.insert(key, self.expr()?);
            if !self.eat(",") {
                self.expect(")")?;
                return Some(Value::Object(map));
            }
        }
    }
}

/// Dict keys as `json.dumps` would write them.
fn json_key(key: Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        _ => None,
    }
}

fn float_value(f: f64) -> Option<Value> {
    Number::from_f64(f).map(Value::Number)
}

fn add(lhs: Value, rhs: Value) -> Option<Value> {
    match (lhs, rhs) {
        (Value::String(mut a), Value::String(b)) => {
            a.push_str(&b);
            Some(Value::String(a))
        }
        (Value::Array(mut a), Value::Array(b)) => {
            a.extend(b);
            Some(Value::Array(a))
        }
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a.checked_add(b).map(Value::from),
            _ => float_value(a.as_f64()? + b.as_f64()?),
        },
        _ => None,
    }
}

fn subtract(lhs: Value, rhs: Value) -> Option<Value> {
    add(lhs, negate(rhs)?)
}

fn negate(value: Value) -> Option<Value> {
    let Value::Number(n) = value else {
        return None;
    };
    match n.as_i64() {
        Some(i) => i.checked_neg().map(Value::from),
        None => float_value(-n.as_f64()?),
    }
}

fn pow(base: Value, exponent: Value) -> Option<Value> {
    let (Value::Number(base), Value::Number(exponent)) = (base, exponent) else {
        return None;
    };
    match (base.as_i64(), exponent.as_i64()) {
        (Some(b), Some(e)) if e >= 0 => {
            let e = u32::try_from(e).ok()?;
            b.checked_pow(e).map(Value::from)
        }
        _ => float_value(base.as_f64()?.powf(exponent.as_f64()?)),
    }
}

fn tokenize(text: &str) -> Result<Vec<LogicalLine>, ParseError> {
    let chars: Vec<char> = text.chars().collect();
    let mut lines = Vec::new();
    let mut statements: Vec<Vec<Token>> = Vec::new();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut start_line = 1;
    let mut indent = 0;
    let mut depth = 0usize;
    let mut at_line_start = true;
    let mut i = 0;

    while i < chars.len() {
        if at_line_start {
            let mut width = 0;
            while let Some(&c) = chars.get(i) {
                match c {
                    ' ' => width += 1,
                    '\t' => width += 8 - width % 8,
                    _ => break,
                }
                i += 1;
            }
            indent = width;
            at_line_start = false;
            continue;
        }

        let c = chars[i];
        if tokens.is_empty() && statements.is_empty() {
            start_line = line;
        }

        match c {
            '\n' => {
                line += 1;
                i += 1;
                if depth == 0 {
                    if !tokens.is_empty() {
                        statements.push(std::mem::take(&mut tokens));
                    }
                    if !statements.is_empty() {
                        lines.push(LogicalLine {
                            number: start_line,
                            indent,
                            statements: std::mem::take(&mut statements),
                        });
                    }
                    at_line_start = true;
                }
            }
            '\\' if chars.get(i + 1) == Some(&'\n') => {
                line += 1;
                i += 2;
            }
            ';' if depth == 0 => {
                if !tokens.is_empty() {
                    statements.push(std::mem::take(&mut tokens));
                }
                i += 1;
            }
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ' ' | '\t' | '\r' | '\x0c' => i += 1,
            '\'' | '"' => {
                let (s, next, newlines) = read_string(&chars, i, false, line)?;
                tokens.push(string_token(s));
                line += newlines;
                i = next;
            }
            c if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) => {
                let start = i;
                while i < chars.len() && is_number_char(&chars, i) {
                    i += 1;
                }
                let lexeme: String = chars[start..i].iter().collect();
                tokens.push(parse_number(&lexeme));
            }
            c if c == '_' || c.is_alphabetic() => {
                let start = i;
                while i < chars.len() && (chars[i] == '_' || chars[i].is_alphanumeric()) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let quoted = matches!(chars.get(i), Some('\'') | Some('"'));
                if quoted && is_string_prefix(&word) {
                    let raw = word.to_ascii_lowercase().contains('r');
                    let (s, next, newlines) = read_string(&chars, i, raw, line)?;
                    tokens.push(string_token(s));
                    line += newlines;
                    i = next;
                } else {
                    tokens.push(Token::Name(word));
                }
            }
            '(' | '[' | '{' => {
                depth += 1;
                tokens.push(Token::Punct(match c {
                    '(' => "(",
                    '[' => "[",
                    _ => "{",
                }));
                i += 1;
            }
            ')' | ']' | '}' => {
                if depth == 0 {
                    return Err(ParseError {
                        line,
                        message: format!("unmatched '{c}'"),
                    });
                }
                depth -= 1;
                tokens.push(Token::Punct(match c {
                    ')' => ")",
                    ']' => "]",
                    _ => "}",
                }));
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Punct("**"));
                i += 2;
            }
            '=' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Other("==".to_string()));
                i += 2;
            }
            '=' | ',' | ':' | '+' | '-' | '.' => {
                tokens.push(Token::Punct(match c {
                    '=' => "=",
                    ',' => ",",
                    ':' => ":",
                    '+' => "+",
                    '-' => "-",
                    _ => ".",
                }));
                i += 1;
            }
            other => {
                tokens.push(Token::Other(other.to_string()));
                i += 1;
            }
        }
    }

    if depth > 0 {
        return Err(ParseError {
            line: start_line,
            message: "unclosed bracket".to_string(),
        });
    }

    if !tokens.is_empty() {
        statements.push(tokens);
    }
    if !statements.is_empty() {
        lines.push(LogicalLine {
            number: start_line,
            indent,
            statements,
        });
    }

    Ok(lines)
}

fn is_string_prefix(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "br" | "rb"
    )
}

fn is_number_char(chars: &[char], i: usize) -> bool {
    let c = chars[i];
    if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
        return true;
    }
    // exponent sign: 1e-5, 2E+3
    (c == '+' || c == '-')
        && i > 0
        && matches!(chars[i - 1], 'e' | 'E')
        && chars.get(i + 1).is_some_and(char::is_ascii_digit)
        && !chars[..i].iter().rev().take_while(|c| c.is_ascii_alphanumeric()).any(|c| matches!(c, 'x' | 'X'))
}

fn parse_number(lexeme: &str) -> Token {
    let cleaned = lexeme.replace('_', "");
    let lower = cleaned.to_ascii_lowercase();

    let radix = [("0x", 16), ("0o", 8), ("0b", 2)]
        .into_iter()
        .find(|(prefix, _)| lower.starts_with(prefix));

    let parsed = match radix {
        Some((prefix, radix)) => i64::from_str_radix(&lower[prefix.len()..], radix).ok().map(Token::Int),
        None if lower.contains(|c| c == '.' || c == 'e') => lower.parse::<f64>().ok().map(Token::Float),
        None => lower.parse::<i64>().ok().map(Token::Int),
    };

    parsed.unwrap_or_else(|| Token::Other(lexeme.to_string()))
}

fn string_token(text: Option<String>) -> Token {
    text.map_or_else(|| Token::Other("<undecodable string>".to_string()), Token::Str)
}

fn escape_error(line: usize, escape: char) -> ParseError {
    ParseError {
        line,
        message: format!("malformed \\{escape} escape in string literal"),
    }
}

/// Read a string literal starting at the opening quote. Returns the decoded
/// text, the index after the closing quote and the newlines consumed. The
/// text is `None` when it holds an escape that is valid Python but cannot be
/// decoded here (`\N{...}`, lone surrogates).
fn read_string(
    chars: &[char],
    start: usize,
    raw: bool,
    line: usize,
) -> Result<(Option<String>, usize, usize), ParseError> {
    let quote = chars[start];
    let triple = chars.get(start + 1) == Some(&quote) && chars.get(start + 2) == Some(&quote);
    let mut i = start + if triple { 3 } else { 1 };
    let mut out = String::new();
    let mut decodable = true;
    let mut newlines = 0;

    let unterminated = || ParseError {
        line,
        message: "unterminated string literal".to_string(),
    };

    loop {
        let c = *chars.get(i).ok_or_else(unterminated)?;

        if c == quote {
            if !triple {
                return Ok((decodable.then_some(out), i + 1, newlines));
            }
            if chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                return Ok((decodable.then_some(out), i + 3, newlines));
            }
        }

        if c == '\n' {
            if !triple {
                return Err(unterminated());
            }
            newlines += 1;
        }

        if c == '\\' {
            let escaped = *chars.get(i + 1).ok_or_else(unterminated)?;
            if escaped == '\n' {
                newlines += 1;
            }
            if raw {
                out.push('\\');
                out.push(escaped);
                i += 2;
                continue;
            }
            i += 2;
            match escaped {
                '\n' => {}
                'a' => out.push('\x07'),
                'b' => out.push('\x08'),
                'f' => out.push('\x0c'),
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                'v' => out.push('\x0b'),
                '\\' | '\'' | '"' => out.push(escaped),
                '0'..='7' => {
                    let mut code = u32::from(escaped) - u32::from('0');
                    for _ in 0..2 {
                        match chars.get(i).and_then(|d| d.to_digit(8)) {
                            Some(digit) => {
                                code = code * 8 + digit;
                                i += 1;
                            }
                            None => break,
                        }
                    }
                    out.push(char::from_u32(code).ok_or_else(|| escape_error(line, escaped))?);
                }
                'x' | 'u' | 'U' => {
                    let len = match escaped {
                        'x' => 2,
                        'u' => 4,
                        _ => 8,
                    };
                    let code = chars
                        .get(i..i + len)
                        .filter(|digits| digits.iter().all(char::is_ascii_hexdigit))
                        .map(|digits| {
                            digits
                                .iter()
                                .fold(0u32, |acc, d| acc * 16 + d.to_digit(16).unwrap_or(0))
                        })
                        .ok_or_else(|| escape_error(line, escaped))?;
                    match char::from_u32(code) {
                        Some(ch) => out.push(ch),
                        None if code <= 0x10FFFF => decodable = false,
                        None => return Err(escape_error(line, escaped)),
                    }
                    i += len;
                }
                'N' => {
                    let end = (chars.get(i) == Some(&'{'))
                        .then(|| chars[i..].iter().position(|&c| c == '}' || c == '\n' || c == quote))
                        .flatten()
                        .map(|offset| i + offset);
                    match end {
                        Some(end) if chars[end] == '}' && end > i + 1 => {
                            decodable = false;
                            i = end + 1;
                        }
                        _ => return Err(escape_error(line, 'N')),
                    }
                }
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
            continue;
        }

        out.push(c);
        i += 1;
    }
}
