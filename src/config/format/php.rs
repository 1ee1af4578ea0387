//! PHP 配置文件读取器 (简单原则：透明的文本解析，绝不执行文件内容)
//!
//! 只识别配置文件里常见的写法：
//! - `$config['key'] = <值>;`
//! - `$config['plugins'][] = '<插件>';`（只记录出现过，不计入列表）
//! - `$config = array(...)` / `$config = [...]`
//!
//! 语句按源码顺序生效，后出现的赋值覆盖先前的值。

use std::collections::HashMap;
use std::ops::Range;

/// 词法单元
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `$name`（不含 `$`）
    Variable(String),
    Ident(String),
    Str(String),
    Number(String),
    /// `=>`
    Arrow,
    /// `==`、`===` 等比较运算符
    Op(String),
    Punct(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 在源文本中的字节偏移
    pub start: usize,
}

/// 词法分析结果
#[derive(Debug, Default)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    /// 注释和 PHP 标签之外文本所占的字节区间
    pub inert: Vec<Range<usize>>,
}

impl Lexed {
    /// 偏移是否落在注释或 HTML 区域内
    pub fn is_inert(&self, offset: usize) -> bool {
        self.inert.iter().any(|r| r.contains(&offset))
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

fn starts_with_ci(bytes: &[u8], pos: usize, pat: &str) -> bool {
    bytes.len() >= pos + pat.len() && bytes[pos..pos + pat.len()].eq_ignore_ascii_case(pat.as_bytes())
}

/// 对 PHP 源码做词法分析
pub fn tokenize(src: &str) -> Lexed {
    let bytes = src.as_bytes();
    let mut lexed = Lexed::default();
    let mut pos = 0;
    let mut in_php = false;

    while pos < bytes.len() {
        if !in_php {
            // HTML 模式：寻找开始标签
            let html_start = pos;
            while pos < bytes.len() && !(bytes[pos] == b'<' && bytes.get(pos + 1) == Some(&b'?')) {
                pos += 1;
            }
            if pos > html_start {
                lexed.inert.push(html_start..pos);
            }
            if pos >= bytes.len() {
                break;
            }
            if starts_with_ci(bytes, pos, "<?php") {
                pos += 5;
            } else if starts_with_ci(bytes, pos, "<?=") {
                pos += 3;
            } else {
                pos += 2;
            }
            in_php = true;
            continue;
        }

        let b = bytes[pos];
        match b {
            b' ' | b'\t' | b'\r' | b'\n' => pos += 1,
            b'?' if bytes.get(pos + 1) == Some(&b'>') => {
                // 结束标签隐含一个分号
                lexed.tokens.push(Token {
                    kind: TokenKind::Punct(';'),
                    start: pos,
                });
                pos += 2;
                in_php = false;
            }
            b'#' if bytes.get(pos + 1) != Some(&b'[') => {
                pos = skip_line_comment(bytes, pos, &mut lexed);
            }
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                pos = skip_line_comment(bytes, pos, &mut lexed);
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                let start = pos;
                pos += 2;
                while pos < bytes.len() && !(bytes[pos] == b'*' && bytes.get(pos + 1) == Some(&b'/')) {
                    pos += 1;
                }
                pos = (pos + 2).min(bytes.len());
                lexed.inert.push(start..pos);
            }
            b'\'' | b'"' => {
                let start = pos;
                let (value, end) = read_string(src, pos);
                lexed.tokens.push(Token {
                    kind: TokenKind::Str(value),
                    start,
                });
                pos = end;
            }
            b'$' if bytes.get(pos + 1).is_some_and(|&n| is_ident_byte(n) && !n.is_ascii_digit()) => {
                let start = pos;
                pos += 1;
                while pos < bytes.len() && is_ident_byte(bytes[pos]) {
                    pos += 1;
                }
                lexed.tokens.push(Token {
                    kind: TokenKind::Variable(src[start + 1..pos].to_string()),
                    start,
                });
            }
            b'0'..=b'9' => {
                let start = pos;
                while pos < bytes.len() && (is_ident_byte(bytes[pos]) || bytes[pos] == b'.') {
                    pos += 1;
                }
                lexed.tokens.push(Token {
                    kind: TokenKind::Number(src[start..pos].to_string()),
                    start,
                });
            }
            _ if is_ident_byte(b) || b == b'\\' => {
                let start = pos;
                while pos < bytes.len() && (is_ident_byte(bytes[pos]) || bytes[pos] == b'\\') {
                    pos += 1;
                }
                lexed.tokens.push(Token {
                    kind: TokenKind::Ident(src[start..pos].to_string()),
                    start,
                });
            }
            b'=' if bytes.get(pos + 1) == Some(&b'>') => {
                lexed.tokens.push(Token {
                    kind: TokenKind::Arrow,
                    start: pos,
                });
                pos += 2;
            }
            b'=' | b'!' | b'<' | b'>' if bytes.get(pos + 1) == Some(&b'=') => {
                let start = pos;
                pos += 2;
                while pos < bytes.len() && bytes[pos] == b'=' {
                    pos += 1;
                }
                lexed.tokens.push(Token {
                    kind: TokenKind::Op(src[start..pos].to_string()),
                    start,
                });
            }
            _ => {
                // 非 ASCII 字节已由标识符分支处理，这里只剩单字节标点
                lexed.tokens.push(Token {
                    kind: TokenKind::Punct(b as char),
                    start: pos,
                });
                pos += 1;
            }
        }
    }

    lexed
}

/// 跳过 `//` 或 `#` 注释，注释在换行或 `?>` 处结束
fn skip_line_comment(bytes: &[u8], mut pos: usize, lexed: &mut Lexed) -> usize {
    let start = pos;
    while pos < bytes.len() && bytes[pos] != b'\n' && !(bytes[pos] == b'?' && bytes.get(pos + 1) == Some(&b'>')) {
        pos += 1;
    }
    lexed.inert.push(start..pos);
    pos
}

/// 读取单/双引号字符串，返回 (值, 结束位置)
fn read_string(src: &str, start: usize) -> (String, usize) {
    let bytes = src.as_bytes();
    let quote = bytes[start];
    let mut pos = start + 1;
    let mut value = String::new();
    let mut chunk_start = pos;

    while pos < bytes.len() && bytes[pos] != quote {
        if bytes[pos] == b'\\' && pos + 1 < bytes.len() {
            value.push_str(&src[chunk_start..pos]);
            let next = bytes[pos + 1];
            let escaped = if quote == b'\'' {
                match next {
                    b'\'' => Some('\''),
                    b'\\' => Some('\\'),
                    _ => None,
                }
            } else {
                match next {
                    b'n' => Some('\n'),
                    b't' => Some('\t'),
                    b'r' => Some('\r'),
                    b'v' => Some('\x0B'),
                    b'e' => Some('\x1B'),
                    b'f' => Some('\x0C'),
                    b'\\' => Some('\\'),
                    b'"' => Some('"'),
                    b'$' => Some('$'),
                    _ => None,
                }
            };
            match escaped {
                Some(c) => {
                    value.push(c);
                    pos += 2;
                }
                None => {
                    // 未知转义保留反斜杠，下一个字符作为普通内容
                    value.push('\\');
                    pos += 1;
                }
            }
            chunk_start = pos;
            continue;
        }
        pos += 1;
    }

    value.push_str(&src[chunk_start..pos.min(bytes.len())]);
    (value, (pos + 1).min(bytes.len()))
}

/// 字面量值
#[derive(Debug, Clone, PartialEq)]
pub enum PhpValue {
    Str(String),
    Number(String),
    Bool(bool),
    Null,
    /// 有序条目：(键, 值)，未写键的条目键为 None
    Array(Vec<(Option<PhpValue>, PhpValue)>),
    /// 无法静态求值的表达式
    Other,
}

impl PhpValue {
    /// PHP `empty()` 语义
    pub fn is_empty(&self) -> bool {
        match self {
            PhpValue::Str(s) => s.is_empty() || s == "0",
            PhpValue::Number(n) => n.trim_start_matches(['0', '.']).is_empty(),
            PhpValue::Bool(b) => !b,
            PhpValue::Null => true,
            PhpValue::Array(entries) => entries.is_empty(),
            PhpValue::Other => false,
        }
    }

    /// 标量转字符串，非标量返回 None
    pub fn as_scalar(&self) -> Option<String> {
        match self {
            PhpValue::Str(s) => Some(s.clone()),
            PhpValue::Number(n) => Some(n.clone()),
            PhpValue::Bool(true) => Some("1".to_string()),
            _ => None,
        }
    }

    /// 按字符串键查找数组条目
    pub fn get(&self, key: &str) -> Option<&PhpValue> {
        match self {
            PhpValue::Array(entries) => entries
                .iter()
                .rev()
                .find(|(k, _)| k.as_ref().and_then(PhpValue::as_scalar).as_deref() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// `!empty($v) ? (array) $v : array()`，只保留标量元素
    pub fn to_name_list(&self) -> Vec<String> {
        if self.is_empty() {
            return Vec::new();
        }
        match self {
            PhpValue::Array(entries) => entries.iter().filter_map(|(_, v)| v.as_scalar()).collect(),
            other => other.as_scalar().into_iter().collect(),
        }
    }
}

/// 值解析器：在一个 token 切片上工作
struct ValueParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> ValueParser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn is_punct(&self, c: char) -> bool {
        matches!(self.peek(), Some(TokenKind::Punct(p)) if *p == c)
    }

    /// 解析完整表达式；有多余 token 时视为无法求值
    fn parse_complete(mut self) -> PhpValue {
        let value = self.parse_value();
        if self.pos < self.tokens.len() {
            PhpValue::Other
        } else {
            value
        }
    }

    fn parse_value(&mut self) -> PhpValue {
        let Some(kind) = self.peek().cloned() else {
            return PhpValue::Other;
        };
        match kind {
            TokenKind::Str(s) => {
                self.pos += 1;
                PhpValue::Str(s)
            }
            TokenKind::Number(n) => {
                self.pos += 1;
                PhpValue::Number(n)
            }
            TokenKind::Punct('-') => {
                self.pos += 1;
                match self.peek().cloned() {
                    Some(TokenKind::Number(n)) => {
                        self.pos += 1;
                        PhpValue::Number(format!("-{n}"))
                    }
                    _ => PhpValue::Other,
                }
            }
            TokenKind::Punct('[') => {
                self.pos += 1;
                self.parse_array(']')
            }
            TokenKind::Ident(ident) => {
                self.pos += 1;
                match ident.to_ascii_lowercase().as_str() {
                    "array" if self.is_punct('(') => {
                        self.pos += 1;
                        self.parse_array(')')
                    }
                    "true" => PhpValue::Bool(true),
                    "false" => PhpValue::Bool(false),
                    "null" => PhpValue::Null,
                    _ => {
                        self.skip_expression();
                        PhpValue::Other
                    }
                }
            }
            _ => {
                self.skip_expression();
                PhpValue::Other
            }
        }
    }

    /// 解析数组字面量（开括号已消费）
    fn parse_array(&mut self, close: char) -> PhpValue {
        let mut entries = Vec::new();
        loop {
            if self.peek().is_none() {
                return PhpValue::Other;
            }
            if self.is_punct(close) {
                self.pos += 1;
                return PhpValue::Array(entries);
            }

            let before = self.pos;
            let first = self.parse_value();
            let entry = if matches!(self.peek(), Some(TokenKind::Arrow)) {
                self.pos += 1;
                (Some(first), self.parse_value())
            } else {
                (None, first)
            };

            if self.is_punct(',') {
                self.pos += 1;
            } else if !self.is_punct(close) {
                // 元素是复杂表达式：跳到下一个分隔符
                self.skip_expression();
                if self.pos == before {
                    // 不配对的闭括号，丢弃以保证前进
                    self.pos += 1;
                }
                entries.push((entry.0, PhpValue::Other));
                if self.is_punct(',') {
                    self.pos += 1;
                }
                continue;
            }
            entries.push(entry);
        }
    }

    /// 跳过当前层级的表达式，停在 `,` 或未配对的闭括号处
    fn skip_expression(&mut self) {
        let mut depth = 0usize;
        while let Some(kind) = self.peek() {
            match kind {
                TokenKind::Punct('(' | '[' | '{') => depth += 1,
                TokenKind::Punct(')' | ']' | '}') => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                TokenKind::Punct(',') | TokenKind::Arrow if depth == 0 => return,
                _ => {}
            }
            self.pos += 1;
        }
    }
}

/// 单个配置变量的求值状态
#[derive(Debug, Clone, Default)]
pub struct VariableState {
    /// 是否持有非空数组（PHP `!empty($var)`）
    pub non_empty: bool,
    /// `plugins` 键的当前值
    pub plugins: Option<PhpValue>,
    /// 是否出现过 `$var['plugins'][] = …` 追加写法
    pub appended: bool,
}

/// 配置文件快照
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    vars: HashMap<String, VariableState>,
}

impl ConfigSnapshot {
    /// 变量是否持有非空数组
    pub fn holds_value(&self, var: &str) -> bool {
        self.vars.get(var).is_some_and(|s| s.non_empty)
    }

    /// 是否通过 `[]` 向 `plugins` 追加过条目（这些条目不计入列表）
    pub fn has_appended(&self, var: &str) -> bool {
        self.vars.get(var).is_some_and(|s| s.appended)
    }

    /// 变量下的 `plugins` 列表（缺失或为空时返回空列表）
    pub fn plugins(&self, var: &str) -> Vec<String> {
        self.vars
            .get(var)
            .and_then(|s| s.plugins.as_ref())
            .map(PhpValue::to_name_list)
            .unwrap_or_default()
    }
}

/// PHP 配置读取器
pub struct PhpConfigReader;

impl PhpConfigReader {
    /// 读取文件中对给定变量的赋值
    ///
    /// 无法识别的语句被忽略，读取永不失败。
    pub fn read(content: &str, variables: &[&str]) -> ConfigSnapshot {
        let lexed = tokenize(content);
        let mut snapshot = ConfigSnapshot::default();

        for statement in split_statements(&lexed.tokens) {
            let Some(Token {
                kind: TokenKind::Variable(name),
                ..
            }) = statement.first()
            else {
                continue;
            };
            if !variables.contains(&name.as_str()) {
                continue;
            }
            apply_assignment(&mut snapshot, name, &statement[1..]);
        }

        snapshot
    }
}

/// 按 `;` 与花括号切分语句（只在括号深度为 0 时切分）
fn split_statements(tokens: &[Token]) -> Vec<&[Token]> {
    let mut statements = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Punct('(' | '[') => depth += 1,
            TokenKind::Punct(')' | ']') => depth = depth.saturating_sub(1),
            TokenKind::Punct(';' | '{' | '}') if depth == 0 => {
                if i > start {
                    statements.push(&tokens[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < tokens.len() {
        statements.push(&tokens[start..]);
    }
    statements
}

/// 下标访问：`['key']` 或 `[]`
enum Index {
    Key(String),
    Append,
}

fn apply_assignment(snapshot: &mut ConfigSnapshot, name: &str, rest: &[Token]) {
    let mut indexes = Vec::new();
    let mut pos = 0;

    // 解析下标链
    while matches!(rest.get(pos).map(|t| &t.kind), Some(TokenKind::Punct('['))) {
        match (rest.get(pos + 1).map(|t| &t.kind), rest.get(pos + 2).map(|t| &t.kind)) {
            (Some(TokenKind::Punct(']')), _) => {
                indexes.push(Index::Append);
                pos += 2;
            }
            (Some(TokenKind::Str(key) | TokenKind::Number(key)), Some(TokenKind::Punct(']'))) => {
                indexes.push(Index::Key(key.clone()));
                pos += 3;
            }
            _ => return,
        }
    }

    if !matches!(rest.get(pos).map(|t| &t.kind), Some(TokenKind::Punct('='))) {
        return;
    }
    let value = ValueParser::new(&rest[pos + 1..]).parse_complete();
    let state = snapshot.vars.entry(name.to_string()).or_default();

    match indexes.as_slice() {
        [] => {
            state.non_empty = !value.is_empty();
            state.plugins = value.get("plugins").cloned();
        }
        // 追加的条目只能由它自己的语句移除，列表只反映可改写的那一处赋值
        [Index::Key(key), Index::Append] if key == "plugins" => {
            state.non_empty = true;
            state.appended = true;
        }
        [Index::Key(key)] if key == "plugins" => {
            state.non_empty = true;
            state.plugins = Some(value);
        }
        _ => state.non_empty = true,
    }
}
