//! Парсер заголовка модуля: директивы и константные метаданные.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Number, Value};

use super::error::ParseError;
use super::lexer::Lexer;
use super::token::{Keyword, Span, Spanned, Token};
use crate::modules::{Import, ImportKind, Module};

/// Константный терм — значение в метаданных модуля или импорта.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum ConstTerm {
    /// Объект `{key: value, ...}`.
    Object(ConstObject),
    /// Массив `[a, b, ...]`.
    Array(Vec<ConstTerm>),
    /// Число.
    Number(Number),
    /// Строка (значение, без кавычек).
    String(String),
    /// `true` / `false`.
    Bool(bool),
    /// `null`.
    Null,
}

impl ConstTerm {
    /// Преобразовать в JSON-значение.
    pub fn to_value(&self) -> Value {
        match self {
            ConstTerm::Object(obj) => Value::Object(obj.to_map()),
            ConstTerm::Array(items) => Value::Array(items.iter().map(ConstTerm::to_value).collect()),
            ConstTerm::Number(n) => Value::Number(n.clone()),
            ConstTerm::String(s) => Value::String(s.clone()),
            ConstTerm::Bool(b) => Value::Bool(*b),
            ConstTerm::Null => Value::Null,
        }
    }

    /// Получить строку, если терм строковый.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstTerm::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ConstTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstTerm::Object(obj) => write!(f, "{}", obj),
            ConstTerm::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            ConstTerm::Number(n) => write!(f, "{}", n),
            ConstTerm::String(s) => write!(f, "{}", quote(s)),
            ConstTerm::Bool(b) => write!(f, "{}", b),
            ConstTerm::Null => write!(f, "null"),
        }
    }
}

/// Пара ключ/значение константного объекта.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstObjectKeyVal {
    pub key: String,
    pub val: ConstTerm,
}

/// Константный объект. Порядок пар сохраняется как в исходнике.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConstObject {
    pub key_vals: Vec<ConstObjectKeyVal>,
}

impl ConstObject {
    /// Создать пустой объект.
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавить пару в конец.
    pub fn push(&mut self, key: impl Into<String>, val: ConstTerm) {
        self.key_vals.push(ConstObjectKeyVal {
            key: key.into(),
            val,
        });
    }

    /// Значение по ключу. При повторах побеждает последнее.
    pub fn get(&self, key: &str) -> Option<&ConstTerm> {
        self.key_vals
            .iter()
            .rev()
            .find(|kv| kv.key == key)
            .map(|kv| &kv.val)
    }

    /// Преобразовать в JSON-объект.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for kv in &self.key_vals {
            map.insert(kv.key.clone(), kv.val.to_value());
        }
        map
    }

    pub fn is_empty(&self) -> bool {
        self.key_vals.is_empty()
    }
}

impl fmt::Display for ConstObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, kv) in self.key_vals.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if is_bare_key(&kv.key) {
                write!(f, "{}: {}", kv.key, kv.val)?;
            } else {
                write!(f, "{}: {}", quote(&kv.key), kv.val)?;
            }
        }
        write!(f, "}}")
    }
}

impl Serialize for ConstObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.key_vals.len()))?;
        for kv in &self.key_vals {
            map.serialize_entry(&kv.key, &kv.val)?;
        }
        map.end()
    }
}

/// Закавычить строку в JSON-нотации.
pub(crate) fn quote(s: &str) -> String {
    Value::from(s).to_string()
}

fn is_bare_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Парсер заголовка модуля.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    /// Создать новый парсер.
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
        }
    }

    /// Распарсить модуль: необязательную директиву `module`, затем
    /// директивы `import`/`include`. Всё после них — тело модуля.
    pub fn parse_module(&mut self) -> Result<Module, ParseError> {
        let mut module = Module::default();

        if matches!(self.lexer.peek_token(), Ok(t) if t.value == Token::Keyword(Keyword::Module)) {
            self.lexer.next_token()?;
            module.meta = Some(self.parse_const_object()?);
            self.expect(Token::Semicolon, "';'")?;
        }

        let body_start = loop {
            let next = match self.lexer.peek_token() {
                Ok(token) => token.clone(),
                // Тело может начинаться с любого символа языка запросов
                Err(ParseError::LexerError { span }) => break span.start,
                Err(e) => return Err(e),
            };

            match next.value {
                Token::Keyword(Keyword::Import) | Token::Keyword(Keyword::Include) => {
                    module.imports.push(self.parse_import()?);
                }
                Token::Keyword(Keyword::Module) => {
                    return Err(ParseError::unexpected_token(
                        next.span,
                        "import, include or query",
                        &next.value,
                    ));
                }
                _ => break next.span.start,
            }
        };

        module.body = self.lexer.source()[body_start..].to_string();
        Ok(module)
    }

    /// Распарсить директиву `import ... ;` или `include ... ;`.
    pub fn parse_import(&mut self) -> Result<Import, ParseError> {
        let keyword = self.lexer.next_token()?;
        let is_include = match keyword.value {
            Token::Keyword(Keyword::Include) => true,
            Token::Keyword(Keyword::Import) => false,
            other => {
                return Err(ParseError::unexpected_token(
                    keyword.span,
                    "import or include",
                    &other,
                ))
            }
        };

        let path_token = self.lexer.next_token()?;
        let path = match path_token.value {
            Token::String(s) => s,
            other => return Err(self.unexpected(path_token.span, "module path string", other)),
        };

        let kind = if is_include {
            ImportKind::Include
        } else {
            self.expect(Token::Keyword(Keyword::As), "'as'")?;
            let alias = self.lexer.next_token()?;
            match alias.value {
                Token::Ident(name) => ImportKind::Module { alias: name },
                Token::Variable(name) => ImportKind::Data { alias: name },
                other => return Err(self.unexpected(alias.span, "import alias", other)),
            }
        };

        let meta = if self.lexer.peek_token()?.value == Token::LBrace {
            Some(self.parse_const_object()?)
        } else {
            None
        };

        let end = self.expect(Token::Semicolon, "';'")?;

        Ok(Import {
            path,
            kind,
            meta,
            span: keyword.span.merge(end),
        })
    }

    /// Распарсить константный объект `{...}`.
    pub fn parse_const_object(&mut self) -> Result<ConstObject, ParseError> {
        let open = self.expect(Token::LBrace, "'{'")?;
        self.parse_object_body(open)
    }

    /// Распарсить константный терм.
    pub fn parse_const_term(&mut self) -> Result<ConstTerm, ParseError> {
        let token = self.lexer.next_token()?;
        match token.value {
            Token::LBrace => Ok(ConstTerm::Object(self.parse_object_body(token.span)?)),
            Token::LBracket => self.parse_array_body(token.span),
            Token::Number(n) => Ok(ConstTerm::Number(n)),
            Token::String(s) => Ok(ConstTerm::String(s)),
            Token::Keyword(Keyword::Null) => Ok(ConstTerm::Null),
            Token::Keyword(Keyword::True) => Ok(ConstTerm::Bool(true)),
            Token::Keyword(Keyword::False) => Ok(ConstTerm::Bool(false)),
            other => Err(self.unexpected(token.span, "constant", other)),
        }
    }

    /// Тело объекта после `{`.
    fn parse_object_body(&mut self, open: Span) -> Result<ConstObject, ParseError> {
        let mut obj = ConstObject::new();

        if self.lexer.peek_token()?.value == Token::RBrace {
            self.lexer.next_token()?;
            return Ok(obj);
        }

        loop {
            let key_token = self.lexer.next_token()?;
            let key = match key_token.value {
                Token::Ident(s) | Token::String(s) => s,
                Token::Keyword(k) => k.as_str().to_string(),
                Token::Eof => return Err(ParseError::Unclosed { span: open, open: '{' }),
                other => return Err(self.unexpected(key_token.span, "object key", other)),
            };
            self.expect(Token::Colon, "':'")?;
            let val = self.parse_const_term()?;
            obj.push(key, val);

            let sep = self.lexer.next_token()?;
            match sep.value {
                Token::Comma => continue,
                Token::RBrace => return Ok(obj),
                Token::Eof => return Err(ParseError::Unclosed { span: open, open: '{' }),
                other => return Err(ParseError::unexpected_token(sep.span, "',' or '}'", &other)),
            }
        }
    }

    /// Тело массива после `[`.
    fn parse_array_body(&mut self, open: Span) -> Result<ConstTerm, ParseError> {
        let mut items = Vec::new();

        if self.lexer.peek_token()?.value == Token::RBracket {
            self.lexer.next_token()?;
            return Ok(ConstTerm::Array(items));
        }

        loop {
            if self.lexer.peek_token()?.value == Token::Eof {
                return Err(ParseError::Unclosed { span: open, open: '[' });
            }
            items.push(self.parse_const_term()?);

            let sep = self.lexer.next_token()?;
            match sep.value {
                Token::Comma => continue,
                Token::RBracket => return Ok(ConstTerm::Array(items)),
                Token::Eof => return Err(ParseError::Unclosed { span: open, open: '[' }),
                other => return Err(ParseError::unexpected_token(sep.span, "',' or ']'", &other)),
            }
        }
    }

    /// Потребовать конкретный токен, вернуть его позицию.
    fn expect(&mut self, expected: Token, what: &str) -> Result<Span, ParseError> {
        let Spanned { value, span } = self.lexer.next_token()?;
        if value == expected {
            Ok(span)
        } else {
            Err(self.unexpected(span, what, value))
        }
    }

    fn unexpected(&self, span: Span, expected: &str, found: Token) -> ParseError {
        if found == Token::Eof {
            ParseError::unexpected_eof(span, format!("expected {}", expected))
        } else {
            ParseError::unexpected_token(span, expected, &found)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_module() {
        let module = Parser::new("").parse_module().unwrap();
        assert!(module.meta.is_none());
        assert!(module.imports.is_empty());
        assert_eq!(module.body, "");
    }

    #[test]
    fn test_parse_module_directive() {
        let module = Parser::new(r#"module {name: "util", version: 2}; def f: .;"#)
            .parse_module()
            .unwrap();
        let meta = module.meta.unwrap();
        assert_eq!(meta.get("name").and_then(ConstTerm::as_str), Some("util"));
        assert_eq!(module.body, "def f: .;");
    }

    #[test]
    fn test_parse_imports() {
        let source = r#"
import "lib/a" as a;
import "data" as $data {search: "./fixtures"};
include "helpers" {};
.foo | a::bar
"#;
        let module = Parser::new(source).parse_module().unwrap();
        assert_eq!(module.imports.len(), 3);

        assert_eq!(module.imports[0].path, "lib/a");
        assert_eq!(
            module.imports[0].kind,
            ImportKind::Module {
                alias: "a".to_string()
            }
        );
        assert!(module.imports[0].meta.is_none());

        assert_eq!(
            module.imports[1].kind,
            ImportKind::Data {
                alias: "data".to_string()
            }
        );
        let meta = module.imports[1].meta.as_ref().unwrap();
        assert_eq!(meta.get("search"), Some(&ConstTerm::String("./fixtures".to_string())));

        assert_eq!(module.imports[2].kind, ImportKind::Include);
        assert!(module.imports[2].meta.as_ref().unwrap().is_empty());

        assert_eq!(module.body, ".foo | a::bar\n");
    }

    #[test]
    fn test_parse_nested_const_terms() {
        let mut parser = Parser::new(r#"{a: [1, "x", null], "b c": {d: true}, if: false}"#);
        let obj = parser.parse_const_object().unwrap();
        assert_eq!(
            serde_json::Value::Object(obj.to_map()),
            serde_json::json!({"a": [1, "x", null], "b c": {"d": true}, "if": false})
        );
    }

    #[test]
    fn test_const_object_display() {
        let mut obj = ConstObject::new();
        obj.push("search", ConstTerm::String("../lib".to_string()));
        obj.push("$$path", ConstTerm::String("/a/b.jq".to_string()));
        assert_eq!(obj.to_string(), r#"{search: "../lib", "$$path": "/a/b.jq"}"#);
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let mut obj = ConstObject::new();
        obj.push("k", ConstTerm::Number(1.into()));
        obj.push("k", ConstTerm::Number(2.into()));
        assert_eq!(obj.get("k"), Some(&ConstTerm::Number(2.into())));
        assert_eq!(obj.to_map()["k"], serde_json::json!(2));
    }

    #[test]
    fn test_missing_semicolon() {
        let err = Parser::new(r#"import "a" as a"#).parse_module().unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_non_constant_metadata() {
        let err = Parser::new(r#"import "a" as a {search: $x};"#)
            .parse_module()
            .unwrap_err();
        match err {
            ParseError::UnexpectedToken { expected, .. } => assert_eq!(expected, "constant"),
            other => panic!("Expected UnexpectedToken, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_object() {
        let err = Parser::new(r#"include "a" {search: "x","#)
            .parse_module()
            .unwrap_err();
        assert!(matches!(err, ParseError::Unclosed { open: '{', .. }));
    }

    #[test]
    fn test_module_directive_after_import() {
        let err = Parser::new(r#"import "a" as a; module {};"#)
            .parse_module()
            .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }
}
