//! Лексер заголовка модуля.
//!
//! Токенизирует только то, что нужно директивам `module`, `import` и
//! `include`. Тело модуля парсер забирает как сырой текст, поэтому лексер
//! ленивый: токены читаются по одному, по запросу.

use logos::Logos;

use super::error::ParseError;
use super::token::{Keyword, Span, Spanned, Token};

/// Внутренние токены для logos.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")] // Пропускаем пробелы
#[logos(skip r"#[^\n]*")] // Пропускаем комментарии # до конца строки
enum LogosToken {
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,

    // Ключевые слова (до идентификаторов!)
    #[token("module")]
    Module,
    #[token("import")]
    Import,
    #[token("include")]
    Include,
    #[token("as")]
    As,
    #[token("null")]
    Null,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[regex(r"-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<serde_json::Number>().ok())]
    Number(serde_json::Number),

    // Строки в JSON-нотации; интерполяция `\(...)` в константах недопустима
    #[regex(r#""([^"\\]|\\.)*""#, |lex| serde_json::from_str::<String>(lex.slice()).ok())]
    String(String),

    #[regex(r"\$[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Variable(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*(::[a-zA-Z_][a-zA-Z0-9_]*)*", |lex| lex.slice().to_string())]
    Ident(String),
}

/// Лексер заголовка модуля.
pub struct Lexer<'a> {
    logos: logos::Lexer<'a, LogosToken>,
    source: &'a str,
    peeked: Option<Result<Spanned<Token>, ParseError>>,
}

impl<'a> Lexer<'a> {
    /// Создать новый лексер.
    pub fn new(source: &'a str) -> Self {
        Self {
            logos: LogosToken::lexer(source),
            source,
            peeked: None,
        }
    }

    /// Получить следующий токен.
    pub fn next_token(&mut self) -> Result<Spanned<Token>, ParseError> {
        match self.peeked.take() {
            Some(peeked) => peeked,
            None => self.read_token(),
        }
    }

    /// Посмотреть на следующий токен без его потребления.
    ///
    /// Ошибка лексера тоже запоминается: повторный `peek_token` вернёт её же,
    /// а не следующий за плохим символом токен.
    pub fn peek_token(&mut self) -> Result<&Spanned<Token>, ParseError> {
        let peeked = match self.peeked.take() {
            Some(peeked) => peeked,
            None => self.read_token(),
        };
        match self.peeked.insert(peeked) {
            Ok(token) => Ok(&*token),
            Err(e) => Err(e.clone()),
        }
    }

    /// Исходный текст.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Прочитать токен из logos.
    fn read_token(&mut self) -> Result<Spanned<Token>, ParseError> {
        match self.logos.next() {
            Some(Ok(logos_token)) => {
                let span = Span::new(self.logos.span().start, self.logos.span().end);
                Ok(Spanned::new(convert_token(logos_token), span))
            }
            Some(Err(())) => {
                let span = Span::new(self.logos.span().start, self.logos.span().end);
                Err(ParseError::LexerError { span })
            }
            None => {
                let pos = self.source.len();
                Ok(Spanned::new(Token::Eof, Span::new(pos, pos)))
            }
        }
    }
}

/// Конвертировать внутренний токен logos в публичный Token.
fn convert_token(logos_token: LogosToken) -> Token {
    match logos_token {
        LogosToken::LBrace => Token::LBrace,
        LogosToken::RBrace => Token::RBrace,
        LogosToken::LBracket => Token::LBracket,
        LogosToken::RBracket => Token::RBracket,
        LogosToken::Colon => Token::Colon,
        LogosToken::Semicolon => Token::Semicolon,
        LogosToken::Comma => Token::Comma,
        LogosToken::Module => Token::Keyword(Keyword::Module),
        LogosToken::Import => Token::Keyword(Keyword::Import),
        LogosToken::Include => Token::Keyword(Keyword::Include),
        LogosToken::As => Token::Keyword(Keyword::As),
        LogosToken::Null => Token::Keyword(Keyword::Null),
        LogosToken::True => Token::Keyword(Keyword::True),
        LogosToken::False => Token::Keyword(Keyword::False),
        LogosToken::Number(n) => Token::Number(n),
        LogosToken::String(s) => Token::String(s),
        LogosToken::Variable(s) => Token::Variable(s),
        LogosToken::Ident(s) => Token::Ident(s),
    }
}
