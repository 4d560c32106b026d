//! Ошибки загрузки модулей.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::parser::ParseError;

/// Основной тип `Result` для библиотеки.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Перечисление всех возможных ошибок загрузчика.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Ни один кандидат не найден ни в одном корне поиска.
    #[error("module not found: {0:?}")]
    ModuleNotFound(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    QueryParse(#[from] QueryParseError),

    #[error(transparent)]
    JsonParse(#[from] JsonParseError),
}

impl LoaderError {
    /// Ошибка ввода-вывода с путём.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Текст ошибки с фрагментом исходника, если он есть.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::QueryParse(e) => e.diagnostic(),
            Self::JsonParse(e) => e.diagnostic(),
            other => other.to_string(),
        }
    }
}

/// Синтаксическая ошибка в файле модуля.
#[derive(Error, Debug)]
#[error("invalid query in module {}: {source}", path.display())]
pub struct QueryParseError {
    /// Файл модуля
    pub path: PathBuf,
    /// Полный текст файла
    pub contents: String,
    #[source]
    pub source: ParseError,
}

impl QueryParseError {
    /// Сообщение с указанием строки и столбца ошибки.
    pub fn diagnostic(&self) -> String {
        let (line, column) = line_col(&self.contents, self.source.span().start);
        render_context(&self.path, &self.contents, line, column, &self.to_string())
    }
}

/// Ошибка декодирования JSON-файла данных.
#[derive(Error, Debug)]
#[error("{}: {source}", path.display())]
pub struct JsonParseError {
    /// Файл данных
    pub path: PathBuf,
    /// Байты, прочитанные до ошибки
    pub contents: String,
    #[source]
    pub source: serde_json::Error,
}

impl JsonParseError {
    /// Сообщение с указанием строки и столбца ошибки.
    pub fn diagnostic(&self) -> String {
        render_context(
            &self.path,
            &self.contents,
            self.source.line(),
            self.source.column(),
            &self.to_string(),
        )
    }
}

/// Строка и столбец (с единицы) для байтового смещения.
fn line_col(contents: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(contents.len());
    let before = contents.get(..offset).unwrap_or(contents);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// Сообщение + строка исходника + указатель под столбцом.
fn render_context(path: &Path, contents: &str, line: usize, column: usize, message: &str) -> String {
    let Some(text) = line.checked_sub(1).and_then(|i| contents.lines().nth(i)) else {
        return message.to_string();
    };

    let gutter = line.to_string();
    let pad = " ".repeat(gutter.len());
    let caret = " ".repeat(column.saturating_sub(1));
    format!(
        "{message}\n{pad} --> {}:{line}:{column}\n{pad} |\n{gutter} | {text}\n{pad} | {caret}^",
        path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Span;

    #[test]
    fn test_not_found_message() {
        let err = LoaderError::ModuleNotFound("lib/util".to_string());
        assert_eq!(err.to_string(), r#"module not found: "lib/util""#);
    }

    #[test]
    fn test_line_col() {
        assert_eq!(line_col("abc", 0), (1, 1));
        assert_eq!(line_col("ab\ncd", 4), (2, 2));
        assert_eq!(line_col("ab\n", 3), (2, 1));
        assert_eq!(line_col("ab", 99), (1, 3));
    }

    #[test]
    fn test_query_parse_diagnostic() {
        let err = QueryParseError {
            path: PathBuf::from("/m/a.jq"),
            contents: "import \"x\" as x;\nimport 1 as y;".to_string(),
            source: ParseError::UnexpectedToken {
                span: Span::new(24, 25),
                expected: "module path string".to_string(),
                found: "1".to_string(),
            },
        };
        let text = err.diagnostic();
        assert!(text.starts_with("invalid query in module /m/a.jq: unexpected token"));
        assert!(text.contains("--> /m/a.jq:2:8"));
        assert!(text.ends_with("2 | import 1 as y;\n  |        ^"));
    }

    #[test]
    fn test_json_parse_diagnostic() {
        let source = serde_json::from_str::<serde_json::Value>("{\"a\":}").unwrap_err();
        let err = JsonParseError {
            path: PathBuf::from("d.json"),
            contents: "{\"a\":}".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("d.json: "));
        assert!(err.diagnostic().contains("1 | {\"a\":}"));
    }

    #[test]
    fn test_io_message_has_path() {
        let err = LoaderError::io("/x/y.jq", io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(err.to_string(), "/x/y.jq: denied");
        assert_eq!(err.diagnostic(), err.to_string());
    }
}
