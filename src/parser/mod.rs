//! Парсер модулей языка запросов.
//!
//! Разбирает только заголовок модуля — то, что нужно загрузчику:
//!
//! ```text
//! module {name: "util"};                       # метаданные модуля
//! import "lib/math" as math;                   # модуль
//! import "fixtures/users" as $users;           # данные (JSON)
//! include "helpers" {search: "../vendor"};     # подстановка с подсказкой поиска
//! def twice: . * 2;                            # тело — отдаётся компилятору как есть
//! ```
//!
//! # Пример
//!
//! ```rust
//! use jqmod::parser::parse_module;
//!
//! let module = parse_module(r#"import "a" as a {search: "./lib"}; a::f"#).unwrap();
//! assert_eq!(module.imports.len(), 1);
//! assert_eq!(module.body, "a::f");
//! ```

pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use error::ParseError;
pub use lexer::Lexer;
pub use parser::{ConstObject, ConstObjectKeyVal, ConstTerm, Parser};
pub use token::{Keyword, Span, Spanned, Token};

use crate::modules::Module;

/// Парсит исходный текст модуля.
///
/// Ошибки не содержат пути к файлу — контекст добавляет загрузчик.
pub fn parse_module(source: &str) -> Result<Module, ParseError> {
    Parser::new(source).parse_module()
}
