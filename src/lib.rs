//! # jqmod
//!
//! Разрешение и загрузка модулей для интерпретатора языка запросов в
//! стиле jq.
//!
//! ## Основные модули
//!
//! - [`modules`] - Загрузчик, резолвер путей, конфигурация
//! - [`parser`] - Разбор заголовка модуля (module/import/include)
//! - [`error`] - Ошибки загрузки с контекстом для диагностики
//!
//! ## Пример
//!
//! ```rust,no_run
//! use jqmod::{ModuleConfig, ModuleLoader};
//!
//! let loader = ModuleLoader::from_config(&ModuleConfig::default());
//! let init = loader.load_init_modules().unwrap();
//! let math = loader.load_module_with_meta("math", None).unwrap();
//! for import in &math.imports {
//!     let loaded = loader.load_import(import).unwrap();
//! }
//! ```

pub mod error;
pub mod modules;
pub mod parser;

// === Re-exports для удобства ===
pub use error::{JsonParseError, LoaderError, LoaderResult, QueryParseError};
pub use modules::{
    Import, ImportKind, ImportMeta, LoadedImport, Module, ModuleConfig, ModuleLoader,
    ModuleResolver,
};
pub use parser::{parse_module, ConstObject, ConstTerm, ParseError};
