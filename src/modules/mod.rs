//! Система модулей языка запросов.
//!
//! Загрузчик находит импортируемые модули и файлы данных по списку корней
//! поиска, разбирает их и возвращает компилятору.
//!
//! ## Синтаксис
//!
//! ```text
//! import "math" as math;                    # ~/.jq/math.jq или ~/.jq/math/math.jq
//! import "users" as $users;                 # users.json, все значения файла
//! include "helpers" {search: "./vendor"};   # сначала ищем рядом с текущим файлом
//! ```
//!
//! Файл с именем `.jq`, указанный прямо в списке путей, загружается при
//! старте как init-модуль.

mod loader;
mod metadata;
mod module;
mod resolver;

pub use loader::{LoadedImport, ModuleLoader};
pub use metadata::{ImportMeta, IMPORTER_PATH_KEY, SEARCH_KEY};
pub use module::{Import, ImportKind, Module};
pub use resolver::{clean_path, join_under, ModuleResolver};

use std::env;
use std::path::{Path, PathBuf};

/// Зарезервированное имя init-модуля.
pub const INIT_FILE_NAME: &str = ".jq";

/// Расширение модулей.
pub const MODULE_EXTENSION: &str = ".jq";

/// Расширение файлов данных.
pub const DATA_EXTENSION: &str = ".json";

/// Пути поиска по умолчанию (до раскрытия `~` и `$ORIGIN`).
pub const DEFAULT_SEARCH_PATHS: [&str; 3] = ["~/.jq", "$ORIGIN/../lib/jq", "$ORIGIN/../lib"];

/// Конфигурация модульной системы.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleConfig {
    /// Пути поиска модулей
    pub search_paths: Vec<PathBuf>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self::from_raw_paths(DEFAULT_SEARCH_PATHS)
    }
}

impl ModuleConfig {
    /// Конфигурация с уже готовыми путями.
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Конфигурация из путей в пользовательской нотации (`~`, `$ORIGIN`).
    pub fn from_raw_paths<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let home = dirs_next::home_dir();
        let origin = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));

        let search_paths = raw
            .into_iter()
            .map(|p| expand_search_path(p.as_ref(), home.as_deref(), origin.as_deref()))
            .collect();

        Self { search_paths }
    }
}

/// Раскрыть `~` (домашняя директория) и `$ORIGIN` (директория исполняемого
/// файла) в начале пути. Если раскрыть нечем, путь остаётся как есть.
pub fn expand_search_path(raw: &str, home: Option<&Path>, origin: Option<&Path>) -> PathBuf {
    let expand = |prefix: &str, base: Option<&Path>| -> Option<PathBuf> {
        let rest = raw.strip_prefix(prefix)?;
        if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with(std::path::MAIN_SEPARATOR)) {
            return None;
        }
        let base = base?;
        Some(join_under(base, Path::new(rest)))
    };

    expand("~", home)
        .or_else(|| expand("$ORIGIN", origin))
        .unwrap_or_else(|| PathBuf::from(raw))
}
