//! Метаданные импорта, значимые для разрешения путей.

use std::path::PathBuf;

use serde_json::{Map, Value};

/// Ключ, под которым загрузчик записывает путь импортирующего файла.
pub const IMPORTER_PATH_KEY: &str = "$$path";

/// Ключ пользовательской подсказки поиска.
pub const SEARCH_KEY: &str = "search";

/// Проверенные метаданные импорта.
///
/// Значение неверного типа считается отсутствующим: `{"search": 1}`
/// эквивалентно отсутствию подсказки.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMeta {
    /// Абсолютный путь файла, объявившего импорт
    pub importer_path: Option<PathBuf>,
    /// Путь относительно директории импортирующего файла
    pub search: Option<PathBuf>,
}

impl ImportMeta {
    /// Извлечь поля из нетипизированного JSON-объекта.
    pub fn from_map(meta: &Map<String, Value>) -> Self {
        let string_field = |key: &str| match meta.get(key) {
            Some(Value::String(s)) => Some(PathBuf::from(s)),
            _ => None,
        };

        Self {
            importer_path: string_field(IMPORTER_PATH_KEY),
            search: string_field(SEARCH_KEY),
        }
    }

    /// То же для необязательных метаданных.
    pub fn from_optional(meta: Option<&Map<String, Value>>) -> Self {
        meta.map(Self::from_map).unwrap_or_default()
    }

    /// Подсказка поиска действует только вместе с путём импортёра.
    pub fn search_hint(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.importer_path.as_ref().zip(self.search.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("Expected object"),
        }
    }

    #[test]
    fn test_both_fields() {
        let meta = ImportMeta::from_map(&map(json!({"$$path": "/a/b/x.jq", "search": "../lib"})));
        assert_eq!(meta.importer_path, Some(PathBuf::from("/a/b/x.jq")));
        assert_eq!(meta.search, Some(PathBuf::from("../lib")));
        assert!(meta.search_hint().is_some());
    }

    #[test]
    fn test_wrong_types_are_absent() {
        let meta = ImportMeta::from_map(&map(json!({"$$path": 1, "search": ["../lib"]})));
        assert_eq!(meta, ImportMeta::default());
    }

    #[test]
    fn test_search_without_importer() {
        let meta = ImportMeta::from_map(&map(json!({"search": "./lib"})));
        assert!(meta.search.is_some());
        assert!(meta.search_hint().is_none());
    }

    #[test]
    fn test_none() {
        assert_eq!(ImportMeta::from_optional(None), ImportMeta::default());
    }
}
