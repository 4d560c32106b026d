//! Разобранный модуль и его импорты.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::parser::{ConstObject, Span};

/// Разобранный модуль.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Module {
    /// Метаданные из директивы `module {...};`
    pub meta: Option<ConstObject>,
    /// Импорты в порядке объявления
    pub imports: Vec<Import>,
    /// Тело модуля (определения и запрос) — для компилятора
    pub body: String,
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref meta) = self.meta {
            writeln!(f, "module {};", meta)?;
        }
        for import in &self.imports {
            writeln!(f, "{}", import)?;
        }
        write!(f, "{}", self.body)
    }
}

/// Вид импорта.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImportKind {
    /// `include "path";` — определения подставляются в текущую область
    Include,
    /// `import "path" as name;`
    Module { alias: String },
    /// `import "path" as $name;` — JSON-данные
    Data { alias: String },
}

/// Импорт внутри модуля.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Import {
    /// Путь импорта как написан в исходнике
    pub path: String,
    /// Вид импорта
    #[serde(flatten)]
    pub kind: ImportKind,
    /// Метаданные `{...}`; загрузчик дописывает сюда `"$$path"`
    pub meta: Option<ConstObject>,
    /// Позиция директивы
    #[serde(skip)]
    pub span: Span,
}

impl Import {
    /// Импорт JSON-данных?
    pub fn is_data(&self) -> bool {
        matches!(self.kind, ImportKind::Data { .. })
    }

    /// Метаданные как JSON-объект — в таком виде их принимает загрузчик.
    pub fn meta_map(&self) -> Option<Map<String, Value>> {
        self.meta.as_ref().map(ConstObject::to_map)
    }
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = crate::parser::parser::quote(&self.path);
        match &self.kind {
            ImportKind::Include => write!(f, "include {}", path)?,
            ImportKind::Module { alias } => write!(f, "import {} as {}", path, alias)?,
            ImportKind::Data { alias } => write!(f, "import {} as ${}", path, alias)?,
        }
        if let Some(ref meta) = self.meta {
            write!(f, " {}", meta)?;
        }
        write!(f, ";")
    }
}
