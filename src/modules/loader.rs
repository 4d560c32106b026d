//! Загрузчик модулей.
//!
//! Единственный компонент, который читает файловую систему: находит файл
//! через [`ModuleResolver`], читает его и разбирает как модуль или как
//! поток JSON-значений. Ничего не кэширует — каждый вызов заново
//! обращается к диску.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use log::{debug, trace};
use serde_json::{Map, Value};

use super::metadata::{ImportMeta, IMPORTER_PATH_KEY};
use super::{
    clean_path, Import, Module, ModuleConfig, ModuleResolver, DATA_EXTENSION, INIT_FILE_NAME,
    MODULE_EXTENSION,
};
use crate::error::{JsonParseError, LoaderError, LoaderResult, QueryParseError};
use crate::parser::{self, ConstTerm};

// 256KB red zone, 64MB stack growth для глубоко вложенных JSON-данных
const JSON_STACK_RED_ZONE: usize = 256 * 1024;
const JSON_STACK_GROWTH: usize = 64 * 1024 * 1024;

/// Результат загрузки одного импорта.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedImport {
    /// Модуль (`import "x" as x;`, `include "x";`)
    Module(Module),
    /// Все JSON-значения файла данных (`import "x" as $x;`)
    Data(Vec<Value>),
}

/// Загрузчик модулей.
#[derive(Debug, Clone, Default)]
pub struct ModuleLoader {
    /// Резолвер путей
    resolver: ModuleResolver,
}

impl ModuleLoader {
    /// Создать загрузчик с путями поиска.
    pub fn with_search_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            resolver: ModuleResolver::with_search_paths(paths),
        }
    }

    /// Создать загрузчик по конфигурации.
    pub fn from_config(config: &ModuleConfig) -> Self {
        Self::with_search_paths(config.search_paths.clone())
    }

    /// Получить резолвер.
    pub fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }

    /// Загрузить init-модули: пути поиска с базовым именем `.jq`,
    /// указывающие на существующий файл.
    ///
    /// Несуществующие пути и директории пропускаются. Первая же ошибка
    /// чтения или разбора прерывает загрузку; уже разобранные модули
    /// при этом отбрасываются.
    pub fn load_init_modules(&self) -> LoaderResult<Vec<Module>> {
        let mut modules = Vec::new();

        for path in self.resolver.search_paths() {
            if path.file_name().map_or(true, |name| name != INIT_FILE_NAME) {
                continue;
            }

            let metadata = match fs::metadata(path) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    trace!("init module {} does not exist", path.display());
                    continue;
                }
                Err(e) => return Err(LoaderError::io(path, e)),
            };
            if metadata.is_dir() {
                trace!("init path {} is a directory", path.display());
                continue;
            }

            let contents = fs::read_to_string(path).map_err(|e| LoaderError::io(path, e))?;
            modules.push(parse_module(path, contents)?);
            debug!("loaded init module {}", path.display());
        }

        Ok(modules)
    }

    /// Загрузить модуль по имени импорта.
    ///
    /// `meta` — метаданные импорта; пара `"$$path"` + `"search"` добавляет
    /// корень поиска относительно импортирующего файла.
    pub fn load_module_with_meta(
        &self,
        name: &str,
        meta: Option<&Map<String, Value>>,
    ) -> LoaderResult<Module> {
        let path = self
            .resolver
            .resolve(name, MODULE_EXTENSION, &ImportMeta::from_optional(meta))?;
        let contents = fs::read_to_string(&path).map_err(|e| LoaderError::io(&path, e))?;
        parse_module(&path, contents)
    }

    /// Загрузить файл данных по имени импорта.
    ///
    /// Файл — это ноль или больше JSON-значений подряд (как в JSON Lines,
    /// но разделителем может быть любой пробел или сама структура).
    pub fn load_json_with_meta(
        &self,
        name: &str,
        meta: Option<&Map<String, Value>>,
    ) -> LoaderResult<Vec<Value>> {
        let path = self
            .resolver
            .resolve(name, DATA_EXTENSION, &ImportMeta::from_optional(meta))?;
        let file = File::open(&path).map_err(|e| LoaderError::io(&path, e))?;

        let mut consumed = Vec::new();
        let decoded: Result<Vec<Value>, serde_json::Error> = {
            let reader = Recorder::new(BufReader::new(file), &mut consumed);
            let mut de = serde_json::Deserializer::from_reader(reader);
            // Глубина вложенности не ограничена; стек растёт по мере надобности
            de.disable_recursion_limit();
            stacker::maybe_grow(JSON_STACK_RED_ZONE, JSON_STACK_GROWTH, || {
                de.into_iter::<Value>().collect()
            })
        };

        match decoded {
            Ok(values) => {
                debug!("decoded {} value(s) from {}", values.len(), path.display());
                Ok(values)
            }
            Err(e) if e.is_io() => Err(LoaderError::io(path, e.into())),
            Err(source) => Err(JsonParseError {
                path,
                contents: String::from_utf8_lossy(&consumed).into_owned(),
                source,
            }
            .into()),
        }
    }

    /// Загрузить импорт, выбрав модуль или данные по его виду.
    pub fn load_import(&self, import: &Import) -> LoaderResult<LoadedImport> {
        let meta = import.meta_map();
        if import.is_data() {
            self.load_json_with_meta(&import.path, meta.as_ref())
                .map(LoadedImport::Data)
        } else {
            self.load_module_with_meta(&import.path, meta.as_ref())
                .map(LoadedImport::Module)
        }
    }
}

/// Разобрать модуль и записать в метаданные каждого его импорта путь
/// файла (`"$$path"`). Импорты без метаданных не меняются.
fn parse_module(path: &Path, contents: String) -> LoaderResult<Module> {
    let mut module = match parser::parse_module(&contents) {
        Ok(module) => module,
        Err(source) => {
            return Err(QueryParseError {
                path: path.to_path_buf(),
                contents,
                source,
            }
            .into())
        }
    };

    let absolute = std::path::absolute(path).map_err(|e| LoaderError::io(path, e))?;
    let importer = clean_path(&absolute).to_string_lossy().into_owned();

    for meta in module.imports.iter_mut().filter_map(|i| i.meta.as_mut()) {
        meta.push(IMPORTER_PATH_KEY, ConstTerm::String(importer.clone()));
    }

    Ok(module)
}

/// Читатель, копирующий всё прочитанное в буфер — для контекста ошибки.
struct Recorder<'a, R> {
    inner: R,
    seen: &'a mut Vec<u8>,
}

impl<'a, R: Read> Recorder<'a, R> {
    fn new(inner: R, seen: &'a mut Vec<u8>) -> Self {
        Self { inner, seen }
    }
}

impl<R: Read> Read for Recorder<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.seen.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}
