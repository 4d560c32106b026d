//! Разрешение путей модулей.
//!
//! Для каждого корня поиска проверяются два кандидата:
//!
//! - `root/name.ext` — модуль-файл;
//! - `root/name/basename(name).ext` — модуль-пакет в одноимённой директории.
//!
//! Побеждает первый существующий кандидат первого подходящего корня.

use std::fs;
use std::path::{Component, Path, PathBuf};

use log::{debug, trace};

use super::metadata::ImportMeta;
use crate::error::{LoaderError, LoaderResult};

/// Резолвер модулей.
#[derive(Debug, Clone, Default)]
pub struct ModuleResolver {
    /// Корни поиска в порядке приоритета
    search_paths: Vec<PathBuf>,
}

impl ModuleResolver {
    /// Создать резолвер с путями поиска.
    pub fn with_search_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths: paths,
        }
    }

    /// Получить все пути поиска.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Эффективный список корней для данного импорта.
    ///
    /// Если в метаданных есть и `"$$path"`, и `"search"`, первым идёт
    /// `dir($$path)/search`, затем настроенные корни.
    pub fn search_roots(&self, meta: &ImportMeta) -> Vec<PathBuf> {
        let mut roots = Vec::with_capacity(self.search_paths.len() + 1);
        if let Some((importer, search)) = meta.search_hint() {
            roots.push(join_under(&parent_dir(importer), search));
        }
        roots.extend(self.search_paths.iter().cloned());
        roots
    }

    /// Кандидаты для одного корня: файл, затем пакет.
    pub fn candidates(root: &Path, name: &str, extension: &str) -> [PathBuf; 2] {
        let file = join_under(root, Path::new(&format!("{}{}", name, extension)));
        let package = join_under(
            &join_under(root, Path::new(name)),
            Path::new(&format!("{}{}", base_name(name), extension)),
        );
        [file, package]
    }

    /// Разрешить имя модуля в путь к существующему файлу.
    pub fn resolve(&self, name: &str, extension: &str, meta: &ImportMeta) -> LoaderResult<PathBuf> {
        for root in self.search_roots(meta) {
            for candidate in Self::candidates(&root, name, extension) {
                if fs::metadata(&candidate).is_ok() {
                    debug!("resolved {:?} to {}", name, candidate.display());
                    return Ok(candidate);
                }
                trace!("no {:?} at {}", name, candidate.display());
            }
        }

        Err(LoaderError::ModuleNotFound(name.to_string()))
    }
}

/// Лексическая нормализация пути: убирает `.`, сворачивает `..`,
/// схлопывает разделители. Файловую систему не трогает.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // Выше корня подниматься некуда
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        PathBuf::from(".")
    } else {
        out.iter().collect()
    }
}

/// Присоединить `rel` к `base`. Корень и префикс диска в `rel`
/// игнорируются: результат всегда лежит под `base` (до сворачивания `..`).
pub fn join_under(base: &Path, rel: &Path) -> PathBuf {
    let mut joined = base.to_path_buf();
    for component in rel.components() {
        if matches!(
            component,
            Component::Normal(_) | Component::CurDir | Component::ParentDir
        ) {
            joined.push(component);
        }
    }
    clean_path(&joined)
}

/// Директория файла; для голого имени — `.`.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        Some(_) => PathBuf::from("."),
        None => path.to_path_buf(),
    }
}

/// Последний элемент имени модуля: `lib/util` -> `util`, `lib/..` -> `..`.
/// Пустое имя даёт `.`, одни разделители — `/`.
fn base_name(name: &str) -> &str {
    if name.is_empty() {
        return ".";
    }
    let trimmed = name.trim_end_matches(std::path::is_separator);
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind(std::path::is_separator) {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap().write_all(b"def f: .;").unwrap();
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(clean_path(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(clean_path(Path::new("../x/..")), PathBuf::from(".."));
        assert_eq!(clean_path(Path::new("a//b/")), PathBuf::from("a/b"));
        assert_eq!(clean_path(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn test_join_under_ignores_root() {
        assert_eq!(join_under(Path::new("/a/b"), Path::new("../lib")), PathBuf::from("/a/lib"));
        assert_eq!(join_under(Path::new("/a/b"), Path::new("/lib")), PathBuf::from("/a/b/lib"));
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("lib/util"), "util");
        assert_eq!(base_name("util"), "util");
        assert_eq!(base_name(".."), "..");
        assert_eq!(base_name("lib/.."), "..");
        assert_eq!(base_name("lib/util/"), "util");
        assert_eq!(base_name(""), ".");
        assert_eq!(base_name("//"), "/");
    }

    #[test]
    fn test_candidates_for_dot_names() {
        let [file, package] = ModuleResolver::candidates(Path::new("/r"), "lib/..", ".jq");
        assert_eq!(file, PathBuf::from("/r/lib/...jq"));
        assert_eq!(package, PathBuf::from("/r/...jq"));

        let [file, package] = ModuleResolver::candidates(Path::new("/r"), "", ".jq");
        assert_eq!(file, PathBuf::from("/r/.jq"));
        assert_eq!(package, PathBuf::from("/r/..jq"));
    }

    #[test]
    fn test_search_roots_precedence() {
        let resolver =
            ModuleResolver::with_search_paths(vec![PathBuf::from("/g1"), PathBuf::from("/g2")]);
        let meta = ImportMeta {
            importer_path: Some(PathBuf::from("/a/b/x.ext")),
            search: Some(PathBuf::from("../lib")),
        };

        assert_eq!(
            resolver.search_roots(&meta),
            vec![
                PathBuf::from("/a/lib"),
                PathBuf::from("/g1"),
                PathBuf::from("/g2")
            ]
        );
    }

    #[test]
    fn test_search_roots_without_importer() {
        let resolver = ModuleResolver::with_search_paths(vec![PathBuf::from("/g1")]);
        let meta = ImportMeta {
            importer_path: None,
            search: Some(PathBuf::from("./lib")),
        };
        assert_eq!(resolver.search_roots(&meta), vec![PathBuf::from("/g1")]);
    }

    #[test]
    fn test_candidates() {
        let [file, package] = ModuleResolver::candidates(Path::new("/r"), "lib/util", ".jq");
        assert_eq!(file, PathBuf::from("/r/lib/util.jq"));
        assert_eq!(package, PathBuf::from("/r/lib/util/util.jq"));
    }

    #[test]
    fn test_resolve_flat_module() {
        let dir = tempdir().unwrap();
        let module_path = dir.path().join("math.jq");
        touch(&module_path);

        let resolver = ModuleResolver::with_search_paths(vec![dir.path().to_path_buf()]);
        let result = resolver.resolve("math", ".jq", &ImportMeta::default());

        assert_eq!(result.unwrap(), module_path);
    }

    #[test]
    fn test_resolve_package_directory() {
        let dir = tempdir().unwrap();
        let module_path = dir.path().join("utils").join("utils.jq");
        touch(&module_path);

        let resolver = ModuleResolver::with_search_paths(vec![dir.path().to_path_buf()]);
        let result = resolver.resolve("utils", ".jq", &ImportMeta::default());

        assert_eq!(result.unwrap(), module_path);
    }

    #[test]
    fn test_flat_file_preferred_within_root() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("utils").join("utils.jq"));
        touch(&dir.path().join("utils.jq"));

        let resolver = ModuleResolver::with_search_paths(vec![dir.path().to_path_buf()]);
        let result = resolver.resolve("utils", ".jq", &ImportMeta::default());

        assert_eq!(result.unwrap(), dir.path().join("utils.jq"));
    }

    #[test]
    fn test_earlier_root_wins_with_package_form() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        touch(&first.path().join("utils").join("utils.jq"));
        touch(&second.path().join("utils.jq"));

        let resolver = ModuleResolver::with_search_paths(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        let result = resolver.resolve("utils", ".jq", &ImportMeta::default());

        assert_eq!(result.unwrap(), first.path().join("utils").join("utils.jq"));
    }

    #[test]
    fn test_search_hint_shadows_global_roots() {
        let project = tempdir().unwrap();
        let global = tempdir().unwrap();
        let importer = project.path().join("src").join("main.jq");
        touch(&importer);
        touch(&project.path().join("vendor").join("dep.jq"));
        touch(&global.path().join("dep.jq"));

        let resolver = ModuleResolver::with_search_paths(vec![global.path().to_path_buf()]);
        let meta = ImportMeta {
            importer_path: Some(importer),
            search: Some(PathBuf::from("../vendor")),
        };

        let result = resolver.resolve("dep", ".jq", &meta).unwrap();
        assert_eq!(result, project.path().join("vendor").join("dep.jq"));

        // Без подсказки — глобальный корень
        let result = resolver.resolve("dep", ".jq", &ImportMeta::default()).unwrap();
        assert_eq!(result, global.path().join("dep.jq"));
    }

    #[test]
    fn test_extension_selects_file() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("users.json"));

        let resolver = ModuleResolver::with_search_paths(vec![dir.path().to_path_buf()]);
        assert!(resolver.resolve("users", ".json", &ImportMeta::default()).is_ok());
        assert!(resolver.resolve("users", ".jq", &ImportMeta::default()).is_err());
    }

    #[test]
    fn test_resolve_not_found_names_module() {
        let dir = tempdir().unwrap();
        let resolver = ModuleResolver::with_search_paths(vec![dir.path().to_path_buf()]);

        match resolver.resolve("nonexistent_module_xyz", ".jq", &ImportMeta::default()) {
            Err(LoaderError::ModuleNotFound(name)) => assert_eq!(name, "nonexistent_module_xyz"),
            other => panic!("Expected ModuleNotFound, got {:?}", other),
        }
    }
}
