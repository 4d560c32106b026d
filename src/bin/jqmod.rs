//! jqmod - просмотр разрешения и загрузки модулей.
//!
//! Использование:
//!   jqmod init                          - init-модули из путей поиска
//!   jqmod resolve <name> [--data]       - путь, в который разрешается импорт
//!   jqmod show <name> [--json]          - заголовок разобранного модуля
//!   jqmod data <name>                   - значения файла данных

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::{Map, Value};

use jqmod::modules::{ImportMeta, DATA_EXTENSION, IMPORTER_PATH_KEY, MODULE_EXTENSION, SEARCH_KEY};
use jqmod::{LoaderResult, Module, ModuleConfig, ModuleLoader};

/// Module resolution inspector for jq-style query modules
#[derive(Parser)]
#[command(name = "jqmod")]
#[command(version)]
#[command(about = "Resolve and load jq-style modules", long_about = None)]
struct Cli {
    /// Library search path (repeatable); replaces the default search path
    #[arg(short = 'L', long = "library-path", value_name = "DIR", global = true)]
    library_paths: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List init modules found on the search path
    Init,

    /// Print the file an import name resolves to
    Resolve {
        /// Import name, e.g. "lib/util"
        name: String,

        /// Resolve a data import (.json) instead of a module (.jq)
        #[arg(long)]
        data: bool,

        #[command(flatten)]
        hint: SearchHint,
    },

    /// Parse a module and print its header
    Show {
        name: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        hint: SearchHint,
    },

    /// Decode a data file and print its values, one per line
    Data {
        name: String,

        #[command(flatten)]
        hint: SearchHint,
    },
}

/// Подсказка поиска, как её записал бы импортирующий модуль.
#[derive(clap::Args)]
struct SearchHint {
    /// Path of the importing file
    #[arg(long, value_name = "FILE", requires = "search")]
    from: Option<PathBuf>,

    /// Search hint relative to the importing file
    #[arg(long, value_name = "DIR", requires = "from")]
    search: Option<String>,
}

impl SearchHint {
    fn to_meta(&self) -> Option<Map<String, Value>> {
        let (from, search) = self.from.as_ref().zip(self.search.as_ref())?;
        let mut meta = Map::new();
        meta.insert(
            IMPORTER_PATH_KEY.to_string(),
            Value::String(from.to_string_lossy().into_owned()),
        );
        meta.insert(SEARCH_KEY.to_string(), Value::String(search.clone()));
        Some(meta)
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let config = if cli.library_paths.is_empty() {
        ModuleConfig::default()
    } else {
        ModuleConfig::with_search_paths(cli.library_paths.clone())
    };
    let loader = ModuleLoader::from_config(&config);

    match run(&loader, cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e.diagnostic());
            ExitCode::FAILURE
        }
    }
}

fn run(loader: &ModuleLoader, command: Commands) -> LoaderResult<ExitCode> {
    match command {
        Commands::Init => {
            for module in loader.load_init_modules()? {
                println!("{}", module);
            }
        }
        Commands::Resolve { name, data, hint } => {
            let extension = if data { DATA_EXTENSION } else { MODULE_EXTENSION };
            let meta = ImportMeta::from_optional(hint.to_meta().as_ref());
            let path = loader.resolver().resolve(&name, extension, &meta)?;
            println!("{}", path.display());
        }
        Commands::Show { name, json, hint } => {
            let module = loader.load_module_with_meta(&name, hint.to_meta().as_ref())?;
            match render_module(&module, json) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("{} {}", "error:".red().bold(), e);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Data { name, hint } => {
            for value in loader.load_json_with_meta(&name, hint.to_meta().as_ref())? {
                println!("{}", value);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Текст модуля для `show`: исходная нотация или JSON.
fn render_module(module: &Module, json: bool) -> serde_json::Result<String> {
    if json {
        serde_json::to_string_pretty(module)
    } else {
        Ok(module.to_string())
    }
}
