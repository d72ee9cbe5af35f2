//! pagekit maintenance tool
//!
//! Runs stored page documents through the codec: migrating legacy documents
//! to the canonical form, reporting what decoding repaired, rendering, and
//! moving pages in and out of a file store.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pagekit_core::{render, EngineConfig, RenderOptions};
use pagekit_document::{codec, DecodeReport};
use pagekit_persist::{DocumentStore, FileStore, PageId};
use pagekit_registry::{library, Registry};
use pagekit_schema::Breakpoint;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("pagekit")
        .version(pagekit_core::VERSION)
        .about("Page document maintenance")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration file (TOML)"),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Page store directory, overriding store_dir"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("migrate")
                .about("Rewrite a document in the canonical current format")
                .arg(input_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write here instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Decode a document and report what needed repair")
                .arg(input_arg())
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .action(ArgAction::SetTrue)
                        .help("Exit with status 2 unless the document is already canonical"),
                ),
        )
        .subcommand(
            Command::new("render")
                .about("Render a document to markup")
                .arg(input_arg())
                .arg(
                    Arg::new("breakpoint")
                        .long("breakpoint")
                        .default_value("base")
                        .value_parser(["base", "medium", "large"])
                        .help("Breakpoint for responsive text"),
                ),
        )
        .subcommand(
            Command::new("blocks")
                .about("List registered block types")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("pages").about("List pages in the store"))
        .subcommand(
            Command::new("import")
                .about("Validate a document file and save it as a page")
                .arg(page_arg())
                .arg(input_arg()),
        )
        .subcommand(
            Command::new("export")
                .about("Print a stored page")
                .arg(page_arg()),
        )
}

fn input_arg() -> Arg {
    Arg::new("input")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Document file (JSON)")
}

fn page_arg() -> Arg {
    Arg::new("page").required(true).help("Page id")
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(matches: &ArgMatches) -> Result<EngineConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = matches.get_one::<PathBuf>("store") {
        config = config.with_store_dir(dir);
    }
    Ok(config)
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

async fn open_store(config: &EngineConfig) -> Result<FileStore> {
    let Some(dir) = &config.store_dir else {
        bail!("no page store: pass --store or set store_dir");
    };
    Ok(FileStore::open(dir).await?)
}

fn page_id(args: &ArgMatches) -> Result<PageId> {
    let raw = args
        .get_one::<String>("page")
        .context("missing page id")?;
    Ok(PageId::new(raw.as_str())?)
}

fn input_path(args: &ArgMatches) -> Result<&PathBuf> {
    args.get_one::<PathBuf>("input").context("missing input")
}

fn report_lines(report: &DecodeReport) -> Vec<String> {
    let mut lines = vec![format!("format version: {}", report.version)];
    if report.unversioned {
        lines.push("no version field; read as legacy".to_string());
    }
    if report.upgraded_values > 0 {
        lines.push(format!("upgraded responsive values: {}", report.upgraded_values));
    }
    for unknown in &report.unknown_blocks {
        lines.push(format!(
            "unknown block {} ({}) in {}, kept as placeholder",
            unknown.type_name, unknown.id, unknown.zone
        ));
    }
    for zone in &report.repaired_zones {
        lines.push(format!("created missing zone {zone}"));
    }
    lines
}

fn blocks_json(registry: &Registry) -> serde_json::Value {
    registry
        .definitions()
        .map(|def| {
            serde_json::json!({
                "type": def.type_name(),
                "label": def.label(),
                "category": def.category(),
                "fields": def.fields().keys().collect::<Vec<_>>(),
                "slots": def.slots(),
            })
        })
        .collect()
}

async fn run(matches: &ArgMatches, config: &EngineConfig) -> Result<i32> {
    let registry = library::standard()?;
    match matches.subcommand() {
        Some(("migrate", args)) => {
            let text = read_input(input_path(args)?)?;
            let (migrated, report) = codec::migrate(&text, &registry)?;
            tracing::debug!(clean = report.is_clean(), "document migrated");
            for line in report_lines(&report) {
                eprintln!("{line}");
            }
            match args.get_one::<PathBuf>("output") {
                Some(out) => std::fs::write(out, migrated + "\n")
                    .with_context(|| format!("cannot write {}", out.display()))?,
                None => println!("{migrated}"),
            }
        }
        Some(("validate", args)) => {
            let decoded = codec::deserialize(&read_input(input_path(args)?)?, &registry)?;
            let document = &decoded.document;
            println!(
                "{} blocks in {} zones",
                document.instance_count(),
                document.zone_count()
            );
            for line in report_lines(&decoded.report) {
                println!("{line}");
            }
            if args.get_flag("strict") && !decoded.report.is_clean() {
                return Ok(2);
            }
        }
        Some(("render", args)) => {
            let decoded = codec::deserialize(&read_input(input_path(args)?)?, &registry)?;
            let breakpoint = args
                .get_one::<String>("breakpoint")
                .and_then(|key| Breakpoint::from_key(key))
                .unwrap_or(Breakpoint::Base);
            let options = RenderOptions::from_config(config).at(breakpoint);
            let rendered = render(&decoded.document, &registry, &options);
            for error in &rendered.errors {
                eprintln!("warning: {error}");
            }
            println!("{}", rendered.markup);
        }
        Some(("blocks", args)) => {
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&blocks_json(&registry))?);
            } else {
                for def in registry.definitions() {
                    let slots = if def.slots().is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", def.slots().join(", "))
                    };
                    println!("{:<12} {:<11} {}{slots}", def.type_name(), def.category(), def.label());
                }
            }
        }
        Some(("pages", _)) => {
            let store = open_store(config).await?;
            for page in store.list().await? {
                println!("{page}");
            }
        }
        Some(("import", args)) => {
            let page = page_id(args)?;
            let decoded = codec::deserialize(&read_input(input_path(args)?)?, &registry)?;
            let body = codec::to_string(&decoded.document)?;
            let store = open_store(config).await?;
            let current = store.load(&page).await?.map(|stored| stored.revision);
            let revision = store.save(&page, &body, current).await?;
            tracing::info!(page = %page, blocks = decoded.document.instance_count(), "page imported");
            println!("{page} saved at {}", revision.short());
        }
        Some(("export", args)) => {
            let store = open_store(config).await?;
            let stored = store.fetch(&page_id(args)?).await?;
            println!("{}", stored.body);
        }
        _ => {}
    }
    Ok(0)
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    init_tracing(&config.log_level, matches.get_flag("log-json"));

    let code = run(&matches, &config).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn store_flag_overrides_config() {
        let matches = cli()
            .try_get_matches_from(["pagekit", "--store", "/tmp/pages", "pages"])
            .unwrap();
        let config = load_config(&matches).unwrap();
        assert_eq!(config.store_dir, Some(PathBuf::from("/tmp/pages")));
    }

    #[test]
    fn report_mentions_placeholders() {
        let registry = library::standard().unwrap();
        let legacy = r#"{"root":{"props":{}},"zones":{"root.content":[
            {"id":"7d6a3c2e-0f59-4a8c-9b5e-2d1f3e4a5b6c","type":"Carousel","props":{}}
        ]}}"#;
        let decoded = codec::deserialize(legacy, &registry).unwrap();
        let lines = report_lines(&decoded.report);
        assert!(lines.iter().any(|l| l.contains("legacy")));
        assert!(lines.iter().any(|l| l.contains("unknown block Carousel")));
    }

    #[test]
    fn blocks_json_lists_every_type() {
        let registry = library::standard().unwrap();
        let json = blocks_json(&registry);
        assert_eq!(json.as_array().unwrap().len(), registry.len());
    }

    #[tokio::test]
    async fn import_requires_a_store() {
        let config = EngineConfig::default();
        assert!(open_store(&config).await.is_err());

        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&config.with_store_dir(dir.path())).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}
