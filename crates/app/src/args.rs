use std::fmt;
use std::path::PathBuf;

use spark_core::model::{ModuleId, TopicId, TopicSummary};

pub const DEFAULT_DB_URL: &str = "sqlite://spark.sqlite3";
pub const DB_URL_ENV: &str = "SPARK_DB_URL";

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidNumber { what: &'static str, raw: String },
    InvalidId { what: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidNumber { what, raw } => write!(f, "invalid {what}: {raw}"),
            ArgsError::InvalidId { what, raw } => write!(f, "invalid {what}: {raw:?}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn require_arg(
    args: &mut impl Iterator<Item = String>,
    what: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingArgument { what })
}

fn parse_number(raw: String, what: &'static str) -> Result<u32, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { what, raw })
}

fn parse_module_id(raw: String) -> Result<ModuleId, ArgsError> {
    ModuleId::try_new(raw.clone()).map_err(|_| ArgsError::InvalidId {
        what: "module id",
        raw,
    })
}

fn parse_topic_id(raw: String) -> Result<TopicId, ArgsError> {
    TopicId::try_new(raw.clone()).map_err(|_| ArgsError::InvalidId {
        what: "topic id",
        raw,
    })
}

fn reject_trailing(args: &mut impl Iterator<Item = String>) -> Result<(), ArgsError> {
    match args.next() {
        Some(extra) => Err(ArgsError::UnknownArg(extra)),
        None => Ok(()),
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  spark [--db <sqlite_url> | --memory] progress list");
    eprintln!("  spark [--db <sqlite_url> | --memory] progress show <module>");
    eprintln!("  spark [--db <sqlite_url> | --memory] progress save <module> <index> <total> [--completed]");
    eprintln!("  spark [--db <sqlite_url> | --memory] progress complete <module> <total>");
    eprintln!("  spark [--db <sqlite_url> | --memory] progress reset <module>");
    eprintln!("  spark [--db <sqlite_url> | --memory] progress clear");
    eprintln!("  spark [--db <sqlite_url> | --memory] queue list|status|clear");
    eprintln!("  spark [--db <sqlite_url> | --memory] queue add <topic> <title> [--icon <icon>] [--color <color>] [--articles <n>]");
    eprintln!("  spark [--db <sqlite_url> | --memory] queue remove <topic>");
    eprintln!("  spark [--db <sqlite_url> | --memory] study <module.json>");
    eprintln!();
    eprintln!("Study controls (one per line):");
    eprintln!("  n or empty line  next card");
    eprintln!("  p                previous card");
    eprintln!("  s <dx>           swipe by dx pixels");
    eprintln!("  a <choice>       answer a quiz (letter or 1-based number)");
    eprintln!("  q                quit");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {DB_URL_ENV}, RUST_LOG");
}

//
// ─── PARSED FORM ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Sqlite(String),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressCommand {
    List,
    Show {
        module: ModuleId,
    },
    Save {
        module: ModuleId,
        index: u32,
        total: u32,
        completed: bool,
    },
    Complete {
        module: ModuleId,
        total: u32,
    },
    Reset {
        module: ModuleId,
    },
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueCommand {
    List,
    Status,
    Add(TopicSummary),
    Remove { topic: TopicId },
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Progress(ProgressCommand),
    Queue(QueueCommand),
    Study { module_path: PathBuf },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub backend: Backend,
    pub command: Command,
}

impl Args {
    /// Parse everything after the program name. `env_db_url` is the value of
    /// [`DB_URL_ENV`], if set; `--db` and `--memory` override it.
    pub fn parse(
        args: impl IntoIterator<Item = String>,
        env_db_url: Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut args = args.into_iter();
        let mut backend = Backend::Sqlite(normalize_sqlite_url(
            env_db_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DB_URL.into()),
        ));

        let command = loop {
            let Some(arg) = args.next() else {
                break Command::Help;
            };
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    backend = Backend::Sqlite(normalize_sqlite_url(value));
                }
                "--memory" => backend = Backend::Memory,
                "--help" | "-h" | "help" => break Command::Help,
                "progress" => break Command::Progress(parse_progress(&mut args)?),
                "queue" => break Command::Queue(parse_queue(&mut args)?),
                "study" => {
                    let path = require_arg(&mut args, "module file")?;
                    reject_trailing(&mut args)?;
                    break Command::Study {
                        module_path: PathBuf::from(path),
                    };
                }
                other if other.starts_with('-') => return Err(ArgsError::UnknownArg(arg)),
                _ => return Err(ArgsError::UnknownCommand(arg)),
            }
        };

        Ok(Self { backend, command })
    }
}

fn parse_progress(args: &mut impl Iterator<Item = String>) -> Result<ProgressCommand, ArgsError> {
    let action = require_arg(args, "progress action")?;
    let command = match action.as_str() {
        "list" => ProgressCommand::List,
        "show" => ProgressCommand::Show {
            module: parse_module_id(require_arg(args, "module id")?)?,
        },
        "save" => {
            let module = parse_module_id(require_arg(args, "module id")?)?;
            let index = parse_number(require_arg(args, "card index")?, "card index")?;
            let total = parse_number(require_arg(args, "total cards")?, "total cards")?;
            let mut completed = false;
            for arg in args.by_ref() {
                match arg.as_str() {
                    "--completed" => completed = true,
                    _ => return Err(ArgsError::UnknownArg(arg)),
                }
            }
            ProgressCommand::Save {
                module,
                index,
                total,
                completed,
            }
        }
        "complete" => {
            let module = parse_module_id(require_arg(args, "module id")?)?;
            let total = parse_number(require_arg(args, "total cards")?, "total cards")?;
            ProgressCommand::Complete { module, total }
        }
        "reset" => ProgressCommand::Reset {
            module: parse_module_id(require_arg(args, "module id")?)?,
        },
        "clear" => ProgressCommand::Clear,
        _ => return Err(ArgsError::UnknownCommand(action)),
    };
    reject_trailing(args)?;
    Ok(command)
}

fn parse_queue(args: &mut impl Iterator<Item = String>) -> Result<QueueCommand, ArgsError> {
    let action = require_arg(args, "queue action")?;
    let command = match action.as_str() {
        "list" => QueueCommand::List,
        "status" => QueueCommand::Status,
        "add" => {
            let id = parse_topic_id(require_arg(args, "topic id")?)?;
            let title = require_arg(args, "topic title")?;
            let mut topic = TopicSummary {
                id,
                title,
                icon: None,
                color: None,
                articles_count: 0,
            };
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--icon" => topic.icon = Some(require_value(args, "--icon")?),
                    "--color" => topic.color = Some(require_value(args, "--color")?),
                    "--articles" => {
                        let raw = require_value(args, "--articles")?;
                        topic.articles_count = parse_number(raw, "--articles value")?;
                    }
                    _ => return Err(ArgsError::UnknownArg(arg)),
                }
            }
            QueueCommand::Add(topic)
        }
        "remove" => QueueCommand::Remove {
            topic: parse_topic_id(require_arg(args, "topic id")?)?,
        },
        "clear" => QueueCommand::Clear,
        _ => return Err(ArgsError::UnknownCommand(action)),
    };
    reject_trailing(args)?;
    Ok(command)
}

//
// ─── SQLITE PATHS ──────────────────────────────────────────────────────────────
//

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" {
        return raw;
    }

    let trimmed = raw.trim();
    let rest = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let (path_str, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    match query {
        Some(query) => format!("sqlite://{}?{query}", absolute.display()),
        None => format!("sqlite://{}", absolute.display()),
    }
}

/// Make sure the database file and its directory exist before sqlx opens it.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(args.iter().map(|a| (*a).to_string()), None)
    }

    #[test]
    fn no_arguments_prints_help() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.command, Command::Help);
        assert_eq!(
            args.backend,
            Backend::Sqlite(normalize_sqlite_url(DEFAULT_DB_URL.into()))
        );
    }

    #[test]
    fn db_flag_overrides_environment() {
        let args = Args::parse(
            ["--db", "sqlite:///tmp/a.db", "progress", "list"].map(String::from),
            Some("sqlite:///tmp/env.db".into()),
        )
        .unwrap();
        assert_eq!(args.backend, Backend::Sqlite("sqlite:///tmp/a.db".into()));

        let args = Args::parse(
            ["progress", "list"].map(String::from),
            Some("sqlite:///tmp/env.db".into()),
        )
        .unwrap();
        assert_eq!(args.backend, Backend::Sqlite("sqlite:///tmp/env.db".into()));
    }

    #[test]
    fn parses_progress_save() {
        let args = parse(&["--memory", "progress", "save", "m1", "3", "10", "--completed"]).unwrap();
        assert_eq!(args.backend, Backend::Memory);
        assert_eq!(
            args.command,
            Command::Progress(ProgressCommand::Save {
                module: ModuleId::try_new("m1").unwrap(),
                index: 3,
                total: 10,
                completed: true,
            })
        );
    }

    #[test]
    fn parses_queue_add_with_options() {
        let args = parse(&[
            "queue", "add", "t1", "Sleep", "--icon", "🌙", "--articles", "7",
        ])
        .unwrap();
        let Command::Queue(QueueCommand::Add(topic)) = args.command else {
            panic!("expected queue add");
        };
        assert_eq!(topic.title, "Sleep");
        assert_eq!(topic.icon.as_deref(), Some("🌙"));
        assert_eq!(topic.color, None);
        assert_eq!(topic.articles_count, 7);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            parse(&["progress", "save", "m1", "x", "3"]),
            Err(ArgsError::InvalidNumber {
                what: "card index",
                raw: "x".into()
            })
        );
        assert_eq!(
            parse(&["progress", "show", " "]),
            Err(ArgsError::InvalidId {
                what: "module id",
                raw: " ".into()
            })
        );
        assert_eq!(
            parse(&["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        );
        assert_eq!(
            parse(&["queue", "list", "extra"]),
            Err(ArgsError::UnknownArg("extra".into()))
        );
        assert_eq!(
            parse(&["stats"]),
            Err(ArgsError::UnknownCommand("stats".into()))
        );
    }

    #[test]
    fn relative_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("sqlite:data/spark.db".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/spark.db"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///var/lib/spark.db".into()),
            "sqlite:///var/lib/spark.db"
        );
    }

    #[test]
    fn default_url_resolves_against_working_directory() {
        let cwd = std::env::current_dir().unwrap();
        let expected = format!("sqlite://{}", cwd.join("spark.sqlite3").display());
        assert_eq!(normalize_sqlite_url(DEFAULT_DB_URL.into()), expected);

        let Backend::Sqlite(url) = parse(&["progress", "list"]).unwrap().backend else {
            panic!("expected sqlite backend");
        };
        assert_eq!(url, expected);

        let with_query = normalize_sqlite_url("sqlite://data/spark.db?mode=rwc".into());
        assert!(with_query.starts_with("sqlite:///"));
        assert!(with_query.ends_with("data/spark.db?mode=rwc"));
    }
}
