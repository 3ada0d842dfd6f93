use std::fmt;

use chrono::{Datelike, NaiveDate};
use services::{AppServices, Clock};
use study_core::model::{OwnerId, PlanCategory, PlanId};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use config::Config;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingCommand,
    MissingFlag { command: &'static str, flag: &'static str },
    MissingId { command: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidOwner { raw: String },
    InvalidMinutes { raw: String },
    InvalidDay { raw: String },
    InvalidMonth { raw: String },
    InvalidCategory { raw: String },
    InvalidPlanId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingCommand => write!(f, "missing subcommand"),
            ArgsError::MissingFlag { command, flag } => {
                write!(f, "{command} requires {flag}")
            }
            ArgsError::MissingId { command } => write!(f, "{command} requires a plan id"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidOwner { raw } => write!(f, "invalid --owner value: {raw:?}"),
            ArgsError::InvalidMinutes { raw } => write!(f, "invalid --minutes value: {raw}"),
            ArgsError::InvalidDay { raw } => {
                write!(f, "invalid --day value (expected YYYY-MM-DD): {raw}")
            }
            ArgsError::InvalidMonth { raw } => {
                write!(f, "invalid --month value (expected YYYY-MM): {raw}")
            }
            ArgsError::InvalidCategory { raw } => write!(
                f,
                "invalid --category value (study, essay, rest, food, other): {raw}"
            ),
            ArgsError::InvalidPlanId { raw } => write!(f, "invalid plan id: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  study timer (--plan <id> | --subject <s> --time <1h30m>)");
    eprintln!("  study log --subject <s> --minutes <n>");
    eprintln!("  study dashboard [--json]");
    eprintln!("  study history");
    eprintln!("  study goals show");
    eprintln!("  study goals set --daily <h> --weekly <h> --monthly <h>");
    eprintln!("  study plans add --subject <s> --time <t> [--day YYYY-MM-DD] [--category <c>]");
    eprintln!("  study plans list");
    eprintln!("  study plans move <id> --day YYYY-MM-DD");
    eprintln!("  study plans delete <id>");
    eprintln!("  study plans board [--month YYYY-MM]");
    eprintln!("  study essays write [--theme <t>] [--text <s>]   (text read from stdin if omitted)");
    eprintln!("  study essays list");
    eprintln!("  study essays theme");
    eprintln!();
    eprintln!("Global options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://study.sqlite3)");
    eprintln!("  --owner <id>              Owner whose data is used (default: local)");
    eprintln!();
    eprintln!("Timer controls (type and press enter): p = pause, r = resume, q = quit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_DB_URL, STUDY_OWNER_ID, STUDY_TICK_MS, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TimerSource {
    Plan(PlanId),
    Adhoc { subject: String, time: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Timer(TimerSource),
    Log {
        subject: String,
        minutes: u32,
    },
    Dashboard {
        json: bool,
    },
    History,
    GoalsShow,
    GoalsSet {
        daily: String,
        weekly: String,
        monthly: String,
    },
    PlansAdd {
        subject: String,
        time: String,
        day: Option<NaiveDate>,
        category: PlanCategory,
    },
    PlansList,
    PlansMove {
        id: PlanId,
        day: NaiveDate,
    },
    PlansDelete {
        id: PlanId,
    },
    PlansBoard {
        month: Option<(i32, u32)>,
    },
    EssaysWrite {
        theme: Option<String>,
        text: Option<String>,
    },
    EssaysList,
    EssaysTheme,
}

/// Flags collected before the command is assembled.
#[derive(Debug, Default)]
struct Flags {
    db_url: Option<String>,
    owner: Option<OwnerId>,
    plan: Option<PlanId>,
    subject: Option<String>,
    time: Option<String>,
    minutes: Option<u32>,
    day: Option<NaiveDate>,
    category: Option<PlanCategory>,
    month: Option<(i32, u32)>,
    daily: Option<String>,
    weekly: Option<String>,
    monthly: Option<String>,
    theme: Option<String>,
    text: Option<String>,
    json: bool,
    positional: Vec<String>,
}

#[derive(Debug)]
struct Args {
    db_url: Option<String>,
    owner: Option<OwnerId>,
    command: Command,
}

fn parse_day(raw: String) -> Result<NaiveDate, ArgsError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ArgsError::InvalidDay { raw })
}

fn parse_month(raw: String) -> Result<(i32, u32), ArgsError> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .map_err(|_| ArgsError::InvalidMonth { raw })?;
    Ok((first.year(), first.month()))
}

fn parse_plan_id(raw: String) -> Result<PlanId, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidPlanId { raw })
}

impl Flags {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut flags = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    flags.db_url = Some(value);
                }
                "--owner" => {
                    let value = require_value(args, "--owner")?;
                    let owner = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidOwner { raw: value.clone() })?;
                    flags.owner = Some(owner);
                }
                "--plan" => flags.plan = Some(parse_plan_id(require_value(args, "--plan")?)?),
                "--subject" => flags.subject = Some(require_value(args, "--subject")?),
                "--time" => flags.time = Some(require_value(args, "--time")?),
                "--minutes" => {
                    let value = require_value(args, "--minutes")?;
                    let minutes = value
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidMinutes { raw: value.clone() })?;
                    flags.minutes = Some(minutes);
                }
                "--day" => flags.day = Some(parse_day(require_value(args, "--day")?)?),
                "--category" => {
                    let value = require_value(args, "--category")?;
                    let category = PlanCategory::parse(&value)
                        .map_err(|_| ArgsError::InvalidCategory { raw: value.clone() })?;
                    flags.category = Some(category);
                }
                "--month" => flags.month = Some(parse_month(require_value(args, "--month")?)?),
                "--daily" => flags.daily = Some(require_value(args, "--daily")?),
                "--weekly" => flags.weekly = Some(require_value(args, "--weekly")?),
                "--monthly" => flags.monthly = Some(require_value(args, "--monthly")?),
                "--theme" => flags.theme = Some(require_value(args, "--theme")?),
                "--text" => flags.text = Some(require_value(args, "--text")?),
                "--json" => flags.json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => flags.positional.push(arg),
            }
        }
        Ok(flags)
    }

    fn take_id(&mut self, command: &'static str) -> Result<PlanId, ArgsError> {
        if self.positional.is_empty() {
            return Err(ArgsError::MissingId { command });
        }
        parse_plan_id(self.positional.remove(0))
    }

    fn finish(self) -> Result<(), ArgsError> {
        match self.positional.into_iter().next() {
            Some(extra) => Err(ArgsError::UnknownArg(extra)),
            None => Ok(()),
        }
    }
}

fn required<T>(value: Option<T>, command: &'static str, flag: &'static str) -> Result<T, ArgsError> {
    value.ok_or(ArgsError::MissingFlag { command, flag })
}

impl Args {
    fn parse(argv: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut iter = argv.into_iter();
        let mut flags = Flags::parse(&mut iter)?;
        if flags.positional.is_empty() {
            return Err(ArgsError::MissingCommand);
        }
        let head = flags.positional.remove(0);

        let command = match head.as_str() {
            "timer" => match flags.plan.take() {
                Some(id) => Command::Timer(TimerSource::Plan(id)),
                None => Command::Timer(TimerSource::Adhoc {
                    subject: required(flags.subject.take(), "timer", "--plan or --subject")?,
                    time: required(flags.time.take(), "timer", "--time")?,
                }),
            },
            "log" => Command::Log {
                subject: required(flags.subject.take(), "log", "--subject")?,
                minutes: required(flags.minutes.take(), "log", "--minutes")?,
            },
            "dashboard" => Command::Dashboard { json: flags.json },
            "history" => Command::History,
            "goals" => {
                let sub = if flags.positional.is_empty() {
                    "show".to_owned()
                } else {
                    flags.positional.remove(0)
                };
                match sub.as_str() {
                    "show" => Command::GoalsShow,
                    "set" => Command::GoalsSet {
                        daily: required(flags.daily.take(), "goals set", "--daily")?,
                        weekly: required(flags.weekly.take(), "goals set", "--weekly")?,
                        monthly: required(flags.monthly.take(), "goals set", "--monthly")?,
                    },
                    _ => return Err(ArgsError::UnknownCommand(format!("goals {sub}"))),
                }
            }
            "plans" => {
                let sub = if flags.positional.is_empty() {
                    "list".to_owned()
                } else {
                    flags.positional.remove(0)
                };
                match sub.as_str() {
                    "add" => Command::PlansAdd {
                        subject: required(flags.subject.take(), "plans add", "--subject")?,
                        time: required(flags.time.take(), "plans add", "--time")?,
                        day: flags.day.take(),
                        category: flags.category.take().unwrap_or_default(),
                    },
                    "list" => Command::PlansList,
                    "move" => Command::PlansMove {
                        id: flags.take_id("plans move")?,
                        day: required(flags.day.take(), "plans move", "--day")?,
                    },
                    "delete" => Command::PlansDelete {
                        id: flags.take_id("plans delete")?,
                    },
                    "board" => Command::PlansBoard {
                        month: flags.month.take(),
                    },
                    _ => return Err(ArgsError::UnknownCommand(format!("plans {sub}"))),
                }
            }
            "essays" => {
                let sub = if flags.positional.is_empty() {
                    "list".to_owned()
                } else {
                    flags.positional.remove(0)
                };
                match sub.as_str() {
                    "write" => Command::EssaysWrite {
                        theme: flags.theme.take(),
                        text: flags.text.take(),
                    },
                    "list" => Command::EssaysList,
                    "theme" => Command::EssaysTheme,
                    _ => return Err(ArgsError::UnknownCommand(format!("essays {sub}"))),
                }
            }
            _ => return Err(ArgsError::UnknownCommand(head)),
        };

        let db_url = flags.db_url.take();
        let owner = flags.owner.take();
        flags.finish()?;

        Ok(Self {
            db_url,
            owner,
            command,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
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

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.is_empty() || matches!(argv[0].as_str(), "--help" | "-h") {
        print_usage();
        return Ok(());
    }

    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_filter)?)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let db_url = normalize_sqlite_url(args.db_url.unwrap_or(config.db_url));
    let owner = args.owner.unwrap_or(config.owner);

    // Open + migrate SQLite in the binary glue so core/services stay pure.
    prepare_sqlite_file(&db_url)?;
    let app = AppServices::new_sqlite(&db_url, Clock::default_clock(), config.tick_interval).await?;
    info!(db_url = %db_url, owner = %owner, "storage ready");

    commands::execute(&app, owner, args.command).await
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
