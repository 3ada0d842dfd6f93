use std::fmt;

use chrono::{DateTime, Duration, Utc};
use study_core::model::{
    ESSAY_THEMES, Goal, NewEssay, NewStudyPlan, NewStudySession, OwnerId, PlanCategory,
};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    owner: OwnerId,
    days: u32,
    plans: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidOwner { raw: String },
    InvalidDays { raw: String },
    InvalidPlans { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidOwner { raw } => write!(f, "invalid --owner value: {raw:?}"),
            ArgsError::InvalidDays { raw } => write!(f, "invalid --days value: {raw}"),
            ArgsError::InvalidPlans { raw } => write!(f, "invalid --plans value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("STUDY_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut owner = std::env::var("STUDY_OWNER_ID")
            .ok()
            .and_then(|value| value.parse::<OwnerId>().ok())
            .unwrap_or_else(|| OwnerId::new("local"));
        let mut days = std::env::var("STUDY_SEED_DAYS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(10);
        let mut plans = std::env::var("STUDY_SEED_PLANS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(4);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--owner" => {
                    let value = require_value(&mut args, "--owner")?;
                    owner = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidOwner { raw: value.clone() })?;
                }
                "--days" => {
                    let value = require_value(&mut args, "--days")?;
                    days = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidDays { raw: value.clone() })?;
                }
                "--plans" => {
                    let value = require_value(&mut args, "--plans")?;
                    plans = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidPlans { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            owner,
            days,
            plans,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --owner <id>              Owner to seed (default: local)");
    eprintln!("  --days <n>                Days of study sessions to append (default: 10)");
    eprintln!("  --plans <n>               Number of calendar plans to add (default: 4)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  STUDY_DB_URL, STUDY_OWNER_ID, STUDY_SEED_DAYS, STUDY_SEED_PLANS");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let subjects = [
        ("Matemática", 50),
        ("Português", 35),
        ("Física", 25),
        ("Redação", 40),
        ("História", 20),
    ];
    let mut sessions = 0_u32;
    for day in 0..args.days {
        // Two sessions per day, skipping every fourth day so the streak breaks.
        if day % 4 == 3 {
            continue;
        }
        for slot in 0..2_u32 {
            let idx = ((day + slot) as usize) % subjects.len();
            let (subject, minutes) = subjects[idx];
            let created_at =
                now - Duration::days(i64::from(day)) - Duration::hours(i64::from(slot) * 3 + 1);
            let session = NewStudySession::new(
                args.owner.clone(),
                subject,
                minutes + slot * 5,
                created_at,
            )?;
            storage.sessions.create_session(&session).await?;
            sessions += 1;
        }
    }

    let goal = Goal::from_hours_input(args.owner.clone(), "2", "12", "48", now)?;
    storage.goals.upsert_goal(&goal).await?;

    let plan_samples = [
        ("Matemática", "1h30m", PlanCategory::Study),
        ("Redação ENEM", "50m", PlanCategory::Essay),
        ("Almoço", "1h", PlanCategory::Food),
        ("Descanso", "30m", PlanCategory::Rest),
    ];
    for i in 0..args.plans {
        let (subject, time, category) = plan_samples[(i as usize) % plan_samples.len()];
        let day = (now + Duration::days(i64::from(i))).date_naive();
        let plan = NewStudyPlan::new(args.owner.clone(), day, subject, time, category, now)?;
        storage.plans.create_plan(&plan).await?;
    }

    let essay = NewEssay::new(
        args.owner.clone(),
        ESSAY_THEMES[0],
        "A educação é a base do desenvolvimento.\n\nSem investimento contínuo, a desigualdade se perpetua.",
        now - Duration::days(2),
    )?;
    storage.essays.create_essay(&essay).await?;

    println!(
        "Seeded {} sessions, a goal, {} plans and an essay for {} into {}",
        sessions, args.plans, args.owner, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
