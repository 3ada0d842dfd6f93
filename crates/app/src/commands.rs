use std::error::Error;
use std::io::Write as _;

use chrono::{Datelike, Local};
use services::{AppServices, TimerService, TimerServiceError};
use storage::repository::StorageError;
use study_core::model::OwnerId;
use study_core::timer::{PlanInput, TimerPhase};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use crate::{Command, TimerSource};

type CmdResult = Result<(), Box<dyn Error>>;

pub(crate) async fn execute(app: &AppServices, owner: OwnerId, command: Command) -> CmdResult {
    match command {
        Command::Timer(source) => run_timer(app, owner, source).await,
        Command::Log { subject, minutes } => {
            let id = app.session_log().log(owner, &subject, minutes).await?;
            println!("logged {minutes} min of {} ({id})", subject.trim());
            Ok(())
        }
        Command::Dashboard { json } => show_dashboard(app, &owner, json).await,
        Command::History => show_history(app, &owner).await,
        Command::GoalsShow => {
            match app.goals().load_hours(&owner).await? {
                Some(hours) => println!(
                    "daily {}h  weekly {}h  monthly {}h",
                    hours.daily, hours.weekly, hours.monthly
                ),
                None => println!("no goal set"),
            }
            Ok(())
        }
        Command::GoalsSet {
            daily,
            weekly,
            monthly,
        } => {
            let goal = app
                .goals()
                .save_hours(owner, &daily, &weekly, &monthly)
                .await?;
            let hours = goal.as_hours_input();
            println!(
                "goal saved: daily {}h  weekly {}h  monthly {}h",
                hours.daily, hours.weekly, hours.monthly
            );
            Ok(())
        }
        Command::PlansAdd {
            subject,
            time,
            day,
            category,
        } => {
            let id = app
                .plans()
                .add(owner, day, &subject, &time, category)
                .await?;
            println!("{id}");
            Ok(())
        }
        Command::PlansList => {
            let plans = app.plans().list(&owner).await?;
            if plans.is_empty() {
                println!("no plans");
            }
            for plan in plans {
                println!(
                    "{}  {}  {:<6} {:<8} {}",
                    plan.id,
                    plan.day.format("%d/%m/%Y"),
                    plan.category.as_str(),
                    plan.time,
                    plan.subject
                );
            }
            Ok(())
        }
        Command::PlansMove { id, day } => {
            app.plans().move_to(id, day).await?;
            println!("moved {id} to {}", day.format("%d/%m/%Y"));
            Ok(())
        }
        Command::PlansDelete { id } => {
            app.plans().delete(id).await?;
            println!("deleted {id}");
            Ok(())
        }
        Command::PlansBoard { month } => {
            let (year, month) = month.unwrap_or_else(|| {
                let today = Local::now().date_naive();
                (today.year(), today.month())
            });
            let board = app.plans().month_board(&owner, year, month).await?;
            for column in board.iter().filter(|d| !d.plans.is_empty()) {
                println!("{}", column.day.format("%a %d/%m"));
                for plan in &column.plans {
                    println!(
                        "  [{}] {} {} ({})",
                        plan.category.as_str(),
                        plan.subject,
                        plan.time,
                        plan.color()
                    );
                }
            }
            Ok(())
        }
        Command::EssaysWrite { theme, text } => write_essay(app, owner, theme, text).await,
        Command::EssaysList => {
            let essays = app.essays().list(&owner).await?;
            if essays.is_empty() {
                println!("no essays yet");
            }
            for essay in essays {
                println!(
                    "{}  {}  ({} words)",
                    essay.created_at.with_timezone(&Local).format("%d/%m/%Y"),
                    essay.theme,
                    essay.word_count()
                );
                for line in essay.text.lines() {
                    println!("    {line}");
                }
                println!();
            }
            Ok(())
        }
        Command::EssaysTheme => {
            println!("{}", app.essays().random_theme());
            Ok(())
        }
    }
}

async fn write_essay(
    app: &AppServices,
    owner: OwnerId,
    theme: Option<String>,
    text: Option<String>,
) -> CmdResult {
    let essays = app.essays();
    let theme = theme.unwrap_or_else(|| {
        let picked = essays.random_theme();
        println!("theme: {picked}");
        picked.to_owned()
    });
    let text = match text {
        Some(text) => text,
        None => {
            eprintln!("write the essay, end with Ctrl-D");
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };

    let id = essays.write(owner, &theme, &text).await?;
    println!("essay saved ({id})");
    Ok(())
}

async fn show_dashboard(app: &AppServices, owner: &OwnerId, json: bool) -> CmdResult {
    let view = app.dashboard().build_view(owner).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    for (label, period) in [("today", &view.today), ("week", &view.week), ("month", &view.month)] {
        match period.goal_minutes {
            Some(goal) if view.has_goal => println!(
                "{label:<6} {:>9}  {:>3}% of {} min",
                period.display, period.percent, goal
            ),
            _ => println!("{label:<6} {:>9}", period.display),
        }
    }
    println!("sessions {}  streak {} day(s)", view.session_count, view.streak_days);

    if !view.daily_series.is_empty() {
        println!();
        for point in &view.daily_series {
            println!("{}  {:>5.1}h", point.day, point.hours);
        }
    }
    if !view.subject_series.is_empty() {
        println!();
        for point in &view.subject_series {
            println!("{:<20} {:>5.1}h", point.subject, point.hours);
        }
    }
    Ok(())
}

async fn show_history(app: &AppServices, owner: &OwnerId) -> CmdResult {
    let history = app.session_log().history(owner).await?;
    if history.is_empty() {
        println!("no sessions yet");
        return Ok(());
    }
    for day in &history.days {
        println!("{}", day.label);
        for entry in &day.entries {
            println!("  {} {:<20} {}", entry.color, entry.subject, entry.duration);
        }
    }
    if !history.undated.is_empty() {
        println!("undated");
        for entry in &history.undated {
            println!("  {} {:<20} {}", entry.color, entry.subject, entry.duration);
        }
    }
    Ok(())
}

async fn run_timer(app: &AppServices, owner: OwnerId, source: TimerSource) -> CmdResult {
    let plan = match source {
        TimerSource::Plan(id) => {
            let plan = app.plans().get(id).await?.ok_or(StorageError::NotFound)?;
            PlanInput::from(&plan)
        }
        TimerSource::Adhoc { subject, time } => PlanInput::new(subject, time),
    };

    let timer = app.timer();
    let mut updates = timer.subscribe();
    timer.select_plan(&plan).await?;
    timer.start().await;
    println!("{} - {}", plan.subject.trim(), timer.snapshot().await.display);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                let marker = if snapshot.phase == TimerPhase::Paused { " (paused)" } else { "" };
                print!("\r{}{marker}          ", snapshot.display);
                std::io::stdout().flush()?;
                if snapshot.phase == TimerPhase::Finished {
                    println!();
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line?.as_deref().map(str::trim) {
                    Some("p") => {
                        timer.pause().await;
                    }
                    Some("r") => {
                        timer.resume().await;
                    }
                    Some("q") => {
                        println!();
                        info!(subject = %plan.subject, "timer abandoned");
                        return Ok(());
                    }
                    Some("") => {}
                    Some(other) => eprintln!("unknown control {other:?} (p = pause, r = resume, q = quit)"),
                    None => stdin_open = false,
                }
            }
        }
    }

    save_with_retry(&timer, owner, &mut lines).await
}

async fn save_with_retry(
    timer: &TimerService,
    owner: OwnerId,
    lines: &mut Lines<BufReader<Stdin>>,
) -> CmdResult {
    loop {
        match timer.save(owner.clone()).await {
            Ok(id) => {
                println!("session saved ({id})");
                return Ok(());
            }
            Err(TimerServiceError::Persistence(err)) => {
                warn!(error = %err, "session not saved");
                eprintln!("could not save the session: {err}");
                eprintln!("type s to retry, anything else to discard");
                match lines.next_line().await?.as_deref().map(str::trim) {
                    Some("s") => {}
                    _ => return Err(err.into()),
                }
            }
            Err(other) => return Err(other.into()),
        }
    }
}
