use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use congregate_common::{RecurrenceType, StatisticsBucket, WeekdaySet, WorshipType};
use congregate_db::{Database, SqliteStore};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod service;

use config::CtlConfig;
use service::StatisticsService;

#[derive(Parser)]
#[command(name = "congregate")]
#[command(about = "Church activity schedules and attendance statistics", long_about = None)]
struct Cli {
    #[arg(short, long, global = true, help = "Configuration file to use instead of the default")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Print results as JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Activity {
        #[command(subcommand)]
        action: ActivityAction,
    },

    Rule {
        #[command(subcommand)]
        action: RuleAction,
    },

    /// List the dates an activity takes place on
    Expand {
        activity_id: i64,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },

    /// Show the next date an activity takes place on
    Next {
        activity_id: i64,
        #[arg(long, help = "Search from this date instead of today")]
        from: Option<NaiveDate>,
    },

    Member {
        #[command(subcommand)]
        action: MemberAction,
    },

    Office {
        #[command(subcommand)]
        action: OfficeAction,
    },

    /// Mark a member's attendance at one occurrence
    Attend {
        activity_id: i64,
        username: String,
        date: NaiveDate,
        #[arg(short, long, default_value = "present")]
        status: String,
        #[arg(short, long)]
        note: Option<String>,
    },

    Status {
        #[command(subcommand)]
        action: StatusAction,
    },

    Stats {
        #[command(subcommand)]
        action: StatsAction,
    },
}

#[derive(Subcommand)]
enum ActivityAction {
    List {
        #[arg(short, long)]
        worship_type: Option<WorshipType>,
    },
    Create {
        name: String,
        #[arg(short, long)]
        worship_type: Option<WorshipType>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        location: Option<String>,
    },
    Delete {
        activity_id: i64,
    },
}

#[derive(Subcommand)]
enum RuleAction {
    List {
        activity_id: i64,
    },
    Add {
        activity_id: i64,
        #[arg(short = 't', long = "type")]
        recurrence_type: RecurrenceType,
        #[arg(short, long, default_value_t = 1)]
        interval: u32,
        #[arg(short, long, help = "Weekdays for weekly rules, e.g. SUN,WED")]
        days: Option<WeekdaySet>,
        #[arg(long)]
        day_of_month: Option<u32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        until: Option<NaiveDate>,
    },
    Delete {
        rule_id: i64,
    },
}

#[derive(Subcommand)]
enum MemberAction {
    List,
    Add {
        username: String,
        display_name: String,
        #[arg(short, long)]
        email: Option<String>,
    },
    Deactivate {
        username: String,
    },
    History {
        username: String,
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Subcommand)]
enum OfficeAction {
    List,
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    Grant {
        office: String,
        permission: String,
    },
    Revoke {
        office: String,
        permission: String,
    },
    Assign {
        username: String,
        office: String,
    },
    Remove {
        username: String,
        office: String,
    },
    /// Show the offices and effective permissions of a member
    Show {
        username: String,
    },
}

#[derive(Subcommand)]
enum StatusAction {
    List,
    Add {
        name: String,
        #[arg(long, help = "Whether this status counts as attended")]
        counted: bool,
        #[arg(short, long)]
        description: Option<String>,
    },
    SetCounted {
        name: String,
        #[arg(action = clap::ArgAction::Set)]
        counted: bool,
    },
    Delete {
        name: String,
    },
}

#[derive(Subcommand)]
enum StatsAction {
    /// Recompute and store the statistics of an activity
    Recompute {
        activity_id: i64,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(short, long)]
        bucket: Option<StatisticsBucket>,
    },
    /// Show stored statistics of an activity
    Show {
        activity_id: i64,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Combined statistics of every activity of one worship type
    Worship {
        worship_type: WorshipType,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CtlConfig::load_from_path(path)?,
        None => CtlConfig::load()?,
    };
    init_tracing(&config.general.log_level);

    let db = Database::new(config.database.to_db_config())
        .await
        .with_context(|| format!("Failed to open database at {}", config.database.path))?;
    db.run_migrations().await.context("Failed to run database migrations")?;
    debug!("Database ready at {}", config.database.path);

    let service = StatisticsService::new(SqliteStore::new(db), config.statistics.clone());
    let today = chrono::Local::now().date_naive();
    let json = cli.json;
    let db = service.store().database();

    match cli.command {
        Commands::Activity { action } => match action {
            ActivityAction::List { worship_type } => {
                commands::activity::list(db, worship_type, json).await?
            }
            ActivityAction::Create { name, worship_type, description, location } => {
                commands::activity::create(db, name, worship_type, description, location, json).await?
            }
            ActivityAction::Delete { activity_id } => commands::activity::delete(db, activity_id).await?,
        },
        Commands::Rule { action } => match action {
            RuleAction::List { activity_id } => commands::rule::list(db, activity_id, json).await?,
            RuleAction::Add {
                activity_id,
                recurrence_type,
                interval,
                days,
                day_of_month,
                month,
                start,
                until,
            } => {
                let rule = commands::rule::RuleArgs {
                    activity_id,
                    recurrence_type,
                    interval,
                    days: days.unwrap_or_default(),
                    day_of_month,
                    month_of_year: month,
                    start_date: start,
                    end_date: until,
                };
                commands::rule::add(db, rule, json).await?
            }
            RuleAction::Delete { rule_id } => commands::rule::delete(db, rule_id).await?,
        },
        Commands::Expand { activity_id, from, to } => {
            commands::schedule::expand(&service, activity_id, from, to, json).await?
        }
        Commands::Next { activity_id, from } => {
            commands::schedule::next(&service, activity_id, from.unwrap_or(today), json).await?
        }
        Commands::Member { action } => match action {
            MemberAction::List => commands::member::list(db, json).await?,
            MemberAction::Add { username, display_name, email } => {
                commands::member::add(db, username, display_name, email, json).await?
            }
            MemberAction::Deactivate { username } => commands::member::deactivate(db, &username).await?,
            MemberAction::History { username, limit } => {
                commands::member::history(db, &username, limit, json).await?
            }
        },
        Commands::Office { action } => match action {
            OfficeAction::List => commands::office::list(db, json).await?,
            OfficeAction::Create { name, description } => {
                commands::office::create(db, &name, description.as_deref()).await?
            }
            OfficeAction::Grant { office, permission } => {
                commands::office::grant(db, &office, &permission).await?
            }
            OfficeAction::Revoke { office, permission } => {
                commands::office::revoke(db, &office, &permission).await?
            }
            OfficeAction::Assign { username, office } => {
                commands::office::assign(db, &username, &office).await?
            }
            OfficeAction::Remove { username, office } => {
                commands::office::remove(db, &username, &office).await?
            }
            OfficeAction::Show { username } => commands::office::show(db, &username, json).await?,
        },
        Commands::Attend { activity_id, username, date, status, note } => {
            commands::attendance::mark(db, activity_id, &username, date, status, note, json).await?
        }
        Commands::Status { action } => match action {
            StatusAction::List => commands::status::list(db, json).await?,
            StatusAction::Add { name, counted, description } => {
                commands::status::add(db, name, counted, description).await?
            }
            StatusAction::SetCounted { name, counted } => {
                commands::status::set_counted(db, &name, counted).await?
            }
            StatusAction::Delete { name } => commands::status::delete(db, &name).await?,
        },
        Commands::Stats { action } => match action {
            StatsAction::Recompute { activity_id, from, to, bucket } => {
                let (from, to) = service.window(from, to, today);
                commands::stats::recompute(&service, activity_id, from, to, bucket, json).await?
            }
            StatsAction::Show { activity_id, from, to } => {
                let (from, to) = service.window(from, to, today);
                commands::stats::show(db, activity_id, from, to, json).await?
            }
            StatsAction::Worship { worship_type, from, to } => {
                let (from, to) = service.window(from, to, today);
                commands::stats::worship(&service, worship_type, from, to, json).await?
            }
        },
    }

    Ok(())
}
