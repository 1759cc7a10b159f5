use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use eyre::{Result, eyre};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use taskboard::render::Renderer;
use taskboard::{
    Config, DeleteOutcome, GroupKey, Grouping, Priority, PriorityFilter, SortBy, Status, SystemClock, Task,
    TaskListStore, Theme,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Taskboard - to-do list with day sections, a status board and an archive")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the config file (default: <config dir>/taskboard/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the storage directory
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Layout {
    /// Day sections
    Date,
    /// Board columns
    Status,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task
    Add {
        #[arg(required = true)]
        text: Vec<String>,
        #[arg(short, long, default_value = "None")]
        priority: Priority,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
    },

    /// Show the active tasks
    List {
        /// Case-insensitive text search
        #[arg(short, long)]
        search: Option<String>,
        /// All, None, Low, Medium or High
        #[arg(short, long)]
        priority: Option<PriorityFilter>,
        /// dateAdded, dueDate, priority or manual
        #[arg(long)]
        sort: Option<SortBy>,
        #[arg(long, value_enum, default_value = "status")]
        by: Layout,
    },

    /// Show archived tasks
    Archived,

    /// Set a task's status (pending, in-progress, done, archived)
    Status { id: i64, status: Status },

    /// Flip a task between done and pending
    Toggle { id: i64 },

    /// Replace a task's text
    Edit {
        id: i64,
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Change a task's priority
    Priority { id: i64, priority: Priority },

    /// Set or clear (`none`) a task's due date
    Due { id: i64, due: String },

    /// Move a task to the archive
    Archive { id: i64 },

    /// Bring an archived task back as pending
    Restore { id: i64 },

    /// Delete a task permanently
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Move a task to a day ("unscheduled" or YYYY-MM-DD) or a status column
    Move { id: i64, group: GroupKey },

    /// Drop a task onto another one, reordering within the shared group
    Reorder {
        dragged: i64,
        target: i64,
        #[arg(long, value_enum, default_value = "date")]
        by: Layout,
    },

    /// Show or change the theme (light, dark, toggle)
    Theme { choice: Option<String> },
}

fn init_tracing(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| eyre!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

fn confirm_delete(task: &Task) -> bool {
    print!("Delete \"{}\" permanently? [y/N] ", task.text);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn report(found: bool, id: i64, done: &str) -> Result<()> {
    if found {
        println!("{} {}", done, id);
        Ok(())
    } else {
        Err(eyre!("No task with id {}", id))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let storage = config.open_storage()?;
    let mut store = TaskListStore::load(storage.as_ref(), SystemClock).with_archive_threshold(config.archive_threshold_ms());
    store.persist_to(storage);

    // One-shot reconciliation per session
    let swept = store.sweep_stale();
    if swept > 0 {
        println!("Archived {} task(s) done for over {} hours", swept, config.archive_after_hours);
    }

    let renderer = Renderer::new(config.color && io::stdout().is_terminal(), store.theme());
    let today = store.today();
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Add { text, priority, due } => match store.add(&text.join(" "), priority, due) {
            Some(task) => println!("Added {}", task.id),
            None => return Err(eyre!("Task text cannot be empty")),
        },
        Commands::List {
            search,
            priority,
            sort,
            by,
        } => {
            store.set_sort_by(sort.unwrap_or(config.sort_by));
            if let Some(query) = search {
                store.set_search_query(query);
            }
            if let Some(filter) = priority {
                store.set_filter_priority(filter);
            }
            match by {
                Layout::Status => renderer.board(&mut out, &store.visible_by_status(), today)?,
                Layout::Date => renderer.date_sections(&mut out, &store.visible_by_date(), today)?,
            }
            writeln!(out, "Completed Tasks: {}", store.completed_count())?;
        }
        Commands::Archived => renderer.task_list(&mut out, &store.archived(), today)?,
        Commands::Status { id, status } => report(store.set_status(id, status), id, "Updated")?,
        Commands::Toggle { id } => report(store.toggle_complete(id), id, "Toggled")?,
        Commands::Edit { id, text } => {
            let text = text.join(" ");
            if text.trim().is_empty() {
                return Err(eyre!("Task text cannot be empty"));
            }
            report(store.edit_text(id, &text), id, "Edited")?
        }
        Commands::Priority { id, priority } => report(store.set_priority(id, priority), id, "Updated")?,
        Commands::Due { id, due } => {
            let due = if due.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(NaiveDate::parse_from_str(&due, "%Y-%m-%d").map_err(|e| eyre!("Invalid due date {}: {}", due, e))?)
            };
            report(store.set_due_date(id, due), id, "Updated")?
        }
        Commands::Archive { id } => report(store.archive(id), id, "Archived")?,
        Commands::Restore { id } => report(store.restore(id), id, "Restored")?,
        Commands::Delete { id, yes } => match store.delete(id, true, |task| yes || confirm_delete(task)) {
            DeleteOutcome::Removed => println!("Deleted {}", id),
            DeleteOutcome::Declined => println!("Kept {}", id),
            DeleteOutcome::NotFound => return Err(eyre!("No task with id {}", id)),
        },
        Commands::Move { id, group } => report(store.move_to_group(id, group), id, "Moved")?,
        Commands::Reorder { dragged, target, by } => {
            let grouping = match by {
                Layout::Date => Grouping::ByDate,
                Layout::Status => Grouping::ByStatus,
            };
            let session = store
                .begin_drag(dragged, grouping)
                .ok_or_else(|| eyre!("No task with id {}", dragged))?;
            report(store.drop_on_task(session, target), dragged, "Moved")?
        }
        Commands::Theme { choice } => {
            let theme = match choice.as_deref() {
                None => store.theme(),
                Some("toggle") => store.toggle_theme(),
                Some(name) => {
                    let theme: Theme = name.parse().map_err(|e: String| eyre!(e))?;
                    store.set_theme(theme);
                    theme
                }
            };
            println!("Theme: {}", theme);
        }
    }

    Ok(())
}
