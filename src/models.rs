// Data models for the task board

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single to-do entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredTask")]
pub struct Task {
    pub id: i64,
    pub text: String,
    pub status: Status,
    /// Day section the task is filed under; `None` is the unscheduled section
    pub date: Option<NaiveDate>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    /// Milliseconds since epoch of the last transition into `Done`
    pub completed_at: Option<i64>,
}

impl Task {
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            status: Status::Pending,
            date: None,
            priority: Priority::None,
            due_date: None,
            completed_at: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == Status::Done
    }

    pub fn is_archived(&self) -> bool {
        self.status == Status::Archived
    }

    /// Past due and not yet done. Archived tasks are never overdue.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => !matches!(self.status, Status::Done | Status::Archived) && due < today,
            None => false,
        }
    }

    /// Day section key for this task
    pub fn date_key(&self) -> GroupKey {
        match self.date {
            Some(day) => GroupKey::Day(day),
            None => GroupKey::Unscheduled,
        }
    }

    /// Key of the group this task falls in under the given grouping
    pub fn group_key(&self, grouping: Grouping) -> GroupKey {
        match grouping {
            Grouping::ByDate => self.date_key(),
            Grouping::ByStatus => GroupKey::Status(self.status),
        }
    }

    pub fn in_group(&self, key: &GroupKey) -> bool {
        match key {
            GroupKey::Unscheduled => self.date.is_none(),
            GroupKey::Day(day) => self.date == Some(*day),
            GroupKey::Status(status) => self.status == *status,
        }
    }
}

/// On-disk shape, accepting both the boolean `completed` layout and `status`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    id: i64,
    text: String,
    status: Option<Status>,
    completed: Option<bool>,
    date: Option<NaiveDate>,
    #[serde(default)]
    priority: Priority,
    due_date: Option<NaiveDate>,
    completed_at: Option<i64>,
}

impl From<StoredTask> for Task {
    fn from(stored: StoredTask) -> Self {
        let status = match (stored.status, stored.completed) {
            (Some(status), _) => status,
            (None, Some(true)) => Status::Done,
            (None, _) => Status::Pending,
        };

        Self {
            id: stored.id,
            text: stored.text,
            status,
            date: stored.date,
            priority: stored.priority,
            due_date: stored.due_date,
            completed_at: stored.completed_at,
        }
    }
}

/// Workflow state of a task. Declaration order is board column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
    Archived,
}

impl Status {
    /// Columns shown on the board
    pub const BOARD: [Status; 3] = [Status::Pending, Status::InProgress, Status::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
            Status::Archived => "Archived",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect();
        match normalized.as_str() {
            "pending" | "todo" => Ok(Status::Pending),
            "inprogress" | "doing" => Ok(Status::InProgress),
            "done" => Ok(Status::Done),
            "archived" => Ok(Status::Archived),
            _ => Err(format!("unknown status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn rank(&self) -> u8 {
        match self {
            Priority::None => 0,
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::None => "None",
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Priority::None),
            "low" => Ok(Priority::Low),
            "medium" | "med" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(format!("unknown priority: {}", s)),
        }
    }
}

/// How tasks are partitioned for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    ByDate,
    ByStatus,
}

/// Identifies one display group: a day section or a board column.
///
/// Ordering puts `Unscheduled` first, then days ascending, then columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Unscheduled,
    Day(NaiveDate),
    Status(Status),
}

impl GroupKey {
    pub const UNSCHEDULED: &'static str = "unscheduled";
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Unscheduled => write!(f, "{}", Self::UNSCHEDULED),
            GroupKey::Day(day) => write!(f, "{}", day.format("%Y-%m-%d")),
            GroupKey::Status(status) => write!(f, "{}", status),
        }
    }
}

impl FromStr for GroupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(Self::UNSCHEDULED) {
            return Ok(GroupKey::Unscheduled);
        }
        if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(GroupKey::Day(day));
        }
        trimmed
            .parse::<Status>()
            .map(GroupKey::Status)
            .map_err(|_| format!("unknown group: {} (expected a date, a status or 'unscheduled')", s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("unknown theme: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let mut task = Task::new(1700000000000, "Buy milk");
        task.due_date = Some(day("2024-01-01"));
        task.status = Status::InProgress;

        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"dueDate\":\"2024-01-01\""));
        assert!(json.contains("\"completedAt\":null"));
        assert!(json.contains("\"status\":\"In Progress\""));
        assert!(!json.contains("completed\""));
    }

    #[test]
    fn test_legacy_completed_flag_is_migrated() {
        let json = r#"[
            {"id":1,"text":"a","completed":true,"date":"2024-03-01","priority":"High","dueDate":null},
            {"id":2,"text":"b","completed":false,"date":null,"priority":"None","dueDate":"2024-03-09"}
        ]"#;
        let tasks: Vec<Task> = serde_json::from_str(json).unwrap();

        assert_eq!(tasks[0].status, Status::Done);
        assert_eq!(tasks[0].date, Some(day("2024-03-01")));
        assert_eq!(tasks[0].priority, Priority::High);
        assert_eq!(tasks[1].status, Status::Pending);
        assert_eq!(tasks[1].due_date, Some(day("2024-03-09")));
    }

    #[test]
    fn test_missing_status_and_priority_default() {
        let task: Task = serde_json::from_str(r#"{"id":5,"text":"bare"}"#).unwrap();
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.priority, Priority::None);
        assert_eq!(task.date, None);
    }

    #[test]
    fn test_status_wins_over_completed() {
        let task: Task = serde_json::from_str(r#"{"id":5,"text":"x","status":"Archived","completed":false}"#).unwrap();
        assert_eq!(task.status, Status::Archived);
    }

    #[test]
    fn test_is_overdue() {
        let today = day("2024-01-10");
        let mut task = Task::new(1, "report");
        assert!(!task.is_overdue(today));

        task.due_date = Some(day("2024-01-09"));
        assert!(task.is_overdue(today));

        task.due_date = Some(today);
        assert!(!task.is_overdue(today));

        task.due_date = Some(day("2024-01-01"));
        task.status = Status::Done;
        assert!(!task.is_overdue(today));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("in progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("In-Progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("DONE".parse::<Status>().unwrap(), Status::Done);
        assert!("later".parse::<Status>().is_err());
    }

    #[test]
    fn test_priority_rank_and_parse() {
        assert_eq!(Priority::High.rank(), 3);
        assert_eq!(Priority::None.rank(), 0);
        assert_eq!("medium".parse::<Priority>().unwrap(), Priority::Medium);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_group_key_parse_and_order() {
        assert_eq!("unscheduled".parse::<GroupKey>().unwrap(), GroupKey::Unscheduled);
        assert_eq!(
            "2024-02-01".parse::<GroupKey>().unwrap(),
            GroupKey::Day(day("2024-02-01"))
        );
        assert_eq!("done".parse::<GroupKey>().unwrap(), GroupKey::Status(Status::Done));
        assert!("nowhere".parse::<GroupKey>().is_err());

        let mut keys = vec![
            GroupKey::Day(day("2024-02-01")),
            GroupKey::Unscheduled,
            GroupKey::Day(day("2024-01-15")),
        ];
        keys.sort();
        assert_eq!(keys[0], GroupKey::Unscheduled);
        assert_eq!(keys[1], GroupKey::Day(day("2024-01-15")));
        assert_eq!(GroupKey::Unscheduled.to_string(), "unscheduled");
    }

    #[test]
    fn test_in_group() {
        let mut task = Task::new(1, "x");
        assert!(task.in_group(&GroupKey::Unscheduled));
        task.date = Some(day("2024-01-01"));
        assert!(task.in_group(&GroupKey::Day(day("2024-01-01"))));
        assert!(!task.in_group(&GroupKey::Unscheduled));
        assert!(task.in_group(&GroupKey::Status(Status::Pending)));
    }

    #[test]
    fn test_theme_toggle_and_serde() {
        assert_eq!(Theme::default(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
    }
}
