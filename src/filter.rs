// Derived views: filtering, sorting and grouping of the task list

use crate::models::{GroupKey, Priority, Status, Task};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Priority filter applied to the default view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl PriorityFilter {
    pub fn matches(&self, priority: Priority) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Only(wanted) => *wanted == priority,
        }
    }
}

impl fmt::Display for PriorityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityFilter::All => write!(f, "All"),
            PriorityFilter::Only(priority) => write!(f, "{}", priority),
        }
    }
}

impl FromStr for PriorityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(PriorityFilter::All);
        }
        s.parse::<Priority>().map(PriorityFilter::Only)
    }
}

/// Sort order for the default view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    /// Newest first (descending id)
    #[default]
    DateAdded,
    /// Earliest due date first; tasks without one go last
    DueDate,
    /// High, Medium, Low, None
    Priority,
    /// Keep list order, so drag reordering shows through
    Manual,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::DateAdded => "dateAdded",
            SortBy::DueDate => "dueDate",
            SortBy::Priority => "priority",
            SortBy::Manual => "manual",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .collect();
        match normalized.as_str() {
            "dateadded" | "added" => Ok(SortBy::DateAdded),
            "duedate" | "due" => Ok(SortBy::DueDate),
            "priority" => Ok(SortBy::Priority),
            "manual" => Ok(SortBy::Manual),
            _ => Err(format!("unknown sort order: {}", s)),
        }
    }
}

/// UI state that drives the default view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    pub search_query: String,
    pub filter_priority: PriorityFilter,
    pub sort_by: SortBy,
}

/// Default view: drop archived, search, filter by priority, then sort.
///
/// All sorts are stable, so ties keep their list order.
pub fn view(tasks: &[Task], options: &ViewOptions) -> Vec<Task> {
    let needle = options.search_query.to_lowercase();

    let mut visible: Vec<Task> = tasks
        .iter()
        .filter(|task| !task.is_archived())
        .filter(|task| needle.is_empty() || task.text.to_lowercase().contains(&needle))
        .filter(|task| options.filter_priority.matches(task.priority))
        .cloned()
        .collect();

    match options.sort_by {
        SortBy::DateAdded => visible.sort_by_key(|task| Reverse(task.id)),
        SortBy::DueDate => visible.sort_by_key(|task| (task.due_date.is_none(), task.due_date)),
        SortBy::Priority => visible.sort_by_key(|task| Reverse(task.priority.rank())),
        SortBy::Manual => {}
    }

    visible
}

/// Board columns. Every column is present, even when empty; archived tasks
/// are not placed anywhere.
pub fn group_by_status(tasks: &[Task]) -> BTreeMap<Status, Vec<Task>> {
    let mut groups: BTreeMap<Status, Vec<Task>> = Status::BOARD.iter().map(|status| (*status, Vec::new())).collect();

    for task in tasks {
        if let Some(column) = groups.get_mut(&task.status) {
            column.push(task.clone());
        }
    }

    groups
}

/// Day sections, iterated unscheduled first then by ascending date
pub fn group_by_date(tasks: &[Task]) -> BTreeMap<GroupKey, Vec<Task>> {
    let mut groups: BTreeMap<GroupKey, Vec<Task>> = BTreeMap::new();

    for task in tasks {
        groups.entry(task.date_key()).or_default().push(task.clone());
    }

    groups
}

/// Archived tasks, most recently completed first
pub fn archived_view(tasks: &[Task]) -> Vec<Task> {
    let mut archived: Vec<Task> = tasks.iter().filter(|task| task.is_archived()).cloned().collect();
    archived.sort_by_key(|task| Reverse(task.completed_at));
    archived
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn task(id: i64, text: &str) -> Task {
        Task::new(id, text)
    }

    fn with_priority(id: i64, priority: Priority) -> Task {
        let mut t = task(id, "t");
        t.priority = priority;
        t
    }

    fn with_due(id: i64, due: Option<&str>) -> Task {
        let mut t = task(id, "t");
        t.due_date = due.map(day);
        t
    }

    fn sorted(sort_by: SortBy) -> ViewOptions {
        ViewOptions {
            sort_by,
            ..Default::default()
        }
    }

    #[test]
    fn test_view_sort_by_priority() {
        let tasks = vec![
            with_priority(1, Priority::Low),
            with_priority(2, Priority::High),
            with_priority(3, Priority::None),
            with_priority(4, Priority::Medium),
        ];

        let result: Vec<Priority> = view(&tasks, &sorted(SortBy::Priority)).iter().map(|t| t.priority).collect();
        assert_eq!(
            result,
            vec![Priority::High, Priority::Medium, Priority::Low, Priority::None]
        );
    }

    #[test]
    fn test_view_sort_by_priority_is_stable() {
        let tasks = vec![
            with_priority(1, Priority::High),
            with_priority(2, Priority::Low),
            with_priority(3, Priority::High),
        ];

        let ids: Vec<i64> = view(&tasks, &sorted(SortBy::Priority)).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn test_view_sort_by_due_date_nulls_last() {
        let tasks = vec![
            with_due(1, None),
            with_due(2, Some("2024-01-10")),
            with_due(3, Some("2024-01-05")),
            with_due(4, None),
        ];

        let result = view(&tasks, &sorted(SortBy::DueDate));
        let dues: Vec<Option<NaiveDate>> = result.iter().map(|t| t.due_date).collect();
        assert_eq!(
            dues,
            vec![Some(day("2024-01-05")), Some(day("2024-01-10")), None, None]
        );
        // Null due dates keep their relative order
        assert_eq!(result[2].id, 1);
        assert_eq!(result[3].id, 4);
    }

    #[test]
    fn test_view_sort_by_date_added_newest_first() {
        let tasks = vec![task(10, "a"), task(30, "b"), task(20, "c")];
        let ids: Vec<i64> = view(&tasks, &sorted(SortBy::DateAdded)).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![30, 20, 10]);
    }

    #[test]
    fn test_view_manual_keeps_list_order() {
        let tasks = vec![task(10, "a"), task(30, "b"), task(20, "c")];
        let ids: Vec<i64> = view(&tasks, &sorted(SortBy::Manual)).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![10, 30, 20]);
    }

    #[test]
    fn test_view_excludes_archived() {
        let mut archived = task(2, "old");
        archived.status = Status::Archived;
        let tasks = vec![task(1, "new"), archived];

        let result = view(&tasks, &ViewOptions::default());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 1);
    }

    #[test]
    fn test_view_search_case_insensitive() {
        let tasks = vec![task(1, "Buy MILK"), task(2, "walk dog"), task(3, "milkshake")];
        let options = ViewOptions {
            search_query: "milk".to_string(),
            sort_by: SortBy::Manual,
            ..Default::default()
        };

        let ids: Vec<i64> = view(&tasks, &options).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_view_search_keeps_spaces() {
        let tasks = vec![task(1, "Buy milk"), task(2, "milkshake")];
        let options = ViewOptions {
            search_query: " milk".to_string(),
            sort_by: SortBy::Manual,
            ..Default::default()
        };
        let ids: Vec<i64> = view(&tasks, &options).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1]);

        let blank = ViewOptions {
            search_query: "  ".to_string(),
            ..options
        };
        assert!(view(&tasks, &blank).is_empty());
    }

    #[test]
    fn test_view_filter_priority() {
        let tasks = vec![
            with_priority(1, Priority::High),
            with_priority(2, Priority::Low),
            with_priority(3, Priority::High),
        ];
        let options = ViewOptions {
            filter_priority: PriorityFilter::Only(Priority::High),
            ..Default::default()
        };

        let ids: Vec<i64> = view(&tasks, &options).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_group_by_status_preserves_order() {
        let mut a = task(1, "a");
        a.status = Status::Done;
        let b = task(2, "b");
        let mut c = task(3, "c");
        c.status = Status::InProgress;
        let d = task(4, "d");
        let mut e = task(5, "e");
        e.status = Status::Archived;

        let groups = group_by_status(&[a, b, c, d, e]);
        assert_eq!(groups.len(), 3);
        let pending: Vec<i64> = groups[&Status::Pending].iter().map(|t| t.id).collect();
        assert_eq!(pending, vec![2, 4]);
        assert_eq!(groups[&Status::InProgress].len(), 1);
        assert_eq!(groups[&Status::Done][0].id, 1);
        assert!(!groups.contains_key(&Status::Archived));
    }

    #[test]
    fn test_group_by_date_unscheduled_first() {
        let mut a = task(1, "a");
        a.date = Some(day("2024-02-01"));
        let b = task(2, "b");
        let mut c = task(3, "c");
        c.date = Some(day("2024-01-15"));
        let mut d = task(4, "d");
        d.date = Some(day("2024-02-01"));

        let groups = group_by_date(&[a, b, c, d]);
        let keys: Vec<GroupKey> = groups.keys().copied().collect();
        assert_eq!(
            keys,
            vec![
                GroupKey::Unscheduled,
                GroupKey::Day(day("2024-01-15")),
                GroupKey::Day(day("2024-02-01")),
            ]
        );
        let feb: Vec<i64> = groups[&GroupKey::Day(day("2024-02-01"))].iter().map(|t| t.id).collect();
        assert_eq!(feb, vec![1, 4]);
    }

    #[test]
    fn test_archived_view_most_recent_first() {
        let mut a = task(1, "a");
        a.status = Status::Archived;
        a.completed_at = Some(100);
        let mut b = task(2, "b");
        b.status = Status::Archived;
        b.completed_at = Some(300);
        let mut c = task(3, "c");
        c.status = Status::Archived;
        let d = task(4, "d");

        let ids: Vec<i64> = archived_view(&[a, b, c, d]).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_parse_filter_and_sort() {
        assert_eq!("all".parse::<PriorityFilter>().unwrap(), PriorityFilter::All);
        assert_eq!(
            "High".parse::<PriorityFilter>().unwrap(),
            PriorityFilter::Only(Priority::High)
        );
        assert_eq!("dueDate".parse::<SortBy>().unwrap(), SortBy::DueDate);
        assert_eq!("date-added".parse::<SortBy>().unwrap(), SortBy::DateAdded);
        assert!("random".parse::<SortBy>().is_err());
    }
}
