// Terminal rendering of tasks, day sections and board columns

use crate::models::{GroupKey, Priority, Status, Task, Theme};
use chrono::NaiveDate;
use colored::{ColoredString, Colorize};
use eyre::Result;
use std::collections::BTreeMap;
use std::io::Write;

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
    theme: Theme,
}

impl Renderer {
    pub fn new(color: bool, theme: Theme) -> Self {
        Self { color, theme }
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        match self.theme {
            Theme::Light => self.paint(text, |s| s.bold().blue()),
            Theme::Dark => self.paint(text, |s| s.bold().bright_cyan()),
        }
    }

    /// One line: id, checkbox, text, priority tag, due date
    pub fn task_line(&self, task: &Task, today: NaiveDate) -> String {
        let checkbox = match task.status {
            Status::Done => "[x]",
            Status::InProgress => "[~]",
            Status::Archived => "[-]",
            Status::Pending => "[ ]",
        };

        let mut line = format!("{:>13} {} ", task.id, checkbox);

        let text = if task.is_done() {
            self.paint(&task.text, |s| s.dimmed().strikethrough())
        } else {
            task.text.clone()
        };
        line.push_str(&text);

        if task.priority != Priority::None {
            let tag = format!(" [{}]", task.priority);
            let tag = match task.priority {
                Priority::High => self.paint(&tag, |s| s.red()),
                Priority::Medium => self.paint(&tag, |s| s.yellow()),
                _ => self.paint(&tag, |s| s.blue()),
            };
            line.push_str(&tag);
        }

        if let Some(due) = task.due_date {
            let label = format!(" Due: {}", format_due(due));
            if task.is_overdue(today) {
                line.push_str(&self.paint(&format!("{} (overdue)", label), |s| s.red().bold()));
            } else {
                line.push_str(&label);
            }
        }

        line
    }

    pub fn task_list(&self, out: &mut dyn Write, tasks: &[Task], today: NaiveDate) -> Result<()> {
        if tasks.is_empty() {
            writeln!(out, "  (no tasks)")?;
            return Ok(());
        }
        for task in tasks {
            writeln!(out, "{}", self.task_line(task, today))?;
        }
        Ok(())
    }

    /// Day sections, each headed by its date or "Unscheduled"
    pub fn date_sections(
        &self,
        out: &mut dyn Write,
        groups: &BTreeMap<GroupKey, Vec<Task>>,
        today: NaiveDate,
    ) -> Result<()> {
        for (key, tasks) in groups {
            let title = match key {
                GroupKey::Unscheduled => "Unscheduled".to_string(),
                GroupKey::Day(day) if *day == today => format!("Today ({})", day.format("%a, %b %-d")),
                GroupKey::Day(day) => day.format("%a, %b %-d %Y").to_string(),
                GroupKey::Status(status) => status.to_string(),
            };
            writeln!(out, "{}", self.heading(&title))?;
            self.task_list(out, tasks, today)?;
        }
        Ok(())
    }

    /// Board columns with their counts
    pub fn board(&self, out: &mut dyn Write, columns: &BTreeMap<Status, Vec<Task>>, today: NaiveDate) -> Result<()> {
        for (status, tasks) in columns {
            writeln!(out, "{}", self.heading(&format!("{} ({})", status, tasks.len())))?;
            self.task_list(out, tasks, today)?;
        }
        Ok(())
    }
}

/// Short display form, e.g. `Jan 5`
pub fn format_due(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}
