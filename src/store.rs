// Task list state manager: the single owner and mutator of the task list

use crate::clock::{Clock, IdGenerator, SystemClock};
use crate::filter::{self, PriorityFilter, SortBy, ViewOptions};
use crate::models::{GroupKey, Grouping, Priority, Status, Task, Theme};
use crate::storage::{self, KeyValueStorage};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Done tasks older than this are swept into the archive
pub const DEFAULT_ARCHIVE_THRESHOLD_MS: i64 = 86_400_000;

/// What part of the store state a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// The task list itself
    Tasks,
    Theme,
    /// Search, priority filter or sort order
    View,
}

/// Observer called after every state change, with the store in its new state
pub type Subscriber = Box<dyn FnMut(Change, &TaskListStore)>;

/// A drag in progress: which task is being dragged and the group it left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub task_id: i64,
    pub origin: GroupKey,
}

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    /// Confirmation was refused
    Declined,
    NotFound,
}

pub struct TaskListStore {
    tasks: Vec<Task>,
    view: ViewOptions,
    theme: Theme,
    ids: IdGenerator,
    clock: Box<dyn Clock>,
    archive_threshold_ms: i64,
    subscribers: Vec<Subscriber>,
}

impl Default for TaskListStore {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl TaskListStore {
    /// Empty store
    pub fn new<C: Clock + 'static>(clock: C) -> Self {
        Self::with_tasks(Vec::new(), clock)
    }

    /// Store over an existing list. Ids are issued above the largest one present.
    pub fn with_tasks<C: Clock + 'static>(tasks: Vec<Task>, clock: C) -> Self {
        let ids = IdGenerator::seeded(tasks.iter().map(|task| task.id));
        Self {
            tasks,
            view: ViewOptions::default(),
            theme: Theme::default(),
            ids,
            clock: Box::new(clock),
            archive_threshold_ms: DEFAULT_ARCHIVE_THRESHOLD_MS,
            subscribers: Vec::new(),
        }
    }

    /// Load todos and theme from storage. Bad data never fails the load.
    pub fn load<C: Clock + 'static>(storage: &dyn KeyValueStorage, clock: C) -> Self {
        let mut store = Self::with_tasks(storage::load_todos(storage), clock);
        store.theme = storage::load_theme(storage);
        store
    }

    pub fn with_archive_threshold(mut self, threshold_ms: i64) -> Self {
        self.archive_threshold_ms = threshold_ms;
        self
    }

    pub fn archive_threshold_ms(&self) -> i64 {
        self.archive_threshold_ms
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(Change, &TaskListStore) + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Persist every task and theme change to `storage`. Write failures are
    /// logged and otherwise ignored; the in-memory state stays authoritative.
    pub fn persist_to(&mut self, mut backend: Box<dyn KeyValueStorage>) {
        self.subscribe(move |change, store| {
            let result = match change {
                Change::Tasks => storage::save_todos(backend.as_mut(), store.tasks()),
                Change::Theme => storage::save_theme(backend.as_mut(), store.theme()),
                Change::View => Ok(()),
            };
            if let Err(e) = result {
                warn!(?change, error = ?e, "Failed to persist state");
            }
        });
    }

    fn notify(&mut self, change: Change) {
        let mut subscribers = std::mem::take(&mut self.subscribers);
        for subscriber in subscribers.iter_mut() {
            subscriber(change, self);
        }
        self.subscribers = subscribers;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    fn find_mut(&mut self, id: i64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add a task at the front of the list. Blank text adds nothing, and
    /// neither does an add once the largest possible id is taken.
    pub fn add(&mut self, text: &str, priority: Priority, due_date: Option<NaiveDate>) -> Option<Task> {
        if text.trim().is_empty() {
            debug!("Ignoring add with blank text");
            return None;
        }

        let Some(id) = self.ids.next(self.clock.now_ms()) else {
            warn!("No task id left above the largest stored one, ignoring add");
            return None;
        };
        let mut task = Task::new(id, text);
        task.priority = priority;
        task.due_date = due_date;
        task.date = Some(self.clock.today());

        self.tasks.insert(0, task.clone());
        info!(id, "Added task");
        self.notify(Change::Tasks);
        Some(task)
    }

    /// Flip between done and pending
    pub fn toggle_complete(&mut self, id: i64) -> bool {
        let next = match self.get(id) {
            Some(task) if task.is_done() => Status::Pending,
            Some(_) => Status::Done,
            None => return false,
        };
        self.set_status(id, next)
    }

    /// Change workflow state.
    ///
    /// Entering `Done` stamps `completed_at`; moving back to `Pending` or
    /// `InProgress` clears it. Archiving keeps the stamp so the archive can
    /// be ordered by completion time. Leaving `Archived` for `Pending` or
    /// `InProgress` (as `restore` does) clears it too.
    pub fn set_status(&mut self, id: i64, status: Status) -> bool {
        let now = self.clock.now_ms();
        let Some(task) = self.find_mut(id) else {
            return false;
        };

        let previous = task.status;
        if previous == status {
            return true;
        }

        task.status = status;
        match status {
            Status::Done => task.completed_at = Some(now),
            Status::Pending | Status::InProgress => task.completed_at = None,
            Status::Archived => {}
        }

        debug!(id, from = %previous, to = %status, "Changed task status");
        self.notify(Change::Tasks);
        true
    }

    pub fn archive(&mut self, id: i64) -> bool {
        self.set_status(id, Status::Archived)
    }

    /// Bring a task back as pending, whatever it was before archiving
    pub fn restore(&mut self, id: i64) -> bool {
        self.set_status(id, Status::Pending)
    }

    pub fn edit_text(&mut self, id: i64, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let Some(task) = self.find_mut(id) else {
            return false;
        };
        task.text = text.to_string();
        self.notify(Change::Tasks);
        true
    }

    pub fn set_priority(&mut self, id: i64, priority: Priority) -> bool {
        let Some(task) = self.find_mut(id) else {
            return false;
        };
        task.priority = priority;
        self.notify(Change::Tasks);
        true
    }

    pub fn set_due_date(&mut self, id: i64, due_date: Option<NaiveDate>) -> bool {
        let Some(task) = self.find_mut(id) else {
            return false;
        };
        task.due_date = due_date;
        self.notify(Change::Tasks);
        true
    }

    /// Remove a task from the list.
    ///
    /// Only a permanent delete of a task that is not archived asks `confirm`;
    /// every other delete removes the task straight away.
    pub fn delete<F>(&mut self, id: i64, permanent: bool, confirm: F) -> DeleteOutcome
    where
        F: FnOnce(&Task) -> bool,
    {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return DeleteOutcome::NotFound;
        };

        if permanent && !self.tasks[index].is_archived() && !confirm(&self.tasks[index]) {
            debug!(id, "Delete not confirmed");
            return DeleteOutcome::Declined;
        }

        self.tasks.remove(index);
        info!(id, "Deleted task");
        self.notify(Change::Tasks);
        DeleteOutcome::Removed
    }

    /// Drag `dragged_id` onto `target_id` inside `group`.
    ///
    /// The dragged task is spliced out of the group's sequence and then
    /// inserted at the index the target held before the removal. Tasks
    /// outside the group keep their positions.
    pub fn reorder_within_group(&mut self, dragged_id: i64, target_id: i64, group: GroupKey) -> bool {
        if dragged_id == target_id {
            return false;
        }

        let slots: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.in_group(&group))
            .map(|(index, _)| index)
            .collect();
        let mut members: Vec<Task> = slots.iter().map(|&index| self.tasks[index].clone()).collect();

        let dragged_index = members.iter().position(|task| task.id == dragged_id);
        let target_index = members.iter().position(|task| task.id == target_id);
        let (Some(dragged_index), Some(target_index)) = (dragged_index, target_index) else {
            return false;
        };

        let dragged = members.remove(dragged_index);
        members.insert(target_index, dragged);

        for (slot, task) in slots.into_iter().zip(members) {
            self.tasks[slot] = task;
        }

        debug!(dragged_id, target_id, %group, "Reordered within group");
        self.notify(Change::Tasks);
        true
    }

    /// Move a task to another day section or board column
    pub fn move_to_group(&mut self, id: i64, target: GroupKey) -> bool {
        match target {
            GroupKey::Status(status) => self.set_status(id, status),
            GroupKey::Unscheduled | GroupKey::Day(_) => {
                let Some(task) = self.find_mut(id) else {
                    return false;
                };
                task.date = match target {
                    GroupKey::Day(day) => Some(day),
                    _ => None,
                };
                debug!(id, group = %target, "Moved task to group");
                self.notify(Change::Tasks);
                true
            }
        }
    }

    /// Archive every task done for longer than `threshold_ms` as of `now_ms`.
    /// Returns the number archived; a second call with the same `now_ms`
    /// archives nothing.
    pub fn auto_archive_stale(&mut self, now_ms: i64, threshold_ms: i64) -> usize {
        let mut archived = 0;
        for task in self.tasks.iter_mut() {
            if task.status != Status::Done {
                continue;
            }
            match task.completed_at {
                Some(completed_at) if now_ms.saturating_sub(completed_at) > threshold_ms => {
                    task.status = Status::Archived;
                    archived += 1;
                }
                _ => {}
            }
        }

        if archived > 0 {
            info!(count = archived, "Archived stale done tasks");
            self.notify(Change::Tasks);
        }
        archived
    }

    /// One-shot sweep at load time, using the store's clock and threshold
    pub fn sweep_stale(&mut self) -> usize {
        let now = self.clock.now_ms();
        self.auto_archive_stale(now, self.archive_threshold_ms)
    }

    // ========================================================================
    // Drag and drop
    // ========================================================================

    /// Start dragging a task; the origin is its current group under `grouping`
    pub fn begin_drag(&self, id: i64, grouping: Grouping) -> Option<DragSession> {
        self.get(id).map(|task| DragSession {
            task_id: id,
            origin: task.group_key(grouping),
        })
    }

    /// Drop onto another task: reorder inside the origin group, or join the
    /// target's group when the target lives elsewhere.
    pub fn drop_on_task(&mut self, session: DragSession, target_id: i64) -> bool {
        let Some(target) = self.get(target_id) else {
            return false;
        };

        if target.in_group(&session.origin) {
            return self.reorder_within_group(session.task_id, target_id, session.origin);
        }

        let grouping = match session.origin {
            GroupKey::Status(_) => Grouping::ByStatus,
            GroupKey::Unscheduled | GroupKey::Day(_) => Grouping::ByDate,
        };
        let destination = target.group_key(grouping);
        self.move_to_group(session.task_id, destination)
    }

    /// Drop onto a group's empty area
    pub fn drop_on_group(&mut self, session: DragSession, group: GroupKey) -> bool {
        if group == session.origin {
            return false;
        }
        self.move_to_group(session.task_id, group)
    }

    // ========================================================================
    // UI state
    // ========================================================================

    pub fn view_options(&self) -> &ViewOptions {
        &self.view
    }

    pub fn search_query(&self) -> &str {
        &self.view.search_query
    }

    pub fn filter_priority(&self) -> PriorityFilter {
        self.view.filter_priority
    }

    pub fn sort_by(&self) -> SortBy {
        self.view.sort_by
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.view.search_query = query.into();
        self.notify(Change::View);
    }

    pub fn set_filter_priority(&mut self, filter: PriorityFilter) {
        self.view.filter_priority = filter;
        self.notify(Change::View);
    }

    pub fn set_sort_by(&mut self, sort_by: SortBy) {
        self.view.sort_by = sort_by;
        self.notify(Change::View);
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.notify(Change::Theme);
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.set_theme(self.theme.toggled());
        self.theme
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Default view under the current search, filter and sort
    pub fn visible(&self) -> Vec<Task> {
        filter::view(&self.tasks, &self.view)
    }

    pub fn visible_by_status(&self) -> BTreeMap<Status, Vec<Task>> {
        filter::group_by_status(&self.visible())
    }

    pub fn visible_by_date(&self) -> BTreeMap<GroupKey, Vec<Task>> {
        filter::group_by_date(&self.visible())
    }

    pub fn archived(&self) -> Vec<Task> {
        filter::archived_view(&self.tasks)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.is_done()).count()
    }
}
