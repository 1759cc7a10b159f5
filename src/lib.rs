// Taskboard - to-do list state manager with kanban views and key-value persistence

pub mod clock;
pub mod config;
pub mod filter;
pub mod models;
pub mod render;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use clock::{Clock, IdGenerator, ManualClock, SystemClock, now_ms};
pub use config::{Backend, Config};
pub use filter::{PriorityFilter, SortBy, ViewOptions, archived_view, group_by_date, group_by_status, view};
pub use models::{GroupKey, Grouping, Priority, Status, Task, Theme};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, SqliteStorage};
pub use store::{Change, DeleteOutcome, DragSession, TaskListStore};
