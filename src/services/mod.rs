pub mod prefetch;
pub mod result_actions;
pub mod schedule;

pub use prefetch::{ActionType, ClassList, LessonScope, RelatedData, RelatedLookups, SqliteLookups, Table, prefetch};
pub use result_actions::{ResultActions, SqliteResultActions};
pub use schedule::{ScheduleEntry, ScheduleOwner, adjust_to_week, schedule_for};
