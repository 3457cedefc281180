//! Domain model (ids, job kinds, status, task record, events, errors).

pub mod errors;
pub mod events;
pub mod ids;
pub mod state;
pub mod task;
pub mod task_type;

pub use self::errors::{ErrorKind, JobError};
pub use self::events::TaskEvent;
pub use self::ids::{ParseTaskIdError, TaskId};
pub use self::state::{ParseStatusError, TaskStatus};
pub use self::task::{AddOptions, LogEntry, LogLevel, Task};
pub use self::task_type::{JobKind, TaskType};
