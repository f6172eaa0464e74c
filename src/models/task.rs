use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Represents the priority of a task.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }

    /// Case-insensitive lookup used for values coming from outside the API.
    pub fn parse_loose(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            _ => None,
        }
    }
}

/// Represents the status of a task, which is also the board column it appears in.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Todo,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed.
    Closed,
    /// Task is parked.
    Frozen,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Closed,
        TaskStatus::Frozen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::Closed => "closed",
            TaskStatus::Frozen => "frozen",
        }
    }
}

/// Treats an explicit `null` the same as an absent list.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Parses an ISO 8601 datetime. Timestamps without an offset are taken as UTC.
pub fn parse_due_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(with_offset) = value.parse::<DateTime<FixedOffset>>() {
        return Some(with_offset.with_timezone(&Utc));
    }
    value
        .parse::<NaiveDateTime>()
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn optional_due_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| {
            parse_due_date(&raw).ok_or_else(|| {
                let message = format!("due_date `{}` is not an ISO 8601 datetime", raw);
                <D::Error as de::Error>::custom(message)
            })
        })
        .transpose()
}

/// Keeps an explicit `null` apart from an absent field: `Some(None)` clears the value.
fn clearable_due_date<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    optional_due_date(deserializer).map(Some)
}

/// Represents a task as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Store-generated identifier, rendered as a 24 character hex string.
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub participants: Vec<String>,
    /// Id of the user who created the task. Never changes after creation.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// A task ready to be persisted; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub participants: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl NewTask {
    pub fn into_task(self, id: String) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            due_date: self.due_date,
            status: self.status,
            participants: self.participants,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}

/// Input structure for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    #[serde(default, deserialize_with = "optional_due_date")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub participants: Vec<String>,
}

impl TaskInput {
    /// Due dates must lie strictly after `now`.
    pub fn due_date_is_valid(&self, now: DateTime<Utc>) -> bool {
        self.due_date.map_or(true, |due| due > now)
    }

    /// Stamps the creator and creation time onto the input.
    pub fn into_new_task(self, created_by: String, created_at: DateTime<Utc>) -> NewTask {
        NewTask {
            title: self.title,
            description: self.description,
            priority: self.priority,
            due_date: self.due_date,
            status: self.status,
            participants: self.participants,
            created_by,
            created_at,
        }
    }
}

/// Partial update. Absent (or `null`) fields are left untouched, except
/// `due_date`, where an explicit `null` clears the deadline.
///
/// The creator and creation time are deliberately not part of this type, so a
/// client can never overwrite them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TaskPatch {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "clearable_due_date")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub status: Option<TaskStatus>,
    pub participants: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
            && self.participants.is_none()
    }

    /// Applies the supplied fields to `task` in place.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(participants) = &self.participants {
            task.participants = participants.clone();
        }
    }
}

/// The board view: every task appears in the column matching its status.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBoard {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub closed: Vec<Task>,
    pub frozen: Vec<Task>,
}

impl TaskBoard {
    pub fn column_mut(&mut self, status: TaskStatus) -> &mut Vec<Task> {
        match status {
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Closed => &mut self.closed,
            TaskStatus::Frozen => &mut self.frozen,
        }
    }

    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Closed => &self.closed,
            TaskStatus::Frozen => &self.frozen,
        }
    }
}

impl FromIterator<Task> for TaskBoard {
    fn from_iter<I: IntoIterator<Item = Task>>(tasks: I) -> Self {
        let mut board = TaskBoard::default();
        for task in tasks {
            board.column_mut(task.status).push(task);
        }
        board
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub total: u64,
    pub completed: u64,
    pub frozen: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantsSummary {
    pub participants: Vec<String>,
    pub counts: TaskCounts,
}
