pub mod task;
pub mod user;

pub use task::{
    parse_due_date, NewTask, ParticipantsSummary, Task, TaskBoard, TaskCounts, TaskInput,
    TaskPatch, TaskPriority, TaskStatus,
};
pub use user::{LoginRequest, NewUser, RegisterRequest, TokenResponse, User, UserResponse};
