//! Persistence seams.
//!
//! Services talk to the document store only through these traits. `mongo` is the
//! production backend; `memory` keeps everything in process and backs the tests.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskPatch, TaskStatus, User};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Persists a new user. A duplicate email is reported as `AppError::Conflict`.
    async fn insert(&self, user: NewUser) -> Result<User, AppError>;
}

/// Task ids passed to a `TaskStore` have already been checked for shape by the caller.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: NewTask) -> Result<Task, AppError>;

    /// Every task, in store iteration order.
    async fn find_all(&self) -> Result<Vec<Task>, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>, AppError>;

    /// Applies `patch` and returns the task as stored afterwards, or `None` if absent.
    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Option<Task>, AppError>;

    /// Returns whether a task was removed.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    /// Tasks whose title or status contains `needle`, ignoring case.
    async fn search(&self, needle: &str) -> Result<Vec<Task>, AppError>;

    /// Participant values across all tasks. May contain duplicates and empty strings.
    async fn participants(&self) -> Result<Vec<String>, AppError>;

    /// Number of tasks, optionally restricted to one status.
    async fn count(&self, status: Option<TaskStatus>) -> Result<u64, AppError>;
}
