use chrono::Utc;
use log::info;
use mongodb::bson::oid::ObjectId;
use std::collections::BTreeSet;
use std::sync::Arc;
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    ParticipantsSummary, Task, TaskBoard, TaskCounts, TaskInput, TaskPatch, TaskStatus, User,
};
use crate::store::TaskStore;

/// Task CRUD, search and the board views.
///
/// Every call re-reads the store; nothing is cached between requests.
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
}

/// Rejects anything that is not a 24 character hex ObjectId.
fn check_id(id: &str) -> Result<(), AppError> {
    ObjectId::parse_str(id)
        .map(|_| ())
        .map_err(|_| AppError::InvalidId("Invalid task ID".into()))
}

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>) -> Self {
        Self { tasks }
    }

    /// Creates a task owned by `caller`.
    pub async fn create(&self, caller: &User, input: TaskInput) -> Result<Task, AppError> {
        input.validate()?;
        let now = Utc::now();
        if !input.due_date_is_valid(now) {
            return Err(AppError::ValidationError(
                "Due date must be in the future".into(),
            ));
        }

        let task = self
            .tasks
            .insert(input.into_new_task(caller.id.clone(), now))
            .await?;
        info!("task {} created by {}", task.id, caller.email);
        Ok(task)
    }

    /// All tasks grouped into their status columns.
    pub async fn list(&self) -> Result<TaskBoard, AppError> {
        Ok(self.tasks.find_all().await?.into_iter().collect())
    }

    pub async fn get(&self, id: &str) -> Result<Task, AppError> {
        check_id(id)?;
        self.tasks.find_by_id(id).await?.ok_or_else(not_found)
    }

    /// Applies the supplied fields and returns the updated task.
    pub async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task, AppError> {
        check_id(id)?;
        if patch.is_empty() {
            return Err(AppError::ValidationError("No update data provided".into()));
        }
        patch.validate()?;

        let task = self.tasks.update(id, &patch).await?.ok_or_else(not_found)?;
        info!("task {} updated", task.id);
        Ok(task)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        check_id(id)?;
        if !self.tasks.delete(id).await? {
            return Err(not_found());
        }
        info!("task {} deleted", id);
        Ok(())
    }

    /// Matches `query` against title or status text; an empty query returns everything.
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<Task>, AppError> {
        match query.filter(|q| !q.is_empty()) {
            Some(needle) => self.tasks.search(needle).await,
            None => self.tasks.find_all().await,
        }
    }

    /// Distinct participants across all tasks plus status counts.
    pub async fn participants_summary(&self) -> Result<ParticipantsSummary, AppError> {
        let participants: BTreeSet<String> = self
            .tasks
            .participants()
            .await?
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();

        Ok(ParticipantsSummary {
            participants: participants.into_iter().collect(),
            counts: TaskCounts {
                total: self.tasks.count(None).await?,
                completed: self.tasks.count(Some(TaskStatus::Closed)).await?,
                frozen: self.tasks.count(Some(TaskStatus::Frozen)).await?,
            },
        })
    }
}
