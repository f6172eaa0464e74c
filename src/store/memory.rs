use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskPatch, TaskStatus, User};

/// In-process store with the same observable behaviour as the MongoDB backend.
///
/// Ids are freshly generated ObjectIds, so they pass the same id checks as real
/// records. Iteration order is insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    tasks: RwLock<Vec<Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        let user = user.into_user(ObjectId::new().to_hex());
        users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert(&self, task: NewTask) -> Result<Task, AppError> {
        let task = task.into_task(ObjectId::new().to_hex());
        self.tasks.write().await.push(task.clone());
        Ok(task)
    }

    async fn find_all(&self) -> Result<Vec<Task>, AppError> {
        Ok(self.tasks.read().await.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>, AppError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Option<Task>, AppError> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks.iter_mut().find(|t| t.id == id).map(|task| {
            patch.apply_to(task);
            task.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        Ok(tasks.len() != before)
    }

    async fn search(&self, needle: &str) -> Result<Vec<Task>, AppError> {
        let needle = needle.to_lowercase();
        let tasks = self.tasks.read().await;
        Ok(tasks
            .iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&needle)
                    || t.status.as_str().to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn participants(&self) -> Result<Vec<String>, AppError> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .iter()
            .flat_map(|t| t.participants.iter().cloned())
            .collect())
    }

    async fn count(&self, status: Option<TaskStatus>) -> Result<u64, AppError> {
        let tasks = self.tasks.read().await;
        let count = tasks
            .iter()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .count();
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskPriority;
    use chrono::Utc;

    fn new_task(title: &str, status: TaskStatus) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: String::new(),
            priority: TaskPriority::Medium,
            due_date: None,
            status,
            participants: vec!["ana".to_string()],
            created_by: "creator".to_string(),
            created_at: Utc::now(),
        }
    }

    #[actix_rt::test]
    async fn test_user_email_is_unique() {
        let store = MemoryStore::new();
        let user = NewUser {
            email: "a@example.com".to_string(),
            name: "Ann".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        };
        let stored = UserStore::insert(&store, user.clone()).await.unwrap();
        assert_eq!(stored.id.len(), 24);
        assert!(matches!(
            UserStore::insert(&store, user).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[actix_rt::test]
    async fn test_task_roundtrip_through_store() {
        let store = MemoryStore::new();
        let task = TaskStore::insert(&store, new_task("Plan", TaskStatus::Todo))
            .await
            .unwrap();

        assert_eq!(store.find_by_id(&task.id).await.unwrap(), Some(task.clone()));

        let patch = TaskPatch {
            status: Some(TaskStatus::Closed),
            ..TaskPatch::default()
        };
        let updated = store.update(&task.id, &patch).await.unwrap().unwrap();
        assert_eq!(updated.status, TaskStatus::Closed);
        assert_eq!(updated.title, "Plan");

        assert!(store.delete(&task.id).await.unwrap());
        assert!(!store.delete(&task.id).await.unwrap());
        assert!(store.update(&task.id, &patch).await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_search_matches_title_or_status() {
        let store = MemoryStore::new();
        TaskStore::insert(&store, new_task("Write Report", TaskStatus::Todo))
            .await
            .unwrap();
        TaskStore::insert(&store, new_task("Deploy", TaskStatus::InProgress))
            .await
            .unwrap();

        let by_title = store.search("report").await.unwrap();
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].title, "Write Report");

        let by_status = store.search("PROGRESS").await.unwrap();
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].title, "Deploy");

        assert_eq!(store.count(None).await.unwrap(), 2);
        assert_eq!(store.count(Some(TaskStatus::Todo)).await.unwrap(), 1);
    }
}
