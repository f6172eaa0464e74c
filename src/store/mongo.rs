use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use log::{info, warn};
use mongodb::bson::{self, doc, oid::ObjectId, Bson, DateTime as BsonDateTime, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};

use super::{TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskPatch, TaskPriority, TaskStatus, User};

const USERS: &str = "users";
const TASKS: &str = "tasks";
const DUPLICATE_KEY: i32 = 11000;

/// MongoDB-backed implementation of both store traits.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Connects and pings the server so a bad connection string fails at startup.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, AppError> {
        let client_options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);
        db.run_command(doc! { "ping": 1 }).await?;
        info!("connected to MongoDB database {}", db_name);
        Ok(Self { client, db })
    }

    /// Creates the unique index backing email uniqueness.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users().create_index(index).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.client.clone().shutdown().await;
    }

    fn users(&self) -> Collection<UserDocument> {
        self.db.collection(USERS)
    }

    // Read as raw documents so one undecodable record cannot fail a whole listing.
    fn tasks(&self) -> Collection<Document> {
        self.db.collection(TASKS)
    }

    async fn collect_tasks(&self, filter: Document) -> Result<Vec<Task>, AppError> {
        let mut cursor = self.tasks().find(filter).await?;
        let mut tasks = Vec::new();
        while let Some(raw) = cursor.try_next().await? {
            if let Some(task) = decode_task(raw) {
                tasks.push(task);
            }
        }
        Ok(tasks)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    email: String,
    name: String,
    #[serde(rename = "password")]
    password_hash: String,
    #[serde(default = "default_active")]
    is_active: bool,
    created_at: BsonDateTime,
}

fn default_active() -> bool {
    true
}

impl UserDocument {
    fn from_new(id: ObjectId, user: NewUser) -> Self {
        Self {
            id,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            is_active: true,
            created_at: to_bson_date(user.created_at),
        }
    }
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        User {
            id: doc.id.to_hex(),
            email: doc.email,
            name: doc.name,
            password_hash: doc.password_hash,
            is_active: doc.is_active,
            created_at: to_chrono(doc.created_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TaskDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    #[serde(default)]
    description: String,
    priority: TaskPriority,
    #[serde(default)]
    due_date: Option<BsonDateTime>,
    #[serde(default)]
    status: TaskStatus,
    #[serde(default)]
    participants: Option<Vec<String>>,
    #[serde(default)]
    created_by: String,
    created_at: BsonDateTime,
}

impl TaskDocument {
    fn from_new(id: ObjectId, task: NewTask) -> Self {
        Self {
            id,
            title: task.title,
            description: task.description,
            priority: task.priority,
            due_date: task.due_date.map(to_bson_date),
            status: task.status,
            participants: Some(task.participants),
            created_by: task.created_by,
            created_at: to_bson_date(task.created_at),
        }
    }
}

impl From<TaskDocument> for Task {
    fn from(doc: TaskDocument) -> Self {
        Task {
            id: doc.id.to_hex(),
            title: doc.title,
            description: doc.description,
            priority: doc.priority,
            due_date: doc.due_date.map(to_chrono),
            status: doc.status,
            participants: doc.participants.unwrap_or_default(),
            created_by: doc.created_by,
            created_at: to_chrono(doc.created_at),
        }
    }
}

fn to_bson_date(value: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(value.timestamp_millis())
}

fn to_chrono(value: BsonDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis()).unwrap_or_default()
}

/// Records with a status or priority outside the closed enums are skipped.
fn decode_task(raw: Document) -> Option<Task> {
    let id = raw.get_object_id("_id").ok();
    match bson::from_document::<TaskDocument>(raw) {
        Ok(doc) => Some(doc.into()),
        Err(e) => {
            warn!("skipping undecodable task {:?}: {}", id, e);
            None
        }
    }
}

fn parse_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::InvalidId("Invalid task ID".into()))
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY
        }
        _ => false,
    }
}

/// The `$set` body for a partial update; only supplied fields appear.
fn patch_document(patch: &TaskPatch) -> Document {
    let mut set = doc! {};
    if let Some(title) = &patch.title {
        set.insert("title", title.as_str());
    }
    if let Some(description) = &patch.description {
        set.insert("description", description.as_str());
    }
    if let Some(priority) = patch.priority {
        set.insert("priority", priority.as_str());
    }
    if let Some(due_date) = patch.due_date {
        set.insert("due_date", due_date.map_or(Bson::Null, |due| to_bson_date(due).into()));
    }
    if let Some(status) = patch.status {
        set.insert("status", status.as_str());
    }
    if let Some(participants) = &patch.participants {
        set.insert("participants", participants.clone());
    }
    set
}

/// Case-insensitive literal match on title or status.
fn search_filter(needle: &str) -> Document {
    let pattern = regex::escape(needle);
    doc! {
        "$or": [
            { "title": { "$regex": pattern.clone(), "$options": "i" } },
            { "status": { "$regex": pattern, "$options": "i" } },
        ]
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let found = self.users().find_one(doc! { "email": email }).await?;
        Ok(found.map(User::from))
    }

    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let document = UserDocument::from_new(ObjectId::new(), user);
        match self.users().insert_one(&document).await {
            Ok(_) => Ok(document.into()),
            Err(e) if is_duplicate_key(&e) => {
                Err(AppError::Conflict("Email already registered".into()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl TaskStore for MongoStore {
    async fn insert(&self, task: NewTask) -> Result<Task, AppError> {
        let document = TaskDocument::from_new(ObjectId::new(), task);
        let raw = bson::to_document(&document)
            .map_err(|e| AppError::InternalServerError(format!("Failed to encode task: {}", e)))?;
        self.tasks().insert_one(raw).await?;
        Ok(document.into())
    }

    async fn find_all(&self) -> Result<Vec<Task>, AppError> {
        self.collect_tasks(doc! {}).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>, AppError> {
        let found = self.tasks().find_one(doc! { "_id": parse_id(id)? }).await?;
        Ok(found.and_then(decode_task))
    }

    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Option<Task>, AppError> {
        let filter = doc! { "_id": parse_id(id)? };
        // Records that cannot be read back are left as they are.
        let existing = self.tasks().find_one(filter.clone()).await?;
        if existing.and_then(decode_task).is_none() {
            return Ok(None);
        }

        let updated = self
            .tasks()
            .find_one_and_update(filter, doc! { "$set": patch_document(patch) })
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated.and_then(decode_task))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = self.tasks().delete_one(doc! { "_id": parse_id(id)? }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn search(&self, needle: &str) -> Result<Vec<Task>, AppError> {
        self.collect_tasks(search_filter(needle)).await
    }

    async fn participants(&self) -> Result<Vec<String>, AppError> {
        let values = self.tasks().distinct("participants", doc! {}).await?;
        Ok(values
            .into_iter()
            .filter_map(|value| match value {
                Bson::String(s) => Some(s),
                _ => None,
            })
            .collect())
    }

    async fn count(&self, status: Option<TaskStatus>) -> Result<u64, AppError> {
        let filter = match status {
            Some(status) => doc! { "status": status.as_str() },
            None => doc! {},
        };
        Ok(self.tasks().count_documents(filter).await?)
    }
}
