//! Key-value backed task, material, and embedding repositories.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::debug;
use uuid::Uuid;

use studium_core::defaults::{EMBEDDING_KEY_PREFIX, MATERIAL_KEY_PREFIX, TASK_KEY_PREFIX};
use studium_core::{
    ChunkEmbedding, ContentAnalysis, EmbeddingRepository, Error, Material, MaterialRepository,
    MaterialStatus, ProcessingTask, Result, StorageBackend, TaskRepository, TaskStatus, TaskType,
};

/// Task, material, and embedding persistence over any [`StorageBackend`].
///
/// Tasks are keyed `studium:task:{material_id}:{task_type}`, so upserting is
/// naturally deduplicating: a material can never hold two tasks of the same
/// type. Status transitions are monotonic: updates against a terminal task
/// are rejected.
#[derive(Clone)]
pub struct KvTaskStore {
    storage: Arc<dyn StorageBackend>,
}

impl KvTaskStore {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    fn task_key(material_id: Uuid, task_type: TaskType) -> String {
        format!("{TASK_KEY_PREFIX}{material_id}:{task_type}")
    }

    fn material_key(id: Uuid) -> String {
        format!("{MATERIAL_KEY_PREFIX}{id}")
    }

    fn embedding_key(material_id: Uuid) -> String {
        format!("{EMBEDDING_KEY_PREFIX}{material_id}")
    }

    async fn load_task(&self, material_id: Uuid, task_type: TaskType) -> Result<ProcessingTask> {
        let key = Self::task_key(material_id, task_type);
        let raw = self
            .storage
            .get(&key)
            .await?
            .ok_or(Error::TaskNotFound {
                material_id,
                task_type,
            })?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save_task(&self, task: &ProcessingTask) -> Result<()> {
        let key = Self::task_key(task.material_id, task.task_type);
        let raw = serde_json::to_string(task)?;
        self.storage.set(&key, &raw).await
    }

    async fn load_material(&self, id: Uuid) -> Result<Material> {
        let raw = self
            .storage
            .get(&Self::material_key(id))
            .await?
            .ok_or(Error::MaterialNotFound(id))?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save_material(&self, material: &Material) -> Result<()> {
        let raw = serde_json::to_string(material)?;
        self.storage.set(&Self::material_key(material.id), &raw).await
    }
}

#[async_trait]
impl TaskRepository for KvTaskStore {
    async fn upsert(&self, task: &ProcessingTask) -> Result<()> {
        debug!(
            material_id = %task.material_id,
            task_type = %task.task_type,
            status = ?task.status,
            "Upserting processing task"
        );
        self.save_task(task).await
    }

    async fn get(&self, material_id: Uuid, task_type: TaskType) -> Result<Option<ProcessingTask>> {
        match self
            .storage
            .get(&Self::task_key(material_id, task_type))
            .await?
        {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn list_for_material(&self, material_id: Uuid) -> Result<Vec<ProcessingTask>> {
        let prefix = format!("{TASK_KEY_PREFIX}{material_id}:");
        let mut tasks = Vec::new();
        for key in self.storage.get_all_keys().await? {
            if !key.starts_with(&prefix) {
                continue;
            }
            if let Some(raw) = self.storage.get(&key).await? {
                tasks.push(serde_json::from_str::<ProcessingTask>(&raw)?);
            }
        }
        tasks.sort_by_key(|t| t.created_at);
        Ok(tasks)
    }

    async fn mark_processing(&self, material_id: Uuid, task_type: TaskType) -> Result<()> {
        let mut task = self.load_task(material_id, task_type).await?;
        if task.status.is_terminal() {
            return Err(Error::InvalidInput(format!(
                "task {task_type} for material {material_id} is already terminal"
            )));
        }
        task.status = TaskStatus::Processing;
        task.updated_at = Utc::now();
        self.save_task(&task).await
    }

    async fn update_progress(
        &self,
        material_id: Uuid,
        task_type: TaskType,
        progress: f32,
        message: Option<&str>,
    ) -> Result<()> {
        let mut task = self.load_task(material_id, task_type).await?;
        if task.status.is_terminal() {
            return Err(Error::InvalidInput(format!(
                "task {task_type} for material {material_id} is already terminal"
            )));
        }
        task.status = TaskStatus::Processing;
        task.progress = progress.clamp(0.0, 1.0);
        task.message = message.map(String::from);
        task.updated_at = Utc::now();
        self.save_task(&task).await
    }

    async fn complete(
        &self,
        material_id: Uuid,
        task_type: TaskType,
        result: Option<JsonValue>,
    ) -> Result<()> {
        let mut task = self.load_task(material_id, task_type).await?;
        if task.status.is_terminal() {
            return Err(Error::InvalidInput(format!(
                "task {task_type} for material {material_id} is already terminal"
            )));
        }
        task.status = TaskStatus::Completed;
        task.progress = 1.0;
        task.result = result;
        task.message = None;
        task.updated_at = Utc::now();
        self.save_task(&task).await
    }

    async fn fail(&self, material_id: Uuid, task_type: TaskType, error: &str) -> Result<()> {
        let mut task = self.load_task(material_id, task_type).await?;
        if task.status.is_terminal() {
            return Err(Error::InvalidInput(format!(
                "task {task_type} for material {material_id} is already terminal"
            )));
        }
        task.status = TaskStatus::Error;
        task.error = Some(error.to_string());
        task.updated_at = Utc::now();
        self.save_task(&task).await
    }
}

#[async_trait]
impl MaterialRepository for KvTaskStore {
    async fn insert(&self, material: &Material) -> Result<()> {
        self.save_material(material).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Material>> {
        match self.storage.get(&Self::material_key(id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: MaterialStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let mut material = self.load_material(id).await?;
        material.status = status;
        material.error_message = error_message.map(String::from);
        material.updated_at = Utc::now();
        self.save_material(&material).await
    }

    async fn finalize(
        &self,
        id: Uuid,
        content: &str,
        topics: &[String],
        processed: &ContentAnalysis,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<()> {
        let mut material = self.load_material(id).await?;
        material.content = content.to_string();
        material.topics = topics.to_vec();
        material.processed_content = Some(processed.clone());
        material.embeddings = embeddings;
        material.status = MaterialStatus::Ready;
        material.error_message = None;
        material.updated_at = Utc::now();
        self.save_material(&material).await
    }
}

#[async_trait]
impl EmbeddingRepository for KvTaskStore {
    async fn store_chunks(&self, material_id: Uuid, chunks: &[ChunkEmbedding]) -> Result<()> {
        let raw = serde_json::to_string(chunks)?;
        self.storage
            .set(&Self::embedding_key(material_id), &raw)
            .await
    }

    async fn get_for_material(&self, material_id: Uuid) -> Result<Vec<ChunkEmbedding>> {
        let mut chunks: Vec<ChunkEmbedding> =
            match self.storage.get(&Self::embedding_key(material_id)).await? {
                Some(raw) => serde_json::from_str(&raw)?,
                None => Vec::new(),
            };
        chunks.sort_by_key(|c| c.chunk_index);
        Ok(chunks)
    }
}
