use crate::entities::{prelude::*, videos};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

/// Persistent video records
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<videos::Model>>;
    async fn create(
        &self,
        user_id: &str,
        title: String,
        description: Option<String>,
    ) -> Result<videos::Model>;
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<videos::Model>>;
    /// Writes the mutable fields of `video` back to the store
    async fn update(&self, video: &videos::Model) -> Result<videos::Model>;
    async fn ping(&self) -> bool;
}

pub struct SeaOrmVideoStore {
    db: DatabaseConnection,
}

impl SeaOrmVideoStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VideoStore for SeaOrmVideoStore {
    async fn get(&self, id: &str) -> Result<Option<videos::Model>> {
        Ok(Videos::find_by_id(id).one(&self.db).await?)
    }

    async fn create(
        &self,
        user_id: &str,
        title: String,
        description: Option<String>,
    ) -> Result<videos::Model> {
        let now = Utc::now();
        let video = videos::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            title: Set(title),
            description: Set(description),
            thumbnail_url: Set(None),
            video_url: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(video.insert(&self.db).await?)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<videos::Model>> {
        Ok(Videos::find()
            .filter(videos::Column::UserId.eq(user_id))
            .order_by_desc(videos::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    async fn update(&self, video: &videos::Model) -> Result<videos::Model> {
        let active = videos::ActiveModel {
            id: Unchanged(video.id.clone()),
            title: Set(video.title.clone()),
            description: Set(video.description.clone()),
            thumbnail_url: Set(video.thumbnail_url.clone()),
            video_url: Set(video.video_url.clone()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        Ok(active.update(&self.db).await?)
    }

    async fn ping(&self) -> bool {
        self.db.ping().await.is_ok()
    }
}
