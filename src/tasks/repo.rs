use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{bounded, StoreError};
use crate::tasks::repo_types::Task;

/// Task persistence. Every method is scoped to `owner`; a task owned by
/// someone else is reported exactly like a missing one.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, owner: Uuid, title: &str, completed: bool) -> Result<Task, StoreError>;
    async fn list(&self, owner: Uuid) -> Result<Vec<Task>, StoreError>;
    async fn get(&self, owner: Uuid, id: i64) -> Result<Option<Task>, StoreError>;
    async fn update(
        &self,
        owner: Uuid,
        id: i64,
        title: &str,
        completed: bool,
    ) -> Result<Option<Task>, StoreError>;
    async fn delete(&self, owner: Uuid, id: i64) -> Result<Option<Task>, StoreError>;
}

#[derive(Clone)]
pub struct PgTaskStore {
    db: PgPool,
    timeout: Duration,
}

impl PgTaskStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn create(&self, owner: Uuid, title: &str, completed: bool) -> Result<Task, StoreError> {
        bounded(
            self.timeout,
            sqlx::query_as::<_, Task>(
                r#"
                INSERT INTO todos (title, completed, owner_id)
                VALUES ($1, $2, $3)
                RETURNING id, title, completed, owner_id, created_at, updated_at
                "#,
            )
            .bind(title)
            .bind(completed)
            .bind(owner)
            .fetch_one(&self.db),
        )
        .await
    }

    async fn list(&self, owner: Uuid) -> Result<Vec<Task>, StoreError> {
        bounded(
            self.timeout,
            sqlx::query_as::<_, Task>(
                r#"
                SELECT id, title, completed, owner_id, created_at, updated_at
                FROM todos
                WHERE owner_id = $1
                ORDER BY created_at DESC, id DESC
                "#,
            )
            .bind(owner)
            .fetch_all(&self.db),
        )
        .await
    }

    async fn get(&self, owner: Uuid, id: i64) -> Result<Option<Task>, StoreError> {
        bounded(
            self.timeout,
            sqlx::query_as::<_, Task>(
                r#"
                SELECT id, title, completed, owner_id, created_at, updated_at
                FROM todos
                WHERE id = $1 AND owner_id = $2
                "#,
            )
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.db),
        )
        .await
    }

    async fn update(
        &self,
        owner: Uuid,
        id: i64,
        title: &str,
        completed: bool,
    ) -> Result<Option<Task>, StoreError> {
        bounded(
            self.timeout,
            sqlx::query_as::<_, Task>(
                r#"
                UPDATE todos
                SET title = $3, completed = $4, updated_at = now()
                WHERE id = $1 AND owner_id = $2
                RETURNING id, title, completed, owner_id, created_at, updated_at
                "#,
            )
            .bind(id)
            .bind(owner)
            .bind(title)
            .bind(completed)
            .fetch_optional(&self.db),
        )
        .await
    }

    async fn delete(&self, owner: Uuid, id: i64) -> Result<Option<Task>, StoreError> {
        bounded(
            self.timeout,
            sqlx::query_as::<_, Task>(
                r#"
                DELETE FROM todos
                WHERE id = $1 AND owner_id = $2
                RETURNING id, title, completed, owner_id, created_at, updated_at
                "#,
            )
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.db),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::{PgUserStore, UserStore};
    use crate::testing::pg_pool;

    const LIMIT: Duration = Duration::from_secs(5);

    async fn user(pool: &PgPool) -> Uuid {
        PgUserStore::new(pool.clone(), LIMIT)
            .create(&format!("{}@example.com", Uuid::new_v4()), "digest")
            .await
            .expect("create user")
            .id
    }

    #[tokio::test]
    async fn sql_predicates_hide_tasks_from_other_owners() {
        let Some(pool) = pg_pool().await else { return };
        let store = PgTaskStore::new(pool.clone(), LIMIT);
        let alice = user(&pool).await;
        let bob = user(&pool).await;

        let task = store.create(alice, "alice's task", false).await.unwrap();
        assert_eq!(task.owner_id, alice);

        assert!(store.get(bob, task.id).await.unwrap().is_none());
        assert!(store
            .update(bob, task.id, "hijacked", true)
            .await
            .unwrap()
            .is_none());
        assert!(store.delete(bob, task.id).await.unwrap().is_none());
        assert!(store.list(bob).await.unwrap().is_empty());

        let kept = store.get(alice, task.id).await.unwrap().expect("still there");
        assert_eq!(kept.title, "alice's task");
        assert!(!kept.completed);
    }

    #[tokio::test]
    async fn owner_can_update_list_and_delete() {
        let Some(pool) = pg_pool().await else { return };
        let store = PgTaskStore::new(pool.clone(), LIMIT);
        let owner = user(&pool).await;

        let first = store.create(owner, "first", false).await.unwrap();
        let second = store.create(owner, "second", false).await.unwrap();

        let listed: Vec<i64> = store.list(owner).await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(listed, vec![second.id, first.id]);

        let updated = store
            .update(owner, first.id, "first, done", true)
            .await
            .unwrap()
            .expect("owner may update");
        assert_eq!(updated.title, "first, done");
        assert!(updated.completed);
        assert_eq!(updated.owner_id, owner);

        let removed = store.delete(owner, first.id).await.unwrap().expect("owner may delete");
        assert_eq!(removed.id, first.id);
        assert!(store.get(owner, first.id).await.unwrap().is_none());
    }
}
