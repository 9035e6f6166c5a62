//! In-memory store doubles for tests, plus a shared Postgres container for
//! the SQL-backed store tests.

use std::sync::{
    atomic::{AtomicI64, AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use sqlx::PgPool;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use time::OffsetDateTime;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    auth::{jwt::TokenService, repo::UserStore, repo_types::User},
    config::JwtConfig,
    db,
    state::AppState,
    store::StoreError,
    tasks::{repo::TaskStore, repo_types::Task},
};

pub const TEST_SECRET: &str = "test-signing-secret";

/// Points the SQL tests at an existing database instead of starting a container.
pub const TEST_DATABASE_URL: &str = "TASKLIST_TEST_DATABASE_URL";

struct SharedPostgres {
    url: String,
    // Keeps the container alive for the whole test run.
    _container: Option<ContainerAsync<Postgres>>,
}

static SHARED_PG: OnceCell<Option<SharedPostgres>> = OnceCell::const_new();

impl SharedPostgres {
    async fn init() -> anyhow::Result<Self> {
        let (url, container) = match std::env::var(TEST_DATABASE_URL) {
            Ok(url) => (url, None),
            Err(_) => {
                let container = Postgres::default().with_tag("16").start().await?;
                let host = container.get_host().await?;
                let port = container.get_host_port_ipv4(5432).await?;
                let url = format!("postgresql://postgres:postgres@{host}:{port}/postgres");
                (url, Some(container))
            }
        };

        // Migrations run once on the shared database.
        let pool = PgPool::connect(&url).await?;
        db::migrate(&pool).await?;
        pool.close().await;

        Ok(Self {
            url,
            _container: container,
        })
    }
}

/// Fresh pool on the shared, migrated database. `None` when neither Docker
/// nor `TASKLIST_TEST_DATABASE_URL` is available, so callers can skip.
pub async fn pg_pool() -> Option<PgPool> {
    let shared = SHARED_PG
        .get_or_init(|| async {
            match SharedPostgres::init().await {
                Ok(shared) => Some(shared),
                Err(e) => {
                    eprintln!("skipping Postgres tests: {e:#}");
                    None
                }
            }
        })
        .await
        .as_ref()?;
    Some(PgPool::connect(&shared.url).await.expect("connect to test database"))
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
    calls: AtomicUsize,
}

impl MemoryUserStore {
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(StoreError::UniqueViolation);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
    next_id: AtomicI64,
    calls: AtomicUsize,
}

impl MemoryTaskStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create(&self, owner: Uuid, title: &str, completed: bool) -> Result<Task, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = OffsetDateTime::now_utc();
        let task = Task {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            title: title.to_string(),
            completed,
            owner_id: owner,
            created_at: now,
            updated_at: now,
        };
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task)
    }

    async fn list(&self, owner: Uuid) -> Result<Vec<Task>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.iter().rev().filter(|t| t.owner_id == owner).cloned().collect())
    }

    async fn get(&self, owner: Uuid, id: i64) -> Result<Option<Task>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.iter().find(|t| t.id == id && t.owner_id == owner).cloned())
    }

    async fn update(
        &self,
        owner: Uuid,
        id: i64,
        title: &str,
        completed: bool,
    ) -> Result<Option<Task>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut tasks = self.tasks.lock().unwrap();
        Ok(tasks
            .iter_mut()
            .find(|t| t.id == id && t.owner_id == owner)
            .map(|t| {
                t.title = title.to_string();
                t.completed = completed;
                t.updated_at = OffsetDateTime::now_utc();
                t.clone()
            }))
    }

    async fn delete(&self, owner: Uuid, id: i64) -> Result<Option<Task>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut tasks = self.tasks.lock().unwrap();
        let pos = tasks.iter().position(|t| t.id == id && t.owner_id == owner);
        Ok(pos.map(|i| tasks.remove(i)))
    }
}

pub struct Harness {
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
    pub tasks: Arc<MemoryTaskStore>,
}

pub fn harness() -> Harness {
    let users = Arc::new(MemoryUserStore::default());
    let tasks = Arc::new(MemoryTaskStore::default());
    let tokens = TokenService::new(&JwtConfig {
        secret: TEST_SECRET.into(),
        ttl_hours: 24,
    })
    .expect("test token service");

    let state = AppState::from_parts(users.clone(), tasks.clone(), Arc::new(tokens));
    Harness { state, users, tasks }
}
