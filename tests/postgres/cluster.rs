//! Embedded `PostgreSQL` cluster shared by the adapter tests.
//!
//! The cluster is downloaded and started once per test binary by
//! `postgresql_embedded`. `initdb` refuses to run as root, so these tests must
//! run as an unprivileged user.

use diesel::prelude::*;
use postgresql_embedded::{PostgreSQL, Settings, Status};
use rstest::fixture;
use std::sync::{Mutex, OnceLock, PoisonError};
use tokio::runtime::Runtime;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

static SHARED_CLUSTER: OnceLock<Result<ManagedCluster, String>> = OnceLock::new();
static TEMPLATE_LOCK: Mutex<()> = Mutex::new(());

/// Shared `PostgreSQL` cluster handle for integration tests.
pub type PostgresCluster = &'static ManagedCluster;

/// Running embedded cluster plus the runtime that owns its process handle.
pub struct ManagedCluster {
    settings: Settings,
    _runtime: Runtime,
    _postgres: PostgreSQL,
}

impl ManagedCluster {
    fn start() -> Result<Self, BoxError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let mut postgres = PostgreSQL::new(Settings::default());
        runtime.block_on(async {
            postgres.setup().await?;
            if !matches!(postgres.status(), Status::Started) {
                postgres.start().await?;
            }
            Ok::<(), BoxError>(())
        })?;
        Ok(Self {
            settings: postgres.settings().clone(),
            _runtime: runtime,
            _postgres: postgres,
        })
    }

    /// Returns the connection URL for `database`.
    #[must_use]
    pub fn database_url(&self, database: &str) -> String {
        self.settings.url(database)
    }

    /// Creates `template` and migrates it unless it already exists.
    pub async fn ensure_template_exists<F>(
        &'static self,
        template: &'static str,
        migrate: F,
    ) -> Result<(), BoxError>
    where
        F: FnOnce(&str) -> Result<(), BoxError> + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let _guard = TEMPLATE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            if self.database_exists(template)? {
                return Ok(());
            }
            self.execute_admin_sql(&format!("CREATE DATABASE {}", quote_identifier(template)))?;
            if let Err(err) = migrate(&self.database_url(template)) {
                self.execute_admin_sql(&format!("DROP DATABASE {}", quote_identifier(template)))?;
                return Err(err);
            }
            Ok(())
        })
        .await?
    }

    /// Clones `template` into a fresh database dropped with the returned guard.
    pub async fn temporary_database_from_template(
        &'static self,
        name: &str,
        template: &'static str,
    ) -> Result<TemporaryDatabase, BoxError> {
        let db_name = name.to_owned();
        tokio::task::spawn_blocking(move || {
            self.execute_admin_sql(&format!(
                "CREATE DATABASE {} TEMPLATE {}",
                quote_identifier(&db_name),
                quote_identifier(template),
            ))?;
            Ok(TemporaryDatabase {
                cluster: self,
                url: self.database_url(&db_name),
                name: db_name,
            })
        })
        .await?
    }

    fn execute_admin_sql(&self, sql: &str) -> Result<(), BoxError> {
        let mut conn = PgConnection::establish(&self.database_url("postgres"))?;
        diesel::sql_query(sql).execute(&mut conn)?;
        Ok(())
    }

    fn database_exists(&self, db_name: &str) -> Result<bool, BoxError> {
        #[derive(diesel::QueryableByName)]
        struct ExistsRow {
            #[diesel(sql_type = diesel::sql_types::Bool)]
            exists: bool,
        }

        let mut conn = PgConnection::establish(&self.database_url("postgres"))?;
        let row = diesel::sql_query(
            "SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1) AS exists",
        )
        .bind::<diesel::sql_types::Text, _>(db_name)
        .get_result::<ExistsRow>(&mut conn)?;
        Ok(row.exists)
    }
}

/// Database that is dropped when the guard goes out of scope.
pub struct TemporaryDatabase {
    cluster: PostgresCluster,
    name: String,
    url: String,
}

impl TemporaryDatabase {
    /// Returns the connection URL of the database.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for TemporaryDatabase {
    fn drop(&mut self) {
        let sql = format!(
            "DROP DATABASE IF EXISTS {} WITH (FORCE)",
            quote_identifier(&self.name)
        );
        drop(self.cluster.execute_admin_sql(&sql));
    }
}

/// Provides the shared cluster, starting it on first use.
#[fixture]
pub fn postgres_cluster() -> Result<PostgresCluster, BoxError> {
    // Started on a plain thread so the cluster's runtime is never nested
    // inside the test runtime.
    let cluster = SHARED_CLUSTER.get_or_init(|| {
        std::thread::spawn(|| ManagedCluster::start().map_err(|err| err.to_string()))
            .join()
            .unwrap_or_else(|_| Err("cluster start-up panicked".to_owned()))
    });
    cluster
        .as_ref()
        .map_err(|err| format!("failed to start PostgreSQL: {err}").into())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
