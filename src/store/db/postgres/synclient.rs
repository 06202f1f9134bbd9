use std::{sync::Arc, time::Duration};

use sqlx::{
    Database, Error, IntoArguments, PgPool, Postgres,
    postgres::{PgPoolOptions, PgRow},
};
use tokio::{
    runtime::{Handle, Runtime},
    task::block_in_place,
};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_CONNECTIONS: u32 = 200;

/// Synchronous facade over the async sqlx pool.
///
/// The store traits are synchronous; this client bridges them onto the
/// engine runtime, using `block_in_place` when the caller is already on a
/// runtime worker thread.
#[derive(Debug, Clone)]
pub struct SynClient {
    pool: PgPool,

    runtime: Arc<Runtime>,
}

impl SynClient {
    #[allow(clippy::expect_fun_call)]
    pub fn connect(
        db_url: &str,
        runtime: Arc<Runtime>,
    ) -> Self {
        let connect = async { PgPoolOptions::new().acquire_timeout(ACQUIRE_TIMEOUT).max_connections(MAX_CONNECTIONS).connect(db_url).await };
        let pool = if Handle::try_current().is_ok() {
            block_in_place(|| runtime.block_on(connect))
        } else {
            runtime.block_on(connect)
        };

        Self {
            pool: pool.expect(&format!("failed to connect to DB {}", db_url)),
            runtime,
        }
    }

    fn block<F: Future>(
        &self,
        fut: F,
    ) -> F::Output {
        if Handle::try_current().is_ok() {
            block_in_place(|| self.runtime.block_on(fut))
        } else {
            self.runtime.block_on(fut)
        }
    }

    pub fn query_one<'q, A>(
        &self,
        sql: &'q str,
        params: A,
    ) -> Result<PgRow, Error>
    where
        A: IntoArguments<'q, Postgres> + 'q,
    {
        self.block(async {
            let mut conn = self.pool.acquire().await?;

            sqlx::query_with(sql, params).fetch_one(&mut *conn).await
        })
    }

    pub fn query<'q, A>(
        &self,
        sql: &'q str,
        params: A,
    ) -> Result<Vec<PgRow>, Error>
    where
        A: IntoArguments<'q, Postgres> + 'q,
    {
        self.block(async {
            let mut conn = self.pool.acquire().await?;

            sqlx::query_with(sql, params).fetch_all(&mut *conn).await
        })
    }

    pub fn execute<'q, A>(
        &self,
        sql: &'q str,
        params: A,
    ) -> Result<<Postgres as Database>::QueryResult, Error>
    where
        A: IntoArguments<'q, Postgres> + 'q,
    {
        self.block(async {
            let mut conn = self.pool.acquire().await?;

            sqlx::query_with(sql, params).execute(&mut *conn).await
        })
    }

    pub fn batch_execute(
        &self,
        sqls: &[String],
    ) -> Result<(), Error> {
        self.block(async {
            let mut tx = self.pool.begin().await?;

            for sql in sqls {
                sqlx::query(sql).execute(&mut *tx).await?;
            }
            tx.commit().await
        })
    }
}
