// Shared harness for the MongoDB-backed integration tests. Each test gets a
// throwaway database named after the current timestamp; when no server is
// reachable the test skips instead of failing.

use std::{
    env,
    sync::{Mutex, MutexGuard, OnceLock},
    time::{SystemTime, UNIX_EPOCH},
};

use mongodb::Client;

use commerceos::state::{AppState, init_state};

/// Serializes DB-mutating tests; they share the MONGODB_DB env var.
static TEST_DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub struct TestContext {
    pub state: AppState,
    pub db_name: String,
    _guard: MutexGuard<'static, ()>,
}

fn mongo_uri() -> String {
    env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
}

async fn drop_database(db_name: &str) -> Result<(), mongodb::error::Error> {
    let client = Client::with_uri_str(mongo_uri()).await?;
    client.database(db_name).drop().await
}

pub async fn setup_state() -> Option<TestContext> {
    let guard = TEST_DB_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("failed to lock test db mutex");

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis();
    let db_name = format!("commerceostest_{millis}");
    unsafe {
        env::set_var("MONGODB_DB", &db_name);
    }

    if let Err(err) = drop_database(&db_name).await {
        eprintln!("Skipping test; MongoDB not reachable: {err:?}");
        drop(guard);
        return None;
    }

    match init_state().await {
        Ok(state) => Some(TestContext {
            state,
            db_name,
            _guard: guard,
        }),
        Err(err) => {
            eprintln!("Skipping test; init_state failed: {err:?}");
            drop(guard);
            None
        }
    }
}

pub async fn teardown(ctx: Option<TestContext>) {
    if let Some(ctx) = ctx {
        let _ = drop_database(&ctx.db_name).await;
        drop(ctx);
    }
}
