/// Integration tests for the SQLite pool and migrations against a real file
///
/// Each test works in its own database file under the system temp directory.

use bugboard_shared::db::migrations::{ensure_database_exists, get_migration_status, run_migrations};
use bugboard_shared::db::pool::{close_pool, create_pool, get_pool_stats, health_check, DatabaseConfig};
use bugboard_shared::models::project::{CreateProject, Project};
use bugboard_shared::models::user::{CreateUser, User};
use std::path::PathBuf;

fn temp_database(tag: &str) -> (PathBuf, String) {
    let path = std::env::temp_dir().join(format!(
        "bugboard-{}-{}-{}.db",
        tag,
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let url = format!("sqlite://{}", path.display());
    (path, url)
}

fn file_config(url: &str) -> DatabaseConfig {
    DatabaseConfig {
        url: url.to_string(),
        max_connections: 4,
        min_connections: 1,
        connect_timeout_seconds: 10,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_file_pool_lifecycle() {
    let (path, url) = temp_database("pool");

    ensure_database_exists(&url).await.expect("database file created");
    assert!(path.exists());

    let pool = create_pool(file_config(&url)).await.expect("pool created");
    health_check(&pool).await.expect("health check passes");

    let stats = get_pool_stats(&pool);
    assert!(stats.total_connections >= 1);
    assert_eq!(stats.total_connections, stats.active_connections + stats.idle_connections);

    close_pool(pool).await;
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_migrations_persist_across_pools() {
    let (path, url) = temp_database("migrations");

    let pool = create_pool(file_config(&url)).await.unwrap();
    run_migrations(&pool).await.unwrap();
    close_pool(pool).await;

    let pool = create_pool(file_config(&url)).await.unwrap();
    let status = get_migration_status(&pool).await.unwrap();
    assert!(status.is_up_to_date);

    // running again against an up-to-date file is a no-op
    run_migrations(&pool).await.unwrap();

    close_pool(pool).await;
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_concurrent_visits_are_not_lost() {
    let (path, url) = temp_database("visits");

    let pool = create_pool(file_config(&url)).await.unwrap();
    run_migrations(&pool).await.unwrap();

    User::create(&pool, CreateUser::regular("alice", "alice@example.org", "h"))
        .await
        .unwrap();
    let project = Project::create(
        &pool,
        CreateProject {
            title: "Tracker".into(),
            summary: "Bugs".into(),
            created_by: "alice".into(),
        },
    )
    .await
    .unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let pool = pool.clone();
        let id = project.id;
        handles.push(tokio::spawn(async move {
            Project::record_visit(&pool, id).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let project = Project::find_by_id(&pool, project.id).await.unwrap().unwrap();
    assert_eq!(project.visits, 20);

    close_pool(pool).await;
    let _ = std::fs::remove_file(&path);
}
