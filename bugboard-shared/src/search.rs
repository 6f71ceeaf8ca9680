/// Cross-entity search
///
/// A query is matched as a literal, Unicode case-insensitive substring against
/// project titles, issue titles, and user names or emails. Results are
/// concatenated by category: every project hit, then every issue hit, then
/// every user hit. Within a category projects and issues keep their default
/// list ordering and users are sorted by name.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::listing::Ordering;
use crate::models::issue::{Issue, ISSUE_COLUMNS};
use crate::models::project::{Project, PROJECT_COLUMNS};
use crate::models::user::User;

/// Longest query considered; longer input is cut
pub const MAX_QUERY_CHARS: usize = 64;

/// One search result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "item", rename_all = "lowercase")]
pub enum SearchHit {
    Project(Project),
    Issue(Issue),
    User(User),
}

/// Trims the query and cuts it to [`MAX_QUERY_CHARS`]; None when nothing is left
pub fn normalize_query(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_QUERY_CHARS).collect())
}

/// True when `haystack` contains `needle`, ignoring case
///
/// `needle` must already be lowercased. Folding uses Unicode rules, which
/// SQLite's `lower()` does not.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Searches all entity kinds
///
/// An empty or whitespace-only query returns no results.
pub async fn search(pool: &SqlitePool, raw_query: &str) -> Result<Vec<SearchHit>, sqlx::Error> {
    let Some(query) = normalize_query(raw_query) else {
        return Ok(Vec::new());
    };

    let needle = query.to_lowercase();

    let projects: Vec<Project> = sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY {}",
        Ordering::project_default().to_sql()
    ))
    .fetch_all(pool)
    .await?
    .into_iter()
    .filter(|p| contains_folded(&p.title, &needle))
    .collect();

    let issues: Vec<Issue> = sqlx::query_as::<_, Issue>(&format!(
        "SELECT {ISSUE_COLUMNS} FROM issues ORDER BY {}",
        Ordering::issue_default().to_sql()
    ))
    .fetch_all(pool)
    .await?
    .into_iter()
    .filter(|i| contains_folded(&i.title, &needle))
    .collect();

    let users = User::search(pool, &query).await?;

    debug!(
        query = %query,
        projects = projects.len(),
        issues = issues.len(),
        users = users.len(),
        "Search completed"
    );

    let mut hits = Vec::with_capacity(projects.len() + issues.len() + users.len());
    hits.extend(projects.into_iter().map(SearchHit::Project));
    hits.extend(issues.into_iter().map(SearchHit::Issue));
    hits.extend(users.into_iter().map(SearchHit::User));

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("   "), None);
        assert_eq!(normalize_query(""), None);
        assert_eq!(normalize_query("  Test  ").as_deref(), Some("Test"));

        let long = "é".repeat(100);
        assert_eq!(normalize_query(&long).map(|q| q.chars().count()), Some(MAX_QUERY_CHARS));
    }

    #[test]
    fn test_contains_folded() {
        assert!(contains_folded("Test Project", "test"));
        assert!(contains_folded("Édition spéciale", "édition"));
        assert!(contains_folded("STRASSE ÜBER", "über"));
        assert!(contains_folded("100% done", "0%"));
        assert!(!contains_folded("Other Project", "test project"));
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        use crate::db::memory_pool;
        use crate::models::project::CreateProject;
        use crate::models::user::CreateUser;

        let pool = memory_pool().await.unwrap();
        User::create(&pool, CreateUser::regular("Éloïse", "eloise@example.org", "h"))
            .await
            .unwrap();
        Project::create(
            &pool,
            CreateProject {
                title: "Édition".into(),
                summary: "Print run".into(),
                created_by: "Éloïse".into(),
            },
        )
        .await
        .unwrap();

        let hits = search(&pool, "édition").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(matches!(&hits[0], SearchHit::Project(p) if p.title == "Édition"));

        let hits = search(&pool, "ÉLOÏSE").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(matches!(&hits[0], SearchHit::User(u) if u.name == "Éloïse"));
    }
}
