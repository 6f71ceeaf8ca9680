/// Filter terms and explicit sort orders
///
/// Every list view resolves its optional filter term to a status filter plus
/// an [`Ordering`]: a list of sort keys rendered verbatim into `ORDER BY`.
/// Each ordering ends with an `id` key so equal timestamps or counters still
/// page deterministically.
///
/// | view | term | filter | ordering |
/// |---|---|---|---|
/// | issues | `recent` | - | created desc |
/// | issues | `popular` | - | visits desc, created desc |
/// | issues | `open`/`closed` | status | default |
/// | issues | other/none | - | visits desc, created desc, status, priority |
/// | projects | `recent` | - | created desc |
/// | projects | `popular` | - | visits desc, created desc |
/// | projects | other/none | - | visits desc, created desc, title |
/// | project issues | `open`/`closed` | status | created desc |
/// | project issues | other/none | - | created desc |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::issue::IssueStatus;

/// Filter term accepted by list views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterTerm {
    Recent,
    Popular,
    Open,
    Closed,
}

impl FilterTerm {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterTerm::Recent => "recent",
            FilterTerm::Popular => "popular",
            FilterTerm::Open => "open",
            FilterTerm::Closed => "closed",
        }
    }

    /// Parses a term, treating anything unrecognized as no term at all
    pub fn parse_lenient(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|s| s.parse().ok())
    }

    /// Status the term filters on, if any
    pub fn status(&self) -> Option<IssueStatus> {
        match self {
            FilterTerm::Open => Some(IssueStatus::Open),
            FilterTerm::Closed => Some(IssueStatus::Closed),
            FilterTerm::Recent | FilterTerm::Popular => None,
        }
    }
}

impl fmt::Display for FilterTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter term: {0}")]
pub struct UnknownFilterTerm(pub String);

impl FromStr for FilterTerm {
    type Err = UnknownFilterTerm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recent" => Ok(FilterTerm::Recent),
            "popular" => Ok(FilterTerm::Popular),
            "open" => Ok(FilterTerm::Open),
            "closed" => Ok(FilterTerm::Closed),
            other => Err(UnknownFilterTerm(other.to_string())),
        }
    }
}

/// Column a list can be sorted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Visits,
    CreatedOn,
    ModifiedOn,
    Status,
    Priority,
    Title,
    Id,
}

impl SortKey {
    fn column(&self) -> &'static str {
        match self {
            SortKey::Visits => "visits",
            SortKey::CreatedOn => "created_on",
            SortKey::ModifiedOn => "modified_on",
            SortKey::Status => "status",
            SortKey::Priority => "priority",
            SortKey::Title => "title",
            SortKey::Id => "id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordered list of sort keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering(Vec<(SortKey, Direction)>);

impl Ordering {
    pub fn new(keys: Vec<(SortKey, Direction)>) -> Self {
        Self(keys)
    }

    pub fn keys(&self) -> &[(SortKey, Direction)] {
        &self.0
    }

    /// Renders the `ORDER BY` body, e.g. `visits DESC, id DESC`
    pub fn to_sql(&self) -> String {
        self.0
            .iter()
            .map(|(key, direction)| {
                let dir = match direction {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                };
                format!("{} {}", key.column(), dir)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// visits desc, created desc, status, priority
    pub fn issue_default() -> Self {
        use Direction::*;
        Self(vec![
            (SortKey::Visits, Desc),
            (SortKey::CreatedOn, Desc),
            (SortKey::Status, Asc),
            (SortKey::Priority, Asc),
            (SortKey::Id, Desc),
        ])
    }

    /// visits desc, created desc, title
    pub fn project_default() -> Self {
        use Direction::*;
        Self(vec![
            (SortKey::Visits, Desc),
            (SortKey::CreatedOn, Desc),
            (SortKey::Title, Asc),
            (SortKey::Id, Desc),
        ])
    }

    pub fn recent() -> Self {
        Self(vec![
            (SortKey::CreatedOn, Direction::Desc),
            (SortKey::Id, Direction::Desc),
        ])
    }

    pub fn popular() -> Self {
        Self(vec![
            (SortKey::Visits, Direction::Desc),
            (SortKey::CreatedOn, Direction::Desc),
            (SortKey::Id, Direction::Desc),
        ])
    }

    pub fn recently_modified() -> Self {
        Self(vec![
            (SortKey::ModifiedOn, Direction::Desc),
            (SortKey::Id, Direction::Desc),
        ])
    }
}

/// Resolved issue list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFilter {
    pub project_id: Option<i64>,
    pub status: Option<IssueStatus>,
    pub ordering: Ordering,
}

impl IssueFilter {
    /// Site-wide issue list
    pub fn for_term(term: Option<FilterTerm>) -> Self {
        let (status, ordering) = match term {
            Some(FilterTerm::Recent) => (None, Ordering::recent()),
            Some(FilterTerm::Popular) => (None, Ordering::popular()),
            Some(t @ (FilterTerm::Open | FilterTerm::Closed)) => (t.status(), Ordering::issue_default()),
            None => (None, Ordering::issue_default()),
        };

        Self {
            project_id: None,
            status,
            ordering,
        }
    }

    /// Issues of one project, always newest first
    pub fn for_project(project_id: i64, term: Option<FilterTerm>) -> Self {
        Self {
            project_id: Some(project_id),
            status: term.and_then(|t| t.status()),
            ordering: Ordering::recent(),
        }
    }
}

/// Resolved project list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFilter {
    pub ordering: Ordering,
}

impl ProjectFilter {
    pub fn for_term(term: Option<FilterTerm>) -> Self {
        let ordering = match term {
            Some(FilterTerm::Recent) => Ordering::recent(),
            Some(FilterTerm::Popular) => Ordering::popular(),
            _ => Ordering::project_default(),
        };

        Self { ordering }
    }
}
