use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum EntityKind {
    User,
    Leaderboard,
    Activity,
    Activities,
}

impl EntityKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Leaderboard => "leaderboard",
            Self::Activity => "activity",
            Self::Activities => "activities",
        }
    }
}

/// Address of one cached fetch result: an entity kind plus an optional
/// identifier for single-record kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey {
    kind: EntityKind,
    id: Option<String>,
}

impl QueryKey {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::User,
            id: Some(id.into()),
        }
    }

    /// Full user collection used for ranking.
    pub fn leaderboard() -> Self {
        Self {
            kind: EntityKind::Leaderboard,
            id: None,
        }
    }

    pub fn activity(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Activity,
            id: Some(id.into()),
        }
    }

    pub fn activities() -> Self {
        Self {
            kind: EntityKind::Activities,
            id: None,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{}", self.kind.as_str(), id),
            None => f.write_str(self.kind.as_str()),
        }
    }
}
