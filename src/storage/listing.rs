//! Pagination and sorting for list queries.
//!
//! Sort keys are resolved against a fixed allow-list per entity, so the
//! column names interpolated into SQL never come from the caller.

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// `asc` (any case) is ascending; anything else is descending.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Resolved list parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: u32,
    pub offset: u32,
    /// Requested sort key, resolved per entity at query time
    pub sort: Option<String>,
    pub order: SortOrder,
    /// Substring search (contacts only)
    pub search: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            sort: None,
            order: SortOrder::Desc,
            search: None,
        }
    }
}

impl ListOptions {
    /// Build from raw query-string values.
    ///
    /// Unparseable numbers fall back to the defaults; `limit` is clamped to
    /// `1..=MAX_LIMIT`, a negative `offset` to 0.
    #[must_use]
    pub fn from_query(
        limit: Option<&str>,
        offset: Option<&str>,
        sort: Option<&str>,
        order: Option<&str>,
        search: Option<&str>,
    ) -> Self {
        let limit = parse_int(limit).map_or(DEFAULT_LIMIT, |n| {
            u32::try_from(n.clamp(1, i64::from(MAX_LIMIT))).unwrap_or(DEFAULT_LIMIT)
        });
        let offset = parse_int(offset).map_or(0, |n| u32::try_from(n.max(0)).unwrap_or(u32::MAX));

        Self {
            limit,
            offset,
            sort: sort
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
            order: SortOrder::parse(order),
            search: search.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
        }
    }

    /// Resolve the sort key against an entity's allow-list.
    ///
    /// `allowed` maps public keys to SQL column expressions; an unknown or
    /// missing key resolves to `default`'s column.
    #[must_use]
    pub fn sort_column(&self, allowed: &[(&str, &'static str)], default: &str) -> &'static str {
        let lookup = |key: &str| {
            allowed
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, column)| *column)
        };
        self.sort
            .as_deref()
            .and_then(lookup)
            .or_else(|| lookup(default))
            .unwrap_or("updated_at")
    }
}

/// Leading-integer parse: `"20abc"` reads as 20, `"abc"` as nothing.
fn parse_int(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    let end = raw
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(raw.len(), |(i, _)| i);
    raw[..end].parse().ok()
}

pub const CONTACT_SORTS: &[(&str, &str)] = &[
    ("updated_at", "c.updated_at"),
    ("created_at", "c.created_at"),
    ("first_name", "c.first_name"),
    ("last_name", "c.last_name"),
    ("company", "c.company"),
];

pub const DEAL_SORTS: &[(&str, &str)] = &[
    ("updated_at", "d.updated_at"),
    ("created_at", "d.created_at"),
    ("amount", "d.amount"),
    ("name", "d.name"),
    ("company", "d.company"),
    ("owner", "d.owner"),
    ("stage", "s.name"),
    ("pipeline", "p.name"),
];

pub const TASK_SORTS: &[(&str, &str)] = &[
    ("due_at", "t.due_at"),
    ("created_at", "t.created_at"),
    ("subject", "t.subject"),
    ("owner", "t.owner"),
];
