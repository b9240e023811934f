use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Id,
    Username,
    DisplayName,
    Email,
    Enabled,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub const ALL: [SortField; 7] = [
        SortField::Id,
        SortField::Username,
        SortField::DisplayName,
        SortField::Email,
        SortField::Enabled,
        SortField::CreatedAt,
        SortField::UpdatedAt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Username => "username",
            SortField::DisplayName => "displayName",
            SortField::Email => "email",
            SortField::Enabled => "enabled",
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
        }
    }

    pub fn next(self) -> Self {
        let index = SortField::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0);
        SortField::ALL[(index + 1) % SortField::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn toggled(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sort {
    pub field: SortField,
    pub dir: SortDir,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::Id,
            dir: SortDir::Asc,
        }
    }
}

/// Wire form is `field,dir`, e.g. `id,asc`.
impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.field.as_str(), self.dir.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("page size must be one of 25, 50 or 100 (got {0})")]
    PageSize(u32),
    #[error("invalid sort '{0}', expected 'field,asc' or 'field,desc'")]
    Sort(String),
}

impl FromStr for Sort {
    type Err = QueryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || QueryError::Sort(raw.to_string());
        let (field, dir) = raw.split_once(',').ok_or_else(invalid)?;
        let field = SortField::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == field.trim())
            .ok_or_else(invalid)?;
        let dir = match dir.trim() {
            "asc" => SortDir::Asc,
            "desc" => SortDir::Desc,
            _ => return Err(invalid()),
        };
        Ok(Sort { field, dir })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PageSize {
    #[default]
    TwentyFive,
    Fifty,
    Hundred,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::TwentyFive, PageSize::Fifty, PageSize::Hundred];

    pub fn get(self) -> u32 {
        match self {
            PageSize::TwentyFive => 25,
            PageSize::Fifty => 50,
            PageSize::Hundred => 100,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PageSize::TwentyFive => PageSize::Fifty,
            PageSize::Fifty => PageSize::Hundred,
            PageSize::Hundred => PageSize::TwentyFive,
        }
    }
}

impl TryFrom<u32> for PageSize {
    type Error = QueryError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        PageSize::ALL
            .into_iter()
            .find(|size| size.get() == value)
            .ok_or(QueryError::PageSize(value))
    }
}

/// Filter, sort and paging state of the grid. A value of this type is an
/// immutable snapshot once attached to a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// `Some(true)` hides disabled users; `None` leaves the filter unset.
    pub enabled: Option<bool>,
    pub text: String,
    pub page: u32,
    pub page_size: PageSize,
    pub sort: Sort,
}

impl ListQuery {
    pub fn initial(hide_disabled: bool) -> Self {
        Self {
            enabled: hide_disabled.then_some(true),
            text: String::new(),
            page: 1,
            page_size: PageSize::default(),
            sort: Sort::default(),
        }
    }

    pub fn hides_disabled(&self) -> bool {
        self.enabled == Some(true)
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::initial(true)
    }
}

/// Partial update of the filter part of a [`ListQuery`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub enabled: Option<Option<bool>>,
    pub text: Option<String>,
}

impl FilterPatch {
    pub fn enabled(enabled: Option<bool>) -> Self {
        Self {
            enabled: Some(enabled),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            enabled: None,
            text: Some(text.into()),
        }
    }
}

/// One page of the user list as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    pub data: Vec<User>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl ListPage {
    pub fn page_count(&self) -> u32 {
        if self.page_size == 0 {
            return 1;
        }
        let pages = self.total.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }
}
