use std::{
    cmp::Ordering,
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::debug;

use crate::{
    domain::{
        ListPage, PageSize, Role, Sort, SortDir, SortField, User, UserDraft, UserField, UserId,
        UserPayload,
    },
    validation,
};

use super::{ApiError, ErrorPayload, ListRequest, UserApi, codes};

/// Number of calls served per endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallLog {
    pub list: usize,
    pub get: usize,
    pub create: usize,
    pub update: usize,
}

/// User service held in memory. Applies the same rules as the real service:
/// normalization, unique username and email, not-found on unknown ids,
/// filtering, sorting and paging.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserApi {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    next_id: u64,
    failures: VecDeque<ApiError>,
    calls: CallLog,
}

impl InMemoryUserApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let api = Self::new();
        if let Ok(mut guard) = api.inner.lock() {
            for user in users {
                let numeric = user.id.as_str().parse::<u64>().unwrap_or(0);
                guard.next_id = guard.next_id.max(numeric);
                guard.users.push(user);
            }
        }
        api
    }

    /// A populated service used by the CLI demo mode.
    pub fn demo() -> Self {
        const NAMES: [(&str, &str); 12] = [
            ("ada", "Ada Lovelace"),
            ("alan", "Alan Turing"),
            ("grace", "Grace Hopper"),
            ("edsger", "Edsger Dijkstra"),
            ("barbara", "Barbara Liskov"),
            ("donald", "Donald Knuth"),
            ("frances", "Frances Allen"),
            ("ken", "Ken Thompson"),
            ("margaret", "Margaret Hamilton"),
            ("dennis", "Dennis Ritchie"),
            ("radia", "Radia Perlman"),
            ("tony", "Tony Hoare"),
        ];
        let api = Self::new();
        for round in 0..5u32 {
            for (index, (handle, name)) in NAMES.iter().enumerate() {
                let serial = round as usize * NAMES.len() + index;
                let role = match serial % 7 {
                    0 => Role::SuperAdmin,
                    1 | 2 => Role::Admin,
                    _ => Role::Guest,
                };
                let username = if round == 0 {
                    (*handle).to_string()
                } else {
                    format!("{handle}.{round}")
                };
                let payload = UserPayload {
                    email: format!("{username}@example.org"),
                    username,
                    display_name: (*name).to_string(),
                    phone: (serial % 3 == 0).then(|| format!("+1415555{:04}", serial)),
                    roles: [role].into_iter().collect(),
                    enabled: serial % 5 != 4,
                };
                api.seed(payload);
            }
        }
        api
    }

    /// Inserts a record directly, bypassing validation.
    pub fn seed(&self, payload: UserPayload) -> Option<User> {
        let mut guard = self.inner.lock().ok()?;
        let user = guard.insert(payload);
        Some(user)
    }

    /// Removes a record as if another administrator deleted it.
    pub fn remove(&self, id: &UserId) -> bool {
        match self.inner.lock() {
            Ok(mut guard) => {
                let before = guard.users.len();
                guard.users.retain(|user| &user.id != id);
                guard.users.len() != before
            }
            Err(_) => false,
        }
    }

    /// The next call to any endpoint fails with `error`.
    pub fn fail_next(&self, error: ApiError) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.failures.push_back(error);
        }
    }

    pub fn calls(&self) -> CallLog {
        self.inner
            .lock()
            .map(|guard| guard.calls)
            .unwrap_or_default()
    }

    pub fn users(&self) -> Vec<User> {
        self.inner
            .lock()
            .map(|guard| guard.users.clone())
            .unwrap_or_default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, ApiError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| ApiError::Transport("in-memory store is unavailable".to_string()))?;
        if let Some(error) = guard.failures.pop_front() {
            debug!(%error, "injected failure");
            return Err(error);
        }
        Ok(guard)
    }
}

impl MemoryState {
    fn insert(&mut self, payload: UserPayload) -> User {
        self.next_id += 1;
        let now = Utc::now() - Duration::minutes(self.next_id as i64);
        let user = User {
            id: UserId::new(self.next_id.to_string()),
            username: payload.username,
            display_name: payload.display_name,
            phone: payload.phone,
            email: payload.email,
            roles: payload.roles,
            enabled: payload.enabled,
            created_at: now,
            updated_at: now,
        };
        self.users.push(user.clone());
        user
    }

    fn check(
        &self,
        payload: &UserPayload,
        existing: Option<&UserId>,
    ) -> Result<UserPayload, ApiError> {
        let normalized = validation::normalize(&UserDraft::from(payload));
        let errors = validation::validate(&normalized);
        if !errors.is_empty() {
            let payload = errors.iter().fold(
                ErrorPayload::new(codes::VALIDATION),
                |payload, (field, message)| payload.with_detail(field.as_str(), message),
            );
            return Err(ApiError::rejected(422, payload));
        }

        let others = || {
            self.users
                .iter()
                .filter(move |user| Some(&user.id) != existing)
        };
        let mut conflict = ErrorPayload::new(codes::DUPLICATE);
        if others().any(|user| user.username == normalized.username) {
            conflict = conflict.with_detail(UserField::Username.as_str(), "Already in use");
        }
        if others().any(|user| user.email == normalized.email) {
            conflict = conflict.with_detail(UserField::Email.as_str(), "Already in use");
        }
        if !conflict.details.is_empty() {
            return Err(ApiError::rejected(409, conflict));
        }
        Ok(normalized.to_payload())
    }
}

fn not_found() -> ApiError {
    ApiError::rejected(404, ErrorPayload::new(codes::NOT_FOUND))
}

fn compare(field: SortField, left: &User, right: &User) -> Ordering {
    match field {
        SortField::Id => match (
            left.id.as_str().parse::<u64>(),
            right.id.as_str().parse::<u64>(),
        ) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            _ => left.id.cmp(&right.id),
        },
        SortField::Username => left.username.cmp(&right.username),
        SortField::DisplayName => left
            .display_name
            .to_lowercase()
            .cmp(&right.display_name.to_lowercase()),
        SortField::Email => left.email.cmp(&right.email),
        SortField::Enabled => left.enabled.cmp(&right.enabled),
        SortField::CreatedAt => left.created_at.cmp(&right.created_at),
        SortField::UpdatedAt => left.updated_at.cmp(&right.updated_at),
    }
}

#[async_trait]
impl UserApi for InMemoryUserApi {
    async fn list(&self, request: &ListRequest) -> Result<ListPage, ApiError> {
        let mut guard = self.state()?;
        guard.calls.list += 1;

        let invalid = |field: &str, message: String| {
            ApiError::rejected(
                400,
                ErrorPayload::new(codes::VALIDATION).with_detail(field, message),
            )
        };
        let sort = request
            .sort
            .parse::<Sort>()
            .map_err(|err| invalid("sort", err.to_string()))?;
        let page_size = PageSize::try_from(request.page_size)
            .map_err(|err| invalid("pageSize", err.to_string()))?;
        if request.page == 0 {
            return Err(invalid("page", "page starts at 1".to_string()));
        }

        let needle = request.q.as_deref().map(str::to_lowercase);
        let mut matches = guard
            .users
            .iter()
            .filter(|user| request.enabled.is_none_or(|enabled| user.enabled == enabled))
            .filter(|user| {
                needle.as_deref().is_none_or(|needle| {
                    user.username.to_lowercase().contains(needle)
                        || user.email.to_lowercase().contains(needle)
                })
            })
            .cloned()
            .collect::<Vec<_>>();
        matches.sort_by(|left, right| {
            let ordering = compare(sort.field, left, right);
            match sort.dir {
                SortDir::Asc => ordering,
                SortDir::Desc => ordering.reverse(),
            }
        });

        let total = matches.len() as u64;
        let size = page_size.get() as usize;
        let start = (request.page as usize - 1).saturating_mul(size);
        let data = matches.into_iter().skip(start).take(size).collect();
        Ok(ListPage {
            data,
            page: request.page,
            page_size: page_size.get(),
            total,
        })
    }

    async fn get(&self, id: &UserId) -> Result<User, ApiError> {
        let mut guard = self.state()?;
        guard.calls.get += 1;
        guard
            .users
            .iter()
            .find(|user| &user.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn create(&self, payload: &UserPayload) -> Result<User, ApiError> {
        let mut guard = self.state()?;
        guard.calls.create += 1;
        let accepted = guard.check(payload, None)?;
        Ok(guard.insert(accepted))
    }

    async fn update(&self, id: &UserId, payload: &UserPayload) -> Result<User, ApiError> {
        let mut guard = self.state()?;
        guard.calls.update += 1;
        if !guard.users.iter().any(|user| &user.id == id) {
            return Err(not_found());
        }
        let accepted = guard.check(payload, Some(id))?;
        let user = guard
            .users
            .iter_mut()
            .find(|user| &user.id == id)
            .ok_or_else(not_found)?;
        user.username = accepted.username;
        user.display_name = accepted.display_name;
        user.phone = accepted.phone;
        user.email = accepted.email;
        user.roles = accepted.roles;
        user.enabled = accepted.enabled;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}
