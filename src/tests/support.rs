use chrono::{TimeZone, Utc};

use crate::domain::{ListPage, Role, User, UserDraft, UserId};

pub(crate) fn user(id: &str, username: &str) -> User {
    let stamp = Utc
        .with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp");
    User {
        id: UserId::new(id),
        username: username.to_string(),
        display_name: format!("User {username}"),
        phone: None,
        email: format!("{username}@example.org"),
        roles: [Role::Guest].into_iter().collect(),
        enabled: true,
        created_at: stamp,
        updated_at: stamp,
    }
}

pub(crate) fn page_of(users: Vec<User>, page: u32, total: u64) -> ListPage {
    ListPage {
        data: users,
        page,
        page_size: 25,
        total,
    }
}

pub(crate) fn valid_draft() -> UserDraft {
    UserDraft {
        username: "adminuser".to_string(),
        display_name: "Admin User".to_string(),
        email: "admin@example.org".to_string(),
        phone: String::new(),
        roles: [Role::Admin].into_iter().collect(),
        enabled: true,
    }
}
