#![deny(rust_2018_idioms)]

pub mod api;
pub mod app;
pub mod domain;
pub mod form;
pub mod list;
pub mod prefs;
mod presentation;
pub mod save;
pub mod sync;
pub mod validation;

#[cfg(feature = "http")]
pub use api::HttpUserApi;
pub use api::{ApiError, InMemoryUserApi, UserApi};
pub use app::{Effect, Msg, Screen, UiOptions, UserAdmin};
pub use prefs::{FilePreferences, MemoryPreferences, PreferenceStore};

pub mod prelude {
    pub use super::{InMemoryUserApi, UiOptions, UserAdmin, UserApi};
}

#[cfg(test)]
mod tests;
