pub(crate) mod input;
pub(crate) mod keymap;
mod options;
mod runtime;
mod screen;
mod status;
mod terminal;
mod user_admin;

pub use options::UiOptions;
pub use screen::{Effect, Msg, Screen};
pub use user_admin::UserAdmin;
