mod error;
mod query;
mod user;

pub use error::DraftError;
pub use query::{
    FilterPatch, ListPage, ListQuery, PageSize, QueryError, Sort, SortDir, SortField,
};
pub use user::{FieldValue, Role, User, UserDraft, UserField, UserId, UserPayload};
