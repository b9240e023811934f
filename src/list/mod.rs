mod controller;

pub use controller::{DEFAULT_DEBOUNCE, FetchTicket, ListQueryController};
