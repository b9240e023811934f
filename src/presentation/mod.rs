mod components;
mod view;

pub use view::{Focus, UiContext, draw};
