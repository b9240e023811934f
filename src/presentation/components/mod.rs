mod dialog;
mod footer;
mod form;
mod grid;
mod header;
mod layout;

pub use dialog::render_discard_dialog;
pub use footer::render_footer;
pub use form::render_form;
pub use grid::render_grid;
pub use header::render_header;
