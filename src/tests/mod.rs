mod support;

mod form;
mod save;
mod screen;
