//! Shared helpers: dotted value paths, placeholder templating, timestamps

pub mod template;
pub mod time;
pub mod value_path;

pub use value_path::{get_path, get_str, remove_nulls, set_path};
