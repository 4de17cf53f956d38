//! YAML persistence of the implication list, with optional hot reload via
//! a `notify` watcher on the file's directory.

mod core;
mod watcher;


pub use self::core::{ImplicationStore, ImplicationsFile};
