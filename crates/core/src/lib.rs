pub mod config;
pub mod label;
pub mod node;

pub use config::Config;
pub use label::*;
pub use node::*;
