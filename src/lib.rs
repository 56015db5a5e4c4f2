pub mod config;
pub mod error;
pub mod filter;
pub mod inspect;
pub mod model;
pub mod pgpass;
pub mod pipeline;
pub mod render;
pub mod source;

pub use error::UmlError;
pub use model::Diagram;
pub use pipeline::{build_diagram, generate};
