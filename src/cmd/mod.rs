//! CLI subcommand handlers.

mod demo_cmd;
mod schema;
mod view_cmd;

pub use demo_cmd::*;
pub use schema::*;
pub use view_cmd::*;
