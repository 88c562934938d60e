pub mod command;
pub mod execute;
pub mod output;

pub use command::{AccessFields, CliCommand};
pub use execute::execute;
pub use output::render_json;
