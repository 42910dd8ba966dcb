//! Report rendering for analyses and snapshot history.

mod generator;

pub use generator::{
    generate_history_json, generate_history_markdown, generate_json_report,
    generate_markdown_report,
};
