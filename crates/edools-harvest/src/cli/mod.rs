//! CLI subcommand implementations for the edools-harvest binary.

pub mod doctor;
pub mod login_cmd;
pub mod output;
pub mod scrape_cmd;
