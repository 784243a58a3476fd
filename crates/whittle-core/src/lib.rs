pub mod errors;
pub mod host;
pub mod ids;
pub mod messages;
pub mod state;
pub mod tokens;
