//! Command implementations

mod codes;
mod config;
mod post_codes;
mod service;
mod session;

pub use codes::codes;
pub use config::show_config;
pub use post_codes::post_codes;
pub use service::{payoffs, ping};
pub use session::{check_in, check_out, drop_out};
