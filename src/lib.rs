mod auth;
mod config;
mod directory;
mod error;
mod password;
mod routes;
mod token;
mod types;

pub use auth::*;
pub use config::*;
pub use directory::*;
pub use error::*;
pub use password::*;
pub use routes::*;
pub use token::*;
pub use types::*;
