pub mod error;
pub mod config;
pub mod path;
pub mod net;
pub mod fs;
pub mod state;
pub mod routing;
