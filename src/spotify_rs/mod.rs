pub mod auth;
pub mod client;
pub mod source;
pub mod types;

pub use source::SpotifySource;
