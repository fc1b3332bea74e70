pub mod plex;
pub mod source;
