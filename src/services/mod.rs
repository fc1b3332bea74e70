pub mod plex;
pub mod retry;
pub mod sync;
