pub mod config;
pub mod platform;
pub mod playback;
pub mod presence;
pub mod protocol;
pub mod realtime;
pub mod session;
pub mod settings;
pub mod state;
pub mod store;
pub mod supabase;
pub mod sync;
pub mod ticker;
