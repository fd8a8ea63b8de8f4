pub mod completion;
pub mod config;
pub mod media;
pub mod text;
pub mod types;

// Keep the public surface small and intentional.
pub use completion::*;
pub use config::*;
pub use media::*;
pub use text::*;
pub use types::*;
