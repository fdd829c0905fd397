pub mod headless;

// Re-export main types
pub use headless::{HeadlessPort, HeadlessPortFactory};
