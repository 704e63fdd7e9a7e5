pub mod message;
pub mod event;
pub mod caption;
pub mod tool;
pub mod config;
pub mod error;
pub mod session;
pub mod clock;


pub use error::VisionError;
pub type Result<T> = std::result::Result<T, VisionError>;
