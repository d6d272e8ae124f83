mod analyze;
mod health;
mod rebuild;

pub use analyze::handle_analyze;
pub use health::health_check;
pub use rebuild::handle_rebuild;
