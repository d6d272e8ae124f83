mod request;
mod response;

pub use request::AnalyzeRequest;
pub use response::{HealthResponse, RebuildResponse};
