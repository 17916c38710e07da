pub mod middleware;
pub mod serde_helpers;
