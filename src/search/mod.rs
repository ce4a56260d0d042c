pub mod pipeline;
pub mod executor;
