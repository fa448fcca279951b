pub mod cache;
pub mod estimate;
pub mod melhor_envio;
pub mod rate_limit;
