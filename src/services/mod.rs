pub mod chatbots;
pub mod fetch;
pub mod queries;
