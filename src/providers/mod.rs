pub mod memory;
pub mod postgrest;
