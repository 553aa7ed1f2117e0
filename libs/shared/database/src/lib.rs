pub mod locks;
pub mod postgrest;
