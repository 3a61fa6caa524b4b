pub mod entities;
pub mod posts;
