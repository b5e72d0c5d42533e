pub mod legacy;
pub mod posts;
pub mod upload;
pub mod user;
