pub mod auth_dtos;
pub mod post_dtos;
