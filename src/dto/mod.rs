pub mod admissions;
pub mod auth;
pub mod cart;
pub mod community;
pub mod orders;
pub mod products;
pub mod settings;
