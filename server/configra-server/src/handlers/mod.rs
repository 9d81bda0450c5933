pub mod configs;
pub mod health;
