pub mod chat;
pub mod health;
pub mod mode;
pub mod probe;
pub mod score;
