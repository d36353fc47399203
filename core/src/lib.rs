pub mod chat;
pub mod enforce;
pub mod error;
pub mod mode;
pub mod prompt;
pub mod risk;
pub mod whales;
