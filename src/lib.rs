pub mod audit;
pub mod bot;
pub mod clock;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod moderation;
pub mod openrouter;
pub mod provider;
pub mod session;
pub mod types;

pub use bot::run;
