pub mod assistant;
pub mod automation;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod confirmation;
pub mod context;
pub mod error;
pub mod history;
pub mod listen;
pub mod router;
pub mod speech;
pub mod ui;
pub mod utterance;
