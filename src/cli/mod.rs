pub mod checker;
pub mod cmd;
pub mod configuration;
pub mod generator;
pub mod logger;
