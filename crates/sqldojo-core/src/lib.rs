pub mod config;
pub mod engine;
pub mod errors;
pub mod fingerprint;
pub mod model;
pub mod provision;
pub mod sandbox;
pub mod storage;
pub mod value;
pub mod verify;
