pub mod auth;
pub mod blob_storage;
pub mod clock;
pub mod image_gen;
pub mod openai;
pub mod persistence;
pub mod ports;
