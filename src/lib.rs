pub mod api;
pub mod config;
pub mod cors;
pub mod friend;
pub mod friend_storage;
pub mod memory_friend_storage;
pub mod postgres;
pub mod postgres_friend_storage;
