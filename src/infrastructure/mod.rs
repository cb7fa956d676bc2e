pub mod database;
pub mod media;
pub mod storage;
