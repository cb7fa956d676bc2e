pub mod faststart;
pub mod ingest;
pub mod media_tool;
pub mod media_validator;
pub mod probe;
pub mod publisher;
pub mod staging;
pub mod storage;
pub mod video_store;
