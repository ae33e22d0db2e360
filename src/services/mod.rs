pub mod candidate_service;
pub mod image_service;
pub mod memory_store;
