pub mod image_service;
pub mod keywords;
pub mod object_keys;
pub mod object_store;
pub mod s3_store;
