//! 基础设施层：存储、图片文件与日志

pub mod image_store;
pub mod json_file;
pub mod logger;
pub mod store;
