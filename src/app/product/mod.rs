//! 产品管理

pub mod form;
pub mod handler;
pub mod model;
pub mod service;
pub mod validation;
