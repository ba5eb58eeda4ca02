pub mod cache;
pub mod catalog;
pub mod normalize;
pub mod service;
