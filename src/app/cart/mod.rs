pub mod handler;
pub mod model;
pub mod pricing;
pub mod service;
