//! sawmon - plugin orchestration for server and website monitoring

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;
