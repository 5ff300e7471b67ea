pub mod common;
pub mod gateway;
pub mod layout_engine;
pub mod model;
