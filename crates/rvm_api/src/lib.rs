pub mod domain;
pub mod http;
pub mod rvm_api;

pub use domain::*;
pub use http::*;
pub use rvm_api::*;
