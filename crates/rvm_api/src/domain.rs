mod ordering;
mod predicate;
mod rvm_service;

pub use ordering::*;
pub use predicate::*;
pub use rvm_service::*;
