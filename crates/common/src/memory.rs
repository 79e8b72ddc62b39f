mod device_repository;
mod seed;

pub use device_repository::*;
pub use seed::*;
