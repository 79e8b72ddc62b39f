mod device_response;
mod error;
mod logging;
mod rvm_handler;
mod server;

pub use device_response::*;
pub use error::*;
pub use logging::*;
pub use rvm_handler::*;
pub use server::*;
