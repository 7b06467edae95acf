pub mod body;
pub mod error;
mod macros;
pub mod request;
pub mod response;
