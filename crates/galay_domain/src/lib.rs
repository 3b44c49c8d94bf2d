mod block;
mod chat;
mod config;
mod error;
mod frame;
mod session;
mod source;

pub use block::*;
pub use chat::*;
pub use config::*;
pub use error::*;
pub use frame::*;
pub use session::*;
pub use source::*;
