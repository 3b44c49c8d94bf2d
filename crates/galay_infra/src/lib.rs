mod env;
mod http;
mod session;

pub use env::resolve_chat_config;
pub use http::GalayHttpTransport;
pub use session::SessionStore;
