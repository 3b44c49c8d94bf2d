mod client;
mod reconciler;
mod sse;
mod state;
mod surface;
mod transport;

pub use client::*;
pub use reconciler::*;
pub use sse::*;
pub use state::*;
pub use surface::*;
pub use transport::*;
