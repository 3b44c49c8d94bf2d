mod app;
mod cli;
pub mod local_mock;
mod logging;
mod probe;
mod surface;

pub use app::run;
pub use cli::*;
pub use local_mock::LocalMockTransport;
pub use logging::init_tracing;
pub use probe::probe;
pub use surface::TerminalSurface;
