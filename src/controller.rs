pub mod controller_handler;
pub mod shutdown_signal;

pub use controller_handler::Controller;
