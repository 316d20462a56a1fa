pub mod acquire;
pub mod driver;
pub mod session;

pub use acquire::acquire;
pub use driver::DriverServer;
pub use session::{LaunchOptions, Session};
