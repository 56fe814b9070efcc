pub mod cli;
pub mod config;
pub mod error;
pub mod jump;
pub mod port;
pub mod tunnel;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use error::TunnelError;
pub use jump::JumpHop;
pub use tunnel::{establish, TunnelConfig, TunnelHandle, TunnelLauncher, TunnelRequest, TunnelState};
