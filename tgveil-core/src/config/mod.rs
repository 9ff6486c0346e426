mod capture;
mod fragmentation;
mod ip_refresh;
mod loader;
mod logging;
mod root;
mod targets;
mod validator;

pub use capture::CaptureConfig;
pub use fragmentation::FragmentationConfig;
pub use ip_refresh::IpRefreshConfig;
pub use loader::load_from_path;
pub use logging::{LoggingConfig, MetricsConfig};
pub use root::Config;
pub use targets::TargetsConfig;
