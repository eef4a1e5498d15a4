//! Builtin tools

pub mod echo;
pub mod http;
pub mod weather;

pub use echo::EchoTool;
pub use http::HttpRequestTool;
pub use weather::WeatherTool;
