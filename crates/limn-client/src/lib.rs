//! Limn client library: peer-connection bootstrap, publisher and viewer
//! flows, HTTP signaling exchange, and the overlay render loop.

pub mod capture;
pub mod media;
pub mod publish;
pub mod render;
pub mod session;
pub mod signaling;
pub mod view;

pub use render::{FrameDump, RenderLoop};
pub use session::{EventLog, SessionContext, SessionHandle};
