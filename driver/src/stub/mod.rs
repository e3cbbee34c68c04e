pub mod bridge;
pub mod script;

pub use bridge::StubBackend;
pub use script::StubReply;
