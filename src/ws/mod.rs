pub mod channel;
pub mod registry;
pub mod session;
