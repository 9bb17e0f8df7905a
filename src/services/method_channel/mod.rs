//! Канал методов между службой и приложением

mod handler;
mod server;

pub use self::handler::ShieldMethodHandler;
pub use self::server::MethodChannelServer;
