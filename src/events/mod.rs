pub mod method;
pub mod press;
pub mod shield;

pub use method::{ErrorCode, MethodCall, MethodError, MethodResult, Outbound};
pub use press::{PressEvent, PressSource};
pub use shield::ShieldEvent;
