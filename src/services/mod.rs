pub mod dispatcher;
pub mod method_channel;
pub mod pattern_detector;
pub mod press_source;
pub mod screen_monitor;
pub mod sms;
pub mod volume_sos;

pub use dispatcher::EventDispatcher;
pub use method_channel::{MethodChannelServer, ShieldMethodHandler};
pub use screen_monitor::create_screen_monitor;
pub use sms::create_sms_sender;
pub use volume_sos::VolumeSos;
