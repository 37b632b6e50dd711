//! Communication SDK abstraction

pub mod mock;
pub mod traits;

pub use mock::{MockBehavior, MockCall, MockClientHandle, MockRtcClient, MockRtcClientFactory};
pub use traits::{CallCommand, CallHandle, RtcClient, RtcClientFactory, SdkEvent, SessionEvent};
