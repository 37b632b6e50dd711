//! callbridge-core: per-element RTC client registry and call lifecycle bridge
//!
//! This crate keeps one real-time-communication SDK client per host element
//! and relays everything that client does back to the host:
//!
//! - **Client registry** - [`ClientRegistry`] creates, controls and unmounts clients by element id
//! - **Session construction** - [`session::SessionFactory`] builds and rebuilds the client behind a session
//! - **Event bridge** - [`bridge`] forwards SDK events as cycle-safe JSON ([`Payload`])
//! - **Call state reducer** - [`reducer::reduce`] turns call updates into host signals and effects
//! - **Reconnection** - [`Reconnector`] bounds automatic rebuilds after abnormal call ends
//! - **Lifecycle observer** - [`observer`] unmounts a client when its element leaves the document
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use callbridge_core::{ClientInitOptions, ClientOptions, ClientRegistry, MemoryHost};
//! use callbridge_core::sdk::MockRtcClientFactory;
//!
//! async fn example() {
//!     let registry = ClientRegistry::new(Arc::new(MockRtcClientFactory::new()));
//!     let host = Arc::new(MemoryHost::default());
//!
//!     let options = ClientOptions {
//!         init_options: ClientInitOptions::with_token("token"),
//!         auto_answer: true,
//!         ..Default::default()
//!     };
//!     registry.create("phone", options, host).await;
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  ClientRegistry                  │
//! │  ┌─────────────────────┐   ┌──────────────────┐  │
//! │  │   SessionWrapper    │   │  ObserverHandle  │  │
//! │  │  client ── pump ────┼─► │  (per element)   │  │
//! │  │  current call       │   └──────────────────┘  │
//! │  │  reconnector        │                         │
//! │  └──────────┬──────────┘                         │
//! │             │ bridge + reducer                   │
//! │             ▼                                    │
//! │        HostCallback                              │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod observer;
pub mod options;
pub mod payload;
pub mod reconnect;
pub mod reducer;
pub mod registry;
pub mod sdk;
pub mod session;
pub mod types;

// Re-export key types for convenience
pub use config::{ClientInitOptions, ClientOptions, Environment, IceServer};
pub use error::{BridgeError, ConfigError, SdkError};
pub use host::{HostCallback, HostEvent, MemoryHost, SharedHost};
pub use observer::{Document, ElementRef, MemoryDocument, ObserverHandle};
pub use options::{
    AnswerOptions, AudioSettings, CallOptions, HangupOptions, ScreenShareOptions, VideoSettings,
};
pub use payload::{CIRCULAR_MARKER, ObjectRef, Payload};
pub use reconnect::{ReconnectPolicy, Reconnector};
pub use reducer::{CallSignal, ReducerPolicy, Reduction};
pub use registry::ClientRegistry;
pub use sdk::{CallCommand, CallHandle, RtcClient, RtcClientFactory, SdkEvent, SessionEvent};
pub use session::SessionInfo;
pub use types::{
    CallSnapshot, CallState, DeviceDescriptor, DeviceFilter, DeviceKind, MediaError, MediaKind,
    Notification,
};
