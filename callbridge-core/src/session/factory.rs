//! Builds (and rebuilds) the SDK client behind a session

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::wrapper::SessionWrapper;
use crate::error::SdkError;
use crate::sdk::{RtcClientFactory, SdkEvent};

/// Constructs SDK clients for session wrappers
///
/// Construction and reconstruction are the same step: whatever client the
/// wrapper holds is torn down first, so an id never has two live bridges.
#[derive(Clone)]
pub struct SessionFactory {
    client_factory: Arc<dyn RtcClientFactory>,
}

impl SessionFactory {
    pub fn new(client_factory: Arc<dyn RtcClientFactory>) -> Self {
        Self { client_factory }
    }

    /// Build a client for `wrapper` and connect it
    ///
    /// `attach` receives the new epoch and the event receiver and must spawn
    /// the bridge pump. It runs after the subscription and before `connect`.
    /// A connect failure is logged and returned; the session stays
    /// registered with its pump attached either way.
    pub async fn construct<F>(&self, wrapper: &mut SessionWrapper, attach: F) -> Result<(), SdkError>
    where
        F: FnOnce(u64, broadcast::Receiver<SdkEvent>) -> JoinHandle<()> + Send,
    {
        if let Err(e) = wrapper.teardown().await {
            warn!(element_id = %wrapper.id, error = %e, "Failed to disconnect previous client");
        }

        let config = wrapper.config.clone();
        let mut client = self.client_factory.create(&config.init_options);

        client.set_media_sinks(config.local_element.clone(), config.remote_element.clone());
        client.set_microphone(config.audio);
        client.set_webcam(config.video);

        let rx = client.subscribe();
        wrapper.epoch += 1;
        wrapper.pump = Some(attach(wrapper.epoch, rx));
        wrapper.client = Some(client);

        debug!(element_id = %wrapper.id, epoch = wrapper.epoch, "Connecting client");

        let result = match wrapper.client.as_mut() {
            Some(client) => client.connect().await,
            None => Err(SdkError::NotConnected),
        };

        match &result {
            Ok(()) => wrapper.connected = true,
            Err(e) => error!(element_id = %wrapper.id, error = %e, "Client connect failed"),
        }
        result
    }
}
