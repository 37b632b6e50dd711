//! Scripted walk through a client's lifecycle against the loopback SDK

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use callbridge_core::sdk::{MockBehavior, MockClientHandle, MockRtcClientFactory};
use callbridge_core::{
    CallCommand, CallOptions, CallState, ClientOptions, ClientRegistry, DeviceFilter, HostEvent,
    MemoryDocument, MemoryHost,
};
use clap::Args;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{CallbridgeConfig, ConfigLoader};

/// Time given to the event pump between scripted steps
const SETTLE: Duration = Duration::from_millis(25);

/// Recent events kept by the demo host; the printer streams everything
const HISTORY_LIMIT: usize = 64;

#[derive(Args)]
pub struct DemoArgs {
    /// Answer the inbound call automatically
    #[arg(long)]
    pub auto_answer: bool,

    /// Rebuild the client after the simulated network drop
    #[arg(long)]
    pub reconnect: bool,

    /// Delay before reconnecting, in milliseconds
    #[arg(long, default_value_t = 200)]
    pub reconnect_delay: u64,

    /// Print payloads as indented JSON
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(args: DemoArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let options = demo_options(&config, &args);
    let element_id = config.demo.element_id.clone();

    let clients = Arc::new(MockRtcClientFactory::with_behavior(MockBehavior {
        emit_ready_on_connect: true,
        ..Default::default()
    }));
    let registry = ClientRegistry::new(clients.clone());
    let host = Arc::new(MemoryHost::default().with_history_limit(HISTORY_LIMIT));
    let printer = spawn_printer(&host, args.pretty);

    let unload = CancellationToken::new();
    registry.install_unload_hook(unload.clone());

    let document = MemoryDocument::new();
    let container = document.create_element("app");
    let element = document.create_element(element_id.as_str());
    document.append_child(&document.root(), &container);
    document.append_child(&container, &element);

    info!(element_id = %element_id, "Mounting client");
    if !registry.create(&element_id, options.clone(), host.clone()).await {
        bail!("client {} already exists", element_id);
    }
    registry.create_observer(&element_id, &document).await;
    settle().await;

    let Some(client) = clients.last() else {
        bail!("no client was created");
    };

    inbound_call(&registry, &client, &element_id, &config, options.auto_answer).await;
    outbound_call(&registry, &client, &element_id, &config).await;

    for device in registry.devices(&element_id, DeviceFilter::All).await {
        println!("device  {:?} {} ({})", device.kind, device.label, device.device_id);
    }

    info!(element_id = %element_id, "Simulating network drop");
    registry.call(&element_id, CallOptions::to(config.demo.destination.as_str())).await;
    client.emit_call_update(CallState::Disconnected, None);
    settle().await;
    if options.reconnect_policy().enabled {
        tokio::time::sleep(Duration::from_millis(options.reconnect_delay) + SETTLE).await;
        info!(clients = clients.created_count(), "Clients built so far");
    }

    info!(element_id = %element_id, "Removing element from the document");
    document.remove(&element);
    settle().await;
    if registry.contains(&element_id).await {
        bail!("client {} survived element removal", element_id);
    }

    unload.cancel();
    settle().await;
    printer.abort();

    println!("{} events delivered", host.delivered());
    Ok(())
}

fn demo_options(config: &CallbridgeConfig, args: &DemoArgs) -> ClientOptions {
    let mut options = config.client_options();
    if options.init_options.login_token.is_none() {
        options.init_options.login_token = Some("demo-token".to_string());
    }
    if args.auto_answer {
        options.auto_answer = true;
    }
    if args.reconnect {
        options.auto_reconnect = Some(true);
        options.reconnect_delay = args.reconnect_delay;
    }
    options
}

async fn inbound_call(
    registry: &ClientRegistry,
    client: &MockClientHandle,
    element_id: &str,
    config: &CallbridgeConfig,
    auto_answer: bool,
) {
    info!(element_id, caller = %config.demo.caller_number, "Simulating inbound call");
    client.ring(&config.demo.caller_number);
    settle().await;

    if !auto_answer {
        registry.answer(element_id, None).await;
    }
    client.emit_call_update(CallState::Active, None);
    settle().await;

    registry.command(element_id, CallCommand::Hold).await;
    client.emit_call_update(CallState::Held, None);
    settle().await;

    registry.command(element_id, CallCommand::Unhold).await;
    registry.command(element_id, CallCommand::Dtmf("1".to_string())).await;
    client.emit_call_update(CallState::Active, None);
    settle().await;

    registry.hangup(element_id, None).await;
    client.emit_call_update(CallState::Hangup, None);
    settle().await;
}

async fn outbound_call(
    registry: &ClientRegistry,
    client: &MockClientHandle,
    element_id: &str,
    config: &CallbridgeConfig,
) {
    info!(element_id, destination = %config.demo.destination, "Placing outbound call");
    if !registry
        .call(element_id, CallOptions::to(config.demo.destination.as_str()))
        .await
    {
        return;
    }

    for state in [CallState::Trying, CallState::Early, CallState::Active] {
        client.emit_call_update(state, None);
        settle().await;
    }

    if let Some(stats) = registry.call_stats(element_id).await {
        println!("stats   {}", stats);
    }

    registry.hangup(element_id, None).await;
    client.emit_call_update(CallState::Hangup, None);
    settle().await;
}

fn spawn_printer(host: &MemoryHost, pretty: bool) -> JoinHandle<()> {
    let mut events = host.stream();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            if let Ok(event) = event {
                println!("{}", format_event(&event, pretty));
            }
        }
    })
}

fn format_event(event: &HostEvent, pretty: bool) -> String {
    let payload = match event.payload_json() {
        Ok(value) if pretty => serde_json::to_string_pretty(&value),
        Ok(value) => serde_json::to_string(&value),
        Err(_) => Ok(event.payload.clone()),
    }
    .unwrap_or_else(|_| event.payload.clone());

    format!("[{}] {:<18} {}", event.element_id, event.name, payload)
}

async fn settle() {
    tokio::time::sleep(SETTLE).await;
}
