use std::{path::PathBuf, sync::Arc};

use alice_sh::{
    Handler, HandlerConfig, Outcome, RemotePlatform, Service, ServiceConfig, SyncError,
    common::{
        DescriptorType, ServiceId, StateChange, StateValue,
        device::{DeviceConfig, DeviceInfo, DeviceState},
    },
    handlers::{
        Template, color::ColorConfig, event::EventConfig, on_off::OnOffConfig, range::RangeConfig,
    },
};
use anyhow::{Context as _, bail};
use async_trait::async_trait;
use clap::Parser;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Runs a device from a JSON description and feeds it lines from stdin:
///
///   <handler id> <json payload>             local input
///   remote <type> <instance> <json value>   change pushed by the platform
///   info | state                            print the current payloads
#[derive(Parser)]
struct Args {
    /// Device description file
    config: PathBuf,

    /// Make every push to the platform fail
    #[arg(long)]
    fail: bool,

    /// Override the value cache capacity
    #[arg(long)]
    cache_capacity: Option<usize>,
}

#[derive(Deserialize)]
struct Config {
    service: ServiceConfig,
    device: DeviceConfig,
    handlers: Vec<HandlerEntry>,
}

#[derive(Deserialize)]
struct HandlerEntry {
    id: String,
    #[serde(flatten)]
    kind: HandlerKind,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum HandlerKind {
    Color(ColorConfig),
    Event(EventConfig),
    OnOff(OnOffConfig),
    Range(RangeConfig),
}

impl HandlerConfig for HandlerKind {
    fn template(&self) -> alice_sh::Result<Template> {
        match self {
            HandlerKind::Color(config) => config.template(),
            HandlerKind::Event(config) => config.template(),
            HandlerKind::OnOff(config) => config.template(),
            HandlerKind::Range(config) => config.template(),
        }
    }
}

/// Stands in for the platform: prints every push instead of sending it.
struct LoggingRemote {
    fail: bool,
}

impl LoggingRemote {
    fn outcome(&self) -> Result<(), SyncError> {
        if self.fail {
            return Err(SyncError::Network("simulated failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemotePlatform for LoggingRemote {
    async fn push_device_info(&self, info: &DeviceInfo) -> Result<(), SyncError> {
        tracing::info!(
            device = %info.id,
            payload = %serde_json::to_string(info).unwrap_or_default(),
            "push device info",
        );
        self.outcome()
    }

    async fn push_state(&self, state: &DeviceState) -> Result<(), SyncError> {
        tracing::info!(
            device = %state.id,
            payload = %serde_json::to_string(state).unwrap_or_default(),
            "push state",
        );
        self.outcome()
    }

    fn publish(&self, service: &ServiceId) -> Result<(), SyncError> {
        tracing::info!(%service, "publish");
        Ok(())
    }

    fn unpublish(&self, service: &ServiceId) {
        tracing::info!(%service, "unpublish");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    alice_sh::log::init();

    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read {}", args.config.display()))?;
    let mut config: Config =
        serde_json::from_str(&raw).context("failed to parse device description")?;
    if let Some(capacity) = args.cache_capacity {
        config.service.cache_capacity = capacity;
    }

    let remote = Arc::new(LoggingRemote { fail: args.fail });
    let service = Service::start(config.service, remote).context("failed to start service")?;
    let device = service.device(config.device);

    let mut handlers = Vec::with_capacity(config.handlers.len());
    for entry in &config.handlers {
        let (handler, mut output) = Handler::start(entry.id.as_str(), &entry.kind, device.clone())
            .await
            .with_context(|| format!("failed to start handler {}", entry.id))?;

        let id = entry.id.clone();
        tokio::spawn(async move {
            while let Some(msg) = output.recv().await {
                println!("{id} <- {}", serde_json::to_string(&msg).unwrap_or_default());
            }
        });

        handlers.push(handler);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Err(err) = dispatch(line, &device, &handlers).await {
            eprintln!("error: {err:#}");
        }
    }

    for handler in handlers {
        handler.close(false).await;
    }
    device.close();
    service.close();

    Ok(())
}

async fn dispatch(
    line: &str,
    device: &Arc<alice_sh::Device>,
    handlers: &[Handler],
) -> anyhow::Result<()> {
    let (head, rest) = line.split_once(' ').unwrap_or((line, ""));

    match head {
        "info" => println!("{}", serde_json::to_string_pretty(&device.info())?),
        "state" => println!("{}", serde_json::to_string_pretty(&device.state())?),
        "remote" => {
            let mut parts = rest.splitn(3, ' ');
            let (Some(kind), Some(instance), Some(value)) =
                (parts.next(), parts.next(), parts.next())
            else {
                bail!("usage: remote <type> <instance> <json value>");
            };

            let kind = kind.parse::<DescriptorType>().map_err(anyhow::Error::msg)?;
            let value: StateValue = serde_json::from_str(value).context("invalid value")?;

            if device.apply_remote(&StateChange::new(kind, instance, value)) {
                println!("applied");
            } else {
                println!("ignored, no such descriptor");
            }
        }
        id => {
            let Some(handler) = handlers.iter().find(|h| h.id().as_str() == id) else {
                bail!("unknown handler {id:?}");
            };

            let payload: serde_json::Value = serde_json::from_str(rest).context("invalid payload")?;
            match handler.input(payload).await? {
                Outcome::Unchanged => println!("{id}: unchanged"),
                Outcome::Committed => println!("{id}: committed"),
            }
        }
    }

    Ok(())
}
