use serde::Deserialize;

use crate::core::channel::ChannelOptions;

/// Keys that only steer routing and are never forwarded to the channel.
const ROUTING_KEYS: [&str; 4] = ["exchangeName", "routingKey", "exchange_name", "routing_key"];

/// Publish options, used both as publisher-wide defaults and per call.
///
/// Anything in `extra` is passed through verbatim to the channel.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PublishOptions {
    #[serde(default)]
    pub exchange_name: Option<String>,
    #[serde(default)]
    pub routing_key: Option<String>,
    #[serde(default, rename = "options")]
    pub extra: ChannelOptions,
}

/// Per-call view after merging call options over the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub exchange_name: String,
    pub routing_key: String,
    pub channel_options: ChannelOptions,
}

impl PublishOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exchange(mut self, name: impl Into<String>) -> Self {
        self.exchange_name = Some(name.into());
        self
    }

    pub fn routing_key(mut self, key: impl Into<String>) -> Self {
        self.routing_key = Some(key.into());
        self
    }

    /// Adds a pass-through field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Overlays `per_call` on `self` without touching either.
    ///
    /// An unset or empty per-call exchange/routing key falls back to the
    /// default; with neither set the empty string is used, which brokers
    /// treat as the default exchange.
    pub fn merge(&self, per_call: &PublishOptions) -> ResolvedOptions {
        let mut channel_options = self.extra.clone();
        for (key, value) in &per_call.extra {
            channel_options.insert(key.clone(), value.clone());
        }
        for key in ROUTING_KEYS {
            channel_options.remove(key);
        }

        ResolvedOptions {
            exchange_name: pick(&per_call.exchange_name, &self.exchange_name),
            routing_key: pick(&per_call.routing_key, &self.routing_key),
            channel_options,
        }
    }
}

fn pick(per_call: &Option<String>, default: &Option<String>) -> String {
    per_call
        .as_deref()
        .filter(|v| !v.is_empty())
        .or(default.as_deref())
        .unwrap_or_default()
        .to_owned()
}
