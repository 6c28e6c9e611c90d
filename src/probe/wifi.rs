use color_eyre::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tracing::debug;

use super::Probe;
use crate::command;
use crate::config::Config;
use crate::system::platform;

pub struct WifiProbe;

/// Parse `key: value` diagnostic lines, adding `SNR` when signal and
/// noise are both present.
pub fn parse_wireless<S: AsRef<str>>(lines: &[S]) -> Map<String, Value> {
    let mut out = Map::new();
    for line in lines {
        let line = line.as_ref().trim_start();
        let Some((key, value)) = line.split_once(": ") else {
            continue;
        };
        if key.is_empty() || key.contains(char::is_whitespace) {
            continue;
        }
        out.insert(key.to_string(), Value::String(value.to_string()));
    }

    let level = |key: &str| {
        out.get(key)
            .and_then(Value::as_str)
            .and_then(|v| v.trim().parse::<i64>().ok())
    };
    if let (Some(signal), Some(noise)) = (level("agrCtlRSSI"), level("agrCtlNoise")) {
        out.insert("SNR".to_string(), Value::from(signal - noise));
    }
    out
}

impl Probe for WifiProbe {
    fn name(&self) -> &'static str {
        "wifi"
    }

    fn collect<'a>(&'a self, config: &'a Config) -> BoxFuture<'a, Result<Value>> {
        async move {
            let Some(path) = config.paths.wireless.as_deref() else {
                debug!("no wireless diagnostic tool on this platform");
                return Ok(Value::Object(Map::new()));
            };
            let output = match command::run(&platform::wireless_command(path)).await {
                Ok(output) => output,
                Err(err) if err.is_not_found() => {
                    debug!(path, "wireless diagnostic tool not installed");
                    return Ok(Value::Object(Map::new()));
                }
                Err(err) => return Err(err.into()),
            };
            Ok(Value::Object(parse_wireless(&output.lines())))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const AIRPORT: &str = "\
     agrCtlRSSI: -52
     agrExtRSSI: 0
    agrCtlNoise: -90
    agrExtNoise: 0
          state: running
        op mode: station
     lastTxRate: 573
        maxRate: 867
           BSSID: a0:b1:c2:d3:e4:f5
            SSID: HomeNet
             MCS: 7
         channel: 149,80
";

    #[test]
    fn key_values_and_snr() {
        let lines: Vec<&str> = AIRPORT.lines().collect();
        let parsed = parse_wireless(&lines);
        assert_eq!(parsed["SSID"], "HomeNet");
        assert_eq!(parsed["channel"], "149,80");
        assert_eq!(parsed["BSSID"], "a0:b1:c2:d3:e4:f5");
        assert_eq!(parsed["SNR"], json!(38));
        // "op mode" has a space in the key and is skipped.
        assert!(!parsed.contains_key("op mode"));
    }

    #[test]
    fn no_snr_without_noise() {
        let parsed = parse_wireless(&["agrCtlRSSI: -60", "AirPort: Off"]);
        assert!(!parsed.contains_key("SNR"));
        assert_eq!(parsed["AirPort"], "Off");
    }

    #[test]
    fn unparsable_levels_are_left_alone() {
        let parsed = parse_wireless(&["agrCtlRSSI: n/a", "agrCtlNoise: -90"]);
        assert!(!parsed.contains_key("SNR"));
    }

    #[tokio::test]
    async fn missing_tool_reports_nothing() {
        let mut config = Config::default();
        config.paths.wireless = Some("/nonexistent/sysprobe-airport".to_string());
        let value = WifiProbe.collect(&config).await.unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn unconfigured_tool_reports_nothing() {
        let mut config = Config::default();
        config.paths.wireless = None;
        assert_eq!(WifiProbe.collect(&config).await.unwrap(), json!({}));
    }
}
