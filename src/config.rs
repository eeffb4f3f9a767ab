use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://qaapi.gullyball.com";
pub const DEFAULT_COUNTRY_CODE: &str = "+91";
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime settings shared by the HTTP clients and the playback viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub device_id: String,
    pub platform: String,
    pub country_code: String,
    pub frame_rate: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            device_id: "d3".to_string(),
            platform: "android".to_string(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(base_url) = non_empty("DRSVIEW_BASE_URL") {
            config.base_url = normalize_base_url(&base_url);
        }
        if let Some(secs) = non_empty("DRSVIEW_TIMEOUT_SECS").and_then(|raw| raw.parse().ok()) {
            config.set_timeout_secs(secs);
        }
        if let Some(device_id) = non_empty("DRSVIEW_DEVICE_ID") {
            config.device_id = device_id;
        }
        if let Some(platform) = non_empty("DRSVIEW_PLATFORM") {
            config.platform = platform;
        }
        if let Some(country_code) = non_empty("DRSVIEW_COUNTRY_CODE") {
            config.country_code = normalize_country_code(&country_code);
        }
        if let Some(rate) = non_empty("DRSVIEW_FRAME_RATE").and_then(|raw| raw.parse().ok()) {
            config.set_frame_rate(rate);
        }
        config
    }

    pub fn with_overrides(
        mut self,
        base_url: Option<&str>,
        timeout_secs: Option<u64>,
        frame_rate: Option<f64>,
    ) -> Self {
        if let Some(base_url) = base_url.map(str::trim).filter(|url| !url.is_empty()) {
            self.base_url = normalize_base_url(base_url);
        }
        if let Some(secs) = timeout_secs {
            self.set_timeout_secs(secs);
        }
        if let Some(rate) = frame_rate {
            self.set_frame_rate(rate);
        }
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn set_timeout_secs(&mut self, secs: u64) {
        if secs == 0 {
            return;
        }
        self.read_timeout = Duration::from_secs(secs);
        self.connect_timeout = DEFAULT_CONNECT_TIMEOUT.min(self.read_timeout);
    }

    fn set_frame_rate(&mut self, rate: f64) {
        if rate.is_finite() && rate > 0.0 {
            self.frame_rate = rate;
        }
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn normalize_country_code(raw: &str) -> String {
    let digits = raw.trim().trim_start_matches('+');
    format!("+{digits}")
}
