use std::collections::BTreeMap;
use std::path::PathBuf;

const MOEX_RATE_URL: &str = "https://www.moex.com/ru/derivatives/currency-rate.aspx";

/// Maps a currency symbol (e.g. "USD") to the page listing its daily rates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyEndpoints {
    urls: BTreeMap<String, String>,
}

impl CurrencyEndpoints {
    /// Empty table, useful when every endpoint is supplied by the caller
    pub fn new() -> Self {
        Self {
            urls: BTreeMap::new(),
        }
    }

    /// Register (or replace) the URL for a symbol
    pub fn with(mut self, symbol: impl Into<String>, url: impl Into<String>) -> Self {
        self.urls.insert(symbol.into(), url.into());
        self
    }

    pub fn url_for(&self, symbol: &str) -> Option<&str> {
        self.urls.get(symbol).map(String::as_str)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.urls.keys().map(String::as_str)
    }
}

impl Default for CurrencyEndpoints {
    /// MOEX fixing pages for USD/RUB and EUR/RUB
    fn default() -> Self {
        Self::new()
            .with("USD", format!("{MOEX_RATE_URL}?currency=USD_RUB"))
            .with("EUR", format!("{MOEX_RATE_URL}?currency=EUR_RUB"))
    }
}

/// Mail relay reached over implicit TLS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub host: String,
    pub port: u16,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 465,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub first_currency: String,
    pub second_currency: String,
    pub base_filename: String,
    pub output_dir: Option<PathBuf>,
    pub endpoints: CurrencyEndpoints,
    pub mail: MailSettings,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            first_currency: "USD".to_string(),
            second_currency: "EUR".to_string(),
            base_filename: "courses".to_string(),
            output_dir: None,
            endpoints: CurrencyEndpoints::default(),
            mail: MailSettings::default(),
        }
    }
}
