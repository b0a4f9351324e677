use scraper::{Html, Selector};
use tracing::{debug, error, instrument};

use crate::config::CurrencyEndpoints;
use crate::fetch_error::FetchError;

/// Downloads a currency's rate page and flattens its table cells.
#[derive(Clone)]
pub struct QuoteFetcher {
    client: reqwest::Client,
    endpoints: CurrencyEndpoints,
}

impl QuoteFetcher {
    pub fn new(endpoints: CurrencyEndpoints) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
        }
    }

    /// Fetch the raw cell stream for `symbol`.
    ///
    /// The returned tokens are in document order and are expected to repeat
    /// as `(date, unused, rate)` triples.
    #[instrument(skip(self))]
    pub async fn fetch_cells(&self, symbol: &str) -> Result<Vec<String>, FetchError> {
        let url = self
            .endpoints
            .url_for(symbol)
            .ok_or_else(|| FetchError::UnknownCurrency(symbol.to_string()))?;

        debug!("Sending HTTP request to {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!("Received HTTP response with status: {}", status);

        if !status.is_success() {
            error!("Rate page for {} answered {}", symbol, status);
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response.text().await?;
        debug!("Retrieved HTML content, size: {} bytes", html.len());

        let cells = parse_cells(&html);
        debug!("Extracted {} table cells for {}", cells.len(), symbol);
        Ok(cells)
    }
}

/// Collect the direct text nodes of every `td` inside a `tr`.
///
/// Nested markup (links, spans) is not descended into, and whitespace-only
/// nodes are dropped so the triple layout is not shifted by indentation.
#[instrument(skip(html), fields(html_size = html.len()))]
pub fn parse_cells(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let cell_selector = Selector::parse("tr td").unwrap();

    document
        .select(&cell_selector)
        .flat_map(|cell| {
            cell.children()
                .filter_map(|node| node.value().as_text())
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
        })
        .collect()
}
