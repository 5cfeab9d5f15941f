use reqwest::Client;
use serde::Serialize;
use shopfront_core::config::AppConfig;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpstreamStatus {
    pub name: &'static str,
    pub url: String,
    pub status: &'static str,
    pub detail: String,
}

impl UpstreamStatus {
    pub fn is_reachable(&self) -> bool {
        self.status == "reachable"
    }
}

/// Checks that each upstream answers HTTP at all. Any status code counts as
/// reachable; only transport failures do not.
pub async fn probe_upstreams(client: &Client, config: &AppConfig) -> Vec<UpstreamStatus> {
    let targets = [
        ("catalog", config.catalog.base_url.as_str()),
        ("external_reviews", config.reviews.external_base_url.as_str()),
        ("mock_reviews", config.reviews.mock_base_url.as_str()),
    ];

    let mut statuses = Vec::with_capacity(targets.len());
    for (name, url) in targets {
        statuses.push(probe(client, name, url).await);
    }
    statuses
}

async fn probe(client: &Client, name: &'static str, url: &str) -> UpstreamStatus {
    match client.get(url).send().await {
        Ok(response) => UpstreamStatus {
            name,
            url: url.to_string(),
            status: "reachable",
            detail: format!("responded with {}", response.status().as_u16()),
        },
        Err(error) => UpstreamStatus {
            name,
            url: url.to_string(),
            status: "unreachable",
            detail: format!("request failed: {error}"),
        },
    }
}
