// Open-Elevation resolver - HTTP lookup of ground elevations for trace coordinates
use crate::application::elevation_resolver::ElevationResolver;
use crate::domain::trace::RawCoordinate;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OpenElevationResolver {
    client: reqwest::Client,
    base_url: String,
    batch_size: usize,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    #[allow(dead_code)]
    latitude: f64,
    #[allow(dead_code)]
    longitude: f64,
    elevation: f64,
}

impl OpenElevationResolver {
    pub fn new(base_url: String, timeout: Duration, batch_size: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build elevation HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            batch_size: batch_size.max(1),
        })
    }

    fn build_lookup_url(&self, batch: &[RawCoordinate]) -> String {
        let locations = batch
            .iter()
            .map(|c| format!("{},{}", c.latitude, c.longitude))
            .collect::<Vec<_>>()
            .join("|");
        format!(
            "{}/api/v1/lookup?locations={}",
            self.base_url,
            urlencoding::encode(&locations)
        )
    }

    async fn lookup_batch(&self, batch: &[RawCoordinate]) -> Result<Vec<f64>> {
        let url = self.build_lookup_url(batch);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to elevation service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Elevation lookup failed with status {}: {}", status, body);
        }

        let data = response
            .json::<LookupResponse>()
            .await
            .context("Failed to parse elevation service response")?;

        if data.results.len() != batch.len() {
            anyhow::bail!(
                "Elevation service returned {} results for {} locations",
                data.results.len(),
                batch.len()
            );
        }

        Ok(data.results.into_iter().map(|r| r.elevation).collect())
    }
}

#[async_trait]
impl ElevationResolver for OpenElevationResolver {
    async fn get_elevations(&self, coordinates: &[RawCoordinate]) -> Result<Vec<f64>> {
        let mut elevations = Vec::with_capacity(coordinates.len());

        for (i, batch) in coordinates.chunks(self.batch_size).enumerate() {
            tracing::debug!("Looking up elevation batch {} ({} locations)", i, batch.len());
            elevations.extend(self.lookup_batch(batch).await?);
        }

        Ok(elevations)
    }
}
