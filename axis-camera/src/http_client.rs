use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

pub fn build(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("http client build failed")
}
