use std::sync::Arc;

use relay_http::{MemoryTokenStore, RelayClient, RequestOptions};

fn load_live_base_url() -> Result<String, String> {
    let base_url = std::env::var("RELAY_LIVE_BASE_URL")
        .map_err(|_| "RELAY_LIVE_BASE_URL env is required".to_owned())?;
    if base_url.trim().is_empty() {
        return Err("RELAY_LIVE_BASE_URL is set but empty".to_owned());
    }
    Ok(base_url)
}

#[tokio::test]
async fn live_roundtrip_with_retries_and_cache() {
    let base_url = match load_live_base_url() {
        Ok(value) => value,
        Err(_) => {
            eprintln!("skipping live test: RELAY_LIVE_BASE_URL not set");
            return;
        }
    };

    let client =
        RelayClient::new(base_url).with_token_store(Arc::new(MemoryTokenStore::new()));

    let first = client
        .get("/", RequestOptions::new().retries(1).cached())
        .await
        .expect("live request must succeed");
    assert!(first.is_success());

    let second = client
        .get("/", RequestOptions::new().cached())
        .await
        .expect("cached live request must succeed");
    assert_eq!(first.body, second.body);
}
