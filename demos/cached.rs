use std::time::Instant;

use relay_http::{RelayClient, RequestOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = RelayClient::from_env().map_err(anyhow::Error::msg)?;

    let started = Instant::now();
    let first = client.get("/users/1", RequestOptions::new().cached()).await?;
    println!("network: {} in {:?}", first.status, started.elapsed());

    let started = Instant::now();
    let second = client.get("/users/1", RequestOptions::new().cached()).await?;
    println!("cache:   {} in {:?}", second.status, started.elapsed());

    assert_eq!(first.body, second.body);
    Ok(())
}
