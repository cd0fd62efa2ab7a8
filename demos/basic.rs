use relay_http::{RelayClient, RequestOptions};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = RelayClient::from_env().map_err(anyhow::Error::msg)?;

    let created = client
        .post(
            "/users",
            json!({"name": "Kit"}),
            RequestOptions::new().retries(1),
        )
        .await?;
    println!("created: {}", created.body);

    let user = client
        .get("/users/1", RequestOptions::new().timeout(2_000))
        .await?;
    println!("fetched: {}", user.body);

    Ok(())
}
