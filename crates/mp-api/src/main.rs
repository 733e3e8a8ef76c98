#[tokio::main]
async fn main() {
    if let Err(err) = mp_api::run().await {
        tracing::error!(error = %err, "mp-api failed");
        std::process::exit(1);
    }
}
