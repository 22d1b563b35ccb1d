#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sqldeck::run().await
}
