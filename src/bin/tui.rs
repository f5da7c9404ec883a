#[tokio::main]
async fn main() -> anyhow::Result<()> {
    normscount::tui::run().await
}
