use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    gcode_cleaner::cli::run().await
}
