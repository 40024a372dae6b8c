#[tokio::main]
async fn main() -> cholan::error::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("cholan=info,serenity=warn"),
    )
    .init();
    log::info!("Starting Cholan AI Discord bot");

    match cholan::run().await {
        Ok(()) => {
            log::info!("Bot shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Bot encountered an error: {e}");
            Err(e)
        }
    }
}
