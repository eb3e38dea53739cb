use liftlink::app::App;
use liftlink::config::ClientConfig;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    tracing_subscriber::fmt::init();
    color_eyre::install()?;
    let config = ClientConfig::load_or_default("liftlink.yaml")?;
    let terminal = ratatui::init();
    let result = App::new(config).await?.run(terminal).await;
    ratatui::restore();
    result
}
