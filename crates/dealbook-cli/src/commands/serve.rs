//! Server command implementation

use anyhow::Result;
use dealbook_core::Config;

pub async fn cmd_serve(
    config: Config,
    host: &str,
    port: u16,
    allowed_origins: Vec<String>,
) -> Result<()> {
    println!("🚀 Starting Dealbook web server...");
    println!("   Workbook: {}", config.export.workbook.display());
    println!("   Listening: http://{}:{}", host, port);
    if config.sources.is_empty() {
        println!("   ⚠️  No dashboard sources configured; /api/dashboard will return empty sections");
    } else {
        println!("   Dashboard sources: {}", config.sources.join(", "));
    }
    if !allowed_origins.is_empty() {
        println!("   CORS origins: {}", allowed_origins.join(", "));
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let server = dealbook_server::ServerConfig { allowed_origins };
    dealbook_server::serve_with_config(config, host, port, server).await?;

    Ok(())
}
