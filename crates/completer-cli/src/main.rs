// completer CLI entry point

use completer_cli::router::CommandRouter;

#[tokio::main]
async fn main() {
    if let Err(e) = CommandRouter::route().await {
        eprintln!("error: {}", e.user_message());
        tracing::debug!(details = %e.technical_details(), "Command failed");
        std::process::exit(1);
    }
}
