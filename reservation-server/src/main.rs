use reservation_server::auth::password::hash_password;
use reservation_server::{Config, Server, init_logger_with_file};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = dotenvy::dotenv();

    // `reservation-server hash-password <password>` prints an ADMIN_PASSWORD_HASH value
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("hash-password") {
        let Some(password) = args.get(2) else {
            eprintln!("usage: reservation-server hash-password <password>");
            std::process::exit(2);
        };
        let hash = hash_password(password).map_err(|e| format!("hashing failed: {e}"))?;
        println!("{hash}");
        return Ok(());
    }

    let config = Config::from_env()?;
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!("Starting reservation-server (env: {})", config.environment);

    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {e}");
        return Err(e);
    }

    Ok(())
}
