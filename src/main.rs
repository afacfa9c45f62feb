// src/main.rs
//! `sentinel`: one discovery run per invocation. Schedule it with cron or a
//! systemd timer.

mod cli;

#[tokio::main]
async fn main() {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    internship_sentinel::telemetry::init();

    if let Err(err) = cli::run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
