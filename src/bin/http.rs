#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use log::info;
    use study_planner::{ActivityLog, Planner, PlannerConfig, http_api};

    env_logger::init();

    let addr: SocketAddr = std::env::var("STUDY_PLANNER_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let config = PlannerConfig::from_env()?;
    let planner = Planner::builder()
        .config(config)
        .listener(ActivityLog::new())
        .build();

    info!("study-planner HTTP API listening on http://{addr}");
    println!("study-planner HTTP API listening on http://{addr}");
    http_api::serve(addr, planner).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
