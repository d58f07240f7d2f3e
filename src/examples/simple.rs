//! Simple example of using reqwest-proxy-rotator.
//!
//! Pass proxy URLs as arguments:
//!
//! ```text
//! cargo run --example simple -- socks5://127.0.0.1:1080 http://127.0.0.1:8080
//! ```

use reqwest_proxy_rotator::{ProxyRotator, RotatorConfig};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let proxies: Vec<String> = std::env::args().skip(1).collect();
    if proxies.is_empty() {
        eprintln!("usage: simple <proxy-url> [<proxy-url>...]");
        std::process::exit(1);
    }

    println!("Probing {} proxies...", proxies.len());

    let config = RotatorConfig::builder()
        .proxies(proxies)
        // pair each proxy with a cookie file to persist sessions, e.g.
        // .cookie_groups(vec!["cookies/a.json", "cookies/b.json"])
        .timeout(Duration::from_secs(15))
        .probe_url("https://httpbin.org/ip")
        .probe_timeout(Duration::from_secs(5))
        .shuffle(true)
        .build();

    let rotator = ProxyRotator::new(config).await?;
    println!("{} usable", rotator.len());
    for excluded in rotator.excluded_endpoints() {
        println!("excluded {}: {}", excluded.url, excluded.detail);
    }

    for _ in 0..rotator.len() {
        let entry = rotator.next();
        println!("Requesting via {}...", entry.proxy_url());
        let response = entry.client().get("https://httpbin.org/ip").send().await?;
        let status = response.status();
        let body = response.text().await?;
        println!("  {}: {}", status, body.trim());
    }

    let health = rotator.health_check_all().await;
    for (url, usable) in &health {
        println!("{} usable={}", url, usable);
    }

    rotator.save_all_cookies()?;
    Ok(())
}
