use anyhow::Result;
use geosearch::{Client, Location, Options, RequestContext};
use std::time::Duration;

fn main() -> Result<()> {
    // Example program that calls the library API.
    // Pass a base URL to use another Pelias instance.
    env_logger::init();
    let client = match std::env::args().nth(1) {
        Some(url) => Client::new(url)?,
        None => Client::planning_labs()?,
    };
    let ctx = RequestContext::background().with_timeout(Duration::from_secs(15));

    let found = client.reverse_geocode(
        &ctx,
        Location::new(40.7484, -73.9857),
        Options::with_size(1),
    )?;
    for feature in &found.features {
        let name = feature
            .property("name")
            .and_then(|v| v.as_str())
            .unwrap_or("(unnamed)");
        println!("{}", name);
    }

    let matches = client.search(&ctx, "120 Broadway", Options::default())?;
    println!("search returned {} feature(s)", matches.features.len());
    Ok(())
}
