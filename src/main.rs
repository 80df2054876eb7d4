use chrono::Local;
use geipan_scrap::{info_time, process::crawl_site, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();
    crawl_site().await?;
    info_time!(start_time, "Full crawl time:");

    Ok(())
}
