use chrono::Local;
use reqwest::{Client, StatusCode};
use tokio::{fs::File, io::AsyncWriteExt};

use crate::model::{Case, Testimony};
use crate::{info_time, parse, request};
use crate::{Result, DISCARD_ON_ROLLOVER, EMPTY_MARKER, FILE_PREFIX, FLUSH_THRESHOLD};

/// Crawls the whole case search, page 0 onwards, until a listing comes
/// back empty or with a non-200 status.
pub async fn crawl_site() -> Result<()> {
    let client = Client::new();
    let mut batcher = Batcher::new();

    let mut page = 0_usize;
    let mut status = StatusCode::OK;
    let mut is_empty = false;

    loop {
        match crawl_page(&client, page, &mut batcher).await {
            Ok(listing) => {
                status = listing.status;
                is_empty = listing.is_empty;
            }
            // A failed page is logged and skipped; the termination
            // variables keep their last-seen values.
            Err(err) => info_time!("page {} failed: {}", page, err),
        }
        page += 1;

        if status != StatusCode::OK || is_empty {
            break;
        }
    }

    Ok(())
}

struct ListingOutcome {
    status: StatusCode,
    is_empty: bool,
}

/// One iteration of the crawl: fetch a listing page, extract every case
/// on it, and rewrite the current batch file.
async fn crawl_page(client: &Client, page: usize, batcher: &mut Batcher) -> Result<ListingOutcome> {
    let res = request::fetch_listing(client, page).await?;
    let status = res.status();
    let listing_url = res.url().to_string();
    info_time!("{} {}", listing_url, status);

    let body = res.text().await?;
    let is_empty = body.contains(EMPTY_MARKER);

    if !is_empty {
        let links = parse::parse_listing_page(body.into()).await?;

        let mut handles = Vec::with_capacity(links.len());
        for link in links {
            handles.push(tokio::spawn({
                // Client uses Arc so we can clone cheaply
                let client = client.clone();

                async move { build_case(client, link).await }
            }));
        }

        // Join in request order; the first failure abandons the whole
        // page and surfaces at the loop above.
        let mut cases = Vec::with_capacity(handles.len());
        for handle in handles {
            cases.push(handle.await??);
        }

        batcher.extend(cases);
        info_time!("{} [DONE]", listing_url);
    }

    if let Some((index, outgoing)) = batcher.rollover(DISCARD_ON_ROLLOVER) {
        write_batch(index, &outgoing).await?;
    }
    write_batch(batcher.index(), batcher.cases()).await?;

    Ok(ListingOutcome { status, is_empty })
}

/// Fetches one case detail page and assembles its record, following every
/// testimony link it carries.
async fn build_case(client: Client, url: String) -> Result<Case> {
    let body = request::fetch_page(&client, &url).await?;
    let parsed = parse::parse_case_page(body.into(), url).await?;

    let mut handles = Vec::with_capacity(parsed.testimony_links.len());
    for link in &parsed.testimony_links {
        handles.push(tokio::spawn({
            let client = client.clone();
            let link = link.clone();

            async move { build_testimony(client, link).await }
        }));
    }

    let mut testimonials = Vec::with_capacity(handles.len());
    for handle in handles {
        testimonials.push(handle.await??);
    }

    Ok(parsed.into_case(testimonials))
}

async fn build_testimony(client: Client, url: String) -> Result<Testimony> {
    let body = request::fetch_page(&client, &url).await?;
    parse::parse_testimony_page(body.into(), url).await
}

/// In-memory accumulation of cases between batch-file rollovers. Owned by
/// the crawl loop and only touched between suspension points.
struct Batcher {
    cases: Vec<Case>,
    index: usize,
}

impl Batcher {
    fn new() -> Self {
        Batcher {
            cases: Vec::new(),
            index: 0,
        }
    }

    fn extend(&mut self, page: Vec<Case>) {
        self.cases.extend(page);
    }

    fn index(&self) -> usize {
        self.index
    }

    fn cases(&self) -> &[Case] {
        &self.cases
    }

    /// Advances to the next batch file once the accumulator crosses the
    /// threshold. Returns the outgoing batch and its file index so the
    /// caller can flush it; with `discard` set the outgoing batch is
    /// dropped instead (the legacy behavior).
    fn rollover(&mut self, discard: bool) -> Option<(usize, Vec<Case>)> {
        if self.cases.len() <= FLUSH_THRESHOLD {
            return None;
        }

        let outgoing = std::mem::take(&mut self.cases);
        let outgoing_index = self.index;
        self.index += 1;

        if discard {
            None
        } else {
            Some((outgoing_index, outgoing))
        }
    }
}

/// Serializes a batch and rewrites its numbered output file.
async fn write_batch(index: usize, cases: &[Case]) -> Result<()> {
    let json = serde_json::to_vec(cases)?;
    let mut file = File::create(format!("{FILE_PREFIX}{index}.json")).await?;
    file.write_all(&json).await?;

    Ok(())
}
