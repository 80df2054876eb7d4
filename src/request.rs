use reqwest::{header::CONTENT_TYPE, Client, Response};

use crate::{Result, PAGINATION_URL};

/// Requests one listing page of the case search. Returns the whole
/// `Response` so the caller can read the status code before the body.
pub(crate) async fn fetch_listing(client: &Client, page: usize) -> Result<Response> {
    let res = client
        .get(format!("{PAGINATION_URL}page={page}"))
        .header(CONTENT_TYPE, "text/html")
        .send()
        .await?;
    Ok(res)
}

/// Requests a case or testimony page and returns a `Result<String>`
/// containing the HTML.
pub(crate) async fn fetch_page(client: &Client, url: &str) -> Result<String> {
    let res = client.get(url).send().await?;
    let html = res.text().await?;
    Ok(html)
}
