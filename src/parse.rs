use std::sync::Arc;

use chrono::Local;
use scraper::{ElementRef, Html, Selector};
use tokio::task::spawn_blocking;

use crate::model::{Case, Classification, DocumentLink, Gender, Location, Testimony};
use crate::{warn_time, Error, Result, BASE_URL, SIDEBAR_BLOCKS};

/// A case detail page parsed up to its testimony fetches: every field
/// that can be read without further IO, plus the links still to follow.
pub(crate) struct ParsedCase {
    case: Case,
    /// Absolute URLs of the testimony pages linked from this case.
    pub(crate) testimony_links: Vec<String>,
}

impl ParsedCase {
    pub(crate) fn into_case(self, testimonials: Vec<Testimony>) -> Case {
        Case {
            testimonials,
            ..self.case
        }
    }
}

/// Extracts the case detail URLs from a listing page.
pub(crate) async fn parse_listing_page(html: Arc<String>) -> Result<Vec<String>> {
    let links = spawn_blocking(move || -> Result<Vec<String>> {
        let doc = Html::parse_document(&html);
        listing_links(&doc)
    })
    .await??;

    Ok(links)
}

/// Extracts a case record from a detail page, minus its testimonials.
pub(crate) async fn parse_case_page(html: Arc<String>, url: String) -> Result<ParsedCase> {
    let parsed = spawn_blocking(move || -> Result<ParsedCase> {
        let doc = Html::parse_document(&html);
        case_fields(&doc, &url)
    })
    .await??;

    Ok(parsed)
}

/// Extracts a testimony record from a testimony page.
pub(crate) async fn parse_testimony_page(html: Arc<String>, url: String) -> Result<Testimony> {
    let testimony = spawn_blocking(move || -> Result<Testimony> {
        let doc = Html::parse_document(&html);
        testimony_fields(&doc, &url)
    })
    .await??;

    Ok(testimony)
}

/// Case anchors on a listing page. Entries without an `href` and the
/// search's pagination self-links are dropped, the rest are made absolute.
fn listing_links(doc: &Html) -> Result<Vec<String>> {
    let anchors = create_selector(".custom-link-to > a")?;

    Ok(doc
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| !href.contains("recherche"))
        .map(|href| format!("{BASE_URL}{href}"))
        .collect())
}

fn case_fields(doc: &Html, url: &str) -> Result<ParsedCase> {
    let title = first_text(doc, &create_selector(".cas__title > h2")?);
    let short_description = first_text(doc, &create_selector(".cas__chapo .field-value")?);
    let description = first_text(doc, &create_selector(".cas__body .field-value")?);

    // The sidebar is a strict positional contract: no field names in the
    // markup, fields are whatever renders at each index.
    let sidebar_sel = create_selector(".sidebar-bloc .one_info-data")?;
    let sidebar: Vec<String> = doc.select(&sidebar_sel).map(element_text).collect();
    if sidebar.len() != SIDEBAR_BLOCKS {
        warn_time!(
            "sidebar rendered {} info blocks, expected {}; positional fields may shift",
            sidebar.len(),
            SIDEBAR_BLOCKS
        );
    }

    let mut documents = anchor_links(doc, &create_selector(".documents a")?);
    let attached = anchor_links(doc, &create_selector(".temoignages a")?);

    // Only links matching the testimony URL pattern get fetched; the rest
    // of the container is treated as ordinary documents.
    let (testimony_links, plain): (Vec<_>, Vec<_>) = attached.into_iter().partition(|entry| {
        entry
            .link
            .as_deref()
            .is_some_and(|href| href.contains("temoignage"))
    });
    documents.extend(plain);

    let testimony_links = testimony_links
        .into_iter()
        .filter_map(|entry| entry.link)
        .map(|href| format!("{BASE_URL}{href}"))
        .collect();

    let case = Case {
        geipan_id: trailing_segment(url),
        title,
        short_description,
        description,
        observation_at: sidebar_field(&sidebar, 0),
        region: sidebar_field(&sidebar, 1),
        department: sidebar_field(&sidebar, 2),
        classification: sidebar.get(3).and_then(|s| Classification::from_site(s)),
        modified_at: sidebar_field(&sidebar, 4),
        type_event: sidebar_field(&sidebar, 5),
        strange: sidebar.get(6).and_then(|s| float_prefix(s)).unwrap_or(0.0),
        consistance: sidebar.get(7).and_then(|s| float_prefix(s)).unwrap_or(0.0),
        documents,
        testimonials: Vec::new(),
    };

    Ok(ParsedCase {
        case,
        testimony_links,
    })
}

fn testimony_fields(doc: &Html, url: &str) -> Result<Testimony> {
    // Every testimony field is one `.field__item` under its own named
    // container, no positional dependency.
    let item = |name: &str| -> Result<Option<String>> {
        let sel = create_selector(&format!(".field--name-field-{name} .field__item"))?;
        Ok(first_text(doc, &sel))
    };

    Ok(Testimony {
        geipan_id: trailing_segment(url),
        cas_title: first_text(doc, &create_selector(".cas__title > h2")?),
        observation_at: item("date-d-observation-tem")?,
        age: item("age-wysiwyg")?.as_deref().and_then(int_prefix),
        gender: item("genre-wysiwyg")?.as_deref().and_then(Gender::from_site),
        environment: item("env-sol-wysiwyg")?,
        local_time: item("date-heure-locale-wysiwyg")?,
        environment2: item("cadre-ref-wysiwyg")?,
        distance_event_witness: item("distance-temoin-wysiwyg")?,
        location: Location {
            observation_type: item("nature-wysiwyg")?,
            specificity_observation: item("caracteristique-wysiwyg")?,
            shape: item("forme-wysiwyg")?,
            color: item("couleur-wysiwyg")?,
            size: item("taille-wysiwyg")?,
            number_event: item("nombre-phenomene-wysiwyg")?,
        },
    })
}

/// Trimmed text of the first element matching `sel`, if any.
fn first_text(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel).next().map(element_text)
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// All anchors matching `sel` as `{name, link}` pairs; `link` is the raw
/// `href`, kept relative.
fn anchor_links(doc: &Html, sel: &Selector) -> Vec<DocumentLink> {
    doc.select(sel)
        .map(|a| DocumentLink {
            name: element_text(a),
            link: a.value().attr("href").map(str::to_string),
        })
        .collect()
}

fn sidebar_field(blocks: &[String], index: usize) -> Option<String> {
    blocks.get(index).cloned()
}

/// Last `/`-delimited segment of a URL, the site's record id.
fn trailing_segment(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

/// Leading-digit integer parse, the way the site renders "52 ans".
fn int_prefix(s: &str) -> Option<u32> {
    let t = s.trim();
    let end = t
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(t.len());
    t[..end].parse().ok()
}

/// Leading-float parse, the way the site renders scores like "3.5/5".
fn float_prefix(s: &str) -> Option<f64> {
    let t = s.trim();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in t.char_indices() {
        match c {
            '0'..='9' => end = i + 1,
            '.' if !seen_dot => {
                seen_dot = true;
                end = i + 1;
            }
            _ => break,
        }
    }
    t[..end].parse().ok()
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseMissingSelector(sel_str.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> Html {
        let html = std::fs::read_to_string(format!("tests/fixtures/{name}.html")).unwrap();
        Html::parse_document(&html)
    }

    #[test]
    fn listing_keeps_case_links_only() {
        let doc = fixture("listing");
        let links = listing_links(&doc).unwrap();
        assert_eq!(
            links,
            vec![
                format!("{BASE_URL}/fr/cas/2009-03-02198"),
                format!("{BASE_URL}/fr/cas/1981-01-04123"),
            ]
        );
    }

    #[test]
    fn case_fields_read_the_sidebar_by_position() {
        let doc = fixture("cas");
        let parsed = case_fields(&doc, "https://www.cnes-geipan.fr/fr/cas/1981-01-04123").unwrap();

        let case = parsed.case;
        assert_eq!(case.geipan_id, "1981-01-04123");
        assert_eq!(case.title.as_deref(), Some("QUIMPER (29) 04.01.1981"));
        assert!(case
            .short_description
            .as_deref()
            .is_some_and(|s| s.starts_with("Observation d'un phénomène")));
        assert_eq!(case.observation_at.as_deref(), Some("2020-01-01"));
        assert_eq!(case.region.as_deref(), Some("Bretagne"));
        assert_eq!(case.department.as_deref(), Some("29"));
        assert_eq!(case.classification, Some(Classification::B));
        assert_eq!(case.modified_at.as_deref(), Some("2021-01-01"));
        assert_eq!(case.type_event.as_deref(), Some("type1"));
        assert_eq!(case.strange, 3.5);
        // The eighth block isn't numeric, the score falls back to 0.
        assert_eq!(case.consistance, 0.0);
    }

    #[test]
    fn non_testimony_links_merge_into_documents() {
        let doc = fixture("cas");
        let parsed = case_fields(&doc, "https://www.cnes-geipan.fr/fr/cas/1981-01-04123").unwrap();

        assert_eq!(
            parsed.testimony_links,
            vec![format!("{BASE_URL}/fr/temoignage/1981-01-04123_t1")]
        );

        let names: Vec<_> = parsed
            .case
            .documents
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "Compte rendu d'enquête",
                "Procès verbal de gendarmerie",
                "Questionnaire témoin",
            ]
        );
        // Attached documents keep their raw relative hrefs.
        assert_eq!(
            parsed.case.documents[0].link.as_deref(),
            Some("/sites/default/files/cr_enquete.pdf")
        );
    }

    #[test]
    fn testimony_reads_all_field_items() {
        let doc = fixture("temoignage");
        let tem = testimony_fields(
            &doc,
            "https://www.cnes-geipan.fr/fr/temoignage/1981-01-04123_t1",
        )
        .unwrap();

        assert_eq!(tem.geipan_id, "1981-01-04123_t1");
        assert_eq!(tem.cas_title.as_deref(), Some("QUIMPER (29) 04.01.1981"));
        assert_eq!(tem.observation_at.as_deref(), Some("04-01-1981"));
        assert_eq!(tem.age, Some(52));
        assert_eq!(tem.gender, Some(Gender::H));
        assert_eq!(tem.environment.as_deref(), Some("Rural"));
        assert_eq!(tem.local_time.as_deref(), Some("20h45"));
        assert_eq!(tem.environment2.as_deref(), Some("Depuis un jardin"));
        assert_eq!(tem.distance_event_witness.as_deref(), Some("500 m"));
        assert_eq!(
            tem.location.observation_type.as_deref(),
            Some("Phénomène lumineux")
        );
        assert_eq!(
            tem.location.specificity_observation.as_deref(),
            Some("Trajectoire rectiligne")
        );
        assert_eq!(tem.location.shape.as_deref(), Some("Sphère"));
        assert_eq!(tem.location.color.as_deref(), Some("Orange"));
        assert_eq!(
            tem.location.size.as_deref(),
            Some("Taille apparente de la Lune")
        );
        assert_eq!(tem.location.number_event.as_deref(), Some("1"));
    }

    #[test]
    fn missing_age_stays_unset() {
        let doc = fixture("temoignage_minimal");
        let tem = testimony_fields(
            &doc,
            "https://www.cnes-geipan.fr/fr/temoignage/2004-07-07654_t2",
        )
        .unwrap();

        assert_eq!(tem.geipan_id, "2004-07-07654_t2");
        assert_eq!(tem.age, None);
        assert_eq!(tem.gender, None);
        assert_eq!(tem.observation_at.as_deref(), Some("12-07-2004"));
        assert_eq!(tem.location, Location::default());
    }

    #[test]
    fn numeric_prefixes_parse_like_the_site_renders_them() {
        assert_eq!(int_prefix("52 ans"), Some(52));
        assert_eq!(int_prefix("  52  "), Some(52));
        assert_eq!(int_prefix("ans"), None);
        assert_eq!(int_prefix(""), None);
        assert_eq!(float_prefix("3.5"), Some(3.5));
        assert_eq!(float_prefix("3.5/5"), Some(3.5));
        assert_eq!(float_prefix("not-a-number"), None);
        assert_eq!(float_prefix(""), None);
    }
}
