use scraper::{Html, Selector};
use url::Url;

use crate::models::LinkPreview;

/// Where a field value may come from, tried in table order.
#[derive(Debug, Clone, Copy)]
enum MetaSource {
    /// `<meta property="..." content="...">`, as used by Open Graph.
    Property(&'static str),
    /// `<meta name="..." content="...">`, as used by Twitter Cards.
    Name(&'static str),
    /// Text of the document `<title>`.
    TitleTag,
}

use MetaSource::{Name, Property, TitleTag};

const TITLE_SOURCES: &[MetaSource] = &[Property("og:title"), Name("twitter:title"), TitleTag];

const DESCRIPTION_SOURCES: &[MetaSource] = &[
    Property("og:description"),
    Name("twitter:description"),
    Name("description"),
];

const IMAGE_SOURCES: &[MetaSource] = &[
    Property("og:image"),
    Name("twitter:image"),
    Name("twitter:image:src"),
];

const SITE_NAME_SOURCES: &[MetaSource] = &[Property("og:site_name")];

/// Parse `html` fetched from `page_url` into a preview record.
///
/// Missing or malformed markup never fails; unresolved fields are left empty.
/// The site name falls back to the page's hostname.
pub fn extract_og_data(html: &str, page_url: &Url) -> LinkPreview {
    let document = Html::parse_document(html);

    let title = resolve(&document, TITLE_SOURCES).unwrap_or_default();
    let description = resolve(&document, DESCRIPTION_SOURCES).unwrap_or_default();
    let image = resolve(&document, IMAGE_SOURCES)
        .map(|image| absolutize_image(&image, page_url))
        .unwrap_or_default();
    let site_name = resolve(&document, SITE_NAME_SOURCES)
        .or_else(|| page_url.host_str().map(str::to_string))
        .unwrap_or_default();

    LinkPreview {
        url: page_url.to_string(),
        title,
        description,
        image,
        site_name,
    }
}

/// First non-empty trimmed value among `sources`.
fn resolve(doc: &Html, sources: &[MetaSource]) -> Option<String> {
    sources.iter().find_map(|source| lookup(doc, *source))
}

fn lookup(doc: &Html, source: MetaSource) -> Option<String> {
    match source {
        Property(property) => meta_content(doc, &format!(r#"meta[property="{property}"]"#)),
        Name(name) => meta_content(doc, &format!(r#"meta[name="{name}"]"#)),
        TitleTag => {
            let selector = Selector::parse("title").ok()?;
            doc.select(&selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|s| !s.is_empty())
        }
    }
}

/// Trimmed `content` of the first `<meta>` matching `selector`, if non-empty.
fn meta_content(doc: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve a relative image reference against the page's origin.
///
/// Values that already parse as absolute URLs are returned unchanged. When
/// resolution fails the original value is kept rather than dropped.
pub fn absolutize_image(image: &str, page_url: &Url) -> String {
    if image.is_empty() || Url::parse(image).is_ok() {
        return image.to_string();
    }

    let resolved = Url::parse(&page_url.origin().ascii_serialization())
        .and_then(|origin| origin.join(image));

    match resolved {
        Ok(absolute) => absolute.to_string(),
        Err(e) => {
            tracing::debug!(error = %e, image = %image, "Keeping unresolvable preview image");
            image.to_string()
        }
    }
}
