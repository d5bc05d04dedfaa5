//! Amazon product page extraction.
//!
//! Works on static HTML. Each field is looked up independently; a field
//! that cannot be found keeps its default from [`ProductDetails::empty`].

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::types::{ProductDetails, NOT_AVAILABLE};
use crate::error::CrawlError;
use crate::utils::truncate_chars;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

const PRICE_SELECTORS: &[&str] = &[
    "span.a-price span[aria-hidden='true']",
    "span.a-price span.a-offscreen",
    "#priceblock_ourprice",
    "#priceblock_dealprice",
    ".priceToPay span.a-price-whole",
    ".apexPriceToPay span[aria-hidden='true']",
];

const SELLER_SELECTORS: &[&str] = &[
    "#sellerProfileTriggerId",
    "#merchant-info a",
    "#tabular-buybox-container .tabular-buybox-text[tabular-attribute-name='Sold by'] a",
    "#bylineInfo",
];

const IMAGE_SELECTORS: &[&str] = &["#landingImage", "#imgBlkFront", "#main-image-container img"];

const FEATURE_PARENTS: &[&str] = &["#feature-bullets", "#productOverview_feature_div"];

const DESCRIPTION_SELECTORS: &[&str] = &[
    "#productDescription",
    "#aplus_feature_div",
    "#aplus",
    "#dpx-product-description_feature_div",
];

const SELLER_INFO_SECTION: &str = "#page-section-detail-seller-info";

/// Labels that start the address block on a seller profile page.
const SELLER_ADDRESS_LABELS: &[&str] = &["business address", "geschäftsadresse", "地址"];

/// Labels whose values are not part of the address.
const SELLER_IGNORED_LABELS: &[&str] = &[
    "business name",
    "vat number",
    "trade register number",
    "customer service address",
    "phone",
    "email",
    "名称",
    "增值税",
    "电话",
];

const LISTING_DATE_LABELS: &[&str] = &["Date First Available", "上架时间"];

const BSR_LABELS: &[&str] = &["Best Sellers Rank", "亚马逊热销商品排名"];

static ASIN_IN_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(dp|gp/product)/([A-Z0-9]{10})").expect("valid regex"));
static ASIN_IN_SOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:ASIN\s*[:=]\s*|"ASIN"\s*:\s*)"([A-Z0-9]{10})""#).expect("valid regex")
});
static FIRST_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+\.\d+|\d+)").expect("valid regex"));
static REVIEW_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,3}(?:,\d{3})*|\d+)").expect("valid regex"));
static MONTHLY_SALES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,3}(?:,\d{3})*k\+|\d{1,3}(?:,\d{3})*|\d+)").expect("valid regex")
});
static BSR_RANK: Lazy<Regex> = Lazy::new(|| Regex::new(r"#([\d,]+)\s+in").expect("valid regex"));
static BSR_RANK_ZH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"商品里排第(\d+)名").expect("valid regex"));

/// Extract product details from a product page.
///
/// Fails with [`CrawlError::NoProductDetails`] when the page has neither a
/// title nor a product image.
pub fn extract_product_details(
    html: &str,
    product_url: &str,
    platform: &str,
) -> Result<ProductDetails, CrawlError> {
    let doc = Html::parse_document(html);
    let base = Url::parse(product_url).ok();
    let mut details = ProductDetails::empty(product_url, platform);

    if let Some(title) = first_text(&doc, "#productTitle") {
        details.product_title = title;
    }
    details.asin = extract_asin(&doc, html, product_url).unwrap_or_else(na);
    match extract_price(&doc) {
        Some(price) => details.price = price,
        None => warn!(url = %product_url, "Price not found"),
    }
    if let Some(rating) = first_text(&doc, "span.a-icon-alt")
        .and_then(|text| capture(&FIRST_NUMBER, &text, 1))
    {
        details.rating = rating;
    }
    if let Some(count) = first_text(&doc, "#acrCustomerReviewText")
        .and_then(|text| capture(&REVIEW_COUNT, &text, 1))
    {
        details.review_count = count.replace(',', "");
    }
    if let Some(sales) = first_text(&doc, "#social-proofing-faceout-title-tk_bought")
        .and_then(|text| capture(&MONTHLY_SALES, &text, 1))
    {
        details.monthly_sales = sales.replace(',', "").replace("k+", "000+");
    }
    if let Some(availability) =
        first_text(&doc, "#availability span").or_else(|| first_text(&doc, "#availability"))
    {
        details.availability = availability;
    }
    if let Some((seller, seller_url)) = extract_seller(&doc, base.as_ref()) {
        details.seller = seller;
        details.seller_url = seller_url.unwrap_or_else(na);
    }
    if let Some(image) = extract_image(&doc, base.as_ref()) {
        details.image_url = image;
    }
    if let Some(features) = extract_features(&doc) {
        details.features = features;
    }
    if let Some(description) = extract_description(&doc) {
        details.description = description;
    }
    match extract_brand(&doc) {
        Some(brand) => details.brand_name = brand,
        None => debug!(url = %product_url, "Brand name not found"),
    }
    if let Some(date) = LISTING_DATE_LABELS
        .iter()
        .find_map(|label| table_value(&doc, "th", |th| th.eq_ignore_ascii_case(label)))
    {
        details.listing_date = date;
    }
    if let Some(bsr) = extract_bsr_text(&doc) {
        details.bsr_top_category_rank = bsr_rank(&bsr).unwrap_or_else(na);
        details.bsr_rank_full_text = bsr;
    }

    if details.product_title == NOT_AVAILABLE && details.image_url == NOT_AVAILABLE {
        return Err(CrawlError::NoProductDetails {
            url: product_url.to_string(),
        });
    }

    Ok(details)
}

fn na() -> String {
    NOT_AVAILABLE.to_string()
}

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!(selector = css, error = %e, "Invalid selector");
            None
        }
    }
}

/// Whitespace-normalised text content of an element.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Text of the first element matching `css`, if non-empty.
fn first_text(doc: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    doc.select(&sel).next().map(|el| element_text(&el)).and_then(non_empty)
}

fn capture(re: &Regex, text: &str, group: usize) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(group))
        .map(|m| m.as_str().to_string())
}

/// Resolve a possibly relative link against the page URL.
fn absolute_url(base: Option<&Url>, href: &str) -> Option<String> {
    match Url::parse(href) {
        Ok(url) => Some(url.to_string()),
        Err(_) => base.and_then(|b| b.join(href).ok()).map(|u| u.to_string()),
    }
}

/// Text of the `td` cell following a header cell whose text satisfies `matches`.
fn table_value(doc: &Html, header_css: &str, matches: impl Fn(&str) -> bool) -> Option<String> {
    let sel = selector(header_css)?;
    doc.select(&sel)
        .filter(|th| matches(&element_text(th)))
        .find_map(|th| {
            th.next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|sib| sib.value().name() == "td")
                .map(|td| element_text(&td))
                .and_then(non_empty)
        })
}

fn extract_asin(doc: &Html, html: &str, product_url: &str) -> Option<String> {
    capture(&ASIN_IN_URL, product_url, 2)
        .or_else(|| table_value(doc, "th.prodDetSectionEntry", |th| th.contains("ASIN")))
        .or_else(|| capture(&ASIN_IN_SOURCE, html, 1))
}

fn extract_price(doc: &Html) -> Option<String> {
    for css in PRICE_SELECTORS {
        let Some(sel) = selector(css) else { continue };
        let Some(price) = doc
            .select(&sel)
            .map(|el| element_text(&el))
            .find(|text| !text.is_empty())
        else {
            continue;
        };

        if *css == ".priceToPay span.a-price-whole" {
            if let Some(fraction) = first_text(doc, ".priceToPay span.a-price-fraction") {
                return Some(format!("{}.{}", price.trim_end_matches('.'), fraction));
            }
        }
        return Some(price);
    }
    None
}

fn extract_seller(doc: &Html, base: Option<&Url>) -> Option<(String, Option<String>)> {
    SELLER_SELECTORS.iter().find_map(|css| {
        let sel = selector(css)?;
        let el = doc.select(&sel).next()?;
        let text = element_text(&el);
        if text.is_empty() || text.contains("Visit") || text.contains("Store") {
            return None;
        }
        let href = el
            .value()
            .attr("href")
            .and_then(|href| absolute_url(base, href))
            .filter(|url| url.starts_with("http"));
        Some((text, href))
    })
}

fn extract_image(doc: &Html, base: Option<&Url>) -> Option<String> {
    IMAGE_SELECTORS.iter().find_map(|css| {
        let sel = selector(css)?;
        let el = doc.select(&sel).next()?;
        let src = el
            .value()
            .attr("src")
            .filter(|s| !s.is_empty())
            .or_else(|| el.value().attr("data-src"))?;
        if src.starts_with("data:image") {
            return None;
        }
        absolute_url(base, src)
    })
}

fn extract_features(doc: &Html) -> Option<String> {
    let bullet = selector("li span.a-list-item")?;
    let mut features = Vec::new();

    for css in FEATURE_PARENTS {
        let Some(parent_sel) = selector(css) else { continue };
        let Some(parent) = doc.select(&parent_sel).next() else {
            continue;
        };
        features.extend(
            parent
                .select(&bullet)
                .map(|el| element_text(&el))
                .filter(|text| !text.is_empty()),
        );
    }

    if features.is_empty() {
        None
    } else {
        Some(features.join(" | "))
    }
}

fn extract_description(doc: &Html) -> Option<String> {
    let parts: Vec<String> = DESCRIPTION_SELECTORS
        .iter()
        .filter_map(|css| selector(css))
        .flat_map(|sel| {
            doc.select(&sel)
                .map(|el| element_text(&el))
                .collect::<Vec<_>>()
        })
        .filter(|text| !text.is_empty())
        .collect();

    if parts.is_empty() {
        return None;
    }
    Some(truncate_chars(parts.join(" ").trim(), MAX_DESCRIPTION_CHARS))
}

fn extract_brand(doc: &Html) -> Option<String> {
    if let Some(brand) = first_text(doc, "tr.po-brand > td.a-span9 > span.po-break-word") {
        return Some(brand);
    }

    let byline = first_text(doc, "#bylineInfo")?;
    if !(byline.contains("Visit the") || byline.contains("Brand:")) {
        return None;
    }
    let stripped = byline.replace("Visit the", "").replace("Brand:", "");
    let brand = stripped.trim().split(" Store").next().unwrap_or_default().trim();
    non_empty(brand.to_string())
}

fn extract_bsr_text(doc: &Html) -> Option<String> {
    let has_label = |text: &str| BSR_LABELS.iter().any(|label| text.contains(label));

    if let Some(text) = table_value(doc, "th", has_label) {
        return Some(text);
    }

    let items = selector(
        "#detailBullets_feature_div li, ul.detail-bullet-list li, #productDetails_detailBullets_sections1 li",
    )?;
    doc.select(&items)
        .map(|el| element_text(&el))
        .find(|text| has_label(text))
}

/// Whether `url` points at a seller profile page.
pub fn is_seller_profile(url: &str) -> bool {
    url.contains("/sp?")
}

/// Business address from a seller profile page.
///
/// Reads the leaf spans of the seller information section. Values under
/// the address label are joined into one line; values under other known
/// labels are dropped. Distinct lines are joined with `" | "`.
pub fn extract_seller_address(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let section = doc.select(&selector(SELLER_INFO_SECTION)?).next()?;
    let span = selector("span")?;

    let mut lines: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut skipping = false;

    let leaf_spans = section.select(&span).filter(|el| {
        !el.descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .any(|child| child.value().name() == "span")
    });
    for el in leaf_spans {
        let text = element_text(&el);
        let lower = text.to_lowercase();
        let is_address_label = SELLER_ADDRESS_LABELS.iter().any(|l| lower.contains(l));
        let is_ignored_label = SELLER_IGNORED_LABELS.iter().any(|l| lower.contains(l));

        if is_address_label || is_ignored_label {
            if !current.is_empty() {
                lines.push(current.join(" "));
                current.clear();
            }
            skipping = is_ignored_label && !is_address_label;
        } else if !text.is_empty() && !skipping {
            current.push(text);
        }
    }
    if !current.is_empty() {
        lines.push(current.join(" "));
    }

    let mut seen = HashSet::new();
    lines.retain(|line| seen.insert(line.clone()));
    non_empty(lines.join(" | "))
}

fn bsr_rank(text: &str) -> Option<String> {
    capture(&BSR_RANK, text, 1)
        .or_else(|| capture(&BSR_RANK_ZH, text, 1))
        .map(|rank| rank.replace(',', ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const URL: &str = "https://www.amazon.com/Datacolor-Spyder-Print/dp/B000I0DBH6/ref=sr_1_1";

    const PAGE: &str = r#"<!DOCTYPE html>
<html><body>
  <span id="productTitle">  Datacolor Spyder Print  </span>
  <a id="bylineInfo" href="/stores/Datacolor/page/1">Visit the Datacolor Store</a>
  <div class="priceToPay"><span class="a-price-whole">189.</span><span class="a-price-fraction">99</span></div>
  <span class="a-icon-alt">4.3 out of 5 stars</span>
  <span id="acrCustomerReviewText">1,234 ratings</span>
  <span id="social-proofing-faceout-title-tk_bought">1k+ bought in past month</span>
  <div id="availability"><span> In Stock </span></div>
  <div id="merchant-info">Ships from and sold by <a href="/gp/help/seller/at-a-glance.html?seller=A1">PhotoPro Supplies</a></div>
  <img id="landingImage" src="data:image/gif;base64,R0lGOD" data-src="https://m.media-amazon.com/images/I/spyder.jpg">
  <img id="imgBlkFront" src="https://m.media-amazon.com/images/I/front.jpg">
  <div id="feature-bullets"><ul>
    <li><span class="a-list-item"> Calibrates printers </span></li>
    <li><span class="a-list-item">Works with inkjet papers</span></li>
  </ul></div>
  <div id="productDescription"><p>Accurate color prints.</p></div>
  <table>
    <tr class="po-brand"><td class="a-span3">Brand</td><td class="a-span9"><span class="po-break-word">Datacolor</span></td></tr>
  </table>
  <table id="productDetails_detailBullets_sections1">
    <tr><th class="prodDetSectionEntry"> Date First Available </th><td> March 1, 2007 </td></tr>
    <tr><th class="prodDetSectionEntry">Best Sellers Rank</th><td><span>#1,234 in Electronics (See Top 100)</span></td></tr>
  </table>
</body></html>"#;

    #[test]
    fn extracts_every_field() {
        let details = extract_product_details(PAGE, URL, "Amazon").unwrap();

        assert_eq!(details.product_title, "Datacolor Spyder Print");
        assert_eq!(details.asin, "B000I0DBH6");
        assert_eq!(details.price, "189.99");
        assert_eq!(details.rating, "4.3");
        assert_eq!(details.review_count, "1234");
        assert_eq!(details.monthly_sales, "1000+");
        assert_eq!(details.availability, "In Stock");
        assert_eq!(details.seller, "PhotoPro Supplies");
        assert_eq!(
            details.seller_url,
            "https://www.amazon.com/gp/help/seller/at-a-glance.html?seller=A1"
        );
        // The landing image only has a placeholder `src`.
        assert_eq!(details.image_url, "https://m.media-amazon.com/images/I/front.jpg");
        assert_eq!(details.features, "Calibrates printers | Works with inkjet papers");
        assert_eq!(details.description, "Accurate color prints.");
        assert_eq!(details.brand_name, "Datacolor");
        assert_eq!(details.listing_date, "March 1, 2007");
        assert_eq!(details.bsr_rank_full_text, "#1,234 in Electronics (See Top 100)");
        assert_eq!(details.bsr_top_category_rank, "1234");
        assert_eq!(details.seller_address, NOT_AVAILABLE);
        assert!(!is_seller_profile(&details.seller_url));
    }

    const SELLER_PAGE: &str = r#"<html><body>
<div id="page-section-detail-seller-info"><div class="a-box-inner">
  <h3>Detailed Seller Information</h3>
  <div class="a-row"><span class="a-text-bold">Business Name:</span><span>PhotoPro LLC</span></div>
  <div class="a-row"><span class="a-text-bold">VAT Number:</span><span>US123</span></div>
  <div class="a-row"><span class="a-text-bold">Business Address:</span></div>
  <div class="a-row a-spacing-none indent-left"><span>12 Main St</span></div>
  <div class="a-row a-spacing-none indent-left"><span><span>Lawrenceville</span></span></div>
  <div class="a-row a-spacing-none indent-left"><span>NJ</span></div>
  <div class="a-row a-spacing-none indent-left"><span>US</span></div>
  <div class="a-row"><span class="a-text-bold">Phone:</span><span>555-0100</span></div>
</div></div>
</body></html>"#;

    #[test]
    fn seller_address_keeps_only_address_lines() {
        assert_eq!(
            extract_seller_address(SELLER_PAGE).as_deref(),
            Some("12 Main St Lawrenceville NJ US")
        );
    }

    #[test]
    fn seller_address_missing_section() {
        assert_eq!(extract_seller_address("<html><body>nothing</body></html>"), None);
        assert!(is_seller_profile("https://www.amazon.com/sp?seller=A1"));
    }

    #[test]
    fn missing_fields_keep_defaults() {
        let html = r#"<html><body><span id="productTitle">Bare item</span></body></html>"#;
        let details =
            extract_product_details(html, "https://www.amazon.com/item", "Amazon").unwrap();

        assert_eq!(details.product_title, "Bare item");
        assert_eq!(details.asin, NOT_AVAILABLE);
        assert_eq!(details.price, NOT_AVAILABLE);
        assert_eq!(details.review_count, "0");
        assert_eq!(details.seller, "Amazon");
        assert_eq!(details.seller_url, NOT_AVAILABLE);
        assert_eq!(details.features, NOT_AVAILABLE);
        assert_eq!(details.bsr_top_category_rank, NOT_AVAILABLE);
    }

    #[test]
    fn asin_falls_back_to_page_source() {
        let html = r#"<html><body><span id="productTitle">X</span>
            <script>var data = {"ASIN" : "B0ABCDEFGH"};</script></body></html>"#;
        let details =
            extract_product_details(html, "https://www.amazon.com/item", "Amazon").unwrap();
        assert_eq!(details.asin, "B0ABCDEFGH");
    }

    #[test]
    fn brand_falls_back_to_byline() {
        let html = r#"<html><body><span id="productTitle">X</span>
            <a id="bylineInfo">Visit the Datacolor Store</a></body></html>"#;
        let details = extract_product_details(html, URL, "Amazon").unwrap();
        assert_eq!(details.brand_name, "Datacolor");
        // Byline texts are not seller names.
        assert_eq!(details.seller, "Amazon");
    }

    #[test]
    fn chinese_bsr_rank_and_listing_date() {
        let html = r#"<html><body><span id="productTitle">X</span>
            <table>
              <tr><th>上架时间</th><td>2020年5月1日</td></tr>
            </table>
            <div id="detailBullets_feature_div"><ul>
              <li><span>亚马逊热销商品排名: 在电子产品商品里排第56名</span></li>
            </ul></div></body></html>"#;
        let details = extract_product_details(html, URL, "Amazon").unwrap();
        assert_eq!(details.listing_date, "2020年5月1日");
        assert_eq!(details.bsr_top_category_rank, "56");
    }

    #[test]
    fn description_is_truncated() {
        let long = "a".repeat(MAX_DESCRIPTION_CHARS + 50);
        let html = format!(
            r#"<html><body><span id="productTitle">X</span><div id="productDescription">{long}</div></body></html>"#
        );
        let details = extract_product_details(&html, URL, "Amazon").unwrap();
        assert_eq!(details.description.chars().count(), MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn page_without_title_or_image_fails() {
        let err = extract_product_details("<html><body>Robot check</body></html>", URL, "Amazon")
            .unwrap_err();
        assert!(matches!(err, CrawlError::NoProductDetails { .. }));
    }
}
