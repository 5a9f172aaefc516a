use album_core::ResourceUrl;
use album_engine::{FailureKind, ListingParser, PhotoListingParser};
use pretty_assertions::assert_eq;

fn strings(candidates: &[ResourceUrl]) -> Vec<&str> {
    candidates.iter().map(ResourceUrl::as_str).collect()
}

#[test]
fn photo_records_use_highest_resolution_field() {
    let body = r#"{"payload":[0,[
        {"id":"-1_10","x_src":"https://i/10_x.jpg","z_src":"https://i/10_z.jpg","s_src":"https://i/10_s.jpg"},
        {"id":"-1_11","y_src":"https://i/11_y.jpg","w_src":"https://i/11_w.jpg"},
        {"id":"-1_12","m_src":"https://i/12_m.jpg"},
        {"id":"-1_13"}
    ]]}"#;

    let page = PhotoListingParser::default().parse(body).unwrap();
    assert_eq!(
        strings(&page.candidates),
        vec!["https://i/10_z.jpg", "https://i/11_w.jpg", "https://i/12_m.jpg"]
    );
}

#[test]
fn html_fragments_yield_background_images_without_thumbnail_suffix() {
    let fragment = concat!(
        "<div class=\"photos_row\">",
        "<a href=\"/photo-1_10\" style=\"background-image: url(https://sun9.example/a.jpg?size=604x402&amp;from=bu&amp;cs=240x0);\"></a>",
        "<a href=\"/photo-1_11\" style=\"background-image: url('https://sun9.example/b.jpg');\"></a>",
        "<a href=\"/photo-1_12\" style=\"width: 20px\"></a>",
        "<a href=\"/photo-1_10\" style=\"background-image: url(https://sun9.example/a.jpg?size=604x402&amp;from=bu&amp;cs=240x0);\"></a>",
        "</div>"
    );
    let body = serde_json::json!({ "payload": [0, ["12", fragment]] }).to_string();
    let wrapped = format!("<!--{body}-->");

    let page = PhotoListingParser::default().parse(&wrapped).unwrap();
    assert_eq!(
        strings(&page.candidates),
        vec![
            "https://sun9.example/a.jpg?size=604x402",
            "https://sun9.example/b.jpg"
        ]
    );
}

#[test]
fn escaped_slashes_are_unescaped() {
    let body = r#"{"payload":[0,[{"x_src":"https:\\/\\/i\\/a.jpg"}]]}"#;
    let page = PhotoListingParser::new("").parse(body).unwrap();
    assert_eq!(strings(&page.candidates), vec!["https://i/a.jpg"]);
}

#[test]
fn missing_or_short_payload_is_an_empty_page() {
    let parser = PhotoListingParser::default();
    assert!(parser.parse(r#"{"other":1}"#).unwrap().is_end());
    assert!(parser.parse(r#"{"payload":[0]}"#).unwrap().is_end());
    assert!(parser.parse(r#"{"payload":[0,[]]}"#).unwrap().is_end());
    assert!(parser.parse(r#"{"payload":[0,["no images here"]]}"#).unwrap().is_end());
}

#[test]
fn unexpected_shapes_are_parse_errors() {
    let parser = PhotoListingParser::default();
    assert_eq!(parser.parse("<html>login</html>").unwrap_err().kind, FailureKind::Parse);
    assert_eq!(parser.parse("[1,2,3]").unwrap_err().kind, FailureKind::Parse);
    assert_eq!(parser.parse(r#"{"payload":"x"}"#).unwrap_err().kind, FailureKind::Parse);
}
