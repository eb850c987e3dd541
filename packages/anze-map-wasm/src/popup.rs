// Popup HTML for the three kinds of layers the widget draws. Every line is
// emitted only when its attribute is present; absence is never an error.

use crate::geojson_features::{FeatureProperties, Field};

/// Order in which point-of-interest details are listed under the name.
pub const POI_FIELDS: [Field; 7] = [
    Field::Phone,
    Field::Website,
    Field::Menu,
    Field::MapLink,
    Field::Email,
    Field::Hours,
    Field::Notes,
];

const UNNAMED_POI: &str = "Senza nome";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn title(name: &str) -> String {
    format!("<b>{}</b>", escape_html(name))
}

fn link(href: &str, label: &str) -> String {
    format!(
        "<a href=\"{}\" target=\"_blank\">{}</a>",
        escape_html(href),
        escape_html(label)
    )
}

fn poi_line(field: Field, value: &str) -> Option<String> {
    let line = match field {
        Field::Phone => {
            let dial: String = value.chars().filter(|c| !c.is_whitespace()).collect();
            format!(
                "📞 <a href=\"tel:{}\">{}</a>",
                escape_html(&dial),
                escape_html(value)
            )
        }
        Field::Website => format!("🌐 {}", link(value, "Sito web")),
        Field::Menu => format!("📋 {}", link(value, "Menu")),
        Field::MapLink => format!("📍 {}", link(value, "Google Maps")),
        Field::Email => format!(
            "✉️ <a href=\"mailto:{}\">{}</a>",
            escape_html(value),
            escape_html(value)
        ),
        Field::Hours => format!("🕒 {}", escape_html(value)),
        Field::Notes => format!("🗒️ {}", escape_html(value)),
        _ => return None,
    };
    Some(line)
}

/// Popup for a point of interest.
pub fn poi_popup(props: &FeatureProperties) -> String {
    let mut html = title(props.get(Field::Name).unwrap_or(UNNAMED_POI));
    for field in POI_FIELDS {
        if let Some(line) = props.get(field).and_then(|v| poi_line(field, v)) {
            html.push_str("<br>");
            html.push_str(&line);
        }
    }
    html
}

/// Popup for a route drawn from its detail file: technical data and an
/// optional deep link into an external navigation app.
pub fn route_detail_popup(props: &FeatureProperties, fallback_name: &str) -> String {
    let mut html = title(props.get(Field::Name).unwrap_or(fallback_name));

    let technical = [
        (Field::Length, "📏", "Lunghezza"),
        (Field::Elevation, "⛰️", "Dislivello"),
        (Field::Duration, "⏱️", "Tempo"),
    ];
    if technical.iter().any(|(f, _, _)| props.has(*f)) {
        html.push_str("<br><small>");
        for (field, icon, label) in technical {
            if let Some(value) = props.get(field) {
                html.push_str(&format!("{} <b>{}:</b> {}<br>", icon, label, escape_html(value)));
            }
        }
        html.push_str("</small>");
    }

    if let Some(app) = props.get(Field::AppLink) {
        html.push_str(&format!("<br>📱 {}", link(app, "Apri nell'app")));
    }
    html
}

/// Popup for a route drawn straight from the index file.
pub fn route_index_popup(props: &FeatureProperties, fallback_name: &str) -> String {
    let mut html = title(props.get(Field::Name).unwrap_or(fallback_name));
    if let Some(map) = props.get(Field::FullMap) {
        html.push_str(&format!("<br>🗺️ {}", link(map, "Vedi percorso completo")));
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(json: &str) -> FeatureProperties {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn poi_lines_follow_fixed_order() {
        let p = props(
            r#"{"name":"Trattoria","note":"Chiuso lunedì","telefono":"0365 123 456",
                "email":"info@trattoria.it","sito":"https://trattoria.it"}"#,
        );
        let html = poi_popup(&p);
        let phone = html.find("tel:0365123456").unwrap();
        let site = html.find("Sito web").unwrap();
        let mail = html.find("mailto:info@trattoria.it").unwrap();
        let note = html.find("Chiuso lunedì").unwrap();
        assert!(html.starts_with("<b>Trattoria</b>"));
        assert!(phone < site && site < mail && mail < note);
        assert!(!html.contains("Menu"));
        assert!(!html.contains("🕒"));
    }

    #[test]
    fn empty_attribute_renders_nothing() {
        let html = poi_popup(&props(r#"{"name":"Bar","orari":"","menu":""}"#));
        assert_eq!(html, "<b>Bar</b>");
    }

    #[test]
    fn unnamed_poi_placeholder() {
        assert_eq!(poi_popup(&FeatureProperties::default()), "<b>Senza nome</b>");
    }

    #[test]
    fn detail_popup_technical_block_only_when_present() {
        let with = route_detail_popup(&props(r#"{"name":"Sentiero A","lunghezza":"5km"}"#), "x");
        assert!(with.contains("Sentiero A"));
        assert!(with.contains("<b>Lunghezza:</b> 5km"));
        assert!(!with.contains("Dislivello"));

        let without = route_detail_popup(&props("{}"), "Sentiero B");
        assert_eq!(without, "<b>Sentiero B</b>");
    }

    #[test]
    fn detail_popup_app_link() {
        let html = route_detail_popup(
            &props(r#"{"name":"Anello","app":"https://komoot.com/tour/1"}"#),
            "Anello",
        );
        assert!(html.contains("href=\"https://komoot.com/tour/1\""));
    }

    #[test]
    fn index_popup_full_map_link() {
        let html = route_index_popup(&props(r#"{"mappa":"maps/anello.pdf"}"#), "Anello");
        assert!(html.starts_with("<b>Anello</b>"));
        assert!(html.contains("Vedi percorso completo"));
    }

    #[test]
    fn names_are_escaped() {
        let html = poi_popup(&props(r#"{"name":"<script>Bar & Co</script>"}"#));
        assert_eq!(html, "<b>&lt;script&gt;Bar &amp; Co&lt;/script&gt;</b>");
    }
}
