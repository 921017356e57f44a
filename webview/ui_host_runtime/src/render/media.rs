use crate::document::Document;
use crate::events::MediaStatus;
use crate::registry::{MediaField, MediaPanel, Widget, WidgetRegistry};

use super::{format_source, format_time};

const PLAYING_GLYPH: &str = "⏸";
const IDLE_GLYPH: &str = "⏯";

/// Render now-playing state into both media panels and the play button.
pub fn render(doc: &mut Document, registry: &WidgetRegistry, media: &MediaStatus, default_art: &str) {
    let progress = format!(
        "{} / {}",
        format_time(media.position),
        format_time(media.duration)
    );
    let texts = [
        (MediaField::Title, media.title.as_deref().unwrap_or("No track").to_string()),
        (MediaField::Artist, media.artist.as_deref().unwrap_or("--").to_string()),
        (MediaField::Album, media.album.as_deref().unwrap_or("--").to_string()),
        (MediaField::Progress, progress),
        (MediaField::Status, format!("Status: {}", media.status_label())),
        (
            MediaField::Source,
            format!("Source: {}", format_source(media.source.as_deref())),
        ),
    ];

    for panel in MediaPanel::ALL {
        for (field, text) in &texts {
            if let Some(widget) = registry.get(Widget::Media(panel, *field)) {
                doc.set_text(widget, text);
            }
        }

        if let Some(art) = registry.get(Widget::Media(panel, MediaField::Art)) {
            doc.set_attr(art, "src", media.art.as_deref().unwrap_or(default_art));
        }
    }

    if let Some(play) = registry.get(Widget::MediaPlay) {
        let glyph = if media.is_playing() { PLAYING_GLYPH } else { IDLE_GLYPH };
        doc.set_text(play, glyph);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PLACEHOLDER_ART;

    const PANELS: &str = r#"<html>
  <section id="screen-home">
    <img id="home-art" src=""/>
    <h2 id="home-title"/>
    <p id="home-artist"/>
    <p id="home-progress"/>
    <p id="home-source"/>
    <button id="media-play">⏯</button>
  </section>
  <section id="screen-music">
    <img id="music-art" src=""/>
    <h2 id="music-title"/>
    <p id="music-album"/>
    <p id="music-status"/>
  </section>
</html>"#;

    fn text_of(doc: &Document, id: &str) -> String {
        doc.element_by_id(id)
            .map(|widget| doc.text_content(widget))
            .unwrap_or_default()
    }

    #[test]
    fn empty_media_uses_defaults_in_both_panels() {
        let mut doc = Document::parse(PANELS).expect("parse");
        let registry = WidgetRegistry::resolve(&doc);

        render(&mut doc, &registry, &MediaStatus::default(), PLACEHOLDER_ART);

        assert_eq!(text_of(&doc, "home-title"), "No track");
        assert_eq!(text_of(&doc, "music-title"), "No track");
        assert_eq!(text_of(&doc, "home-artist"), "--");
        assert_eq!(text_of(&doc, "music-album"), "--");
        assert_eq!(text_of(&doc, "home-progress"), "00:00 / 00:00");
        assert_eq!(text_of(&doc, "music-status"), "Status: stopped");
        assert_eq!(text_of(&doc, "home-source"), "Source: No source");
        assert_eq!(text_of(&doc, "media-play"), "⏯");

        let art = doc.element_by_id("music-art").expect("art");
        assert_eq!(doc.attr(art, "src"), Some(PLACEHOLDER_ART));
    }

    #[test]
    fn playing_media_shows_pause_glyph_and_progress() {
        let mut doc = Document::parse(PANELS).expect("parse");
        let registry = WidgetRegistry::resolve(&doc);
        let media = MediaStatus {
            title: Some("Night Drive".to_string()),
            status: Some("playing".to_string()),
            position: Some(65_000.0),
            duration: Some(200_000.0),
            source: Some("bluetooth".to_string()),
            art: Some("https://example.test/cover.png".to_string()),
            ..MediaStatus::default()
        };

        render(&mut doc, &registry, &media, PLACEHOLDER_ART);

        assert_eq!(text_of(&doc, "home-title"), "Night Drive");
        assert_eq!(text_of(&doc, "home-progress"), "01:05 / 03:20");
        assert_eq!(text_of(&doc, "home-source"), "Source: Bluetooth");
        assert_eq!(text_of(&doc, "music-status"), "Status: playing");
        assert_eq!(text_of(&doc, "media-play"), "⏸");

        let art = doc.element_by_id("home-art").expect("art");
        assert_eq!(doc.attr(art, "src"), Some("https://example.test/cover.png"));
    }
}
