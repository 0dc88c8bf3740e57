use serde::{Deserialize, Serialize};

const MEDIA_BASE_URL: &str =
    "https://raw.githubusercontent.com/sujeetkumarr/Brand-New-Website/main/src/assets/music~";

/// One playable item of background music.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub url: String,
    pub title: String,
}

impl Track {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// The fixed set of tracks available for a session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Catalog {
    tracks: Vec<Track>,
}

impl Catalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    /// Classical recordings shipped with the site.
    pub fn default_catalog() -> Self {
        let entries = [
            ("aaye-na-balam.mp3", "Aaye Na Balam - Thumri"),
            (
                "abdul-karim-khan-phagwa.mp3",
                "Abdul Karim Khan - Phagwa Brij Dekhanko",
            ),
            ("ghei-chhand.mp3", "Ghei Chand Makrand"),
            ("hamri-atariya-pe-aao.mp3", "Hamari Atariya Pe"),
            ("mi-radhika.mp3", "Mi Radhika"),
            (
                "pandit-bhimsen-joshi-miyan-ki-malhar.mp3",
                "Miyan ki malhar",
            ),
            ("thumri-naina-more.mp3", "Naina More Tabas Gaye"),
        ];

        Self::new(
            entries
                .iter()
                .map(|(file, title)| Track::new(format!("{MEDIA_BASE_URL}/{file}"), *title))
                .collect(),
        )
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_unique_remote_tracks() {
        let catalog = Catalog::default_catalog();
        assert_eq!(catalog.len(), 7);
        assert!(catalog
            .tracks()
            .iter()
            .all(|track| track.url.starts_with("https://") && track.url.ends_with(".mp3")));

        let mut urls: Vec<&str> = catalog.tracks().iter().map(|t| t.url.as_str()).collect();
        urls.sort_unstable();
        urls.dedup();
        assert_eq!(urls.len(), catalog.len());
    }
}
