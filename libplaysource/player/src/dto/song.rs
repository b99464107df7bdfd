use std::fmt::{self, Display, Formatter};

/// A song requested for playback. Read-only once created; the id is assigned
/// by the client that queued it and echoed back in responses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Song {
    pub id: i32,
    pub name: String,
    pub artists: Vec<String>,
    pub genre: String,
}

impl Display for Song {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.artists.join(", "),
            self.name,
            self.genre
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Song;

    #[test]
    fn test_display_single_artist() {
        let song = Song {
            id: 0,
            name: "Bangarang".to_owned(),
            artists: vec!["Skrillex".to_owned()],
            genre: "Dubstep".to_owned(),
        };
        assert_eq!("Skrillex: Bangarang (Dubstep)", song.to_string());
    }

    #[test]
    fn test_display_joins_artists() {
        let song = Song {
            id: 0,
            name: "Get Lucky".to_owned(),
            artists: vec!["Daft Punk".to_owned(), "Pharrell Williams".to_owned()],
            genre: "Disco".to_owned(),
        };
        assert_eq!(
            "Daft Punk, Pharrell Williams: Get Lucky (Disco)",
            song.to_string()
        );
    }
}
