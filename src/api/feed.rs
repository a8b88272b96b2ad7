use std::fmt;

/// A remote launch collection, imported into the list of the same title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Feed {
    All,
    Upcoming,
    Past,
    Latest,
}

impl Feed {
    pub const ALL: [Feed; 4] = [Feed::All, Feed::Upcoming, Feed::Past, Feed::Latest];

    /// Endpoint path relative to the API base URL
    pub fn path(self) -> &'static str {
        match self {
            Feed::All => "launches",
            Feed::Upcoming => "launches/upcoming",
            Feed::Past => "launches/past",
            Feed::Latest => "launches/latest",
        }
    }

    /// Title of the list this feed is imported into
    pub fn list_title(self) -> &'static str {
        match self {
            Feed::All => "All",
            Feed::Upcoming => "Upcoming",
            Feed::Past => "Past",
            Feed::Latest => "Latest",
        }
    }

    /// File stem used by the response cache
    pub fn key(self) -> &'static str {
        match self {
            Feed::All => "all",
            Feed::Upcoming => "upcoming",
            Feed::Past => "past",
            Feed::Latest => "latest",
        }
    }

    /// Titles of the standard lists, in feed order
    pub fn standard_lists() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.list_title()).collect()
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_lists() {
        assert_eq!(Feed::standard_lists(), vec!["All", "Upcoming", "Past", "Latest"]);
    }

    #[test]
    fn test_paths() {
        assert_eq!(Feed::All.path(), "launches");
        assert_eq!(Feed::Latest.path(), "launches/latest");
        assert_eq!(Feed::Past.to_string(), "past");
    }
}
