use serde::{Deserialize, Serialize};
use std::fmt;

/// Academic term a group belongs to
///
/// Seasons are stored as free text ("2024 Spring", "2024 Agent", ...). This enum
/// is the structured view the dashboard works with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Fall,
    Unclassified,
}

impl Season {
    /// Classify a legacy season string
    ///
    /// The string is split on whitespace and the first token equal to `spring`
    /// or `fall` (ignoring case) decides the season. Anything else is
    /// [`Season::Unclassified`].
    ///
    /// # Examples
    /// ```
    /// use knowmyslots::season::Season;
    ///
    /// assert_eq!(Season::classify("2024 Spring"), Season::Spring);
    /// assert_eq!(Season::classify("fall 2023"), Season::Fall);
    /// assert_eq!(Season::classify("2024 Agent"), Season::Unclassified);
    /// ```
    pub fn classify(raw: &str) -> Season {
        for token in raw.split_whitespace() {
            if token.eq_ignore_ascii_case("spring") {
                return Season::Spring;
            }
            if token.eq_ignore_ascii_case("fall") {
                return Season::Fall;
            }
        }
        Season::Unclassified
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Fall => "fall",
            Season::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed form of a legacy season string
///
/// Carries the year token when one is present so callers can migrate
/// "2024 Spring" into a separate year field and a [`Season`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonTag {
    pub year: Option<String>,
    pub season: Season,
}

impl SeasonTag {
    /// Parse a free-text season such as `"2024 Spring"`
    ///
    /// The year is the first all-digit token, if any.
    ///
    /// # Examples
    /// ```
    /// use knowmyslots::season::{Season, SeasonTag};
    ///
    /// let tag = SeasonTag::parse_legacy("2024 Spring");
    /// assert_eq!(tag.year.as_deref(), Some("2024"));
    /// assert_eq!(tag.season, Season::Spring);
    /// ```
    pub fn parse_legacy(raw: &str) -> SeasonTag {
        let year = raw
            .split_whitespace()
            .find(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string);

        SeasonTag {
            year,
            season: Season::classify(raw),
        }
    }

    /// Render back to the legacy free-text form
    pub fn to_legacy(&self) -> String {
        let season = match self.season {
            Season::Spring => "Spring",
            Season::Fall => "Fall",
            Season::Unclassified => return self.year.clone().unwrap_or_default(),
        };

        match &self.year {
            Some(year) => format!("{year} {season}"),
            None => season.to_string(),
        }
    }
}
