use std::fmt;
use std::num::NonZeroUsize;

/// Token in the format template that is replaced by the artist name.
pub const ARTIST_TOKEN: &str = "%artist%";

/// Token in the format template that is replaced by the track title.
pub const TITLE_TOKEN: &str = "%title%";

/// Format template used when none is given.
pub const DEFAULT_FORMAT: &str = "%artist%: %title%";

/// Truncation marker used when none is given.
pub const DEFAULT_TRUNCATION_MARKER: &str = "...";

/// Output when neither an artist nor a title is available.
pub const PLACEHOLDER: &str = "Spotify";

/// Options controlling how the `status` line is rendered.
///
/// All lengths are counted in characters (Unicode scalar values). `None` means no limit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FormatConfig {
    /// Maximum length of the artist name. Only enforced when the output is truncated.
    pub max_artist_length: Option<NonZeroUsize>,

    /// Maximum length of the track title. Only enforced when the output is truncated.
    pub max_title_length: Option<NonZeroUsize>,

    /// Maximum length of the whole output.
    pub max_length: Option<NonZeroUsize>,

    /// Template containing the `%artist%` and `%title%` tokens.
    pub format: String,

    /// Appended to anything that was truncated. Counts towards the length limits and may be empty.
    pub trunc: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            max_artist_length: None,
            max_title_length: None,
            max_length: None,
            format: String::from(DEFAULT_FORMAT),
            trunc: String::from(DEFAULT_TRUNCATION_MARKER),
        }
    }
}

/// The length limit a truncation was made for.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Budget {
    /// `max_artist_length`
    Artist,
    /// `max_title_length`
    Title,
    /// `max_length`
    Output,
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Budget::Artist => "artist",
            Budget::Title => "title",
            Budget::Output => "output",
        })
    }
}

/// The truncation marker is longer than the length it should fit in.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone, Copy)]
#[error("truncation marker is {marker_length} characters but the limit is {max_length}")]
pub struct MarkerTooLong {
    /// Length of the marker.
    pub marker_length: usize,
    /// The limit that could not be honored.
    pub max_length: usize,
}

/// Rendering the `status` line failed. This is always a configuration mistake.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum FormatError {
    /// The truncation marker does not fit in one of the length limits.
    #[error(
        "Failed to truncate {budget}: the trunc string is {marker_length} characters long, \
         which does not fit in the max {budget} length of {max_length}. \
         Please make sure the trunc string is shorter than the max {budget} length."
    )]
    MarkerTooLong {
        /// Which of the limits was violated.
        budget: Budget,
        /// Length of the truncation marker.
        marker_length: usize,
        /// The limit that could not be honored.
        max_length: usize,
    },
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Shortens `s` to at most `max_length` characters, ending it with `marker` if anything was cut.
///
/// The result is exactly `max_length` characters long whenever `s` had to be shortened.
///
/// # Examples
///
/// ```rust
/// # use std::num::NonZeroUsize;
/// use spotifyctl::truncate;
///
/// let limit = NonZeroUsize::new(10);
/// assert_eq!(truncate("Sing For The Moment", limit, "...").unwrap(), "Sing Fo...");
/// assert_eq!(truncate("Stan", limit, "...").unwrap(), "Stan");
/// assert!(truncate("Sing For The Moment", NonZeroUsize::new(2), "...").is_err());
/// ```
pub fn truncate(
    s: &str,
    max_length: Option<NonZeroUsize>,
    marker: &str,
) -> Result<String, MarkerTooLong> {
    let max_length = match max_length {
        Some(limit) => limit.get(),
        None => return Ok(s.to_owned()),
    };

    if char_len(s) <= max_length {
        return Ok(s.to_owned());
    }

    let marker_length = char_len(marker);
    if marker_length > max_length {
        return Err(MarkerTooLong {
            marker_length,
            max_length,
        });
    }

    let mut truncated: String = s.chars().take(max_length - marker_length).collect();
    truncated.push_str(marker);
    Ok(truncated)
}

fn truncate_for(
    budget: Budget,
    s: &str,
    max_length: Option<NonZeroUsize>,
    marker: &str,
) -> Result<String, FormatError> {
    truncate(s, max_length, marker).map_err(|error| FormatError::MarkerTooLong {
        budget,
        marker_length: error.marker_length,
        max_length: error.max_length,
    })
}

/// Replaces all tokens in the template, left to right. Replacement text is never scanned for
/// tokens again.
fn substitute(template: &str, artist: &str, title: &str) -> String {
    let replacements = [(ARTIST_TOKEN, artist), (TITLE_TOKEN, title)];
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let next = replacements
            .iter()
            .filter_map(|&(token, value)| rest.find(token).map(|at| (at, token, value)))
            .min_by_key(|&(at, _, _)| at);

        match next {
            Some((at, token, value)) => {
                output.push_str(&rest[..at]);
                output.push_str(value);
                rest = &rest[at + token.len()..];
            }
            None => {
                output.push_str(rest);
                return output;
            }
        }
    }
}

/// Length of the template once both tokens are replaced by the full values.
fn untruncated_length(template: &str, artist: &str, title: &str) -> i64 {
    let artist_tokens = template.matches(ARTIST_TOKEN).count() as i64;
    let title_tokens = template.matches(TITLE_TOKEN).count() as i64;

    let artist_delta = char_len(artist) as i64 - char_len(ARTIST_TOKEN) as i64;
    let title_delta = char_len(title) as i64 - char_len(TITLE_TOKEN) as i64;

    char_len(template) as i64 + artist_tokens * artist_delta + title_tokens * title_delta
}

/// Renders artist and title into the configured template.
///
/// When both are missing or empty the output is `"Spotify"`. Otherwise the artist and title
/// limits only come into play when the output has no `max_length`, or when the untruncated output
/// would be longer than `max_length`. In that case both values are truncated to their own limits,
/// put into the template, and the result is truncated to `max_length`.
///
/// # Examples
///
/// ```rust
/// # use std::num::NonZeroUsize;
/// use spotifyctl::{format, FormatConfig};
///
/// let config = FormatConfig {
///     max_length: NonZeroUsize::new(20),
///     max_artist_length: NonZeroUsize::new(10),
///     max_title_length: NonZeroUsize::new(10),
///     ..FormatConfig::default()
/// };
///
/// let output = format(Some("Eminem"), Some("Sing For The Moment"), &config).unwrap();
/// assert_eq!(output, "Eminem: Sing Fo...");
/// ```
pub fn format(
    artist: Option<&str>,
    title: Option<&str>,
    config: &FormatConfig,
) -> Result<String, FormatError> {
    let artist = artist.unwrap_or_default();
    let title = title.unwrap_or_default();

    if artist.is_empty() && title.is_empty() {
        return Ok(String::from(PLACEHOLDER));
    }

    let needs_truncation = match config.max_length {
        None => true,
        Some(limit) => untruncated_length(&config.format, artist, title) > limit.get() as i64,
    };

    if !needs_truncation {
        return Ok(substitute(&config.format, artist, title));
    }

    let title = truncate_for(Budget::Title, title, config.max_title_length, &config.trunc)?;
    let artist = truncate_for(Budget::Artist, artist, config.max_artist_length, &config.trunc)?;
    let output = substitute(&config.format, &artist, &title);

    truncate_for(Budget::Output, &output, config.max_length, &config.trunc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(n: usize) -> Option<NonZeroUsize> {
        NonZeroUsize::new(n)
    }

    fn config(max_length: usize, max_artist: usize, max_title: usize) -> FormatConfig {
        FormatConfig {
            max_artist_length: limit(max_artist),
            max_title_length: limit(max_title),
            max_length: limit(max_length),
            ..FormatConfig::default()
        }
    }

    mod truncation {
        use super::*;

        #[test]
        fn it_leaves_short_strings_alone() {
            assert_eq!(truncate("Stan", limit(4), "...").unwrap(), "Stan");
            assert_eq!(truncate("Stan", limit(40), "...").unwrap(), "Stan");
            assert_eq!(truncate("Stan", None, "...").unwrap(), "Stan");
        }

        #[test]
        fn it_ends_truncated_strings_with_the_marker() {
            let truncated = truncate("Sing For The Moment", limit(13), "...").unwrap();
            assert_eq!(truncated, "Sing For T...");
            assert_eq!(truncated.chars().count(), 13);
        }

        #[test]
        fn it_supports_an_empty_marker() {
            assert_eq!(truncate("Lose Yourself", limit(4), "").unwrap(), "Lose");
        }

        #[test]
        fn it_allows_a_marker_filling_the_whole_limit() {
            assert_eq!(truncate("Lose Yourself", limit(3), "...").unwrap(), "...");
        }

        #[test]
        fn it_fails_when_the_marker_does_not_fit() {
            assert_eq!(
                truncate("Lose Yourself", limit(2), "..."),
                Err(MarkerTooLong {
                    marker_length: 3,
                    max_length: 2
                })
            );
        }

        #[test]
        fn a_long_marker_is_fine_when_nothing_is_cut() {
            assert_eq!(truncate("ab", limit(2), "...").unwrap(), "ab");
        }

        #[test]
        fn it_counts_characters_rather_than_bytes() {
            let truncated = truncate("Beyoncé Knowles", limit(8), "…").unwrap();
            assert_eq!(truncated, "Beyoncé…");

            assert_eq!(truncate("Röyksopp", limit(8), "...").unwrap(), "Röyksopp");
        }

        #[test]
        fn result_length_is_min_of_input_and_limit() {
            let inputs = ["", "a", "Kim", "The Real Slim Shady", "Cleanin' Out My Closet"];
            for input in inputs.iter() {
                for max in 3..25 {
                    let result = truncate(input, limit(max), "...").unwrap();
                    let expected = input.chars().count().min(max);
                    assert_eq!(result.chars().count(), expected, "{} / {}", input, max);
                    if result != *input {
                        assert!(result.ends_with("..."));
                    }
                }
            }
        }
    }

    mod formatting {
        use super::*;

        #[test]
        fn it_defaults_to_artist_colon_title() {
            let output = format(Some("Eminem"), Some("Stan"), &FormatConfig::default()).unwrap();
            assert_eq!(output, "Eminem: Stan");
        }

        #[test]
        fn it_falls_back_to_the_placeholder() {
            let tight = config(1, 1, 1);

            assert_eq!(format(None, None, &tight).unwrap(), "Spotify");
            assert_eq!(format(Some(""), Some(""), &tight).unwrap(), "Spotify");
            assert_eq!(format(Some(""), None, &FormatConfig::default()).unwrap(), "Spotify");
        }

        #[test]
        fn it_does_not_truncate_when_within_max_length() {
            let output = format(Some("Eminem"), Some("Sing For The Moment"), &config(30, 10, 20));
            assert_eq!(output.unwrap(), "Eminem: Sing For The Moment");
        }

        #[test]
        fn it_ignores_field_limits_when_within_max_length() {
            let output = format(Some("Eminem"), Some("Sing For The Moment"), &config(30, 3, 5));
            assert_eq!(output.unwrap(), "Eminem: Sing For The Moment");
        }

        #[test]
        fn it_truncates_fields_when_over_max_length() {
            let output = format(Some("Eminem"), Some("Sing For The Moment"), &config(20, 10, 10));
            assert_eq!(output.unwrap(), "Eminem: Sing Fo...");
        }

        #[test]
        fn it_truncates_the_whole_output_last() {
            let output = format(Some("Eminem"), Some("Sing For The Moment"), &config(15, 10, 10))
                .unwrap();
            assert_eq!(output, "Eminem: Sing...");
            assert_eq!(output.chars().count(), 15);
        }

        #[test]
        fn field_limits_apply_without_max_length() {
            let config = FormatConfig {
                max_title_length: limit(13),
                ..FormatConfig::default()
            };

            let output = format(Some("Eminem"), Some("Sing For The Moment"), &config);
            assert_eq!(output.unwrap(), "Eminem: Sing For T...");
        }

        #[test]
        fn it_uses_the_configured_marker() {
            let config = FormatConfig {
                max_artist_length: limit(4),
                trunc: String::from("~"),
                ..FormatConfig::default()
            };

            let output = format(Some("Dr. Dre"), Some("Still D.R.E."), &config);
            assert_eq!(output.unwrap(), "Dr.~: Still D.R.E.");
        }

        #[test]
        fn it_replaces_every_token() {
            let config = FormatConfig {
                format: String::from("%title% - %artist% (%artist%) %title%"),
                ..FormatConfig::default()
            };

            let output = format(Some("Eminem"), Some("Stan"), &config).unwrap();
            assert_eq!(output, "Stan - Eminem (Eminem) Stan");
        }

        #[test]
        fn it_supports_templates_without_tokens() {
            let config = FormatConfig {
                format: String::from("now playing"),
                max_length: limit(20),
                ..FormatConfig::default()
            };

            assert_eq!(format(Some("Eminem"), None, &config).unwrap(), "now playing");
        }

        #[test]
        fn it_does_not_rescan_replacements() {
            let output = format(Some("%title%"), Some("Stan"), &FormatConfig::default()).unwrap();
            assert_eq!(output, "%title%: Stan");

            assert_eq!(substitute("%title%%artist%", "%title%", "%artist%"), "%artist%%title%");
        }

        #[test]
        fn a_missing_field_renders_empty() {
            let output = format(None, Some("Stan"), &FormatConfig::default()).unwrap();
            assert_eq!(output, ": Stan");
        }

        #[test]
        fn it_estimates_with_short_values() {
            // "%artist%: %title%" is 17 characters, but "a: b" is only 4.
            assert_eq!(untruncated_length(DEFAULT_FORMAT, "a", "b"), 4);

            let output = format(Some("a"), Some("b"), &config(4, 1, 1)).unwrap();
            assert_eq!(output, "a: b");
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn it_fails_when_marker_exceeds_max_length() {
            let error = format(Some("Eminem"), Some("Sing For The Moment"), &config(2, 10, 10))
                .unwrap_err();

            assert_eq!(
                error,
                FormatError::MarkerTooLong {
                    budget: Budget::Output,
                    marker_length: 3,
                    max_length: 2,
                }
            );
        }

        #[test]
        fn it_reports_the_title_budget() {
            let error = format(Some("Eminem"), Some("Sing For The Moment"), &config(10, 10, 2))
                .unwrap_err();

            assert!(matches!(
                error,
                FormatError::MarkerTooLong {
                    budget: Budget::Title,
                    ..
                }
            ));
        }

        #[test]
        fn it_reports_the_artist_budget() {
            let config = FormatConfig {
                max_artist_length: limit(1),
                ..FormatConfig::default()
            };

            let error = format(Some("Eminem"), Some("Stan"), &config).unwrap_err();
            assert!(matches!(
                error,
                FormatError::MarkerTooLong {
                    budget: Budget::Artist,
                    ..
                }
            ));
        }

        #[test]
        fn it_describes_the_violated_budget() {
            let error = FormatError::MarkerTooLong {
                budget: Budget::Title,
                marker_length: 3,
                max_length: 2,
            };

            let message = error.to_string();
            assert!(message.starts_with("Failed to truncate title"));
            assert!(message.contains("max title length of 2"));
        }
    }
}
