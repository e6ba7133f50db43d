//! Turns raw metadata into normalized records and tag strings.
//!
//! The tag string of a movie is, in this order:
//! overview words + genres + keywords + top cast + director,
//! lower-cased and joined with single spaces.

use crate::error::{FeatureError, Result};
use crate::parser::{self, TOP_CAST};
use crate::types::{ListField, MovieId, MovieRecord, RawMovie, TagString, TaggedMovie};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

impl MovieRecord {
    /// Parse and normalize one raw movie.
    ///
    /// Any malformed list field fails the whole record.
    pub fn from_raw(raw: &RawMovie) -> Result<Self> {
        let genres = parser::parse_list(raw.id, ListField::Genres, &raw.genres)?;
        let keywords = parser::parse_list(raw.id, ListField::Keywords, &raw.keywords)?;
        let cast = parser::parse_list(raw.id, ListField::Cast, &raw.cast)?;
        let crew = parser::parse_list(raw.id, ListField::Crew, &raw.crew)?;

        Ok(Self {
            id: raw.id,
            title: raw.title.clone(),
            overview: parser::split_overview(raw.overview.as_deref()),
            genres: parser::extract_names(&genres),
            keywords: parser::extract_names(&keywords),
            cast: parser::extract_top_names(&cast, TOP_CAST),
            director: parser::extract_director(&crew),
        })
    }

    /// Concatenate every token group into this movie's tag string
    pub fn tag_string(&self) -> TagString {
        let tokens = self
            .overview
            .iter()
            .chain(&self.genres)
            .chain(&self.keywords)
            .chain(&self.cast)
            .chain(std::iter::once(&self.director))
            .map(String::as_str);
        TagString::from_tokens(tokens)
    }

    pub fn to_tagged(&self) -> TaggedMovie {
        TaggedMovie {
            id: self.id,
            title: self.title.clone(),
            tags: self.tag_string(),
        }
    }
}

/// Parse every raw movie into a [`MovieRecord`], keeping input order.
///
/// Records are parsed in parallel; the first defect found aborts the batch.
#[instrument(skip(raws), fields(movies = raws.len()))]
pub fn build_records(raws: &[RawMovie]) -> Result<Vec<MovieRecord>> {
    check_unique_ids(raws.iter().map(|raw| raw.id))?;

    let records = raws
        .par_iter()
        .map(MovieRecord::from_raw)
        .collect::<Result<Vec<_>>>()?;

    debug!("Parsed {} movie records", records.len());
    Ok(records)
}

/// Full feature-builder pass: raw movies in, tagged movies out (same order)
#[instrument(skip(raws), fields(movies = raws.len()))]
pub fn build_tagged_movies(raws: &[RawMovie]) -> Result<Vec<TaggedMovie>> {
    let records = build_records(raws)?;
    let tagged: Vec<TaggedMovie> = records.par_iter().map(MovieRecord::to_tagged).collect();

    let empty = tagged.iter().filter(|m| m.tags.is_empty()).count();
    if empty > 0 {
        debug!("{} movies ended up with an empty tag string", empty);
    }
    info!("Built tag strings for {} movies", tagged.len());
    Ok(tagged)
}

fn check_unique_ids(ids: impl Iterator<Item = MovieId>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(FeatureError::DuplicateMovie(id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avatar() -> RawMovie {
        RawMovie {
            id: 19995,
            title: "Avatar".to_string(),
            overview: Some("In the 22nd century, a paraplegic Marine".to_string()),
            genres: r#"[{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}]"#.to_string(),
            keywords: r#"[{"id": 1463, "name": "culture clash"}, {"id": 2964, "name": "future"}]"#.to_string(),
            cast: r#"[{"name": "Sam Worthington"}, {"name": "Zoe Saldana"}, {"name": "Sigourney Weaver"}, {"name": "Stephen Lang"}]"#.to_string(),
            crew: r#"[{"job": "Editor", "name": "John Refoua"}, {"job": "Director", "name": "James Cameron"}]"#.to_string(),
        }
    }

    #[test]
    fn test_record_from_raw() {
        let record = MovieRecord::from_raw(&avatar()).unwrap();
        assert_eq!(record.id, 19995);
        assert_eq!(record.overview.len(), 7);
        assert_eq!(record.genres, vec!["Action", "ScienceFiction"]);
        assert_eq!(record.keywords, vec!["cultureclash", "future"]);
        assert_eq!(record.cast.len(), 3);
        assert_eq!(record.director, "JamesCameron");
    }

    #[test]
    fn test_tag_string_order_and_case() {
        let record = MovieRecord::from_raw(&avatar()).unwrap();
        assert_eq!(
            record.tag_string().as_str(),
            "in the 22nd century, a paraplegic marine action sciencefiction \
             cultureclash future samworthington zoesaldana sigourneyweaver jamescameron"
        );
    }

    #[test]
    fn test_missing_overview_and_director() {
        let mut raw = avatar();
        raw.overview = None;
        raw.crew = "[]".to_string();
        let record = MovieRecord::from_raw(&raw).unwrap();
        assert!(record.overview.is_empty());
        assert_eq!(record.director, "");
        assert!(record.tag_string().as_str().starts_with("action "));
        assert!(!record.tag_string().as_str().ends_with(' '));
    }

    #[test]
    fn test_malformed_field_fails_record() {
        let mut raw = avatar();
        raw.crew = "not a list".to_string();
        let err = MovieRecord::from_raw(&raw).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::MalformedList { movie_id: 19995, field: ListField::Crew, .. }
        ));
    }

    #[test]
    fn test_batch_propagates_malformed_record() {
        let mut bad = avatar();
        bad.id = 2;
        bad.genres = String::new();
        let result = build_tagged_movies(&[avatar(), bad]);
        assert!(matches!(result, Err(FeatureError::MalformedList { movie_id: 2, .. })));
    }

    #[test]
    fn test_batch_rejects_duplicate_ids() {
        let result = build_tagged_movies(&[avatar(), avatar()]);
        assert!(matches!(result, Err(FeatureError::DuplicateMovie(19995))));
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let mut second = avatar();
        second.id = 1;
        second.title = "Second".to_string();
        let tagged = build_tagged_movies(&[avatar(), second]).unwrap();
        assert_eq!(tagged[0].id, 19995);
        assert_eq!(tagged[1].title, "Second");
    }
}
