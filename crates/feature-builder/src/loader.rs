//! Loader for the TMDB 5000 CSV exports.
//!
//! - tmdb_5000_movies.csv: id, title, overview, genres, keywords, ...
//! - tmdb_5000_credits.csv: movie_id, title, cast, crew
//!
//! The two files are joined on movie id. Output order follows the movies
//! file so every later table lines up with it.

use crate::error::{FeatureError, Result};
use crate::types::{MovieId, RawMovie};
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, instrument};

const MOVIE_COLUMNS: [&str; 5] = ["id", "title", "overview", "genres", "keywords"];
const CREDIT_COLUMNS: [&str; 4] = ["movie_id", "title", "cast", "crew"];

#[derive(Debug, Deserialize)]
struct MovieRow {
    id: String,
    title: String,
    overview: Option<String>,
    genres: String,
    keywords: String,
}

#[derive(Debug, Deserialize)]
struct CreditRow {
    movie_id: String,
    cast: String,
    crew: String,
}

/// Load and join both TMDB files.
///
/// The files are parsed in parallel; the join then runs in movies-file order.
#[instrument]
pub fn load_tmdb(movies_path: &Path, credits_path: &Path) -> Result<Vec<RawMovie>> {
    let (movies, credits) = rayon::join(
        || read_file::<MovieRow>(movies_path, "movies", &MOVIE_COLUMNS),
        || read_file::<CreditRow>(credits_path, "credits", &CREDIT_COLUMNS),
    );
    let raws = join_rows(movies?, credits?)?;

    info!("Loaded {} movies from TMDB exports", raws.len());
    Ok(raws)
}

/// Same as [`load_tmdb`] but over in-memory readers
pub fn load_tmdb_from_readers<M: Read, C: Read>(movies: M, credits: C) -> Result<Vec<RawMovie>> {
    let movies = read_rows::<MovieRow>(movies, "movies", &MOVIE_COLUMNS)?;
    let credits = read_rows::<CreditRow>(credits, "credits", &CREDIT_COLUMNS)?;
    join_rows(movies, credits)
}

fn join_rows(movies: Vec<MovieRow>, credits: Vec<CreditRow>) -> Result<Vec<RawMovie>> {
    let mut credits_by_id: HashMap<MovieId, CreditRow> = HashMap::with_capacity(credits.len());
    for row in credits {
        let id = parse_id("movie_id", &row.movie_id)?;
        if credits_by_id.insert(id, row).is_some() {
            return Err(FeatureError::DuplicateCredits(id));
        }
    }

    let mut raws = Vec::with_capacity(movies.len());
    for row in movies {
        let id = parse_id("id", &row.id)?;
        let credit = credits_by_id
            .remove(&id)
            .ok_or_else(|| FeatureError::MissingCredits {
                movie_id: id,
                title: row.title.clone(),
            })?;

        raws.push(RawMovie {
            id,
            title: row.title,
            overview: row.overview.filter(|o| !o.trim().is_empty()),
            genres: row.genres,
            keywords: row.keywords,
            cast: credit.cast,
            crew: credit.crew,
        });
    }
    Ok(raws)
}

fn read_file<T>(path: &Path, file: &str, required: &[&str]) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let handle = std::fs::File::open(path)?;
    read_rows(handle, file, required)
}

fn read_rows<T>(reader: impl Read, file: &str, required: &[&str]) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = reader.headers()?.clone();
    check_columns(&headers, file, required)?;

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record)? {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row = record
            .deserialize(Some(&headers))
            .map_err(|e| FeatureError::ParseError {
                file: file.to_string(),
                line,
                reason: e.to_string(),
            })?;
        rows.push(row);
    }
    Ok(rows)
}

fn check_columns(headers: &StringRecord, file: &str, required: &[&str]) -> Result<()> {
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(FeatureError::MissingColumn {
                file: file.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

fn parse_id(field: &str, value: &str) -> Result<MovieId> {
    value.trim().parse().map_err(|_| FeatureError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVIES: &str = "budget,genres,id,keywords,overview,title\n\
        237000000,\"[{\"\"id\"\": 28, \"\"name\"\": \"\"Action\"\"}]\",19995,\"[{\"\"id\"\": 1463, \"\"name\"\": \"\"culture clash\"\"}]\",A paraplegic Marine,Avatar\n\
        0,[],42,[],,Blank Overview\n";

    const CREDITS: &str = "movie_id,title,cast,crew\n\
        42,Blank Overview,[],[]\n\
        19995,Avatar,\"[{\"\"name\"\": \"\"Sam Worthington\"\"}]\",\"[{\"\"job\"\": \"\"Director\"\", \"\"name\"\": \"\"James Cameron\"\"}]\"\n";

    #[test]
    fn test_join_keeps_movies_order() {
        let raws = load_tmdb_from_readers(MOVIES.as_bytes(), CREDITS.as_bytes()).unwrap();
        assert_eq!(raws.len(), 2);
        assert_eq!(raws[0].id, 19995);
        assert_eq!(raws[0].title, "Avatar");
        assert!(raws[0].crew.contains("James Cameron"));
        assert_eq!(raws[1].id, 42);
        assert_eq!(raws[1].overview, None);
    }

    #[test]
    fn test_missing_credits() {
        let credits = "movie_id,title,cast,crew\n42,Blank Overview,[],[]\n";
        let err = load_tmdb_from_readers(MOVIES.as_bytes(), credits.as_bytes()).unwrap_err();
        assert!(matches!(err, FeatureError::MissingCredits { movie_id: 19995, .. }));
    }

    #[test]
    fn test_duplicate_credits() {
        let credits = format!("{CREDITS}42,Blank Overview Again,[],[]\n");
        let err = load_tmdb_from_readers(MOVIES.as_bytes(), credits.as_bytes()).unwrap_err();
        assert!(matches!(err, FeatureError::DuplicateCredits(42)));
    }

    #[test]
    fn test_missing_column() {
        let movies = "id,title,overview,genres\n1,A,B,[]\n";
        let err = load_tmdb_from_readers(movies.as_bytes(), CREDITS.as_bytes()).unwrap_err();
        assert!(matches!(err, FeatureError::MissingColumn { ref column, .. } if column == "keywords"));
    }

    #[test]
    fn test_invalid_id() {
        let movies = "id,title,overview,genres,keywords\nabc,A,B,[],[]\n";
        let err = load_tmdb_from_readers(movies.as_bytes(), CREDITS.as_bytes()).unwrap_err();
        assert!(matches!(err, FeatureError::InvalidValue { .. }));
    }
}
