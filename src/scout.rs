//! Best-effort venue scouting: web search, model extraction, dedup insert.
//! Every stage past configuration is allowed to fail without sinking the
//! run; the report carries whatever progress was made.

use std::collections::HashSet;
use std::env;
use std::sync::Arc;

use diesel::pg::PgConnection;
use diesel::QueryResult;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tables::{DbPool, Location, NewVenue, Venue, VenueCategory, VenueStatus};

pub const DEFAULT_MAX_RESULTS: usize = 10;
const RESULTS_PER_QUERY: usize = 10;

const SEARCH_KEY_VAR: &str = "BRAVE_SEARCH_API_KEY";
const LLM_KEY_VAR: &str = "ANTHROPIC_API_KEY";

const SEARCH_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";
const LLM_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const LLM_MODEL: &str = "claude-3-5-sonnet-20241022";

const SWEEP_CITIES: &[&str] = &[
    "New York",
    "Los Angeles",
    "Chicago",
    "Miami",
    "Montreal",
    "Mexico City",
    "London",
    "Berlin",
    "Amsterdam",
    "Tokyo",
];

const SWEEP_TEMPLATES: &[&str] = &[
    "art venues accepting installation proposals in {}",
    "galleries open to new media artists in {}",
    "museums commissioning interactive art in {}",
    "light art festivals call for submissions in {}",
];

const GENERIC_QUERIES: &[&str] = &[
    "immersive art venues accepting artist submissions",
    "new media art festival open call",
    "public art commission installation artists",
];

const FOCUS_TEMPLATES: &[&str] = &[
    "{} venues accepting artist submissions",
    "{} galleries or museums open call",
    "{} festivals commissioning installation art",
    "{} art spaces submission guidelines",
];

const EXTRACTION_RUBRIC: &str = "\
You review web search results for an installation artist scouting venues. \
Keep a result only if all of the following hold: it is a real venue, \
institution, or festival (not a listicle, agency, or news article); it \
shows or commissions installation-adjacent art; it has a physical \
presence; and it plausibly accepts submissions or proposals from outside \
artists. Reply with only a JSON array, one object per qualifying venue, \
using the keys name, url, submission_form_url, city, state, country, and \
reason. Use null for anything unknown. Reply with [] if nothing qualifies.";

#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("{0} is not set in the environment")]
    MissingApiKey(&'static str),
    #[error("database pool exhausted")]
    Pool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScoutParams {
    pub search_focus: Option<String>,
    pub max_results: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ScoutReport {
    pub inserted: usize,
    pub skipped: usize,
    pub searched: usize,
}

#[derive(Clone, Debug)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub description: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Candidate {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub submission_form_url: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

pub fn focus_queries(focus: &str) -> Vec<String> {
    FOCUS_TEMPLATES
        .iter()
        .map(|template| template.replace("{}", focus))
        .collect()
}

/// Five random city/template pairings plus the three generic sweeps.
pub fn sweep_queries(rng: &mut impl Rng) -> Vec<String> {
    let mut queries: Vec<String> = SWEEP_CITIES
        .choose_multiple(rng, 5)
        .map(|city| {
            let template = SWEEP_TEMPLATES.choose(rng).unwrap_or(&SWEEP_TEMPLATES[0]);
            template.replace("{}", city)
        })
        .collect();
    queries.extend(GENERIC_QUERIES.iter().map(|q| q.to_string()));
    queries
}

/// Hostname with any leading `www.` stripped, lowercased.
pub fn normalized_domain(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    Some(host.to_ascii_lowercase())
}

/// First occurrence per domain wins; hits without a parseable host drop out.
pub fn dedup_by_domain(hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for hit in hits {
        match normalized_domain(&hit.url) {
            Some(domain) => {
                if seen.insert(domain) {
                    unique.push(hit);
                }
            }
            None => tracing::debug!("Dropping result with unparseable url: {}", hit.url),
        }
    }
    unique
}

/// The numbered digest the extraction model reads.
pub fn digest(hits: &[SearchHit]) -> String {
    let mut lines = Vec::with_capacity(hits.len());
    for (n, hit) in hits.iter().enumerate() {
        lines.push(format!(
            "{}. {}\n   {}\n   {}",
            n + 1,
            hit.title,
            hit.url,
            hit.description
        ));
    }
    lines.join("\n")
}

/// The outermost bracketed span of the reply. The model is asked for a bare
/// array but often wraps it in prose.
pub fn extract_json_array(reply: &str) -> Option<&str> {
    let start = reply.find('[')?;
    let end = reply.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&reply[start..=end])
}

pub fn parse_candidates(reply: &str) -> Option<Vec<Candidate>> {
    serde_json::from_str(extract_json_array(reply)?).ok()
}

async fn web_search(
    client: &reqwest::Client,
    api_key: &str,
    query: &str,
) -> Result<Vec<SearchHit>, reqwest::Error> {
    let body: serde_json::Value = client
        .get(SEARCH_ENDPOINT)
        .query(&[("q", query), ("count", &RESULTS_PER_QUERY.to_string())])
        .header("Accept", "application/json")
        .header("X-Subscription-Token", api_key)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let results = body["web"]["results"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    Ok(results
        .iter()
        .filter_map(|result| {
            Some(SearchHit {
                title: result["title"].as_str()?.to_string(),
                url: result["url"].as_str()?.to_string(),
                description: result["description"].as_str().unwrap_or("").to_string(),
            })
        })
        .collect())
}

async fn request_extraction(
    client: &reqwest::Client,
    api_key: &str,
    digest: &str,
) -> Result<String, reqwest::Error> {
    let body: serde_json::Value = client
        .post(LLM_ENDPOINT)
        .header("x-api-key", api_key)
        .header("anthropic-version", "2023-06-01")
        .json(&serde_json::json!({
            "model": LLM_MODEL,
            "max_tokens": 2048,
            "system": EXTRACTION_RUBRIC,
            "messages": [{"role": "user", "content": digest}]
        }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(body["content"][0]["text"].as_str().unwrap_or("").to_string())
}

fn insert_candidate(conn: &mut PgConnection, candidate: &Candidate) -> QueryResult<bool> {
    if Venue::find_by_name(conn, &candidate.name)?.is_some() {
        return Ok(false);
    }
    let location = Location {
        city: candidate.city.clone(),
        state: candidate.state.clone(),
        country: candidate.country.clone(),
        phone_number: None,
    };
    let notes = match &candidate.reason {
        Some(reason) => format!("[Scout] {}", reason),
        None => "[Scout]".to_string(),
    };
    Venue::create(
        conn,
        NewVenue {
            name: candidate.name.clone(),
            url: candidate.url.clone(),
            submission_form_url: candidate.submission_form_url.clone(),
            locations: vec![location],
            status: Some(VenueStatus::ToContact),
            category: Some(VenueCategory::ForReview),
            notes: Some(notes),
        },
    )?;
    Ok(true)
}

/// Inserts up to `max` candidates, skipping exact name matches against the
/// existing venues. A failed insert is logged and counted, never fatal.
pub fn insert_candidates(
    conn: &mut PgConnection,
    candidates: Vec<Candidate>,
    max: usize,
    searched: usize,
) -> ScoutReport {
    let mut inserted = 0;
    let mut skipped = 0;
    for candidate in candidates.into_iter().take(max) {
        match insert_candidate(conn, &candidate) {
            Ok(true) => inserted += 1,
            Ok(false) => skipped += 1,
            Err(err) => {
                tracing::warn!("Could not insert scouted venue '{}': {}", candidate.name, err);
                skipped += 1;
            }
        }
    }
    ScoutReport {
        inserted,
        skipped,
        searched,
    }
}

/// Runs the full pipeline. Only missing configuration or an exhausted pool
/// is an error; search, extraction, and insert failures degrade to smaller
/// counts in the report.
pub async fn run(db_pool: Arc<DbPool>, params: ScoutParams) -> Result<ScoutReport, ScoutError> {
    let search_key =
        env::var(SEARCH_KEY_VAR).map_err(|_| ScoutError::MissingApiKey(SEARCH_KEY_VAR))?;
    let llm_key = env::var(LLM_KEY_VAR).map_err(|_| ScoutError::MissingApiKey(LLM_KEY_VAR))?;
    let client = reqwest::Client::new();

    let queries = match &params.search_focus {
        Some(focus) => focus_queries(focus),
        None => sweep_queries(&mut rand::thread_rng()),
    };

    let mut hits = Vec::new();
    for query in &queries {
        match web_search(&client, &search_key, query).await {
            Ok(batch) => hits.extend(batch),
            Err(err) => tracing::warn!("Search query '{}' failed: {}", query, err),
        }
    }
    let hits = dedup_by_domain(hits);
    let searched = hits.len();
    tracing::info!("Scout gathered {} unique domains from {} queries", searched, queries.len());
    if hits.is_empty() {
        return Ok(ScoutReport {
            searched,
            ..ScoutReport::default()
        });
    }

    let reply = match request_extraction(&client, &llm_key, &digest(&hits)).await {
        Ok(reply) => reply,
        Err(err) => {
            tracing::warn!("Venue extraction call failed: {}", err);
            return Ok(ScoutReport {
                searched,
                ..ScoutReport::default()
            });
        }
    };
    let candidates = match parse_candidates(&reply) {
        Some(candidates) => candidates,
        None => {
            tracing::warn!("No candidate array found in the model reply");
            return Ok(ScoutReport {
                searched,
                ..ScoutReport::default()
            });
        }
    };

    let mut conn = db_pool.get().map_err(|_| ScoutError::Pool)?;
    let max = params.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
    Ok(insert_candidates(&mut conn, candidates, max, searched))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tables::harness::{to_pg_db_name, DbHarness};
    use crate::tables::test::MIGRATIONS;
    use function_name::named;

    fn hit(url: &str) -> SearchHit {
        SearchHit {
            title: "A venue".to_string(),
            url: url.to_string(),
            description: "".to_string(),
        }
    }

    #[test]
    fn test_normalized_domain_strips_www() {
        assert_eq!(
            normalized_domain("https://www.a.com/x"),
            Some("a.com".to_string())
        );
        assert_eq!(normalized_domain("https://a.com/y"), Some("a.com".to_string()));
        assert_eq!(normalized_domain("not a url"), None);
    }

    #[test]
    fn test_dedup_by_domain_first_wins() {
        let unique = dedup_by_domain(vec![
            hit("https://a.com/x"),
            hit("https://www.a.com/y"),
            hit("https://b.org/z"),
        ]);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].url, "https://a.com/x");
        assert_eq!(unique[1].url, "https://b.org/z");
    }

    #[test]
    fn test_focus_queries_fill_templates() {
        let queries = focus_queries("sound art");
        assert_eq!(queries.len(), 4);
        assert!(queries.iter().all(|q| q.contains("sound art")));
    }

    #[test]
    fn test_sweep_queries_count() {
        let queries = sweep_queries(&mut rand::thread_rng());
        assert_eq!(queries.len(), 8);
    }

    #[test]
    fn test_parse_candidates_from_prose_reply() {
        let reply = "Here are the venues I found:\n\
            [{\"name\": \"Lumen Hall\", \"url\": \"https://lumen.example\", \
              \"city\": \"Chicago\"}]\nLet me know if you need more.";
        let candidates = parse_candidates(reply).expect("candidates");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Lumen Hall");
        assert_eq!(candidates[0].city.as_deref(), Some("Chicago"));
        assert_eq!(candidates[0].state, None);
    }

    #[test]
    fn test_parse_candidates_rejects_missing_array() {
        assert!(parse_candidates("I could not find any venues.").is_none());
        assert!(parse_candidates("]: oops :[").is_none());
    }

    #[test]
    fn test_digest_numbers_results() {
        let text = digest(&[hit("https://a.com"), hit("https://b.org")]);
        assert!(text.starts_with("1. "));
        assert!(text.contains("\n2. "));
    }

    fn candidate(name: &str) -> Candidate {
        Candidate {
            name: name.to_string(),
            url: None,
            submission_form_url: None,
            city: Some("Chicago".to_string()),
            state: None,
            country: None,
            reason: Some("shows installation work".to_string()),
        }
    }

    #[test]
    #[named]
    fn test_insert_skips_existing_name() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        let existing = Venue::create(
            &mut conn,
            crate::tables::NewVenue {
                name: "Lumen Hall".to_string(),
                ..crate::tables::NewVenue::default()
            },
        )
        .expect("venue");

        let report = insert_candidates(
            &mut conn,
            vec![candidate("Lumen Hall"), candidate("Triennale")],
            DEFAULT_MAX_RESULTS,
            2,
        );
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.searched, 2);

        // The existing venue is untouched.
        let unchanged = Venue::get(&mut conn, existing.id).expect("venue");
        assert_eq!(existing, unchanged);

        let scouted = Venue::find_by_name(&mut conn, "Triennale")
            .expect("query")
            .expect("scouted venue");
        assert_eq!(scouted.status, VenueStatus::ToContact);
        assert_eq!(scouted.category, VenueCategory::ForReview);
        assert_eq!(scouted.order_num, 2);
        assert!(scouted.notes.as_deref().unwrap_or("").starts_with("[Scout]"));
    }

    #[test]
    #[named]
    fn test_insert_respects_max() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        let report = insert_candidates(
            &mut conn,
            (0..5).map(|n| candidate(&format!("Venue {}", n))).collect(),
            3,
            5,
        );
        assert_eq!(report.inserted, 3);
        assert_eq!(Venue::list(&mut conn).expect("list").len(), 3);
    }
}
