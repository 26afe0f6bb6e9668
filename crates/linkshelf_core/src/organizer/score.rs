//! Tag scoring signals and the suggestion pipeline.
//!
//! # Responsibility
//! - Compute domain-affinity, recent-activity and similarity signals for one
//!   candidate tag.
//! - Combine signals into a weighted confidence with source attribution.
//! - Produce ranked tag suggestions with human-readable reasons.
//!
//! # Invariants
//! - Every sub-score and the aggregate stay in `[0, 1]`.
//! - A signal counts as a source only above the 0.1 threshold.
//! - Suggestion output is a pure function of (store state, `now_ms`): equal
//!   scores order by tag name.

use crate::model::bookmark::UserId;
use crate::organizer::catalog::{classify_host, host_of};
use crate::repo::bookmark_repo::{normalize_tag, RepoResult};
use crate::repo::organizer_store::OrganizerStore;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Activity window used by the aggregator unless the caller overrides it.
pub const DEFAULT_ACTIVITY_WINDOW_DAYS: u32 = 7;
/// Sub-score above which a signal counts as a suggestion source; aggregate
/// scores at or below it are filtered out of suggestion lists.
pub const SOURCE_THRESHOLD: f64 = 0.1;

const DOMAIN_CONFIDENCE_CEILING: f64 = 100.0;
const SIMILARITY_SAMPLE_LIMIT: u32 = 100;
const MS_PER_DAY: i64 = 86_400_000;
const MIN_TOKEN_CHARS: usize = 3;
const MAX_TOKEN_CHARS: usize = 29;

static URL_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s/-]").expect("valid url token regex"));

/// Caller-supplied blend of the three signals.
///
/// Weights are intentionally not validated to sum to 1; a caller disables a
/// signal by setting its weight to 0. The aggregate clamp keeps the combined
/// value in range regardless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub domain: f64,
    pub activity: f64,
    pub similarity: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            domain: 0.35,
            activity: 0.40,
            similarity: 0.25,
        }
    }
}

/// Which signals contributed materially (> 0.1) to a score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFlags {
    pub domain: bool,
    pub activity: bool,
    pub similarity: bool,
}

/// The dominant signal behind one suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Domain,
    Activity,
    Similarity,
}

/// Sub-scores and their weighted combination for one (url, tag) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub domain_score: f64,
    pub activity_score: f64,
    pub similarity_score: f64,
    pub aggregate_score: f64,
    pub sources: SourceFlags,
}

/// Domain affinity outcome with the counts behind it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DomainSignal {
    /// `frequency * min(total / 100, 1)`, in `[0, 1]`.
    pub score: f64,
    /// Bookmarks on the domain carrying the tag.
    pub tagged: u32,
    /// All bookmarks on the domain.
    pub total: u32,
}

/// Recent activity outcome with the counts behind it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActivitySignal {
    /// Recency-boosted tag frequency, in `[0, 1]`.
    pub score: f64,
    /// Recently created bookmarks carrying the tag.
    pub tagged: u32,
    /// All recently created bookmarks.
    pub total: u32,
    /// Window the counts were computed over.
    pub window_days: u32,
}

/// Token-overlap similarity outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimilaritySignal {
    pub score: f64,
}

/// Full assessment of one candidate tag: the public breakdown plus the
/// per-signal counts the reason generator interpolates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagAssessment {
    pub breakdown: ScoreBreakdown,
    pub domain: DomainSignal,
    pub activity: ActivitySignal,
    pub similarity: SimilaritySignal,
}

/// One ranked tag suggestion, ready for the outer surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSuggestion {
    pub tag: String,
    pub score: f64,
    pub source: SignalSource,
    pub reason: String,
}

/// Frequency of `tag` among the user's bookmarks on `domain`, dampened for
/// domains with few bookmarks.
pub fn domain_affinity<S: OrganizerStore>(
    store: &S,
    user: UserId,
    domain: &str,
    tag: &str,
) -> RepoResult<DomainSignal> {
    let total = store.count_domain_bookmarks(user, domain)?;
    if total == 0 {
        return Ok(DomainSignal::default());
    }

    let tagged = store.count_domain_bookmarks_with_tag(user, domain, tag)?;
    let frequency = f64::from(tagged) / f64::from(total);
    let scale = (f64::from(total) / DOMAIN_CONFIDENCE_CEILING).min(1.0);
    Ok(DomainSignal {
        score: clamp01(frequency * scale),
        tagged,
        total,
    })
}

/// Recency-boosted frequency of `tag` among bookmarks created in the last
/// `window_days` days.
pub fn recent_activity<S: OrganizerStore>(
    store: &S,
    user: UserId,
    tag: &str,
    window_days: u32,
    now_ms: i64,
) -> RepoResult<ActivitySignal> {
    let since_ms = now_ms - i64::from(window_days) * MS_PER_DAY;
    let total = store.count_created_since(user, since_ms)?;
    if total == 0 {
        return Ok(ActivitySignal {
            window_days,
            ..ActivitySignal::default()
        });
    }

    let tagged = store.count_created_since_with_tag(user, since_ms, tag)?;
    let frequency = f64::from(tagged) / f64::from(total);
    Ok(ActivitySignal {
        score: clamp01(frequency * recency_boost(window_days)),
        tagged,
        total,
        window_days,
    })
}

/// Frequency of `tag` among sampled bookmarks sharing URL tokens with `url`,
/// log-boosted by the absolute number of tagged matches.
pub fn similarity<S: OrganizerStore>(
    store: &S,
    user: UserId,
    url: &str,
    tag: &str,
) -> RepoResult<SimilaritySignal> {
    let tokens = tokenize_url(url);
    if tokens.is_empty() {
        return Ok(SimilaritySignal::default());
    }

    let digests = store.sample_digests(user, SIMILARITY_SAMPLE_LIMIT)?;
    let mut match_count: u32 = 0;
    let mut tag_count: u32 = 0;
    for digest in &digests {
        let url_text = digest.url.to_lowercase();
        let tag_text = digest.tags.join(" ");
        let matches = tokens
            .iter()
            .any(|token| url_text.contains(token.as_str()) || tag_text.contains(token.as_str()));
        if !matches {
            continue;
        }

        match_count += 1;
        if digest.tags.iter().any(|name| name == tag) {
            tag_count += 1;
        }
    }

    if match_count == 0 {
        return Ok(SimilaritySignal::default());
    }

    let tag_frequency = f64::from(tag_count) / f64::from(match_count);
    let log_boost = f64::from(tag_count + 1).ln();
    Ok(SimilaritySignal {
        score: clamp01(tag_frequency * log_boost / 10.0),
    })
}

/// Combines the three signals for one (url, tag) pair.
///
/// An unparseable URL yields the all-zero assessment with no sources, never
/// an error.
pub fn assess_tag<S: OrganizerStore>(
    store: &S,
    user: UserId,
    url: &str,
    tag: &str,
    weights: ScoreWeights,
    now_ms: i64,
) -> RepoResult<TagAssessment> {
    let Some(domain) = host_of(url) else {
        return Ok(TagAssessment::default());
    };

    let domain_signal = domain_affinity(store, user, &domain, tag)?;
    let activity_signal = recent_activity(store, user, tag, DEFAULT_ACTIVITY_WINDOW_DAYS, now_ms)?;
    let similarity_signal = similarity(store, user, url, tag)?;

    let aggregate = clamp01(
        domain_signal.score * weights.domain
            + activity_signal.score * weights.activity
            + similarity_signal.score * weights.similarity,
    );

    Ok(TagAssessment {
        breakdown: ScoreBreakdown {
            domain_score: domain_signal.score,
            activity_score: activity_signal.score,
            similarity_score: similarity_signal.score,
            aggregate_score: aggregate,
            sources: SourceFlags {
                domain: domain_signal.score > SOURCE_THRESHOLD,
                activity: activity_signal.score > SOURCE_THRESHOLD,
                similarity: similarity_signal.score > SOURCE_THRESHOLD,
            },
        },
        domain: domain_signal,
        activity: activity_signal,
        similarity: similarity_signal,
    })
}

/// Picks the dominant signal. Ties break toward domain, then activity.
pub fn top_source(breakdown: &ScoreBreakdown) -> SignalSource {
    if breakdown.domain_score >= breakdown.activity_score
        && breakdown.domain_score >= breakdown.similarity_score
    {
        SignalSource::Domain
    } else if breakdown.activity_score >= breakdown.similarity_score {
        SignalSource::Activity
    } else {
        SignalSource::Similarity
    }
}

/// Renders the justification sentence for the dominant signal.
pub fn explain(tag: &str, domain: &str, assessment: &TagAssessment) -> String {
    match top_source(&assessment.breakdown) {
        SignalSource::Domain => {
            let pct = if assessment.domain.total == 0 {
                0
            } else {
                (100.0 * f64::from(assessment.domain.tagged) / f64::from(assessment.domain.total))
                    .round() as u32
            };
            format!("{pct}% of {domain} bookmarks use this tag")
        }
        SignalSource::Activity => format!(
            "Added {} bookmarks with this tag in the last {} days",
            assessment.activity.tagged, assessment.activity.window_days
        ),
        SignalSource::Similarity => {
            format!("Similar to other bookmarks you've tagged with \"{tag}\"")
        }
    }
}

/// Scores every candidate tag for `url` and returns the ranked shortlist.
///
/// Candidates are the union of the domain's seed tags, the user's tag
/// vocabulary, and tags already used on bookmarks from the same domain.
pub fn suggest_tags<S: OrganizerStore>(
    store: &S,
    user: UserId,
    url: &str,
    limit: usize,
    weights: ScoreWeights,
    now_ms: i64,
) -> RepoResult<Vec<TagSuggestion>> {
    let Some(domain) = host_of(url) else {
        return Ok(Vec::new());
    };

    let mut candidates: BTreeSet<String> = BTreeSet::new();
    for tag in classify_host(&domain).tags {
        if let Some(normalized) = normalize_tag(&tag) {
            candidates.insert(normalized);
        }
    }
    for tag in store.tag_vocabulary(user)? {
        if let Some(normalized) = normalize_tag(&tag) {
            candidates.insert(normalized);
        }
    }
    for usage in store.domain_tag_distribution(user, &domain)? {
        if let Some(normalized) = normalize_tag(&usage.name) {
            candidates.insert(normalized);
        }
    }

    let mut suggestions = Vec::new();
    for tag in &candidates {
        let assessment = assess_tag(store, user, url, tag, weights, now_ms)?;
        if assessment.breakdown.aggregate_score <= SOURCE_THRESHOLD {
            continue;
        }

        suggestions.push(TagSuggestion {
            tag: tag.clone(),
            score: assessment.breakdown.aggregate_score,
            source: top_source(&assessment.breakdown),
            reason: explain(tag, &domain, &assessment),
        });
    }

    suggestions.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.tag.cmp(&b.tag)));
    suggestions.truncate(limit);
    Ok(suggestions)
}

/// Splits a URL into lowercase tokens usable for overlap matching.
///
/// Characters outside `[a-z0-9\s/-]` become separators; tokens shorter than
/// 3 or longer than 29 characters are discarded.
pub fn tokenize_url(url: &str) -> Vec<String> {
    let lowered = url.to_lowercase();
    let cleaned = URL_TOKEN_RE.replace_all(&lowered, " ");
    cleaned
        .split_whitespace()
        .filter(|token| (MIN_TOKEN_CHARS..=MAX_TOKEN_CHARS).contains(&token.len()))
        .map(str::to_string)
        .collect()
}

fn recency_boost(window_days: u32) -> f64 {
    if window_days <= 7 {
        1.2
    } else if window_days <= 14 {
        0.9
    } else {
        0.5
    }
}

pub(crate) fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::{
        assess_tag, domain_affinity, explain, recent_activity, similarity, suggest_tags,
        tokenize_url, top_source, ActivitySignal, DomainSignal, ScoreBreakdown, ScoreWeights,
        SignalSource, TagAssessment,
    };
    use crate::organizer::testing::{FakeBookmark, FakeStore};

    const NOW_MS: i64 = 1_700_000_000_000;
    const DAY_MS: i64 = 86_400_000;

    fn round2(value: f64) -> f64 {
        (value * 100.0).round() / 100.0
    }

    fn github_bookmark(tags: &[&str], created_at: i64) -> FakeBookmark {
        FakeBookmark {
            url: "https://github.com/rust-lang/rust".to_string(),
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
            created_at,
            click_count: 0,
        }
    }

    #[test]
    fn tokenize_url_discards_short_and_long_tokens() {
        let tokens = tokenize_url("https://github.com/a/rust-lang");
        assert!(tokens.contains(&"github".to_string()));
        assert!(!tokens.iter().any(|token| token == "a"));
        assert!(tokens.iter().all(|token| token.len() > 2 && token.len() < 30));
    }

    #[test]
    fn domain_affinity_is_zero_without_domain_bookmarks() {
        let store = FakeStore::new(Vec::new());
        let signal = domain_affinity(&store, store.user, "github.com", "rust").unwrap();
        assert_eq!(signal.score, 0.0);
        assert_eq!(signal.total, 0);
    }

    #[test]
    fn domain_affinity_dampens_small_domains() {
        // 3 bookmarks on the domain, 2 tagged: (2/3) * (3/100) = 0.02.
        let store = FakeStore::new(vec![
            github_bookmark(&["rust"], NOW_MS),
            github_bookmark(&["rust"], NOW_MS),
            github_bookmark(&["cli"], NOW_MS),
        ]);
        let signal = domain_affinity(&store, store.user, "github.com", "rust").unwrap();
        assert_eq!(round2(signal.score), 0.02);
        assert_eq!(signal.tagged, 2);
        assert_eq!(signal.total, 3);
    }

    #[test]
    fn domain_affinity_with_full_frequency_still_scales() {
        // 2 bookmarks, both tagged: 1.0 * (2/100) = 0.02.
        let store = FakeStore::new(vec![
            github_bookmark(&["rust"], NOW_MS),
            github_bookmark(&["rust"], NOW_MS),
        ]);
        let signal = domain_affinity(&store, store.user, "github.com", "rust").unwrap();
        assert_eq!(round2(signal.score), 0.02);
    }

    #[test]
    fn recent_activity_applies_seven_day_boost() {
        // 2 recent bookmarks, 1 tagged: (1/2) * 1.2 = 0.6.
        let store = FakeStore::new(vec![
            github_bookmark(&["rust"], NOW_MS - DAY_MS),
            github_bookmark(&["cli"], NOW_MS - DAY_MS),
        ]);
        let signal = recent_activity(&store, store.user, "rust", 7, NOW_MS).unwrap();
        assert_eq!(round2(signal.score), 0.6);
        assert_eq!(signal.tagged, 1);
        assert_eq!(signal.total, 2);
    }

    #[test]
    fn recent_activity_caps_boosted_frequency_at_one() {
        let store = FakeStore::new(vec![
            github_bookmark(&["rust"], NOW_MS - DAY_MS),
            github_bookmark(&["rust"], NOW_MS - DAY_MS),
        ]);
        let signal = recent_activity(&store, store.user, "rust", 7, NOW_MS).unwrap();
        assert_eq!(signal.score, 1.0);
    }

    #[test]
    fn recent_activity_is_zero_without_recent_bookmarks() {
        let store = FakeStore::new(vec![github_bookmark(&["rust"], NOW_MS - 30 * DAY_MS)]);
        let signal = recent_activity(&store, store.user, "rust", 7, NOW_MS).unwrap();
        assert_eq!(signal.score, 0.0);
    }

    #[test]
    fn similarity_is_zero_for_tokenless_url() {
        let store = FakeStore::new(vec![github_bookmark(&["rust"], NOW_MS)]);
        let signal = similarity(&store, store.user, "??!", "rust").unwrap();
        assert_eq!(signal.score, 0.0);
    }

    #[test]
    fn similarity_scores_token_overlap() {
        let store = FakeStore::new(vec![
            github_bookmark(&["rust"], NOW_MS),
            github_bookmark(&["rust"], NOW_MS),
            FakeBookmark {
                url: "https://example.org/cooking".to_string(),
                tags: vec!["recipes".to_string()],
                created_at: NOW_MS,
                click_count: 0,
            },
        ]);
        let signal = similarity(
            &store,
            store.user,
            "https://github.com/tokio-rs/tokio",
            "rust",
        )
        .unwrap();
        // 2 of 2 matching bookmarks tagged: 1.0 * ln(3) / 10.
        assert_eq!(round2(signal.score), round2(3.0_f64.ln() / 10.0));
    }

    #[test]
    fn assess_tag_keeps_every_score_in_unit_range() {
        let store = FakeStore::new(vec![
            github_bookmark(&["rust"], NOW_MS - DAY_MS),
            github_bookmark(&["rust"], NOW_MS - DAY_MS),
            github_bookmark(&["rust"], NOW_MS - DAY_MS),
        ]);
        let assessment = assess_tag(
            &store,
            store.user,
            "https://github.com/rust-lang/cargo",
            "rust",
            ScoreWeights::default(),
            NOW_MS,
        )
        .unwrap();

        let breakdown = assessment.breakdown;
        for score in [
            breakdown.domain_score,
            breakdown.activity_score,
            breakdown.similarity_score,
            breakdown.aggregate_score,
        ] {
            assert!((0.0..=1.0).contains(&score), "score out of range: {score}");
        }
    }

    #[test]
    fn assess_tag_returns_zero_for_unparseable_url() {
        let store = FakeStore::new(vec![github_bookmark(&["rust"], NOW_MS)]);
        let assessment = assess_tag(
            &store,
            store.user,
            "not-a-url",
            "rust",
            ScoreWeights::default(),
            NOW_MS,
        )
        .unwrap();
        assert_eq!(assessment.breakdown, ScoreBreakdown::default());
        assert!(!assessment.breakdown.sources.domain);
        assert!(!assessment.breakdown.sources.activity);
        assert!(!assessment.breakdown.sources.similarity);
    }

    #[test]
    fn zero_weight_disables_a_signal() {
        let store = FakeStore::new(vec![
            github_bookmark(&["rust"], NOW_MS - DAY_MS),
            github_bookmark(&["rust"], NOW_MS - DAY_MS),
        ]);
        let weights = ScoreWeights {
            domain: 0.0,
            activity: 0.0,
            similarity: 0.0,
        };
        let assessment = assess_tag(
            &store,
            store.user,
            "https://github.com/rust-lang/rust",
            "rust",
            weights,
            NOW_MS,
        )
        .unwrap();
        assert_eq!(assessment.breakdown.aggregate_score, 0.0);
    }

    #[test]
    fn top_source_breaks_ties_toward_domain_then_activity() {
        let mut breakdown = ScoreBreakdown {
            domain_score: 0.5,
            activity_score: 0.5,
            similarity_score: 0.5,
            ..ScoreBreakdown::default()
        };
        assert_eq!(top_source(&breakdown), SignalSource::Domain);

        breakdown.domain_score = 0.1;
        assert_eq!(top_source(&breakdown), SignalSource::Activity);

        breakdown.activity_score = 0.2;
        breakdown.similarity_score = 0.4;
        assert_eq!(top_source(&breakdown), SignalSource::Similarity);
    }

    #[test]
    fn explain_interpolates_domain_percentage() {
        let assessment = TagAssessment {
            breakdown: ScoreBreakdown {
                domain_score: 0.5,
                activity_score: 0.2,
                similarity_score: 0.1,
                aggregate_score: 0.3,
                ..ScoreBreakdown::default()
            },
            domain: DomainSignal {
                score: 0.5,
                tagged: 2,
                total: 3,
            },
            ..TagAssessment::default()
        };
        let reason = explain("rust", "github.com", &assessment);
        assert_eq!(reason, "67% of github.com bookmarks use this tag");
    }

    #[test]
    fn explain_interpolates_activity_count_and_window() {
        let assessment = TagAssessment {
            breakdown: ScoreBreakdown {
                domain_score: 0.1,
                activity_score: 0.6,
                similarity_score: 0.2,
                aggregate_score: 0.3,
                ..ScoreBreakdown::default()
            },
            activity: ActivitySignal {
                score: 0.6,
                tagged: 3,
                total: 5,
                window_days: 7,
            },
            ..TagAssessment::default()
        };
        let reason = explain("rust", "github.com", &assessment);
        assert_eq!(reason, "Added 3 bookmarks with this tag in the last 7 days");
    }

    #[test]
    fn suggest_tags_filters_sorts_and_truncates() {
        let mut bookmarks = Vec::new();
        for _ in 0..4 {
            bookmarks.push(github_bookmark(&["rust", "opensource"], NOW_MS - DAY_MS));
        }
        bookmarks.push(FakeBookmark {
            url: "https://example.org/unrelated".to_string(),
            tags: vec!["cooking".to_string()],
            created_at: NOW_MS - 60 * DAY_MS,
            click_count: 0,
        });
        let store = FakeStore::new(bookmarks);

        let suggestions = suggest_tags(
            &store,
            store.user,
            "https://github.com/rust-lang/rust",
            5,
            ScoreWeights::default(),
            NOW_MS,
        )
        .unwrap();

        assert!(!suggestions.is_empty());
        assert!(suggestions.len() <= 5);
        assert!(suggestions.iter().all(|s| s.score > 0.1));
        assert!(suggestions
            .windows(2)
            .all(|pair| pair[0].score >= pair[1].score));
        assert!(!suggestions.iter().any(|s| s.tag == "cooking"));
    }

    #[test]
    fn suggest_tags_is_empty_for_unparseable_url() {
        let store = FakeStore::new(vec![github_bookmark(&["rust"], NOW_MS)]);
        let suggestions = suggest_tags(
            &store,
            store.user,
            "not-a-url",
            5,
            ScoreWeights::default(),
            NOW_MS,
        )
        .unwrap();
        assert!(suggestions.is_empty());
    }

    #[test]
    fn suggest_tags_is_deterministic_for_unchanged_store() {
        let store = FakeStore::new(vec![
            github_bookmark(&["rust", "cli"], NOW_MS - DAY_MS),
            github_bookmark(&["rust"], NOW_MS - DAY_MS),
            github_bookmark(&["opensource"], NOW_MS - DAY_MS),
        ]);
        let url = "https://github.com/rust-lang/rust";
        let first = suggest_tags(&store, store.user, url, 10, ScoreWeights::default(), NOW_MS)
            .unwrap();
        let second = suggest_tags(&store, store.user, url, 10, ScoreWeights::default(), NOW_MS)
            .unwrap();
        assert_eq!(first, second);
    }
}
