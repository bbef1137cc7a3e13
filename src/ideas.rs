//! Append, list, iterate and clear over the stored idea collection.
//!
//! Ideas are only ever appended or cleared as a whole, so an idea's position
//! in the collection is its identity: `list-ideas` reports it as `index` and
//! `iterate-idea` looks ideas up by it. The generated `id` is for display.

use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;
use serde_json::Value;

use crate::error::{ServiceError, ServiceResult};
use crate::storage::DocumentStore;
use crate::types::{AppendOutcome, Idea, IdeaDraft, IdeaListing, IndexedIdea, Iteration};

pub const DEFAULT_DIRECTION: &str = "expand";
pub const KNOWN_DIRECTIONS: [&str; 4] = ["expand", "simplify", "combine", "pivot"];

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Filters for [`IdeaRepository::list`].
#[derive(Clone, Debug, Default)]
pub struct IdeaQuery {
    /// Keep only the last `limit` matches. `None` and `Some(0)` keep all.
    pub limit: Option<usize>,
    /// Case-insensitive substring matched against the idea's JSON form.
    pub search: Option<String>,
}

pub struct IdeaRepository<'a> {
    store: &'a DocumentStore,
}

impl<'a> IdeaRepository<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    pub fn count(&self) -> usize {
        self.store.load().suggested_ideas.len()
    }

    /// Stamps every draft with an id and a shared timestamp and appends them
    /// in order.
    #[tracing::instrument(skip_all, fields(batch = drafts.len()))]
    pub fn append(&self, drafts: Vec<IdeaDraft>) -> ServiceResult<AppendOutcome> {
        if drafts.is_empty() {
            return Err(ServiceError::Validation(
                "Ideas must be a non-empty array".to_string(),
            ));
        }

        let timestamp = Utc::now().trunc_subsecs(3);
        let ideas = stamp_ideas(drafts, timestamp);
        let saved_count = ideas.len();

        let total_ideas = self.store.update(|doc| {
            doc.suggested_ideas.extend(ideas);
            Ok::<_, ServiceError>(doc.suggested_ideas.len())
        })?;
        tracing::info!(saved_count, total_ideas, "saved ideas");

        Ok(AppendOutcome {
            saved_count,
            total_ideas,
            timestamp,
        })
    }

    pub fn list(&self, query: &IdeaQuery) -> IdeaListing {
        select_ideas(&self.store.load().suggested_ideas, query)
    }

    /// Returns the idea stored at `index` together with the requested
    /// direction. Any direction is accepted; an empty one means "expand".
    pub fn iterate(&self, index: i64, direction: Option<&str>) -> ServiceResult<Iteration> {
        let mut ideas = self.store.load().suggested_ideas;
        let len = ideas.len();
        let position = usize::try_from(index)
            .ok()
            .filter(|position| *position < len)
            .ok_or(ServiceError::Range { index, len })?;

        let direction = direction
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(DEFAULT_DIRECTION);
        if !KNOWN_DIRECTIONS.contains(&direction) {
            tracing::debug!(direction, "iterating with a custom direction");
        }

        Ok(Iteration {
            original_idea: ideas.swap_remove(position),
            iteration_direction: direction.to_string(),
        })
    }

    /// Drops every stored idea. The cached repository status is kept.
    pub fn clear(&self, confirm: bool) -> ServiceResult<usize> {
        if !confirm {
            return Err(ServiceError::Permission(
                "Must set confirm=true to clear idea history".to_string(),
            ));
        }

        let cleared = self.store.update(|doc| {
            Ok::<_, ServiceError>(std::mem::take(&mut doc.suggested_ideas).len())
        })?;
        tracing::info!(cleared, "cleared idea history");
        Ok(cleared)
    }
}

/// Validates a raw `ideas` argument: it must be a non-empty array whose
/// elements each carry at least `name` and `description`.
pub fn parse_drafts(raw: &Value) -> ServiceResult<Vec<IdeaDraft>> {
    let items = match raw.as_array() {
        Some(items) if !items.is_empty() => items,
        _ => {
            return Err(ServiceError::Validation(
                "Ideas must be a non-empty array".to_string(),
            ));
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            serde_json::from_value::<IdeaDraft>(item.clone()).map_err(|e| {
                ServiceError::Validation(format!("Idea at position {position} is invalid: {e}"))
            })
        })
        .collect()
}

/// Only the JSON boolean `true` confirms; `"true"`, `1` and friends do not.
pub fn parse_confirmation(raw: &Value) -> bool {
    matches!(raw, Value::Bool(true))
}

pub fn select_ideas(ideas: &[Idea], query: &IdeaQuery) -> IdeaListing {
    let needle = query
        .search
        .as_deref()
        .map(str::to_lowercase)
        .filter(|s| !s.is_empty());

    let matching: Vec<IndexedIdea> = ideas
        .iter()
        .enumerate()
        .filter(|(_, idea)| match &needle {
            Some(needle) => idea_matches(idea, needle),
            None => true,
        })
        .map(|(index, idea)| IndexedIdea {
            index,
            idea: idea.clone(),
        })
        .collect();

    let filtered_ideas = matching.len();
    // `limit` counts from the newest match, so it applies after the search.
    let skip = match query.limit {
        Some(limit) if limit > 0 => filtered_ideas.saturating_sub(limit),
        _ => 0,
    };
    let returned: Vec<IndexedIdea> = matching.into_iter().skip(skip).collect();

    IdeaListing {
        total_ideas: ideas.len(),
        filtered_ideas,
        returned_ideas: returned.len(),
        ideas: returned,
    }
}

fn idea_matches(idea: &Idea, needle: &str) -> bool {
    serde_json::to_string(idea)
        .map(|json| json.to_lowercase().contains(needle))
        .unwrap_or(false)
}

fn stamp_ideas(drafts: Vec<IdeaDraft>, timestamp: DateTime<Utc>) -> Vec<Idea> {
    let mut rng = rand::rng();
    let millis = Utc::now().timestamp_millis();
    drafts
        .into_iter()
        .enumerate()
        .map(|(sequence, draft)| {
            let id = idea_id(millis, sequence, &mut rng);
            Idea::from_draft(draft, id, timestamp)
        })
        .collect()
}

fn idea_id(millis: i64, sequence: usize, rng: &mut impl Rng) -> String {
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("idea_{millis}_{sequence}_{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use tempfile::{TempDir, tempdir};

    fn store() -> (TempDir, DocumentStore) {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("ideas.json"));
        store.ensure_exists().unwrap();
        (dir, store)
    }

    fn draft(name: &str, description: &str) -> IdeaDraft {
        IdeaDraft {
            name: name.to_string(),
            description: description.to_string(),
            features: None,
            category: None,
        }
    }

    fn drafts(names: &[&str]) -> Vec<IdeaDraft> {
        names.iter().map(|n| draft(n, "an idea")).collect()
    }

    #[test]
    fn append_counts_accumulate_across_calls() {
        let (_dir, store) = store();
        let repo = IdeaRepository::new(&store);
        let batches = [1usize, 3, 2, 5];
        let mut expected = 0;
        for (i, size) in batches.iter().enumerate() {
            let names: Vec<String> = (0..*size).map(|n| format!("b{i}-{n}")).collect();
            let batch = names.iter().map(|n| draft(n, "x")).collect();
            let outcome = repo.append(batch).unwrap();
            expected += size;
            assert_eq!(outcome.saved_count, *size);
            assert_eq!(outcome.total_ideas, expected);
        }
        assert_eq!(repo.count(), expected);
    }

    #[test]
    fn append_shares_timestamp_and_keeps_ids_unique() {
        let (_dir, store) = store();
        let repo = IdeaRepository::new(&store);
        let outcome = repo.append(drafts(&["a", "b", "c", "d"])).unwrap();

        let ideas = store.load().suggested_ideas;
        assert!(ideas.iter().all(|i| i.generated_at == outcome.timestamp));
        let ids: HashSet<_> = ideas.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
        assert!(ideas[2].id.starts_with("idea_"));
        assert!(ideas[2].id.contains("_2_"));
        assert_eq!(
            ideas.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c", "d"]
        );
    }

    #[test]
    fn empty_append_is_rejected_without_touching_the_file() {
        let (_dir, store) = store();
        let before = std::fs::read(store.path()).unwrap();
        let err = IdeaRepository::new(&store).append(Vec::new()).unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn parse_drafts_rejects_non_arrays_and_missing_fields() {
        for raw in [json!([]), json!({"name": "x"}), json!("ideas"), Value::Null] {
            let err = parse_drafts(&raw).unwrap_err();
            assert_eq!(err.kind(), "ValidationError");
        }

        let err = parse_drafts(&json!([{ "name": "only a name" }])).unwrap_err();
        assert!(err.to_string().contains("position 0"));

        let parsed = parse_drafts(&json!([
            { "name": "Step Coach", "description": "Counts steps", "features": ["pedometer"], "category": "health" }
        ]))
        .unwrap();
        assert_eq!(parsed[0].features.as_deref(), Some(&["pedometer".to_string()][..]));
    }

    #[test]
    fn confirmation_requires_boolean_true() {
        assert!(parse_confirmation(&json!(true)));
        for raw in [json!("true"), json!(1), json!(false), Value::Null, json!({})] {
            assert!(!parse_confirmation(&raw));
        }
    }

    #[test]
    fn iterate_rejects_out_of_range_positions() {
        let (_dir, store) = store();
        let repo = IdeaRepository::new(&store);
        repo.append(drafts(&["a", "b"])).unwrap();

        for index in [-1, 2, 99] {
            let err = repo.iterate(index, None).unwrap_err();
            assert!(matches!(err, ServiceError::Range { len: 2, .. }));
        }
    }

    #[test]
    fn iterate_returns_stored_idea_and_direction() {
        let (_dir, store) = store();
        let repo = IdeaRepository::new(&store);
        repo.append(drafts(&["a", "b", "c"])).unwrap();
        let stored = store.load().suggested_ideas[1].clone();

        let iteration = repo.iterate(1, Some("simplify")).unwrap();
        assert_eq!(iteration.original_idea, stored);
        assert_eq!(iteration.iteration_direction, "simplify");

        assert_eq!(repo.iterate(0, None).unwrap().iteration_direction, "expand");
        assert_eq!(repo.iterate(0, Some("")).unwrap().iteration_direction, "expand");
        assert_eq!(
            repo.iterate(0, Some("make it musical")).unwrap().iteration_direction,
            "make it musical"
        );
    }

    #[test]
    fn list_limit_keeps_newest_with_original_positions() {
        let (_dir, store) = store();
        let repo = IdeaRepository::new(&store);
        repo.append(drafts(&["a", "b", "c", "d", "e"])).unwrap();

        let listing = repo.list(&IdeaQuery {
            limit: Some(2),
            search: None,
        });
        assert_eq!(listing.total_ideas, 5);
        assert_eq!(listing.filtered_ideas, 5);
        assert_eq!(listing.returned_ideas, 2);
        let picked: Vec<_> = listing.ideas.iter().map(|i| (i.index, i.idea.name.as_str())).collect();
        assert_eq!(picked, vec![(3, "d"), (4, "e")]);

        let all = repo.list(&IdeaQuery {
            limit: Some(50),
            search: None,
        });
        assert_eq!(all.returned_ideas, 5);
        assert_eq!(repo.list(&IdeaQuery { limit: Some(0), search: None }).returned_ideas, 5);
    }

    #[test]
    fn list_search_is_case_insensitive_over_all_fields() {
        let (_dir, store) = store();
        let repo = IdeaRepository::new(&store);
        repo.append(vec![
            draft("Voice Notes", "records memos"),
            IdeaDraft {
                category: Some("Music".into()),
                ..draft("Beat Maker", "loops")
            },
            draft("Weather", "daily MUSIC-free forecast"),
            draft("Translator", "phrases"),
        ])
        .unwrap();

        let listing = repo.list(&IdeaQuery {
            limit: None,
            search: Some("music".into()),
        });
        assert_eq!(listing.total_ideas, 4);
        assert_eq!(listing.filtered_ideas, 2);
        let indices: Vec<_> = listing.ideas.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![1, 2]);

        // limit applies to the matches, newest first
        let newest_match = repo.list(&IdeaQuery {
            limit: Some(1),
            search: Some("MUSIC".into()),
        });
        assert_eq!(newest_match.ideas[0].index, 2);
    }

    #[test]
    fn clear_requires_confirmation_and_keeps_status_cache() {
        let (_dir, store) = store();
        let repo = IdeaRepository::new(&store);
        repo.append(drafts(&["a", "b", "c"])).unwrap();
        let mut doc = store.load();
        let checked = Utc::now().trunc_subsecs(3);
        doc.last_checked = Some(checked);
        store.save(&doc).unwrap();

        let err = repo.clear(false).unwrap_err();
        assert_eq!(err.kind(), "PermissionError");
        assert_eq!(repo.count(), 3);

        assert_eq!(repo.clear(true).unwrap(), 3);
        let after = store.load();
        assert!(after.suggested_ideas.is_empty());
        assert_eq!(after.last_checked, Some(checked));
        assert_eq!(repo.list(&IdeaQuery::default()).total_ideas, 0);
    }

    #[test]
    fn malformed_stored_idea_does_not_wipe_the_others_on_append() {
        let (_dir, store) = store();
        let stored = json!({
            "suggestedIdeas": [
                { "name": "A", "description": "valid", "id": "idea_1_0_a", "generatedAt": "2025-01-01T00:00:00.000Z" },
                { "name": "B", "description": "hand edited", "features": "voice", "id": "idea_1_1_b", "generatedAt": "2025-01-01T00:00:00.000Z" }
            ],
            "repoCache": null,
            "lastChecked": null
        });
        std::fs::write(store.path(), serde_json::to_string_pretty(&stored).unwrap()).unwrap();

        let repo = IdeaRepository::new(&store);
        assert_eq!(repo.count(), 1);
        let outcome = repo.append(drafts(&["C"])).unwrap();
        assert_eq!(outcome.total_ideas, 2);

        let names: Vec<String> = store
            .try_load()
            .unwrap()
            .suggested_ideas
            .into_iter()
            .map(|idea| idea.name)
            .collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn concurrent_appends_may_lose_data_but_never_fail() {
        let (_dir, store) = store();
        let writers = 8;
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..writers)
                .map(|n| {
                    let store = &store;
                    scope.spawn(move || {
                        IdeaRepository::new(store).append(vec![draft(&format!("w{n}"), "racing")])
                    })
                })
                .collect();
            for handle in handles {
                assert!(handle.join().unwrap().is_ok());
            }
        });

        // Last writer wins: anything between one and all of the ideas survives.
        let doc = store.try_load().unwrap();
        assert!((1..=writers).contains(&doc.suggested_ideas.len()));
    }

    #[test]
    fn idea_ids_use_lowercase_base36_suffix() {
        let id = idea_id(1_700_000_000_000, 4, &mut rand::rng());
        let suffix = id.rsplit('_').next().unwrap();
        assert!(id.starts_with("idea_1700000000000_4_"));
        assert_eq!(suffix.len(), ID_SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
    }
}
