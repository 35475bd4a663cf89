//! Exercise operations, run against both the SQLite and in-memory stores.

use albook::db::Database;
use albook::models::*;
use albook::query::{PageRequest, View};
use albook::scheduler::POOL_STAGE;
use albook::service;
use albook::store::{ExerciseStore, MemoryStore};
use albook::Error;
use chrono::{DateTime, Duration, TimeZone, Utc};
use speculate2::speculate;

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn input(title: &str) -> CreateExerciseInput {
    CreateExerciseInput {
        title: title.to_string(),
        ..Default::default()
    }
}

fn create(store: &dyn ExerciseStore, title: &str, resolved: DateTime<Utc>) -> i64 {
    service::create(
        store,
        CreateExerciseInput {
            resolve_date: Some(resolved),
            ..input(title)
        },
        resolved,
    )
    .expect("Failed to create exercise")
}

fn review_times(store: &dyn ExerciseStore, id: i64, times: usize, now: DateTime<Utc>) {
    for _ in 0..times {
        service::review(store, id, now).expect("Failed to review");
    }
}

fn page(store: &dyn ExerciseStore, view: View, search: Option<&str>, n: u32, now: DateTime<Utc>) -> ExercisePage {
    service::list(store, view, search, PageRequest::new(n).unwrap(), now).expect("Failed to list")
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
        let memory = MemoryStore::new();
        let stores: [&dyn ExerciseStore; 2] = [&db, &memory];
    }

    describe "create" {
        it "starts at stage zero due one day after resolving" {
            for store in stores {
                let id = create(store, "Two Sum", at(2024, 1, 1));
                let exercise = service::get(store, id).unwrap();

                assert_eq!(exercise.review_stage, 0);
                assert_eq!(exercise.review_count, 0);
                assert_eq!(exercise.resolve_date, at(2024, 1, 1));
                assert_eq!(exercise.next_review_date, at(2024, 1, 2));
                assert!(exercise.last_reviewed_at.is_none());
            }
        }

        it "defaults resolve_date to now" {
            for store in stores {
                let now = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
                let id = service::create(store, input("LRU Cache"), now).unwrap();
                let exercise = service::get(store, id).unwrap();

                assert_eq!(exercise.resolve_date, now);
                assert_eq!(exercise.created_at, now);
                assert_eq!(exercise.next_review_date, now + Duration::days(1));
            }
        }

        it "rejects a blank title" {
            for store in stores {
                let result = service::create(store, input("   "), at(2024, 1, 1));
                assert!(matches!(result, Err(Error::Validation(_))));

                let stats = service::stats(store, at(2024, 1, 1)).unwrap();
                assert_eq!(stats.total_count, 0);
            }
        }

        it "never reuses ids" {
            for store in stores {
                let first = create(store, "A", at(2024, 1, 1));
                service::delete(store, first).unwrap();
                let second = create(store, "B", at(2024, 1, 1));

                assert!(second > first);
            }
        }
    }

    describe "review" {
        it "moves a new exercise to stage one" {
            for store in stores {
                let id = create(store, "Two Sum", at(2024, 1, 1));
                let reviewed = service::review(store, id, at(2024, 1, 5)).unwrap();

                assert_eq!(reviewed.review_stage, 1);
                assert_eq!(reviewed.review_count, 1);
                assert_eq!(reviewed.next_review_date, at(2024, 1, 8));
                assert_eq!(reviewed.last_reviewed_at, Some(at(2024, 1, 5)));
                assert_eq!(service::get(store, id).unwrap(), reviewed);
            }
        }

        it "climbs to the pool and stays there" {
            for store in stores {
                let id = create(store, "Median of Two Arrays", at(2024, 1, 1));
                let now = at(2024, 2, 1);

                let stages: Vec<u32> = (0..4)
                    .map(|_| service::review(store, id, now).unwrap().review_stage)
                    .collect();
                assert_eq!(stages, vec![1, 2, 3, 3]);

                let exercise = service::get(store, id).unwrap();
                assert_eq!(exercise.review_stage, POOL_STAGE);
                assert_eq!(exercise.review_count, 4);
                assert_eq!(exercise.next_review_date, at(2024, 3, 2));
            }
        }

        it "keeps counting reviews in the pool" {
            for store in stores {
                let id = create(store, "Word Ladder", at(2024, 1, 1));
                review_times(store, id, 10, at(2024, 1, 10));

                let exercise = service::get(store, id).unwrap();
                assert_eq!(exercise.review_stage, POOL_STAGE);
                assert_eq!(exercise.review_count, 10);
            }
        }

        it "reports unknown ids" {
            for store in stores {
                let result = service::review(store, 999, at(2024, 1, 1));
                assert!(matches!(result, Err(Error::NotFound(999))));
            }
        }
    }

    describe "update" {
        it "changes descriptive fields only" {
            for store in stores {
                let id = create(store, "Old", at(2024, 1, 1));
                let before = service::review(store, id, at(2024, 1, 3)).unwrap();

                let updated = service::update(store, id, UpdateExerciseInput {
                    source: "leetcode".to_string(),
                    source_id: "42".to_string(),
                    title: "New".to_string(),
                    link: "https://leetcode.com/problems/trapping-rain-water".to_string(),
                    tags: "stack".to_string(),
                    answer: "two pointers".to_string(),
                    resolve_date: Some(at(2023, 12, 25)),
                }).unwrap();

                assert_eq!(updated.title, "New");
                assert_eq!(updated.source_id, "42");
                assert_eq!(updated.resolve_date, at(2023, 12, 25));
                assert_eq!(updated.review_stage, before.review_stage);
                assert_eq!(updated.review_count, before.review_count);
                assert_eq!(updated.next_review_date, before.next_review_date);
                assert_eq!(updated.last_reviewed_at, before.last_reviewed_at);
                assert_eq!(updated.created_at, before.created_at);
            }
        }

        it "keeps resolve_date when omitted" {
            for store in stores {
                let id = create(store, "Old", at(2024, 1, 1));
                let updated = service::update(store, id, UpdateExerciseInput {
                    title: "Renamed".to_string(),
                    ..Default::default()
                }).unwrap();

                assert_eq!(updated.resolve_date, at(2024, 1, 1));
                assert_eq!(updated.next_review_date, at(2024, 1, 2));
            }
        }

        it "rejects unknown ids and blank titles" {
            for store in stores {
                let missing = service::update(store, 404, UpdateExerciseInput {
                    title: "x".to_string(),
                    ..Default::default()
                });
                assert!(matches!(missing, Err(Error::NotFound(404))));

                let id = create(store, "Keep me", at(2024, 1, 1));
                let blank = service::update(store, id, UpdateExerciseInput::default());
                assert!(matches!(blank, Err(Error::Validation(_))));
                assert_eq!(service::get(store, id).unwrap().title, "Keep me");
            }
        }
    }

    describe "delete" {
        it "removes the exercise" {
            for store in stores {
                let id = create(store, "Gone", at(2024, 1, 1));
                service::delete(store, id).unwrap();

                assert!(matches!(service::get(store, id), Err(Error::NotFound(_))));
                assert!(matches!(service::delete(store, id), Err(Error::NotFound(_))));
            }
        }
    }

    describe "list" {
        it "shows due exercises on the ladder as pending, oldest due first" {
            for store in stores {
                let now = at(2024, 3, 1);
                let later = create(store, "Due later", at(2024, 2, 20));
                let earlier = create(store, "Due earlier", at(2024, 2, 10));
                create(store, "Not yet due", now);
                let pooled = create(store, "Pooled", at(2024, 1, 1));
                review_times(store, pooled, 3, at(2024, 1, 2));

                let pending = page(store, View::Pending, None, 1, now);
                let ids: Vec<i64> = pending.data.iter().map(|e| e.id).collect();

                assert_eq!(ids, vec![earlier, later]);
                assert_eq!(pending.total, 2);
            }
        }

        it "shows graduated exercises in the pool, newest first" {
            for store in stores {
                let first = create(store, "First", at(2024, 1, 1));
                let second = create(store, "Second", at(2024, 1, 2));
                create(store, "Fresh", at(2024, 1, 3));
                review_times(store, first, 3, at(2024, 1, 5));
                review_times(store, second, 5, at(2024, 1, 5));

                let pool = page(store, View::Pool, None, 1, at(2024, 1, 6));
                let ids: Vec<i64> = pool.data.iter().map(|e| e.id).collect();

                assert_eq!(ids, vec![second, first]);
            }
        }

        it "shows exercises reviewed today" {
            for store in stores {
                let now = Utc.with_ymd_and_hms(2024, 4, 10, 12, 0, 0).unwrap();
                let today = create(store, "Today", at(2024, 4, 1));
                let earlier = create(store, "Earlier", at(2024, 4, 1));
                create(store, "Never", at(2024, 4, 1));
                service::review(store, today, now).unwrap();
                service::review(store, earlier, now - Duration::days(2)).unwrap();

                let reviewed = page(store, View::ReviewedToday, None, 1, now);
                let ids: Vec<i64> = reviewed.data.iter().map(|e| e.id).collect();

                assert_eq!(ids, vec![today]);
            }
        }

        it "paginates ten at a time" {
            for store in stores {
                let start = at(2024, 1, 1);
                let ids: Vec<i64> = (0..25)
                    .map(|i| create(store, &format!("Exercise {}", i), start + Duration::minutes(i)))
                    .collect();
                let now = at(2024, 2, 1);

                let second = page(store, View::Total, None, 2, now);
                let expected: Vec<i64> = ids.iter().rev().skip(10).take(10).copied().collect();

                assert_eq!(second.data.iter().map(|e| e.id).collect::<Vec<_>>(), expected);
                assert_eq!(second.total, 25);
                assert_eq!(second.page, 2);
                assert_eq!(second.total_pages, 3);

                assert_eq!(page(store, View::Total, None, 3, now).data.len(), 5);
                let past_end = page(store, View::Total, None, 4, now);
                assert!(past_end.data.is_empty());
                assert_eq!(past_end.total_pages, 3);
            }
        }

        it "searches case-insensitively across fields" {
            for store in stores {
                let now = at(2024, 2, 1);
                let by_title = create(store, "Binary Tree Paths", at(2024, 1, 1));
                let by_tags = service::create(store, CreateExerciseInput {
                    tags: "tree,dfs".to_string(),
                    resolve_date: Some(at(2024, 1, 1)),
                    ..input("Path Sum")
                }, at(2024, 1, 1)).unwrap();
                create(store, "Two Sum", at(2024, 1, 1));

                let found = page(store, View::Total, Some("TREE"), 1, now);
                let mut ids: Vec<i64> = found.data.iter().map(|e| e.id).collect();
                ids.sort();

                assert_eq!(ids, vec![by_title, by_tags]);
                assert_eq!(found.total, 2);
            }
        }

        it "applies search within the view" {
            for store in stores {
                let pooled = create(store, "Graph Coloring", at(2024, 1, 1));
                create(store, "Graph Valid Tree", at(2024, 1, 1));
                review_times(store, pooled, 3, at(2024, 1, 2));

                let pool = page(store, View::Pool, Some("graph"), 1, at(2024, 1, 3));
                assert_eq!(pool.total, 1);
                assert_eq!(pool.data[0].id, pooled);
            }
        }

        it "folds non-ASCII case the same way in every store" {
            for store in stores {
                let id = create(store, "Ärger mit Übungen", at(2024, 1, 1));
                create(store, "Arger ohne Umlaut", at(2024, 1, 1));

                let found = page(store, View::Total, Some("äRGER"), 1, at(2024, 2, 1));
                assert_eq!(found.data.iter().map(|e| e.id).collect::<Vec<_>>(), vec![id]);

                let found = page(store, View::Total, Some("ÜBUNGEN"), 1, at(2024, 2, 1));
                assert_eq!(found.total, 1);
            }
        }

        it "lists exercises solved today, most recently added first" {
            for store in stores {
                let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap();
                let morning = create(store, "Morning", now - Duration::minutes(10));
                let later = create(store, "Later", now);
                create(store, "Last week", at(2024, 6, 8));

                let solved = page(store, View::SolvedToday, None, 1, now);
                assert_eq!(solved.data.iter().map(|e| e.id).collect::<Vec<_>>(), vec![later, morning]);
                assert_eq!(solved.total, 2);
            }
        }

        it "treats wildcard characters literally" {
            for store in stores {
                let id = create(store, "100% coverage", at(2024, 1, 1));
                create(store, "1000 coverage", at(2024, 1, 1));

                let found = page(store, View::Total, Some("100%"), 1, at(2024, 2, 1));
                assert_eq!(found.data.iter().map(|e| e.id).collect::<Vec<_>>(), vec![id]);
            }
        }

        it "returns one empty page when nothing matches" {
            for store in stores {
                create(store, "Two Sum", at(2024, 1, 1));

                let found = page(store, View::Total, Some("zzz"), 1, at(2024, 2, 1));
                assert!(found.data.is_empty());
                assert_eq!(found.total, 0);
                assert_eq!(found.total_pages, 1);
            }
        }
    }

    describe "stats" {
        it "agrees with the list views" {
            for store in stores {
                let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
                for i in 0..4 {
                    create(store, &format!("Due {}", i), at(2024, 6, 1));
                }
                create(store, "Not due", now);
                let reviewed = create(store, "Reviewed", at(2024, 6, 1));
                service::review(store, reviewed, now).unwrap();
                let pooled = create(store, "Pooled", at(2024, 5, 1));
                review_times(store, pooled, 3, at(2024, 5, 2));

                let stats = service::stats(store, now).unwrap();

                assert_eq!(stats.total_count, 7);
                assert_eq!(stats.pending_count, 4);
                assert_eq!(stats.pool_count, 1);
                assert_eq!(stats.reviewed_today_count, 1);
                assert_eq!(stats.solved_today_count, 1);

                assert_eq!(stats.pending_count, page(store, View::Pending, None, 1, now).total);
                assert_eq!(stats.pool_count, page(store, View::Pool, None, 1, now).total);
                assert_eq!(stats.reviewed_today_count, page(store, View::ReviewedToday, None, 1, now).total);
                assert_eq!(stats.solved_today_count, page(store, View::SolvedToday, None, 1, now).total);
                assert_eq!(stats.total_count, page(store, View::Total, None, 1, now).total);
            }
        }

        it "is all zeros for an empty store" {
            for store in stores {
                assert_eq!(service::stats(store, at(2024, 1, 1)).unwrap(), Stats::default());
            }
        }
    }
}
