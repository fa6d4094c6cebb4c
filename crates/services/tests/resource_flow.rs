mod common;

use std::sync::Arc;

use chrono::Duration;
use common::{Call, FakeApi, Failure, good_resource};
use services::resources::RESOURCE_CACHE_TTL_SECS;
use services::{ApiError, Clock, FetchStrategy, ResourceCache, ResourceFetchOrchestrator};
use sprint_core::model::{Resource, SkillId};
use sprint_core::time::fixed_now;
use storage::repository::{InMemoryKvStore, KvStore};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

fn store() -> Arc<dyn KvStore> {
    Arc::new(InMemoryKvStore::new())
}

#[tokio::test]
async fn only_uncached_subskills_are_requested() {
    let api = FakeApi::new();
    api.set_resources("Recursion", vec![good_resource("Recursion", 1)]);
    let cache = ResourceCache::empty(store(), SkillId::new(1), Clock::fixed(fixed_now()));
    cache.put("Loops", vec![good_resource("Loops", 1)]).await;

    let orchestrator = ResourceFetchOrchestrator::new(api.clone());
    let fetch = orchestrator
        .fetch(&cache, &names(&["Recursion", "Loops"]))
        .await
        .expect("fetch");

    assert_eq!(api.resource_calls(), vec![Call::Batch(names(&["Recursion"]))]);
    assert_eq!(fetch.strategy, FetchStrategy::Batch);
    assert_eq!(fetch.resources.len(), 2);
    assert_eq!(fetch.for_subskill("Loops"), [good_resource("Loops", 1)]);
    assert_eq!(fetch.for_subskill("Recursion"), [good_resource("Recursion", 1)]);
    assert!(cache.get_fresh("Recursion").is_some());
}

#[tokio::test]
async fn fully_cached_skill_makes_no_requests() {
    let api = FakeApi::new();
    let cache = ResourceCache::empty(store(), SkillId::new(1), Clock::fixed(fixed_now()));
    cache
        .put_many(vec![
            ("Loops".into(), vec![good_resource("Loops", 1)]),
            ("Recursion".into(), Vec::new()),
        ])
        .await;

    let fetch = ResourceFetchOrchestrator::new(api.clone())
        .fetch(&cache, &names(&["Loops", "Recursion"]))
        .await
        .expect("fetch");

    assert!(api.calls().is_empty());
    assert_eq!(fetch.strategy, FetchStrategy::CacheOnly);
    assert!(fetch.for_subskill("Recursion").is_empty());
}

#[tokio::test]
async fn batch_failure_falls_back_per_subskill() {
    let api = FakeApi::new();
    api.fail_batch(Failure::Unavailable);
    api.set_resources("Loops", vec![good_resource("Loops", 1)]);
    api.set_resources("Recursion", vec![good_resource("Recursion", 1)]);
    api.fail_single("Recursion");
    let cache = ResourceCache::empty(store(), SkillId::new(1), Clock::fixed(fixed_now()));

    let fetch = ResourceFetchOrchestrator::new(api.clone())
        .fetch(&cache, &names(&["Loops", "Recursion"]))
        .await
        .expect("fallback never fails");

    assert_eq!(fetch.strategy, FetchStrategy::Fallback);
    assert_eq!(fetch.for_subskill("Loops"), [good_resource("Loops", 1)]);
    assert!(fetch.for_subskill("Recursion").is_empty());
    assert_eq!(fetch.failed, names(&["Recursion"]));
    assert!(fetch.is_partial());

    let calls = api.resource_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], Call::Batch(names(&["Loops", "Recursion"])));
    assert!(calls.contains(&Call::Single("Loops".into())));
    assert!(calls.contains(&Call::Single("Recursion".into())));

    // Failed keys are retried next time; fetched ones are served from cache.
    assert!(cache.get_fresh("Loops").is_some());
    assert!(cache.get("Recursion").is_none());
}

#[tokio::test]
async fn unauthorized_batch_is_not_worked_around() {
    let api = FakeApi::new();
    api.fail_batch(Failure::Unauthorized);
    let cache = ResourceCache::empty(store(), SkillId::new(1), Clock::fixed(fixed_now()));

    let err = ResourceFetchOrchestrator::new(api.clone())
        .fetch(&cache, &names(&["Loops"]))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(api.resource_calls(), vec![Call::Batch(names(&["Loops"]))]);
}

#[tokio::test]
async fn stale_entries_are_fetched_again_after_ttl() {
    let api = FakeApi::new();
    api.set_resources("Loops", vec![good_resource("Loops", 2)]);
    let documents = store();
    let first = ResourceCache::empty(Arc::clone(&documents), SkillId::new(1), Clock::fixed(fixed_now()));
    first.put("Loops", vec![good_resource("Loops", 1)]).await;

    let mut later = Clock::fixed(fixed_now());
    later.advance(Duration::seconds(RESOURCE_CACHE_TTL_SECS - 1));
    let still_fresh = ResourceCache::load(Arc::clone(&documents), SkillId::new(1), later).await;
    let orchestrator = ResourceFetchOrchestrator::new(api.clone());
    orchestrator
        .fetch(&still_fresh, &names(&["Loops"]))
        .await
        .unwrap();
    assert!(api.calls().is_empty());

    later.advance(Duration::seconds(1));
    let expired = ResourceCache::load(documents, SkillId::new(1), later).await;
    let fetch = orchestrator.fetch(&expired, &names(&["Loops"])).await.unwrap();
    assert_eq!(api.resource_calls(), vec![Call::Batch(names(&["Loops"]))]);
    assert_eq!(fetch.for_subskill("Loops"), [good_resource("Loops", 2)]);
}

#[tokio::test]
async fn fetched_resources_are_filtered_and_ranked() {
    let api = FakeApi::new();
    let mut raw: Vec<Resource> = (0..6).map(|n| good_resource("Loops", n)).collect();
    raw.push(Resource::new(
        "Loops in the Rust book",
        "Official chapter on loop expressions",
        "https://doc.rust-lang.org/book/ch03-05-control-flow.html",
        "documentation",
    ));
    raw.push(Resource::new("short", "too short", "https://blog.dev/x", "article"));
    api.set_resources("Loops", raw);
    let cache = ResourceCache::empty(store(), SkillId::new(1), Clock::fixed(fixed_now()));

    let fetch = ResourceFetchOrchestrator::new(api.clone())
        .fetch(&cache, &names(&["Loops", "Loops"]))
        .await
        .unwrap();

    let loops = fetch.for_subskill("Loops");
    assert_eq!(loops.len(), 4);
    assert!(loops[0].url().starts_with("https://doc.rust-lang.org/"));
    assert!(loops.iter().all(|r| r.title().len() >= 10));
    assert_eq!(api.resource_calls(), vec![Call::Batch(names(&["Loops"]))]);
}

#[tokio::test]
async fn null_description_drops_only_that_resource() {
    let payload: Vec<Resource> = serde_json::from_str(
        r#"[
            {"title":"Loops guide part 1","description":null,"url":"https://blog.dev/loops/1","resource_type":"article"},
            {"title":"Loops guide part 2","description":"A thorough walkthrough of Loops, part 2","url":"https://blog.dev/loops/2","resource_type":"article"},
            {"title":"Loops guide part 3","description":"A thorough walkthrough of Loops, part 3","url":"https://blog.dev/loops/3","resource_type":null}
        ]"#,
    )
    .expect("null fields decode");
    let api = FakeApi::new();
    api.set_resources("Loops", payload);
    let cache = ResourceCache::empty(store(), SkillId::new(1), Clock::fixed(fixed_now()));

    let fetch = ResourceFetchOrchestrator::new(api.clone())
        .fetch(&cache, &names(&["Loops"]))
        .await
        .expect("fetch");

    assert_eq!(fetch.strategy, FetchStrategy::Batch);
    let titles: Vec<_> = fetch
        .for_subskill("Loops")
        .iter()
        .map(Resource::title)
        .collect();
    assert_eq!(titles, ["Loops guide part 2", "Loops guide part 3"]);
    assert_eq!(cache.get_fresh("Loops").unwrap().resources.len(), 2);
}
