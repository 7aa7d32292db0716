//! Load deduplication and style ownership tests for `ComponentCache`.

mod common;

use common::{CARD_CSS, CARD_HTML, CARD_JS, Fixture};
use futures::future::join_all;
use skein_components::error::PresenterError;
use skein_styles::StyleError;
use skein_components::{
    ComponentDescriptor, ComponentInstance, Invalidate, LoadError, LoadState, Module, Presenter,
    PresenterClass, RegistryError, TransportError,
};
use std::sync::Arc;

struct CardPresenter;
impl Presenter for CardPresenter {}

fn card_class() -> impl PresenterClass {
    |_: ComponentInstance, _: Invalidate| {
        Ok::<Box<dyn Presenter>, PresenterError>(Box::new(CardPresenter))
    }
}

fn card() -> ComponentDescriptor {
    ComponentDescriptor::new("card", "widgets")
}

// ─────────────────────────────────────────────────────────────────────────────
// Deduplication
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_loads_read_markup_once() {
    let fixture = Fixture::new().with_card_files();
    let descriptor = card();

    let results = join_all((0..5).map(|_| fixture.cache.load(&descriptor))).await;

    for result in &results {
        let loaded = result.as_ref().unwrap();
        assert_eq!(loaded.markup, "<div class=\"card\"></div>");
        assert_eq!(loaded.styles, vec![".card{}".to_string()]);
    }
    assert_eq!(fixture.reader.files.reads(CARD_HTML), 1);
    assert_eq!(fixture.reader.files.reads(CARD_CSS), 1);
    assert_eq!(fixture.styles.ref_count("card"), Some(5));
    assert_eq!(fixture.head.injections("card"), 1);
}

#[tokio::test]
async fn overlapping_loads_share_result_and_count_two_owners() {
    let fixture = Fixture::new().with_card_files();
    let descriptor = card().with_styles(["a{}"]);

    let (first, second) = futures::join!(
        fixture.cache.load(&descriptor),
        fixture.cache.load(&descriptor)
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.styles, vec!["a{}".to_string()]);
    assert_eq!(fixture.styles.ref_count("card"), Some(2));
    assert_eq!(fixture.cache.state("card"), LoadState::Fulfilled);
}

#[tokio::test]
async fn second_caller_observes_loading_state() {
    let fixture = Fixture::new().with_card_files();
    let descriptor = card();

    let observed = async {
        tokio::task::yield_now().await;
        fixture.cache.state("card")
    };
    let (loaded, observed) = futures::join!(fixture.cache.load(&descriptor), observed);

    loaded.unwrap();
    assert_eq!(observed, LoadState::Loading);
    assert_eq!(fixture.cache.state("card"), LoadState::Fulfilled);
}

#[tokio::test]
async fn cached_load_skips_transport_and_counts_owner() {
    let fixture = Fixture::new().with_card_files();
    let descriptor = card();

    let first = fixture.cache.load(&descriptor).await.unwrap();
    let second = fixture.cache.load(&descriptor).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(fixture.reader.files.total_reads(), 2);
    assert_eq!(fixture.styles.ref_count("card"), Some(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn loads_from_many_tasks_start_one_sequence() {
    let fixture = Fixture::new().with_card_files();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = fixture.cache.clone();
            tokio::spawn(async move { cache.load(&card()).await })
        })
        .collect();
    for handle in handles {
        handle.await.expect("task panicked").unwrap();
    }

    assert_eq!(fixture.reader.files.reads(CARD_HTML), 1);
    assert_eq!(fixture.styles.ref_count("card"), Some(16));
    assert_eq!(fixture.head.count("card"), 1);
}

#[tokio::test]
async fn precomputed_sources_bypass_transport() {
    let fixture = Fixture::new();
    let descriptor = card()
        .with_markup("<p></p>")
        .with_styles(["a{}", "b{}"]);

    let loaded = fixture.cache.load(&descriptor).await.unwrap();

    assert_eq!(loaded.markup, "<p></p>");
    assert_eq!(loaded.styles.len(), 2);
    assert_eq!(fixture.reader.files.total_reads(), 0);
    assert_eq!(fixture.head.count("card"), 2);
    assert_eq!(fixture.styles.ref_count("card"), Some(1));
}

// ─────────────────────────────────────────────────────────────────────────────
// Style Ownership
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn release_removes_styles_after_last_owner() {
    let fixture = Fixture::new().with_card_files();
    let descriptor = card();

    fixture.cache.load(&descriptor).await.unwrap();
    fixture.cache.load(&descriptor).await.unwrap();

    fixture.cache.release("card");
    assert_eq!(fixture.head.count("card"), 1);

    fixture.cache.release("card");
    assert_eq!(fixture.head.count("card"), 0);
    assert!(!fixture.styles.contains("card"));

    // The definition stays cached and its styles come back on the next load.
    assert_eq!(fixture.cache.state("card"), LoadState::Fulfilled);
    fixture.cache.load(&descriptor).await.unwrap();
    assert_eq!(fixture.head.injections("card"), 2);
    assert_eq!(fixture.reader.files.reads(CARD_HTML), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Failures
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_markup_fails_every_waiter() {
    let fixture = Fixture::new();
    let descriptor = card();

    let results = join_all((0..3).map(|_| fixture.cache.load(&descriptor))).await;

    for result in results {
        assert!(matches!(
            result,
            Err(LoadError::Read { ref path, source: TransportError::NotFound(_) }) if path == CARD_HTML
        ));
    }
    assert_eq!(fixture.reader.files.reads(CARD_HTML), 1);
    assert_eq!(fixture.cache.state("card"), LoadState::NotStarted);
    assert!(fixture.styles.is_empty());
}

#[tokio::test]
async fn failed_module_load_allows_retry() {
    let fixture = Fixture::new().with_card_files();
    let descriptor = card().with_presenter("Card");

    let err = fixture.cache.load(&descriptor).await.unwrap_err();
    assert!(matches!(err, LoadError::Module { ref path, .. } if path == CARD_JS));
    assert_eq!(fixture.cache.state("card"), LoadState::NotStarted);
    assert!(fixture.cache.get("card").is_none());
    assert!(!fixture.styles.contains("card"));

    fixture
        .modules
        .table
        .insert(CARD_JS, Module::new().with_export("Card", card_class()));

    let loaded = fixture.cache.load(&descriptor).await.unwrap();
    assert_eq!(loaded.markup, "<div class=\"card\"></div>");
    assert_eq!(fixture.cache.state("card"), LoadState::Fulfilled);
    assert!(fixture.cache.presenter_class("card").is_some());
    assert_eq!(fixture.reader.files.reads(CARD_HTML), 2);
    assert_eq!(fixture.modules.table.loads(CARD_JS), 2);
    assert_eq!(fixture.styles.ref_count("card"), Some(1));
}

#[tokio::test]
async fn failed_style_injection_fails_every_waiter_and_allows_retry() {
    let fixture = Fixture::with_injection_failures(1).with_card_files();
    let descriptor = card();

    let results = join_all((0..3).map(|_| fixture.cache.load(&descriptor))).await;

    for result in results {
        assert!(matches!(
            result,
            Err(LoadError::Style(StyleError::Injection { ref key, .. })) if key == "card"
        ));
    }
    assert_eq!(fixture.cache.state("card"), LoadState::NotStarted);
    assert!(!fixture.styles.contains("card"));
    assert_eq!(fixture.head.count("card"), 0);

    let loaded = fixture.cache.load(&descriptor).await.unwrap();
    assert_eq!(loaded.styles, vec![".card{}".to_string()]);
    assert_eq!(fixture.cache.state("card"), LoadState::Fulfilled);
    assert_eq!(fixture.styles.ref_count("card"), Some(1));
    assert_eq!(fixture.head.count("card"), 1);
}

#[tokio::test]
async fn failed_module_load_fails_every_waiter() {
    let fixture = Fixture::new().with_card_files();
    let descriptor = card().with_presenter("Card");

    let results = join_all((0..3).map(|_| fixture.cache.load(&descriptor))).await;

    for result in results {
        assert!(matches!(
            result,
            Err(LoadError::Module { ref path, source: TransportError::NotFound(_) }) if path == CARD_JS
        ));
    }
    assert_eq!(fixture.modules.table.loads(CARD_JS), 1);
    assert_eq!(fixture.cache.state("card"), LoadState::NotStarted);
    assert!(!fixture.styles.contains("card"));
    assert_eq!(fixture.head.count("card"), 0);
}

#[tokio::test]
async fn missing_export_is_a_load_failure() {
    let fixture = Fixture::new().with_card_files();
    fixture
        .modules
        .table
        .insert(CARD_JS, Module::new().with_export("Other", card_class()));

    let err = fixture
        .cache
        .load(&card().with_presenter("Card"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LoadError::MissingExport { ref export, .. } if export == "Card"
    ));
    assert_eq!(fixture.cache.state("card"), LoadState::NotStarted);
}

// ─────────────────────────────────────────────────────────────────────────────
// Presenter Registration
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn load_registers_declared_presenter() {
    let fixture = Fixture::new().with_card_files();
    fixture
        .modules
        .table
        .insert(CARD_JS, Module::new().with_export("Card", card_class()));

    fixture
        .cache
        .load(&card().with_presenter("Card"))
        .await
        .unwrap();

    assert!(fixture.cache.presenter_class("card").is_some());
}

#[tokio::test]
async fn registration_during_load_is_kept() {
    let fixture = Fixture::new().with_card_files();
    fixture
        .modules
        .table
        .insert(CARD_JS, Module::new().with_export("Card", card_class()));
    let descriptor = card().with_presenter("Card");

    let register = async {
        tokio::task::yield_now().await;
        assert_eq!(fixture.cache.state("card"), LoadState::Loading);
        fixture.cache.register_presenter(
            "card",
            Arc::new(|_: ComponentInstance, _: Invalidate| {
                Err::<Box<dyn Presenter>, PresenterError>(PresenterError::construction("manual"))
            }),
        )
    };
    let (loaded, registered) = futures::join!(fixture.cache.load(&descriptor), register);

    loaded.unwrap();
    registered.unwrap();
    assert_eq!(fixture.cache.state("card"), LoadState::Fulfilled);

    // The hand-registered class wins over the module export.
    let class = fixture.cache.presenter_class("card").unwrap();
    let built = class.construct(ComponentInstance::new("card"), Invalidate::noop());
    assert_eq!(
        built.err(),
        Some(PresenterError::construction("manual"))
    );
}

#[tokio::test]
async fn manual_registration_requires_existing_entry() {
    let fixture = Fixture::new().with_card_files();

    let err = fixture
        .cache
        .register_presenter("card", Arc::new(card_class()))
        .unwrap_err();
    assert_eq!(err, RegistryError::UnknownComponent("card".to_string()));

    fixture.cache.load(&card()).await.unwrap();
    fixture
        .cache
        .register_presenter("card", Arc::new(card_class()))
        .unwrap();
    assert!(fixture.cache.presenter_class("card").is_some());

    let err = fixture
        .cache
        .register_presenter("card", Arc::new(card_class()))
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::PresenterAlreadyRegistered("card".to_string())
    );
}
