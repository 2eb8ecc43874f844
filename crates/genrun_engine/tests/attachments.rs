use std::sync::Arc;
use std::time::Duration;

use genrun_engine::{
    Attachment, AttachmentStore, CaptureOutcome, ClipboardEvent, DomBridge, ElementHandle,
    HeuristicAdapter, Page, PasteError, SimulatedPage,
};
use pretty_assertions::assert_eq;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

const DELAY: Duration = Duration::from_millis(1500);

fn setup() -> (SimulatedPage, ElementHandle, Page) {
    let sim = SimulatedPage::new();
    let field = sim.add_element(r#"<textarea placeholder="Describe it"></textarea>"#);
    let page = Page::new(Arc::new(sim.clone()), Arc::new(HeuristicAdapter::default()));
    (sim, field, page)
}

fn store(persistence: bool) -> AttachmentStore {
    AttachmentStore::new(persistence, Duration::from_millis(100), Duration::from_millis(500))
}

fn bridge() -> DomBridge {
    DomBridge::new(Duration::from_millis(250))
}

fn png(name: &str) -> Attachment {
    Attachment::new(name, "image/png", name.as_bytes().to_vec())
}

#[tokio::test(start_paused = true)]
async fn paste_one_cycles_the_cursor() {
    let (sim, _, page) = setup();
    let store = store(true);
    for name in ["a.png", "b.png", "c.png"] {
        store.append(png(name));
    }
    let cancel = CancellationToken::new();

    let mut indices = Vec::new();
    for _ in 0..4 {
        indices.push(store.paste_one(&page, &cancel).await.unwrap());
    }

    assert_eq!(indices, vec![0, 1, 2, 0]);
    assert_eq!(sim.pasted(), vec!["a.png", "b.png", "c.png", "a.png"]);
    assert_eq!(store.cursor(), 1);
}

#[tokio::test(start_paused = true)]
async fn empty_store_and_missing_field_are_reported() {
    let (_, _, page) = setup();
    let store = store(true);
    let cancel = CancellationToken::new();
    assert_eq!(store.paste_one(&page, &cancel).await, Err(PasteError::Empty));
    assert_eq!(
        store.paste_all_sequential(&page, DELAY, &cancel).await,
        Err(PasteError::Empty)
    );

    let bare = SimulatedPage::new();
    let page = Page::new(Arc::new(bare), Arc::new(HeuristicAdapter::default()));
    store.append(png("a.png"));
    assert_eq!(store.paste_one(&page, &cancel).await, Err(PasteError::NoPromptField));
    assert!(!store.is_busy());
}

#[tokio::test(start_paused = true)]
async fn paste_all_keeps_order_and_spacing() {
    let (sim, _, page) = setup();
    let store = store(true);
    for name in ["a.png", "b.png", "c.png"] {
        store.append(png(name));
    }
    let started = Instant::now();

    let pasted = store
        .paste_all_sequential(&page, DELAY, &CancellationToken::new())
        .await;

    assert_eq!(pasted, Ok(3));
    assert_eq!(sim.pasted(), vec!["a.png", "b.png", "c.png"]);
    assert!(started.elapsed() >= DELAY * 2);
    assert_eq!(store.cursor(), 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_paste_is_rejected_as_busy() {
    let (_, _, page) = setup();
    let store = store(true);
    store.append(png("a.png"));
    store.append(png("b.png"));
    let cancel = CancellationToken::new();

    let (all, one) = tokio::join!(store.paste_all_sequential(&page, DELAY, &cancel), async {
        sleep(Duration::from_millis(10)).await;
        store.paste_one(&page, &cancel).await
    });

    assert_eq!(all, Ok(2));
    assert_eq!(one, Err(PasteError::Busy));
    assert!(!store.is_busy());
}

#[tokio::test(start_paused = true)]
async fn stop_aborts_remaining_pastes() {
    let (sim, _, page) = setup();
    let store = store(true);
    for name in ["a.png", "b.png", "c.png"] {
        store.append(png(name));
    }
    let cancel = CancellationToken::new();

    let (all, ()) = tokio::join!(store.paste_all_sequential(&page, DELAY, &cancel), async {
        sleep(Duration::from_millis(500)).await;
        cancel.cancel();
    });

    assert_eq!(all, Err(PasteError::Cancelled));
    assert_eq!(sim.pasted(), vec!["a.png"]);
    assert!(!store.is_busy());
}

#[tokio::test(start_paused = true)]
async fn capture_with_persistence_stores_first_image() {
    let (sim, _, page) = setup();
    let store = store(true);
    let event = ClipboardEvent {
        files: vec![
            Attachment::new("notes.txt", "text/plain", b"hi".to_vec()),
            png("ref.png"),
            png("second.png"),
        ],
        placeholder_text: None,
    };

    let outcome = store
        .capture_from_clipboard_event(&page, &bridge(), event, &CancellationToken::new())
        .await;

    assert_eq!(outcome, Ok(CaptureOutcome::Stored { index: 0, len: 1 }));
    assert_eq!(store.snapshot()[0].name, "ref.png");
    assert!(sim.pasted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn capture_without_persistence_pastes_once_and_discards() {
    let (sim, field, page) = setup();
    let store = store(false);
    sim.set_value(field, "a cat [image]");
    let event = ClipboardEvent {
        files: vec![png("ref.png")],
        placeholder_text: Some("[image]".to_string()),
    };

    let outcome = store
        .capture_from_clipboard_event(&page, &bridge(), event, &CancellationToken::new())
        .await;

    assert_eq!(outcome, Ok(CaptureOutcome::PastedOnce));
    assert_eq!(sim.pasted(), vec!["ref.png"]);
    assert!(store.is_empty());
    assert_eq!(sim.value(field).as_deref(), Some("a cat "));
}

#[tokio::test]
async fn capture_ignores_events_without_images() {
    let (_, _, page) = setup();
    let store = store(true);
    let event = ClipboardEvent {
        files: vec![Attachment::new("notes.txt", "text/plain", b"hi".to_vec())],
        placeholder_text: None,
    };

    let outcome = store
        .capture_from_clipboard_event(&page, &bridge(), event, &CancellationToken::new())
        .await;

    assert_eq!(outcome, Ok(CaptureOutcome::NoImage));
    assert!(store.is_empty());
}

#[test]
fn clear_resets_cursor_and_persistence_toggles() {
    let store = store(false);
    assert!(!store.persistence_enabled());
    store.set_persistence(true);
    assert!(store.persistence_enabled());

    assert_eq!(store.append(png("a.png")), 0);
    assert_eq!(store.append(png("b.png")), 1);
    assert_eq!(store.len(), 2);
    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.cursor(), 0);
}

#[tokio::test(start_paused = true)]
async fn busy_capture_leaves_field_untouched() {
    let (sim, field, page) = setup();
    let store = store(false);
    store.append(png("held.png"));
    sim.set_value(field, "a cat [image]");
    let cancel = CancellationToken::new();
    let event = ClipboardEvent {
        files: vec![png("ref.png")],
        placeholder_text: Some("[image]".to_string()),
    };

    let (held, captured) = tokio::join!(store.paste_one(&page, &cancel), async {
        sleep(Duration::from_millis(10)).await;
        store
            .capture_from_clipboard_event(&page, &bridge(), event, &cancel)
            .await
    });

    assert_eq!(held, Ok(0));
    assert_eq!(captured, Err(PasteError::Busy));
    assert_eq!(sim.value(field).as_deref(), Some("a cat [image]"));
    assert_eq!(sim.pasted(), vec!["held.png"]);
}
