mod common;

use chat::{ChatCompletionService, ChatError, Role, Turn};
use common::{Harness, TestBackend};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

async fn ready() -> (Harness, String) {
    let h = Harness::new();
    let id = h.register("a.gguf").await;
    h.lifecycle.select(&id, None).await.unwrap();
    (h, id)
}

#[tokio::test]
async fn complete_returns_text_and_records_exchange() {
    let (h, id) = ready().await;
    let done = h.service.complete("hello").await.unwrap();
    assert_eq!(done.text, "a reply #1");
    assert_eq!(done.model_id, id);
    assert_eq!(done.context_turns, 1);
    assert_eq!(
        h.service.history().await,
        vec![Turn::user("hello"), Turn::assistant("a reply #1")]
    );
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let (h, _) = ready().await;
    let res = h.service.complete("").await;
    assert!(matches!(res, Err(ChatError::InvalidArgument(_))));
    assert!(h.session.is_empty().await);
}

#[tokio::test]
async fn complete_before_select_leaves_history_untouched() {
    let h = Harness::new();
    h.register("a.gguf").await;
    let res = h.service.complete("anyone home?").await;
    assert!(matches!(res, Err(ChatError::NoActiveModel)));
    assert!(h.session.is_empty().await);
    assert!(h.probe.contexts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn follow_up_sees_earlier_turns_verbatim() {
    let (h, _) = ready().await;
    let first = h.service.complete("My favorite color is X").await.unwrap();
    h.service.complete("What is my favorite color?").await.unwrap();

    let ctx = h.probe.last_context();
    assert_eq!(
        ctx.turns,
        vec![
            Turn::user("My favorite color is X"),
            Turn::assistant(first.text),
            Turn::user("What is my favorite color?"),
        ]
    );
}

#[tokio::test]
async fn reset_discards_memory_but_keeps_model() {
    let (h, id) = ready().await;
    let t1 = h
        .service
        .complete("My arbitrary favorite color is neon magenta.")
        .await
        .unwrap();
    assert_eq!(
        h.service.history().await,
        vec![
            Turn::user("My arbitrary favorite color is neon magenta."),
            Turn::assistant(t1.text),
        ]
    );

    h.service.reset().await;
    assert!(h.service.history().await.is_empty());
    assert_eq!(h.lifecycle.active_model_id(), Some(id));

    h.service.complete("What is my favorite color?").await.unwrap();
    let ctx = h.probe.last_context();
    assert_eq!(ctx.turns, vec![Turn::user("What is my favorite color?")]);
    assert_eq!(h.probe.loads(), 1);
}

#[tokio::test]
async fn reset_is_idempotent_without_a_model() {
    let h = Harness::new();
    h.service.reset().await;
    h.service.reset().await;
    assert!(h.service.history().await.is_empty());
    assert!(h.lifecycle.current().is_none());
}

#[tokio::test]
async fn generation_failure_keeps_user_turn_only() {
    let (h, _) = ready().await;
    h.service.complete("first").await.unwrap();
    h.probe.fail_generate.store(true, Ordering::SeqCst);

    let err = h.service.complete("second").await.unwrap_err();
    assert!(matches!(err, ChatError::GenerationFailure(_)));
    assert_eq!(err.kind(), "generation_failure");
    let history = h.service.history().await;
    assert_eq!(history.len(), 3);
    assert_eq!(history[2], Turn::user("second"));
}

#[tokio::test]
async fn history_survives_model_swap() {
    let (h, _) = ready().await;
    h.service.complete("remember this").await.unwrap();
    let b = h.register("b.gguf").await;
    h.lifecycle.select(&b, None).await.unwrap();

    let done = h.service.complete("still there?").await.unwrap();
    assert_eq!(done.model_id, "b");
    assert_eq!(done.context_turns, 3);
    assert_eq!(h.probe.last_context().turns[0], Turn::user("remember this"));
}

#[tokio::test]
async fn system_prompt_travels_beside_turns() {
    let (h, _) = ready().await;
    let service = ChatCompletionService::new(h.lifecycle.clone(), h.session.clone())
        .with_system_prompt(Some("Be brief.".into()));
    service.complete("hi").await.unwrap();
    let ctx = h.probe.last_context();
    assert_eq!(ctx.system_prompt.as_deref(), Some("Be brief."));
    assert_eq!(ctx.turns, vec![Turn::user("hi")]);
}

#[tokio::test]
async fn concurrent_completions_keep_pairs_together() {
    let h = Harness::with_backend(|probe| {
        let mut backend = TestBackend::new(probe);
        backend.generate_delay = Duration::from_millis(10);
        backend
    });
    let id = h.register("a.gguf").await;
    h.lifecycle.select(&id, None).await.unwrap();
    let service = Arc::new(h.service);

    let mut tasks = Vec::new();
    for n in 0..5 {
        let service = service.clone();
        tasks.push(tokio::spawn(async move {
            service.complete(&format!("question {n}")).await.unwrap()
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }

    let history = service.history().await;
    assert_eq!(history.len(), 10);
    for pair in history.chunks(2) {
        assert_eq!(pair[0].role, Role::User);
        assert_eq!(pair[1].role, Role::Assistant);
    }
}

#[tokio::test]
async fn reset_during_generation_drops_the_reply() {
    let h = Harness::with_backend(|probe| {
        let mut backend = TestBackend::new(probe);
        backend.generate_delay = Duration::from_millis(100);
        backend
    });
    let id = h.register("a.gguf").await;
    h.lifecycle.select(&id, None).await.unwrap();
    let service = Arc::new(h.service);

    let pending = {
        let service = service.clone();
        tokio::spawn(async move { service.complete("slow question").await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    service.reset().await;

    let done = pending.await.unwrap().unwrap();
    assert!(!done.text.is_empty());
    assert!(service.history().await.is_empty());
}

#[tokio::test]
async fn no_active_model_after_failed_swap_leaves_history_untouched() {
    let h = Harness::with_backend(|probe| {
        let mut backend = TestBackend::new(probe);
        backend.generate_delay = Duration::from_millis(100);
        backend.fail_load_for = Some("broken".into());
        backend
    });
    let id = h.register("a.gguf").await;
    let broken = h.register("broken.gguf").await;
    h.lifecycle.select(&id, None).await.unwrap();

    let busy = {
        let lifecycle = h.lifecycle.clone();
        tokio::spawn(async move {
            lifecycle
                .generate(&llm::PromptContext::new(vec![Turn::user("busy")]))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let swap = {
        let lifecycle = h.lifecycle.clone();
        tokio::spawn(async move { lifecycle.select(&broken, None).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(h.lifecycle.current().is_some());

    let res = h.service.complete("hello").await;
    assert!(matches!(res, Err(ChatError::NoActiveModel)), "{res:?}");
    assert!(h.service.history().await.is_empty());

    busy.await.unwrap().unwrap();
    assert!(matches!(
        swap.await.unwrap(),
        Err(ChatError::LoadFailure { .. })
    ));
    assert!(h.lifecycle.current().is_none());
}

#[tokio::test]
async fn lease_pins_model_for_generation() {
    let (h, id) = ready().await;
    let lease = h.lifecycle.lease().await.unwrap();
    assert_eq!(lease.active().entry.id, id);
    let generation = lease
        .generate(&llm::PromptContext::new(vec![Turn::user("hi")]))
        .await
        .unwrap();
    assert_eq!(generation.model_id, id);
    drop(lease);

    let empty = Harness::new();
    assert!(matches!(
        empty.lifecycle.lease().await,
        Err(ChatError::NoActiveModel)
    ));
}
