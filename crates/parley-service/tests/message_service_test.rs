use std::sync::Arc;

use parley_persist::{InMemoryPersistenceClient, PageRequest, PersistenceClient, MAX_MESSAGE_LENGTH};
use parley_service::{DedupPolicy, MessagePolicy, MessageService, ServiceError, ThreadService};

struct Fixture {
    store: Arc<InMemoryPersistenceClient>,
    threads: ThreadService,
    messages: MessageService,
}

async fn setup(users: usize, policy: MessagePolicy) -> Fixture {
    let store = Arc::new(InMemoryPersistenceClient::new());
    for i in 0..users {
        store.create_user(&format!("user{}", i + 1)).await.unwrap();
    }
    Fixture {
        threads: ThreadService::new(store.clone(), DedupPolicy::ExactPair),
        messages: MessageService::new(store.clone(), policy),
        store,
    }
}

#[tokio::test]
async fn test_create_message_defaults() {
    let fx = setup(2, MessagePolicy::default()).await;
    let (thread, _) = fx.threads.create(&[1, 2]).await.unwrap();

    let message = fx.messages.create(1, thread.id, "  hi  ").await.unwrap();
    assert_eq!(message.text, "hi");
    assert_eq!(message.sender, 1);
    assert_eq!(message.thread, thread.id);
    assert!(!message.is_read);
}

#[tokio::test]
async fn test_create_message_too_long_persists_nothing() {
    let fx = setup(2, MessagePolicy::default()).await;
    let (thread, _) = fx.threads.create(&[1, 2]).await.unwrap();

    let text = "x".repeat(MAX_MESSAGE_LENGTH + 1);
    let err = fx.messages.create(1, thread.id, &text).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    let page = fx.store.list_messages_for_thread(thread.id, PageRequest::default()).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_create_message_unknown_references() {
    let fx = setup(2, MessagePolicy::default()).await;
    let (thread, _) = fx.threads.create(&[1, 2]).await.unwrap();

    let err = fx.messages.create(9, thread.id, "hi").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    let err = fx.messages.create(1, 404, "hi").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_sender_membership_policy() {
    let lenient = setup(3, MessagePolicy::default()).await;
    let (thread, _) = lenient.threads.create(&[1, 2]).await.unwrap();
    assert!(lenient.messages.create(3, thread.id, "hello").await.is_ok());

    let strict = setup(3, MessagePolicy { require_sender_participant: true }).await;
    let (thread, _) = strict.threads.create(&[1, 2]).await.unwrap();
    let err = strict.messages.create(3, thread.id, "hello").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert!(strict.messages.create(2, thread.id, "hello").await.is_ok());
}

#[tokio::test]
async fn test_mark_as_read_is_idempotent() {
    let fx = setup(2, MessagePolicy::default()).await;
    let (thread, _) = fx.threads.create(&[1, 2]).await.unwrap();
    let message = fx.messages.create(1, thread.id, "hi").await.unwrap();

    let once = fx.messages.mark_as_read(message.id).await.unwrap();
    let twice = fx.messages.mark_as_read(once.id).await.unwrap();
    assert!(once.is_read);
    assert_eq!(once, twice);

    let err = fx.messages.mark_as_read(999).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_unread_count_across_threads_with_mixed_states() {
    let fx = setup(5, MessagePolicy::default()).await;
    let mut expected_for_user1 = 0;

    for other in 2..=5 {
        let (thread, _) = fx.threads.create(&[1, other]).await.unwrap();
        for n in 0..other {
            let message = fx.messages.create(other, thread.id, &format!("n{}", n)).await.unwrap();
            if n % 2 == 0 {
                fx.messages.mark_as_read(message.id).await.unwrap();
            } else {
                expected_for_user1 += 1;
            }
        }
    }
    // Thread without user 1 must not count for them
    let (unrelated, _) = fx.threads.create(&[2, 3]).await.unwrap();
    fx.messages.create(2, unrelated.id, "elsewhere").await.unwrap();

    assert_eq!(fx.messages.unread_count_for_user(1).await.unwrap(), expected_for_user1);
    assert_eq!(fx.messages.unread_count_for_user(3).await.unwrap(), 2);
}

#[tokio::test]
async fn test_unread_count_unknown_user() {
    let fx = setup(1, MessagePolicy::default()).await;
    let err = fx.messages.unread_count_for_user(42).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_list_for_thread_never_exceeds_limit() {
    let fx = setup(2, MessagePolicy::default()).await;
    let (thread, _) = fx.threads.create(&[1, 2]).await.unwrap();
    for i in 0..11 {
        fx.messages.create(1 + (i % 2), thread.id, &format!("m{}", i)).await.unwrap();
    }

    for limit in [1, 4, 10, 50] {
        for offset in [0, 3, 10, 20] {
            let page = fx
                .messages
                .list_for_thread(thread.id, PageRequest::new(limit, offset))
                .await
                .unwrap();
            assert!(page.items.len() as u64 <= limit);
            assert_eq!(page.total, 11);
        }
    }

    let err = fx.messages.list_for_thread(77, PageRequest::default()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_list_all_messages_across_threads() {
    let fx = setup(3, MessagePolicy::default()).await;
    let (ab, _) = fx.threads.create(&[1, 2]).await.unwrap();
    let (bc, _) = fx.threads.create(&[2, 3]).await.unwrap();
    fx.messages.create(1, ab.id, "first").await.unwrap();
    fx.messages.create(3, bc.id, "second").await.unwrap();

    let page = fx.messages.list(PageRequest::new(1, 1)).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].text, "second");
}
