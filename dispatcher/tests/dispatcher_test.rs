//! Integration tests for [`dispatcher::UpdateDispatcher`].
//!
//! Covers: update-type routing with the `(type, request)` convention, registration errors,
//! built-in command routing, session injection and repeatable dispatch.

use std::sync::{Arc, Mutex};

use dispatcher::{Container, DispatcherBuilder, Handler, Param, UpdateDispatcher};
use serde_json::{json, Value};
use session::{InMemoryKvStore, Session, SessionFactory};
use telecore_core::{MessageEntity, RouteError, Update, UpdateType};

fn factory() -> SessionFactory {
    SessionFactory::new(Arc::new(InMemoryKvStore::new()))
}

/// Handler taking `(type, request)` that records both.
fn recording_handler(name: &str, seen: Arc<Mutex<Option<(String, Value)>>>) -> Handler {
    Handler::new(name, move |args| {
        let seen = seen.clone();
        async move {
            let update_type = args.get::<String>(0)?.clone();
            let request = args.get::<Update>(1)?.raw().clone();
            *seen.lock().unwrap() = Some((update_type, request));
            Ok(())
        }
    })
    .param(Param::named("type"))
    .param(Param::typed::<Update>("request"))
}

fn command_update(text: &str, length: usize) -> Update {
    Update::new(json!({
        "update_id": 1,
        "message": {
            "message_id": 10,
            "text": text,
            "chat": { "id": 6789012, "type": "private" },
            "from": { "id": 1234567, "is_bot": false, "username": "test_user" },
            "entities": [{ "type": "bot_command", "offset": 0, "length": length }]
        }
    }))
}

/// **Test: An inline query reaches the inline_query handler with `(type, request)`.**
///
/// **Setup:** Dispatcher with a recording handler for inline_query.
/// **Action:** Dispatch `{"inline_query": {"hello": "world"}}` and invoke.
/// **Expected:** args[0] is "inline_query"; the handler saw request.inline_query.hello == "world".
#[tokio::test]
async fn test_inline_query_dispatch() {
    let seen = Arc::new(Mutex::new(None));
    let mut builder = DispatcherBuilder::new(Container::new(), factory());
    builder
        .add_handler("inline_query", recording_handler("inline", seen.clone()))
        .unwrap();
    let dispatcher = builder.build();

    let update = Update::new(json!({ "inline_query": { "hello": "world" } }));
    let dispatch = dispatcher.dispatch(&update).unwrap().unwrap();

    assert_eq!(dispatch.update_type, UpdateType::InlineQuery);
    assert_eq!(dispatch.args.get::<String>(0).unwrap(), "inline_query");
    dispatch.invoke().await.unwrap();

    let (update_type, request) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(update_type, "inline_query");
    assert_eq!(request["inline_query"]["hello"], "world");
}

/// **Test: Registration rejects unknown and duplicate update types.**
#[test]
fn test_invalid_and_duplicate_update_types() {
    let noop = Handler::new("noop", |_args| async { Ok(()) });
    let mut builder = DispatcherBuilder::new(Container::new(), factory());

    let err = builder.add_handler("not_a_type", noop.clone()).err().unwrap();
    assert!(matches!(err, RouteError::InvalidUpdateType(t) if t == "not_a_type"));

    builder.add_handler("callback_query", noop.clone()).unwrap();
    let err = builder.add_handler("callback_query", noop).err().unwrap();
    assert!(matches!(err, RouteError::DuplicateHandler(t) if t == "callback_query"));
}

/// **Test: A payload with no registered update type is silently unrouted.**
#[test]
fn test_unregistered_type_returns_none() {
    let dispatcher = DispatcherBuilder::new(Container::new(), factory()).build();
    let update = Update::new(json!({ "update_id": 3, "inline_query": { "id": "1" } }));
    assert!(dispatcher.dispatch(&update).unwrap().is_none());
}

/// **Test: `/hello world` is routed to the `/hello` command handler.**
///
/// **Setup:** Command "hello" (registered without slash) taking `request`, `command` and
/// `messageEntity`.
/// **Action:** Dispatch the message update and invoke.
/// **Expected:** The handler sees text "/hello world", command "/hello" and the entity.
#[tokio::test]
async fn test_command_routing() {
    let seen = Arc::new(Mutex::new(None));
    let recorder = seen.clone();
    let hello = Handler::new("hello", move |args| {
        let recorder = recorder.clone();
        async move {
            let request = args.get::<Update>(0)?;
            let text = request.raw()["message"]["text"].as_str().map(str::to_string);
            let command = args.get::<String>(1)?.clone();
            let entity = args.get::<MessageEntity>(2)?.clone();
            *recorder.lock().unwrap() = Some((text, command, entity));
            Ok(())
        }
    })
    .param(Param::typed::<Update>("request"))
    .param(Param::named("command"))
    .param(Param::named("messageEntity"));

    let mut builder = DispatcherBuilder::new(Container::new(), factory());
    builder.add_command("hello", hello).unwrap();
    let dispatcher = builder.build();

    let dispatch = dispatcher
        .dispatch(&command_update("/hello world", 6))
        .unwrap()
        .unwrap();
    assert_eq!(dispatch.update_type, UpdateType::Message);
    assert_eq!(dispatch.handler.name(), "handle_command_message");
    dispatch.invoke().await.unwrap();

    let (text, command, entity) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(text.as_deref(), Some("/hello world"));
    assert_eq!(command, "/hello");
    assert_eq!(entity, MessageEntity::new("bot_command", 0, 6));
}

/// **Test: An unknown command fails when the built-in handler runs.**
#[tokio::test]
async fn test_unknown_command_fails() {
    let dispatcher = DispatcherBuilder::new(Container::new(), factory()).build();
    let dispatch = dispatcher
        .dispatch(&command_update("/nope", 5))
        .unwrap()
        .unwrap();
    let err = dispatch.invoke().await.unwrap_err();
    assert!(matches!(err, RouteError::CommandHandlerNotFound(c) if c == "/nope"));
}

/// **Test: A message without a leading command is a no-op for the built-in route.**
#[tokio::test]
async fn test_plain_message_is_noop() {
    let mut builder = DispatcherBuilder::new(Container::new(), factory());
    builder
        .add_command("hello", Handler::new("hello", |_args| async {
            Err(anyhow::anyhow!("must not run").into())
        }))
        .unwrap();
    let dispatcher = builder.build();

    let update = Update::new(json!({
        "message": {
            "text": "say /hello",
            "chat": { "id": 1 },
            "entities": [{ "type": "bot_command", "offset": 4, "length": 6 }]
        }
    }));
    let dispatch = dispatcher.dispatch(&update).unwrap().unwrap();
    dispatch.invoke().await.unwrap();
}

/// **Test: Message handlers receive the chat/user session of the message.**
///
/// **Setup:** `message` route (no built-in commands) taking a typed `Session`.
/// **Action:** Dispatch and invoke; the handler stores a value.
/// **Expected:** The session namespace matches the factory's chat/user session; the value is
/// readable through an independently derived session.
#[tokio::test]
async fn test_message_session_is_injected() {
    let sessions = factory();
    let handler = Handler::new("remember", |args| async move {
        let session = args.get_arc::<Session>(0)?;
        session.set("last", "hello", None).await?;
        Ok(())
    })
    .param(Param::typed::<Session>("session"));

    let mut builder = DispatcherBuilder::without_commands(Container::new(), sessions.clone());
    builder.add_handler("message", handler).unwrap();
    let dispatcher = builder.build();

    let update = command_update("/hello world", 6);
    let dispatch = dispatcher.dispatch(&update).unwrap().unwrap();
    let namespace = dispatch.args.get::<Session>(0).unwrap().namespace().to_string();
    dispatch.invoke().await.unwrap();

    let message = update.message().unwrap().unwrap();
    let expected = sessions.from_message(&message).unwrap();
    assert_eq!(namespace, expected.namespace());
    assert!(namespace.contains("/user-"));
    assert_eq!(
        expected.get::<String>("last").await.unwrap().as_deref(),
        Some("hello")
    );
}

/// **Test: Callback queries get the session of their originating message; other types get null.**
#[test]
fn test_callback_query_session() {
    let session_param = || Param::typed::<Session>("session");
    let noop = || Handler::new("noop", |_args| async { Ok(()) });
    let mut builder = DispatcherBuilder::new(Container::new(), factory());
    builder
        .add_handler("callback_query", noop().param(session_param()))
        .unwrap()
        .add_handler("chosen_inline_result", noop().param(session_param()))
        .unwrap();
    let dispatcher = builder.build();

    let with_message = Update::new(json!({
        "callback_query": { "id": "q", "data": "x", "message": { "chat": { "id": 42 } } }
    }));
    let dispatch = dispatcher.dispatch(&with_message).unwrap().unwrap();
    let session = dispatch.args.get::<Session>(0).unwrap();
    assert!(session.namespace().starts_with("session://chat-"));
    assert!(!session.namespace().contains("/user-"));

    let inline = Update::new(json!({ "callback_query": { "id": "q", "inline_message_id": "i" } }));
    let dispatch = dispatcher.dispatch(&inline).unwrap().unwrap();
    assert!(dispatch.args.dependency(0).unwrap().is_null());

    let chosen = Update::new(json!({ "chosen_inline_result": { "result_id": "r" } }));
    let dispatch = dispatcher.dispatch(&chosen).unwrap().unwrap();
    assert!(dispatch.args.dependency(0).unwrap().is_null());
}

/// **Test: Container entries reach handlers; a missing dependency fails dispatch.**
#[test]
fn test_container_entries_and_missing_dependency() {
    let container = Container::new().with("greeting", "hi".to_string());
    let mut builder = DispatcherBuilder::without_commands(container, factory());
    builder
        .add_handler(
            "edited_message",
            Handler::new("edit", |_args| async { Ok(()) }).param(Param::named("greeting")),
        )
        .unwrap()
        .add_handler(
            "channel_post",
            Handler::new("post", |_args| async { Ok(()) }).param(Param::named("nope")),
        )
        .unwrap();
    let dispatcher = builder.build();

    let dispatch = dispatcher
        .dispatch(&Update::new(json!({ "edited_message": { "chat": { "id": 1 } } })))
        .unwrap()
        .unwrap();
    assert_eq!(dispatch.args.get::<String>(0).unwrap(), "hi");

    let err = dispatcher
        .dispatch(&Update::new(json!({ "channel_post": { "chat": { "id": 1 } } })))
        .err()
        .unwrap();
    assert!(matches!(err, RouteError::DependencyNotFound { param, .. } if param == "nope"));
}

fn idempotence_dispatcher() -> UpdateDispatcher {
    let mut builder = DispatcherBuilder::new(Container::new(), factory());
    builder
        .add_handler(
            "pre_checkout_query",
            recording_handler("checkout", Arc::new(Mutex::new(None))),
        )
        .unwrap();
    builder.build()
}

/// **Test: Dispatching the same payload twice gives equivalent results.**
///
/// **Expected:** Same handler identity; equal `type` and `request` arguments.
#[test]
fn test_dispatch_is_repeatable() {
    let dispatcher = idempotence_dispatcher();
    let update = Update::new(json!({ "pre_checkout_query": { "id": "p", "total_amount": 100 } }));

    let first = dispatcher.dispatch(&update).unwrap().unwrap();
    let second = dispatcher.dispatch(&update).unwrap().unwrap();

    assert!(first.handler.ptr_eq(&second.handler));
    assert_eq!(first.args.len(), second.args.len());
    assert_eq!(
        first.args.get::<String>(0).unwrap(),
        second.args.get::<String>(0).unwrap()
    );
    assert_eq!(
        first.args.get::<Update>(1).unwrap(),
        second.args.get::<Update>(1).unwrap()
    );
}
