mod support;

use std::time::Duration;

use axum::http::Method;
use emby_portal::session::{SessionStatus, SessionWatcher};
use emby_portal::views::login::{self, Credentials};
use emby_portal::{PortalClient, PortalContext, SessionSignal};
use support::{FakeBackend, StatsMode, PASSWORD, SESSION_COOKIE, USERNAME};

fn credentials() -> Credentials {
    Credentials {
        username: USERNAME.to_string(),
        password: PASSWORD.to_string(),
    }
}

/// Wait until the watcher publishes `want`
async fn wait_for(watcher: &SessionWatcher, want: SessionStatus) {
    let mut rx = watcher.subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        while *rx.borrow_and_update() != want {
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap_or_else(|_| panic!("watcher never reported {:?}", want));
}

#[tokio::test]
async fn test_guest_never_checks_admin() {
    let backend = FakeBackend::start().await;
    let ctx = backend.context(None);

    let status = ctx.resolver().resolve().await;

    assert_eq!(status, SessionStatus::GUEST);
    assert_eq!(backend.count(Method::GET, "/debug-token"), 1);
    assert_eq!(backend.count(Method::GET, "/admin/stats"), 0);
}

#[tokio::test]
async fn test_signed_in_admin() {
    let backend = FakeBackend::start().await;
    let ctx = backend.signed_in_context();

    let status = ctx.resolver().resolve().await;

    assert!(status.authenticated);
    assert!(status.is_admin);
}

#[tokio::test]
async fn test_forbidden_stats_means_not_admin() {
    let backend = FakeBackend::start().await;
    backend.set_stats_mode(StatsMode::Forbidden);
    let ctx = backend.signed_in_context();

    let status = ctx.resolver().resolve().await;

    assert!(status.authenticated);
    assert!(!status.is_admin);
}

#[tokio::test]
async fn test_stats_that_are_not_an_object_mean_not_admin() {
    let backend = FakeBackend::start().await;
    backend.set_stats_mode(StatsMode::NotObject);
    let ctx = backend.signed_in_context();

    assert!(!ctx.resolver().resolve_admin().await);
    assert!(ctx.resolver().resolve_authenticated().await);
}

#[tokio::test]
async fn test_unreachable_backend_reads_as_guest() {
    let client = PortalClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
    client.replace_session_cookies(&[SESSION_COOKIE.to_string()]);
    let ctx = PortalContext::new(client, None);

    assert_eq!(ctx.resolver().resolve().await, SessionStatus::GUEST);
}

#[tokio::test]
async fn test_login_signal_updates_watcher() {
    let backend = FakeBackend::start().await;
    let ctx = backend.context(None);
    let watcher = SessionWatcher::spawn(ctx.clone());
    // let the mount resolution land first so it cannot overwrite the login one
    while backend.count(Method::GET, "/debug-token") == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    wait_for(&watcher, SessionStatus::GUEST).await;

    let mut signals = ctx.bus.subscribe();
    login::login(&ctx, &credentials()).await.unwrap();

    assert_eq!(signals.recv().await.unwrap(), SessionSignal::LoginSucceeded);
    wait_for(
        &watcher,
        SessionStatus {
            authenticated: true,
            is_admin: true,
        },
    )
    .await;
}

#[tokio::test]
async fn test_forget_session_returns_watcher_to_guest() {
    let backend = FakeBackend::start().await;
    let ctx = backend.context(None);
    login::login(&ctx, &credentials()).await.unwrap();

    let watcher = SessionWatcher::spawn(ctx.clone());
    wait_for(
        &watcher,
        SessionStatus {
            authenticated: true,
            is_admin: true,
        },
    )
    .await;

    ctx.forget_session();
    wait_for(&watcher, SessionStatus::GUEST).await;
    assert!(ctx.client.session_cookies().is_empty());
}

#[tokio::test]
async fn test_session_file_is_shared_between_processes() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    // first "process" logs in and persists the jar
    let first = backend.context(Some(&path));
    login::login(&first, &credentials()).await.unwrap();
    assert!(path.exists());

    // second one picks it up on its next sync
    let second = backend.context(Some(&path));
    assert!(!second.resolver().resolve_authenticated().await);
    assert!(second.sync_from_disk());
    assert!(second.resolver().resolve_authenticated().await);
    assert!(!second.sync_from_disk());

    // and sees the sign-out too
    first.forget_session();
    assert!(!path.exists());
    assert!(second.sync_from_disk());
    assert!(!second.resolver().resolve_authenticated().await);
}

#[tokio::test]
async fn test_watcher_follows_logins_from_another_process() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let shell = backend.context(Some(&path));
    let watcher = SessionWatcher::spawn(shell.clone());
    while backend.count(Method::GET, "/debug-token") == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    wait_for(&watcher, SessionStatus::GUEST).await;
    let mut signals = shell.bus.subscribe();

    // the other context has its own bus, so only the file connects them
    let other = backend.context(Some(&path));
    login::login(&other, &credentials()).await.unwrap();

    wait_for(
        &watcher,
        SessionStatus {
            authenticated: true,
            is_admin: true,
        },
    )
    .await;
    assert_eq!(signals.recv().await.unwrap(), SessionSignal::StorageChanged);
    assert!(!shell.client.session_cookies().is_empty());

    other.forget_session();
    wait_for(&watcher, SessionStatus::GUEST).await;
}
