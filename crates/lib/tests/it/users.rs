//! Accounts: registration, login and profile changes.

use startpage::Clock;

use crate::helpers::*;

#[tokio::test]
async fn register_and_authenticate() {
    let sp = test_startpages().await;
    let user = sp
        .register(" alice ", "alice@example.com", "correct horse")
        .await
        .unwrap();
    assert_eq!(user.username, "alice");
    assert!(!user.is_staff);
    assert_eq!(user.date_joined, sp.clock().now());
    assert!(user.password_hash.is_some());

    let found = sp.authenticate("alice", "correct horse").await.unwrap();
    assert_eq!(found.id, user.id);
    // Login names match case-insensitively.
    assert_eq!(sp.authenticate("ALICE", "correct horse").await.unwrap().id, user.id);
}

#[tokio::test]
async fn bad_credentials_fail_the_same_way() {
    let sp = test_startpages().await;
    register(&sp, "alice").await;

    let wrong_password = sp.authenticate("alice", "not the one").await.unwrap_err();
    let unknown_user = sp.authenticate("mallory", "password123").await.unwrap_err();
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    assert!(wrong_password.is_invalid_input());
}

#[tokio::test]
async fn usernames_are_unique_ignoring_case() {
    let sp = test_startpages().await;
    register(&sp, "alice").await;

    let err = sp
        .register("Alice", "other@example.com", "password123")
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(sp.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn registration_input_is_checked() {
    let sp = test_startpages().await;

    let err = sp.register("alice", "", "short").await.unwrap_err();
    assert!(err.is_invalid_input());
    let err = sp.register("has space", "", "password123").await.unwrap_err();
    assert!(err.is_invalid_input());
    let err = sp.register("alice", "not-an-email", "password123").await.unwrap_err();
    assert!(err.is_invalid_input());

    // Email is optional.
    let user = sp.register("alice", "", "password123").await.unwrap();
    assert_eq!(user.email, "");
}

#[tokio::test]
async fn change_username() {
    let sp = test_startpages().await;
    let alice = register(&sp, "alice").await;
    register(&sp, "bob").await;

    // Only the case of one's own name changes.
    let renamed = sp.change_username(alice, "Alice").await.unwrap();
    assert_eq!(renamed.username, "Alice");

    let err = sp.change_username(alice, "BOB").await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(sp.user(alice).await.unwrap().username, "Alice");

    sp.change_username(alice, "carol").await.unwrap();
    assert!(sp.authenticate("carol", "password123").await.is_ok());
    assert!(sp.authenticate("alice", "password123").await.is_err());
}

#[tokio::test]
async fn avatar_is_set_and_cleared() {
    let sp = test_startpages().await;
    let alice = register(&sp, "alice").await;

    sp.set_avatar(alice, Some("avatars/alice.png")).await.unwrap();
    assert_eq!(
        sp.user(alice).await.unwrap().avatar.as_deref(),
        Some("avatars/alice.png")
    );

    sp.set_avatar(alice, Some("  ")).await.unwrap();
    assert_eq!(sp.user(alice).await.unwrap().avatar, None);
}

#[tokio::test]
async fn deleting_an_account_removes_its_pages() {
    let sp = test_startpages().await;
    let (alice, page, section) = owner_with_section(&sp, "alice").await;
    fill_section(&sp, alice, &section, 2).await;
    let (bob, bob_page, _) = owner_with_section(&sp, "bob").await;

    sp.delete_user(alice).await.unwrap();

    assert!(sp.user(alice).await.unwrap_err().is_not_found());
    assert!(sp.list_pages(alice).await.unwrap().is_empty());
    assert!(sp.page_view(alice, page.id).await.unwrap_err().is_not_found());
    // The other account is untouched.
    assert_eq!(sp.page_view(bob, bob_page.id).await.unwrap().sections.len(), 1);

    // The name is free again.
    register(&sp, "alice").await;
}

#[tokio::test]
async fn staff_accounts() {
    let sp = test_startpages().await;
    let admin = sp
        .register_staff("admin", "admin@example.com", "password123")
        .await
        .unwrap();
    assert!(admin.is_staff);
    register(&sp, "alice").await;

    let staff: Vec<_> = sp
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .filter(|u| u.is_staff)
        .collect();
    assert_eq!(staff.len(), 1);
    assert_eq!(staff[0].username, "admin");
}
