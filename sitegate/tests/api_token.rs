use std::sync::Arc;

use sitegate::{
    Account, AccountConfig, ErrorKind, NewAccount, SiteGate, SiteGateBuilder, SqliteRepositoryProvider,
};

const PASSWORD: &str = "correct horse battery";

async fn sitegate_with(config: AccountConfig) -> SiteGate<SqliteRepositoryProvider> {
    SiteGateBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .expect("Failed to connect")
        .with_account_config(config)
        .apply_migrations(true)
        .build()
        .await
        .expect("Failed to build SiteGate")
}

async fn register(sitegate: &SiteGate<SqliteRepositoryProvider>, email: &str) -> Account {
    let account = NewAccount::builder()
        .email(email)
        .name("Ada")
        .build()
        .unwrap();
    sitegate.register_account(account, PASSWORD).await.unwrap()
}

#[tokio::test]
async fn test_api_token_issuance_is_idempotent() {
    let sitegate = sitegate_with(AccountConfig::default()).await;
    let account = register(&sitegate, "ada@example.com").await;

    let first = sitegate
        .create_api_token("ada@example.com", PASSWORD)
        .await
        .unwrap();
    let second = sitegate
        .create_api_token("ADA@example.com", PASSWORD)
        .await
        .unwrap();

    assert!(!first.is_empty());
    assert_eq!(first, second);

    let found = sitegate
        .find_account_by_api_token(first.as_str())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, account.id);
    assert_eq!(found.api_token, Some(first));
}

#[tokio::test]
async fn test_missing_email_or_password_is_invalid_request() {
    let sitegate = sitegate_with(AccountConfig::default()).await;
    register(&sitegate, "ada@example.com").await;

    let err = sitegate.create_api_token("", PASSWORD).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);

    let err = sitegate
        .create_api_token("ada@example.com", "")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_look_the_same() {
    let sitegate = sitegate_with(AccountConfig::default()).await;
    register(&sitegate, "ada@example.com").await;

    let unknown = sitegate
        .create_api_token("nobody@example.com", PASSWORD)
        .await
        .unwrap_err();
    let wrong = sitegate
        .create_api_token("ada@example.com", "not the password")
        .await
        .unwrap_err();

    assert_eq!(unknown.kind(), ErrorKind::InvalidCredentials);
    assert_eq!(wrong.kind(), ErrorKind::InvalidCredentials);
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn test_invalidate_echoes_token_and_rotates() {
    let sitegate = sitegate_with(AccountConfig::default()).await;
    let account = register(&sitegate, "ada@example.com").await;

    let original = sitegate
        .create_api_token("ada@example.com", PASSWORD)
        .await
        .unwrap();

    let returned = sitegate
        .invalidate_api_token(original.as_str())
        .await
        .unwrap();
    assert_eq!(returned, original);

    assert!(
        sitegate
            .find_account_by_api_token(original.as_str())
            .await
            .unwrap()
            .is_none()
    );

    let stored = sitegate.get_account(&account.id).await.unwrap().unwrap();
    let replacement = stored.api_token.expect("account keeps a token");
    assert_ne!(replacement, original);

    let next = sitegate
        .create_api_token("ada@example.com", PASSWORD)
        .await
        .unwrap();
    assert_eq!(next, replacement);
}

#[tokio::test]
async fn test_invalidate_unknown_token() {
    let sitegate = sitegate_with(AccountConfig::default()).await;
    register(&sitegate, "ada@example.com").await;

    let err = sitegate
        .invalidate_api_token("no-such-token")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidToken);

    let err = sitegate.invalidate_api_token("").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_invalidating_twice_fails_the_second_time() {
    let sitegate = sitegate_with(AccountConfig::default()).await;
    register(&sitegate, "ada@example.com").await;

    let token = sitegate
        .create_api_token("ada@example.com", PASSWORD)
        .await
        .unwrap();

    sitegate.invalidate_api_token(token.as_str()).await.unwrap();
    let err = sitegate
        .invalidate_api_token(token.as_str())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_concurrent_issuance_agrees_on_one_token() {
    let sitegate = Arc::new(sitegate_with(AccountConfig::default()).await);
    register(&sitegate, "ada@example.com").await;

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let sitegate = sitegate.clone();
            tokio::spawn(async move {
                sitegate
                    .create_api_token("ada@example.com", PASSWORD)
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut tokens = Vec::new();
    for handle in handles {
        tokens.push(handle.await.unwrap());
    }

    assert!(tokens.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_concurrent_invalidation_has_one_winner() {
    let sitegate = Arc::new(sitegate_with(AccountConfig::default()).await);
    register(&sitegate, "ada@example.com").await;

    let token = sitegate
        .create_api_token("ada@example.com", PASSWORD)
        .await
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let sitegate = sitegate.clone();
            let token = token.clone();
            tokio::spawn(async move { sitegate.invalidate_api_token(token.as_str()).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(returned) => {
                assert_eq!(returned, token);
                successes += 1;
            }
            Err(e) => assert_eq!(e.kind(), ErrorKind::InvalidToken),
        }
    }

    assert_eq!(successes, 1);
}

#[tokio::test]
async fn test_require_confirmation() {
    let sitegate = sitegate_with(AccountConfig::default().require_confirmation(true)).await;
    let account = register(&sitegate, "ada@example.com").await;

    let err = sitegate
        .create_api_token("ada@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCredentials);

    let confirmed = sitegate.confirm_account(&account.id).await.unwrap();
    assert!(confirmed.confirmed_at.is_some());

    sitegate
        .create_api_token("ada@example.com", PASSWORD)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_changed_password_is_used_for_issuance() {
    let sitegate = sitegate_with(AccountConfig::default()).await;
    let account = register(&sitegate, "ada@example.com").await;

    sitegate
        .change_password(&account.id, "a brand new password")
        .await
        .unwrap();

    let err = sitegate
        .create_api_token("ada@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCredentials);

    sitegate
        .create_api_token("ada@example.com", "a brand new password")
        .await
        .unwrap();
}
