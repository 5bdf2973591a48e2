//! First-run initialization.
//!
//! Seeds two accounts and a starter catalogue when the store holds no
//! products. The gate looks at products only: a store with users but no
//! products is seeded again, and two concurrent calls can both seed.

use axum::http::StatusCode;
use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use lpg_core::{IdentityEmail, NewProduct, Product, ProductId, Role, User};

use crate::db::kv::KvStore;
use crate::db::{ProductRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::provider::AuthProvider;

/// A seed account: username, password, role.
struct SeedAccount {
    username: &'static str,
    password: &'static str,
    role: &'static str,
    /// Whether a creation failure aborts initialization.
    required: bool,
}

const SEED_ACCOUNTS: &[SeedAccount] = &[
    SeedAccount {
        username: "admin",
        password: "admin123",
        role: Role::ADMIN,
        required: true,
    },
    SeedAccount {
        username: "staff",
        password: "staff123",
        role: Role::STAFF,
        required: false,
    },
];

/// Starter catalogue: name, category, quantity, price in centavos.
const SEED_PRODUCTS: &[(&str, &str, i32, i64)] = &[
    ("11kg Brent Gas", "Gas Tank", 15, 95_000),
    ("22kg Superkalan Gas", "Gas Tank", 25, 185_000),
    ("2.7kg Superkalan", "Gas Tank", 18, 45_000),
    ("LPG Hose", "Accessories", 50, 15_000),
    ("LPG Regulator", "Accessories", 35, 28_000),
    ("Gas Stove Burner", "Accessories", 20, 32_000),
    ("O-ring", "Accessories", 100, 2_500),
    ("Gas Clamp", "Accessories", 75, 3_500),
    ("Double Burner Stove", "Stove", 12, 185_000),
    ("Megakalan", "Stove", 8, 250_000),
];

/// Result of an initialization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// Products already existed; nothing was written.
    AlreadyInitialized,
    /// Seed data was written.
    Seeded {
        /// Usernames whose accounts and profiles were created.
        accounts: Vec<String>,
        /// Number of products written.
        products: usize,
    },
}

impl InitOutcome {
    /// Human-readable summary returned to the caller.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "Database already initialized",
            Self::Seeded { .. } => {
                "Database initialized successfully with default users and products"
            }
        }
    }
}

/// Seeds default accounts and products.
pub struct SeedService<'a> {
    store: &'a dyn KvStore,
    provider: &'a dyn AuthProvider,
    identity_domain: &'a str,
}

impl<'a> SeedService<'a> {
    /// Create a new seed service.
    #[must_use]
    pub const fn new(
        store: &'a dyn KvStore,
        provider: &'a dyn AuthProvider,
        identity_domain: &'a str,
    ) -> Self {
        Self {
            store,
            provider,
            identity_domain,
        }
    }

    /// Seed the store unless products already exist.
    ///
    /// An account the provider reports as already registered is skipped
    /// without writing a profile for it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AuthProvider` (400) if the admin account cannot be
    /// created for any other reason, or a store error.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<InitOutcome> {
        let products = ProductRepository::new(self.store);
        if products.any_exists().await? {
            info!("Store already initialized, skipping seed");
            return Ok(InitOutcome::AlreadyInitialized);
        }

        let mut accounts = Vec::new();
        for account in SEED_ACCOUNTS {
            if self.seed_account(account).await? {
                accounts.push(account.username.to_string());
            }
        }

        let now = Utc::now();
        let catalogue: Vec<Product> = SEED_PRODUCTS
            .iter()
            .map(|&(name, category, quantity, centavos)| {
                Product::create(
                    ProductId::generate(),
                    NewProduct {
                        name: name.to_string(),
                        category: category.to_string(),
                        quantity,
                        price: Decimal::new(centavos, 2),
                        low_stock_threshold: None,
                    },
                    now,
                )
            })
            .collect();
        products.put_many(&catalogue).await?;

        info!(
            accounts = accounts.len(),
            products = catalogue.len(),
            "Store initialized"
        );
        Ok(InitOutcome::Seeded {
            accounts,
            products: catalogue.len(),
        })
    }

    /// Create one seed account and its profile. Returns whether it was
    /// created.
    async fn seed_account(&self, account: &SeedAccount) -> Result<bool> {
        let email = IdentityEmail::for_username(account.username, self.identity_domain)
            .map_err(|e| AppError::Internal(format!("invalid seed username: {e}")))?;
        let password = SecretString::from(account.password);

        match self.provider.create_user(&email, &password).await {
            Ok(id) => {
                let user = User::new(id, account.username, Role::from(account.role), Utc::now());
                UserRepository::new(self.store).put(&user).await?;
                Ok(true)
            }
            Err(e) if e.is_already_registered() => {
                info!(username = account.username, "Seed account already registered");
                Ok(false)
            }
            Err(e) if account.required => Err(AppError::provider(
                StatusCode::BAD_REQUEST,
                format!("Failed to create {}: {e}", account.username),
                e,
            )),
            Err(e) => {
                warn!(username = account.username, error = %e, "Failed to create seed account");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::db::MemoryStore;
    use crate::provider::{MemoryAuthProvider, ProviderError, ProviderSession};

    const DOMAIN: &str = "k4jlpg.local";

    #[tokio::test]
    async fn test_seed_scenario() {
        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let seed = SeedService::new(&store, &provider, DOMAIN);

        let outcome = seed.initialize().await.unwrap();
        assert_eq!(
            outcome,
            InitOutcome::Seeded {
                accounts: vec!["admin".to_string(), "staff".to_string()],
                products: 10,
            }
        );

        let products = ProductRepository::new(&store).list_all().await.unwrap();
        assert_eq!(products.len(), 10);
        let stove = products.iter().find(|p| p.name == "Megakalan").unwrap();
        assert_eq!(stove.price, Decimal::new(2500, 0));
        assert_eq!(stove.quantity, 8);

        let mut users = UserRepository::new(&store).list_all().await.unwrap();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        assert_eq!(users.len(), 2);
        assert!(users[0].is_admin());
        assert_eq!(users[1].role, Role::staff());
    }

    #[tokio::test]
    async fn test_second_call_is_noop() {
        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let seed = SeedService::new(&store, &provider, DOMAIN);

        seed.initialize().await.unwrap();
        let outcome = seed.initialize().await.unwrap();
        assert_eq!(outcome, InitOutcome::AlreadyInitialized);
        assert_eq!(outcome.message(), "Database already initialized");
        assert_eq!(ProductRepository::new(&store).list_all().await.unwrap().len(), 10);
        assert_eq!(provider.account_count(), 2);
    }

    #[tokio::test]
    async fn test_registered_accounts_are_skipped() {
        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let email = IdentityEmail::for_username("admin", DOMAIN).unwrap();
        provider
            .create_user(&email, &SecretString::from("other"))
            .await
            .unwrap();

        let outcome = SeedService::new(&store, &provider, DOMAIN)
            .initialize()
            .await
            .unwrap();
        assert_eq!(
            outcome,
            InitOutcome::Seeded {
                accounts: vec!["staff".to_string()],
                products: 10,
            }
        );
        let users = UserRepository::new(&store).list_all().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "staff");
    }

    /// Provider that refuses every new account.
    struct RefusingProvider;

    #[async_trait]
    impl AuthProvider for RefusingProvider {
        async fn create_user(
            &self,
            _email: &IdentityEmail,
            _password: &SecretString,
        ) -> std::result::Result<lpg_core::UserId, ProviderError> {
            Err(ProviderError::Rejected {
                status: 422,
                message: "Signups not allowed".to_string(),
            })
        }

        async fn sign_in(
            &self,
            _email: &IdentityEmail,
            _password: &SecretString,
        ) -> std::result::Result<ProviderSession, ProviderError> {
            Err(ProviderError::InvalidCredentials)
        }

        async fn get_user(&self, _token: &str) -> std::result::Result<lpg_core::UserId, ProviderError> {
            Err(ProviderError::InvalidToken)
        }

        async fn sign_out(&self, _token: &str) -> std::result::Result<(), ProviderError> {
            Ok(())
        }

        async fn delete_user(&self, _id: &lpg_core::UserId) -> std::result::Result<(), ProviderError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_admin_failure_aborts_before_products() {
        let store = MemoryStore::new();
        let err = SeedService::new(&store, &RefusingProvider, DOMAIN)
            .initialize()
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Failed to create admin: Signups not allowed");
        assert!(store.is_empty());
    }
}
