use std::sync::Arc;
use std::time::Duration;

use promotion_service::config::{
    Config, DatabaseConfig, PaystackConfig, SecurityConfig, ServerConfig,
};
use promotion_service::models::Book;
use promotion_service::services::InMemoryPromotionStore;
use promotion_service::Application;
use secrecy::Secret;
use wiremock::MockServer;

pub const TEST_ORIGIN: &str = "http://localhost:3000";

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryPromotionStore>,
    /// Stands in for the Paystack API.
    pub gateway: MockServer,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_gateway_timeout(5).await
    }

    /// Spawn with a specific Paystack client timeout, for slow-gateway tests.
    pub async fn spawn_with_gateway_timeout(timeout_seconds: u64) -> Self {
        let gateway = MockServer::start().await;

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            database: DatabaseConfig {
                url: Secret::new("mongodb://localhost:27017".to_string()),
                db_name: "promotion_test".to_string(),
            },
            paystack: PaystackConfig {
                secret_key: Secret::new("sk_test_secret".to_string()),
                api_base_url: gateway.uri(),
                timeout_seconds,
            },
            security: SecurityConfig {
                allowed_origins: vec![TEST_ORIGIN.to_string()],
            },
            service_name: "promotion-service-test".to_string(),
        };

        let store = Arc::new(InMemoryPromotionStore::new());
        let app = Application::build_with_store(config, store.clone())
            .await
            .expect("Failed to build test application");

        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            store,
            gateway,
            client,
        }
    }

    pub async fn seed_book(&self, id: &str) {
        self.store.insert_book(Book::new(id)).await;
    }

    pub async fn post_initialize(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/initialize-transaction", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_verify(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/verify-payment", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn gateway_request_count(&self) -> usize {
        self.gateway
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}
