// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::postgres::PgPoolOptions;

use crate::{
    db::{LedgerStore, MemLedgerStore, PgLedgerStore},
    services::{
        auth_service::AuthService, catalog_service::CatalogService, ledger_service::LedgerService,
        notification_service::NotificationService, report_service::ReportService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub catalog_service: CatalogService,
    pub ledger_service: LedgerService,
    pub report_service: ReportService,
}

impl AppState {
    // A assinatura retorna um Result: se a configuração falhar,
    // a aplicação não deve iniciar.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // STORAGE_DRIVER=memory roda sem Postgres (demonstração e testes).
        let driver = env::var("STORAGE_DRIVER").unwrap_or_else(|_| "postgres".to_string());

        let store: Arc<dyn LedgerStore> = if driver == "memory" {
            tracing::warn!("⚠️ Armazenamento em memória ativo: nada será persistido.");
            Arc::new(MemLedgerStore::new())
        } else {
            let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");

            // Conecta ao banco de dados, usando '?' para propagar erros
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .connect(&database_url)
                .await?;

            tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

            sqlx::migrate!().run(&db_pool).await?;
            tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

            Arc::new(PgLedgerStore::new(db_pool))
        };

        Ok(Self::with_store(store, jwt_secret))
    }

    /// Monta o estado em cima de um armazenamento já construído.
    /// É o caminho que os testes usam, com o `MemLedgerStore`.
    pub fn with_store(store: Arc<dyn LedgerStore>, jwt_secret: String) -> Self {
        Self::with_notifications(store, jwt_secret, NotificationService::log_only())
    }

    pub fn with_notifications(
        store: Arc<dyn LedgerStore>,
        jwt_secret: String,
        notifications: NotificationService,
    ) -> Self {
        // --- Monta o gráfico de dependências ---
        let auth_service = AuthService::new(store.clone(), jwt_secret);
        let catalog_service = CatalogService::new(store.clone());
        let ledger_service = LedgerService::new(store.clone(), notifications);
        let report_service = ReportService::new(store);

        Self {
            auth_service,
            catalog_service,
            ledger_service,
            report_service,
        }
    }
}
