use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Todos os casos de negócio são recuperáveis e viram respostas HTTP;
// nada aqui derruba o processo.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // --- Erros do livro-razão de estoque ---
    #[error("Estoque insuficiente: disponível {available}, solicitado {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("Movimentação inválida: {0}")]
    InvalidMovement(String),

    // Outro escritor venceu a corrida pela mesma linha de saldo.
    // O chamador pode simplesmente tentar de novo.
    #[error("Conflito de concorrência, tente novamente")]
    ConcurrencyConflict,

    // --- Erros de catálogo / cadastro ---
    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Local de estoque não encontrado")]
    LocationNotFound,

    #[error("Saldo de estoque não encontrado")]
    StockLevelNotFound,

    #[error("SKU já existe")]
    SkuAlreadyExists,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    // --- Erros de autenticação ---
    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            // Estoque insuficiente leva os números junto, para a UI explicar o porquê.
            AppError::InsufficientStock { available, requested } => {
                let body = Json(json!({
                    "error": "Estoque insuficiente para esta operação.",
                    "available": available,
                    "requested": requested,
                }));
                return (StatusCode::CONFLICT, body).into_response();
            }

            AppError::InvalidMovement(ref reason) => {
                let body = Json(json!({ "error": reason }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::ConcurrencyConflict => (
                StatusCode::CONFLICT,
                "Outra operação alterou este saldo ao mesmo tempo. Tente novamente.",
            ),

            AppError::ProductNotFound => (StatusCode::NOT_FOUND, "Produto não encontrado."),
            AppError::LocationNotFound => (StatusCode::NOT_FOUND, "Local de estoque não encontrado."),
            AppError::StockLevelNotFound => (StatusCode::NOT_FOUND, "Saldo de estoque não encontrado."),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "Usuário não encontrado."),

            AppError::SkuAlreadyExists => (StatusCode::CONFLICT, "Este SKU já está em uso."),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "Este e-mail já está em uso."),

            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos."),
            AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Token de autenticação inválido ou ausente.")
            }

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que o `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
