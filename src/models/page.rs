// src/models/page.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Resposta paginada no formato que o frontend já consome:
// { "data": [...], "pagination": { "page": 1, "limit": 20, ... } }
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let pages = total.div_ceil(limit.max(1) as u64);
        Self { page, limit, total, pages }
    }

    /// Deslocamento em linhas para a página pedida (1-indexada).
    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.limit as u64
    }
}

/// Normaliza página/limite vindos da query string.
pub fn clamp_page_params(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_limit).clamp(1, 100);
    (page, limit)
}
