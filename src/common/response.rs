// src/common/response.rs

use serde::Serialize;
use utoipa::ToSchema;

// Envelope padrão consumido pelo painel: { success, data }
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

/// Lista "paginada". Hoje sempre devolve o conjunto completo numa única página.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn full(items: Vec<T>) -> Self {
        let total = items.len();
        Self {
            items,
            total,
            page: 1,
            page_size: total,
            total_pages: 1,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    #[schema(example = "Appointment deleted successfully")]
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_page_reports_every_item_on_page_one() {
        let page = Page::full(vec![1, 2, 3]);
        assert_eq!(page.total, 3);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 3);
        assert_eq!(page.total_pages, 1);

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pageSize"], 3);
        assert_eq!(json["totalPages"], 1);
    }
}
