// Enveloppe de réponse commune : {"success": true, "message"?: ..., "data"?: ...}

use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "data": data,
    }))
}

pub fn ok_with_message<T: Serialize>(message: impl Into<String>, data: T) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": message.into(),
        "data": data,
    }))
}

pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> HttpResponse {
    HttpResponse::Created().json(json!({
        "success": true,
        "message": message.into(),
        "data": data,
    }))
}

/// Réponse sans données (actions)
pub fn message(message: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": message.into(),
    }))
}

/// Paramètres de pagination `?page=&page_size=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl PageParams {
    /// Page 1-based
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        (self.page() - 1) * self.page_size()
    }
}

/// Une page de résultats + le total
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub data: Vec<T>,
}

impl<T: Serialize> Page<T> {
    pub fn new(data: Vec<T>, count: u64, params: &PageParams) -> Self {
        Self {
            count,
            page: params.page(),
            page_size: params.page_size(),
            data,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            page_size: self.page_size,
            data: self.data.into_iter().map(f).collect(),
        }
    }

    pub fn into_response(self) -> HttpResponse {
        HttpResponse::Ok().json(json!({
            "success": true,
            "count": self.count,
            "page": self.page,
            "page_size": self.page_size,
            "data": self.data,
        }))
    }
}
