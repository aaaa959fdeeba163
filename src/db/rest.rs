// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! REST table API (PostgREST dialect) behind [`TableService`].

use crate::db::{TableQuery, TableService};
use crate::error::AppError;
use crate::services::supabase::SupabaseClient;
use async_trait::async_trait;
use serde_json::Value;

/// Table service backed by the hosted REST endpoint.
#[derive(Clone)]
pub struct RestTables {
    client: SupabaseClient,
}

impl RestTables {
    /// Share the client's HTTP pool and session token.
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

/// Query-string pairs for a select: `select=*`, `col=eq.value`, `order=col.dir`.
pub(crate) fn select_params(query: &TableQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(
        query
            .filters
            .iter()
            .map(|(column, value)| (column.clone(), format!("eq.{}", value))),
    );
    if let Some(order) = query.order {
        let dir = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, dir)));
    }
    params
}

fn id_filter(id: &str) -> [(&'static str, String); 1] {
    [("id", format!("eq.{}", id))]
}

/// Mutations answer with an array of affected rows; take the single one.
fn single_row(rows: Vec<Value>, table: &str, id: &str) -> Result<Value, AppError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("{} row {}", table, id)))
}

#[async_trait]
impl TableService for RestTables {
    async fn select(&self, table: &str, query: &TableQuery) -> Result<Vec<Value>, AppError> {
        let response = self
            .client
            .authorize(self.client.http().get(self.client.rest_url(table)))
            .query(&select_params(query))
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.client.check_response_json(response).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, AppError> {
        let response = self
            .client
            .authorize(self.client.http().post(self.client.rest_url(table)))
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let rows: Vec<Value> = self.client.check_response_json(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::Backend(format!("Insert into {} returned no rows", table)))
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, AppError> {
        let response = self
            .client
            .authorize(self.client.http().patch(self.client.rest_url(table)))
            .query(&id_filter(id))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let rows: Vec<Value> = self.client.check_response_json(response).await?;
        single_row(rows, table, id)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), AppError> {
        let response = self
            .client
            .authorize(self.client.http().delete(self.client.rest_url(table)))
            .query(&id_filter(id))
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.client.check_response(response).await?;
        Ok(())
    }
}
