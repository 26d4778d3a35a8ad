pub mod models;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::FireflyConfig;
use crate::error::{Error, Result};

use models::{
    AccountAttributes, BudgetAttributes, BudgetLimitAttributes, CategoryAttributes, Document,
    Resource, TransactionGroupAttributes,
};
pub use types::{
    Account, AccountType, Budget, Category, CategoryRef, DateRange, Transaction, TransactionType,
};

/// Longest response body excerpt carried in an error message.
const ERROR_BODY_LIMIT: usize = 500;

/// Read-only view of the ledger the reports are built from.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Active budgets with their limit and the amount spent in `range`.
    async fn budgets(&self, range: DateRange) -> Result<Vec<Budget>>;

    /// Every category with spent/earned sums restricted to `range`.
    async fn categories(&self, range: DateRange) -> Result<Vec<Category>>;

    /// Category ids and names, without sums.
    async fn list_categories(&self) -> Result<Vec<CategoryRef>>;

    async fn transactions(
        &self,
        range: DateRange,
        kind: TransactionType,
    ) -> Result<Vec<Transaction>>;

    async fn accounts(&self, kind: AccountType) -> Result<Vec<Account>>;
}

/// Firefly III REST client (`/api/v1`).
pub struct FireflyClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl FireflyClient {
    pub fn new(config: &FireflyConfig) -> Result<Self> {
        // keep any sub-path the instance is served under
        let root = format!("{}/", config.api_url.trim_end_matches('/'));
        let base_url = Url::parse(&root)
            .and_then(|url| url.join("api/v1/"))
            .map_err(|e| Error::Config(format!("invalid firefly.api_url: {}", e)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| Error::Config(format!("failed to build Firefly HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| Error::Network(format!("invalid request path {}: {}", path, e)))?;

        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Network(format!("GET {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(Error::Network(format!(
                "Firefly API returned {} for {}: {}",
                status, path, excerpt
            )));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Decode(format!("unexpected payload from {}: {}", path, e)))
    }

    /// Follows `meta.pagination.total_pages` and concatenates every page.
    async fn get_all_pages<A: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Resource<A>>> {
        let mut items = Vec::new();
        let mut page: u32 = 1;
        loop {
            let mut paged = query.to_vec();
            paged.push(("page", page.to_string()));
            let document: Document<Vec<Resource<A>>> = self.get_json(path, &paged).await?;
            items.extend(document.data);
            if page >= document.meta.pagination.total_pages {
                break;
            }
            page += 1;
        }
        Ok(items)
    }
}

#[async_trait]
impl Ledger for FireflyClient {
    async fn budgets(&self, range: DateRange) -> Result<Vec<Budget>> {
        let query = range.query();
        let budgets: Vec<Resource<BudgetAttributes>> =
            self.get_all_pages("budgets", &query).await?;
        let limits: Vec<Resource<BudgetLimitAttributes>> =
            self.get_all_pages("budget-limits", &query).await?;

        let mut result = Vec::with_capacity(budgets.len());
        for budget in budgets {
            if budget.attributes.active == Some(false) {
                continue;
            }
            let limit = limits
                .iter()
                .rev()
                .find(|limit| limit.attributes.budget_id == budget.id)
                .map(|limit| &limit.attributes);

            let mut tx_query = query.to_vec();
            tx_query.push(("type", TransactionType::All.as_str().to_string()));
            let transactions: Vec<Resource<TransactionGroupAttributes>> = self
                .get_all_pages(&format!("budgets/{}/transactions", budget.id), &tx_query)
                .await?;
            let groups: Vec<TransactionGroupAttributes> =
                transactions.into_iter().map(|t| t.attributes).collect();

            result.push(Budget::from_parts(
                budget.id,
                budget.attributes,
                limit,
                &groups,
            ));
        }
        Ok(result)
    }

    async fn categories(&self, range: DateRange) -> Result<Vec<Category>> {
        let query = range.query();
        let mut result = Vec::new();
        for category in self.list_categories().await? {
            let document: Document<Resource<CategoryAttributes>> = self
                .get_json(&format!("categories/{}", category.id), &query)
                .await?;
            result.push(Category::from_attributes(
                document.data.id,
                document.data.attributes,
            ));
        }
        Ok(result)
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRef>> {
        let categories: Vec<Resource<CategoryAttributes>> =
            self.get_all_pages("categories", &[]).await?;
        Ok(categories
            .into_iter()
            .map(|c| CategoryRef {
                id: c.id,
                name: c.attributes.name,
            })
            .collect())
    }

    async fn transactions(
        &self,
        range: DateRange,
        kind: TransactionType,
    ) -> Result<Vec<Transaction>> {
        let mut query = range.query().to_vec();
        query.push(("type", kind.as_str().to_string()));
        let groups: Vec<Resource<TransactionGroupAttributes>> =
            self.get_all_pages("transactions", &query).await?;
        Ok(groups
            .into_iter()
            .filter_map(|group| Transaction::from_group(group.attributes))
            .collect())
    }

    async fn accounts(&self, kind: AccountType) -> Result<Vec<Account>> {
        let query = [("type", kind.as_str().to_string())];
        let accounts: Vec<Resource<AccountAttributes>> =
            self.get_all_pages("accounts", &query).await?;
        Ok(accounts.into_iter().map(|a| a.attributes.into()).collect())
    }
}
