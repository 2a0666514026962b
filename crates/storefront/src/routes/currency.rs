//! Display currency selection.

use axum::{Form, response::Redirect};
use serde::Deserialize;
use tracing::instrument;

use segishop_core::types::CurrencyCode;

use crate::error::AppError;
use crate::middleware::ShopperSession;
use crate::routes::safe_return_to;

/// Currency selector form data.
#[derive(Debug, Deserialize)]
pub struct CurrencyForm {
    pub currency: String,
    pub return_to: Option<String>,
}

/// Store the chosen currency in the session and go back where the shopper was.
#[instrument(skip(shopper))]
pub async fn select(
    shopper: ShopperSession,
    Form(form): Form<CurrencyForm>,
) -> Result<Redirect, AppError> {
    let code = form
        .currency
        .parse::<CurrencyCode>()
        .map_err(AppError::BadRequest)?;
    shopper.set_currency(code).await?;
    tracing::info!(currency = %code, "Display currency changed");
    Ok(Redirect::to(&safe_return_to(form.return_to.as_deref(), "/")))
}
