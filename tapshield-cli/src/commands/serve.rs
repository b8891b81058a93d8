//! Serve command - HTTP claim endpoint
//!
//! Routes:
//! - `POST /api/claim` with `{"wallet": "<hex>"}` pays one claim
//! - `GET /api/stats` returns the faucet registry
//! - `GET /api/history/{wallet}` lists a wallet's claims on this faucet
//!
//! Errors are returned as `{"success": false, "error": ..., "code": ...}`
//! with 400 for bad input, 429 while a cooldown or claim is pending and 500
//! for everything else.

use actix_web::http::{header, StatusCode};
use actix_web::{web, App, HttpResponse, HttpServer, ResponseError};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tapshield_ledger::{
    Address, ClaimAuthority, ClaimError, ClaimReceipt, ClaimRecord, ErrorClass, FaucetConfig,
    FaucetRegistry, Identity, LedgerError,
};

use crate::ui;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("wallet address is required")]
    MissingWallet,
    #[error("invalid wallet address: {0}")]
    InvalidWallet(String),
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error(transparent)]
    Claim(#[from] ClaimError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::MissingWallet => "MISSING_WALLET",
            ApiError::InvalidWallet(_) => "INVALID_WALLET",
            ApiError::InvalidBody(_) => "INVALID_BODY",
            ApiError::Claim(e) => e.code_str(),
            ApiError::Ledger(e) => e.code_str(),
        }
    }

    fn ledger_error(&self) -> Option<&LedgerError> {
        match self {
            ApiError::Claim(ClaimError::Ledger(e)) | ApiError::Ledger(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingWallet | ApiError::InvalidWallet(_) | ApiError::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => match self.ledger_error() {
                Some(LedgerError::ClaimTooRecent { .. } | LedgerError::ClaimInProgress { .. }) => {
                    StatusCode::TOO_MANY_REQUESTS
                }
                Some(e) if e.class() == ErrorClass::Validation => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let Some(secs) = self.ledger_error().and_then(LedgerError::retry_after_secs) {
            response.insert_header((header::RETRY_AFTER, secs.to_string()));
        }
        response.json(ErrorBody {
            success: false,
            error: self.to_string(),
            code: self.code(),
        })
    }
}

pub struct AppState {
    pub authority: Arc<ClaimAuthority>,
}

#[derive(Deserialize, Debug)]
pub struct ClaimRequest {
    #[serde(default)]
    pub wallet: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ClaimResponse {
    pub success: bool,
    pub amount: u64,
    pub signature: String,
    pub record_id: Address,
    pub receipt: ClaimReceipt,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub registry: FaucetRegistry,
    pub claim_amount: u64,
    pub cooldown_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HistoryEntry {
    pub record_id: Address,
    #[serde(flatten)]
    pub record: ClaimRecord,
}

fn parse_wallet(raw: &str) -> Result<Identity, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::MissingWallet);
    }
    trimmed
        .parse()
        .map_err(|e: LedgerError| ApiError::InvalidWallet(e.to_string()))
}

async fn claim(
    state: web::Data<AppState>,
    body: web::Json<ClaimRequest>,
) -> Result<web::Json<ClaimResponse>, ApiError> {
    let raw = body.wallet.as_deref().ok_or(ApiError::MissingWallet)?;
    let claimer = parse_wallet(raw)?;

    let receipt = state.authority.request_default_claim(&claimer).await?;
    Ok(web::Json(ClaimResponse {
        success: true,
        amount: receipt.amount,
        signature: receipt.transfer_signature.clone(),
        record_id: receipt.record_id,
        receipt,
    }))
}

async fn stats(state: web::Data<AppState>) -> Result<web::Json<StatsResponse>, ApiError> {
    let config = state.authority.config();
    Ok(web::Json(StatsResponse {
        registry: state.authority.stats()?,
        claim_amount: config.claim_amount,
        cooldown_seconds: config.cooldown_seconds,
    }))
}

async fn history(
    state: web::Data<AppState>,
    wallet: web::Path<String>,
) -> Result<web::Json<Vec<HistoryEntry>>, ApiError> {
    let claimer = parse_wallet(&wallet)?;
    let entries = state
        .authority
        .history(&claimer)?
        .into_iter()
        .map(|record| HistoryEntry {
            record_id: record.address(),
            record,
        })
        .collect();
    Ok(web::Json(entries))
}

/// Mount the API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::InvalidBody(err.to_string()).into()),
    )
    .service(web::resource("/api/claim").route(web::post().to(claim)))
    .service(web::resource("/api/stats").route(web::get().to(stats)))
    .service(web::resource("/api/history/{wallet}").route(web::get().to(history)));
}

#[tracing::instrument(skip(storage_dir, config))]
pub async fn run(storage_dir: &Path, config: &FaucetConfig, _verbose: bool) -> Result<()> {
    let authority = super::build_authority(storage_dir, config)?;
    let faucet = super::require_faucet(&authority)?;
    let state = web::Data::new(AppState {
        authority: Arc::new(authority),
    });

    ui::header("TapShield Faucet");
    ui::key_value("Faucet", &faucet.to_string());
    ui::key_value("Claim amount", &ui::tokens(config.claim_amount));
    ui::key_value("Cooldown", &ui::duration(config.cooldown_secs));
    ui::success(&format!("Listening on http://{}", config.bind));

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(&config.bind)
    .with_context(|| format!("Failed to bind {}", config.bind))?
    .run()
    .await?;

    ui::info("Server stopped");
    Ok(())
}
