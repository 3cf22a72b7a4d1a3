use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use orca_core::{
    AccountSnapshot, AuditEvent, AuditLogEntry, AuditRecord, AuditStatus, BrokerStatus,
    OptionChain, Position, RiskRules, RiskRulesUpdate, SpreadConfig, Trade, ValidationOutcome,
};
use orca_engine::SubmitOutcome;

use crate::error::ApiError;
use crate::server::AppState;

pub async fn health() -> &'static str {
    "OK"
}

/// `GET /api/account`: account figures from the selected broker provider.
pub async fn get_account(
    State(state): State<AppState>,
) -> Result<Json<AccountSnapshot>, ApiError> {
    let account = state.broker.get_account().await?;
    Ok(Json(account))
}

/// `GET /api/positions`
pub async fn get_positions(State(state): State<AppState>) -> Json<Vec<Position>> {
    Json(state.store.get_positions().await)
}

/// `POST /api/positions/:position_id/close`
pub async fn close_position(
    State(state): State<AppState>,
    Path(position_id): Path<String>,
) -> Result<Json<Position>, ApiError> {
    let position = state.store.get_position(&position_id).await?;

    state
        .audit
        .record(
            AuditRecord::new(
                AuditEvent::PositionClosed,
                AuditStatus::Success,
                format!("{} {} closed", position.symbol, position.strategy),
            )
            .for_trade(&position.trade_id),
        )
        .await?;

    let position = state.store.close_position(&position_id).await?;
    state.store.adjust_margin(-position.margin_required).await;

    Ok(Json(position))
}

#[derive(Debug, Deserialize)]
pub struct ChainParams {
    pub expiration: Option<NaiveDate>,
}

/// `GET /api/options/chain/:symbol?expiration=YYYY-MM-DD`
pub async fn get_option_chain(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<ChainParams>,
) -> Result<Json<Vec<OptionChain>>, ApiError> {
    let chains = state
        .broker
        .get_option_chain(&symbol, params.expiration)
        .await?;
    Ok(Json(chains))
}

/// `GET /api/trades`
pub async fn list_trades(State(state): State<AppState>) -> Json<Vec<Trade>> {
    Json(state.store.get_trades().await)
}

/// `POST /api/trades/validate`: dry run returning the full rule result set.
pub async fn validate_trade(
    State(state): State<AppState>,
    Json(proposal): Json<SpreadConfig>,
) -> Result<Json<ValidationOutcome>, ApiError> {
    let outcome = state.engine.validate(&proposal).await?;
    Ok(Json(outcome))
}

/// `POST /api/trades/submit`: full pipeline; the response carries the
/// created trade (pending or rejected) plus the diagnostics.
pub async fn submit_trade(
    State(state): State<AppState>,
    Json(proposal): Json<SpreadConfig>,
) -> Result<(StatusCode, Json<SubmitOutcome>), ApiError> {
    let submitted = state.engine.submit(proposal).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

/// `POST /api/trades/:trade_id/cancel`
pub async fn cancel_trade(
    State(state): State<AppState>,
    Path(trade_id): Path<String>,
) -> Result<Json<Trade>, ApiError> {
    let trade = state.engine.cancel(&trade_id).await?;
    Ok(Json(trade))
}

/// `GET /api/rules`: the active rule version.
pub async fn get_rules(State(state): State<AppState>) -> Json<RiskRules> {
    Json(state.store.get_risk_rules().await)
}

/// `POST /api/rules`: appends a new rule version and audits the change.
pub async fn update_rules(
    State(state): State<AppState>,
    Json(update): Json<RiskRulesUpdate>,
) -> Result<Json<RiskRules>, ApiError> {
    let rules = state.store.create_or_update_risk_rules(update).await;

    state
        .audit
        .record(
            AuditRecord::new(
                AuditEvent::RulesUpdate,
                AuditStatus::Applied,
                format!("Risk rules updated: {} v{}", rules.name, rules.version),
            )
            .by("admin"),
        )
        .await?;

    Ok(Json(rules))
}

#[derive(Debug, Deserialize)]
pub struct LogParams {
    pub trade_id: Option<String>,
}

/// `GET /api/logs?trade_id=...`: audit entries in insertion order.
pub async fn get_logs(
    State(state): State<AppState>,
    Query(params): Query<LogParams>,
) -> Json<Vec<AuditLogEntry>> {
    let entries = match params.trade_id {
        Some(id) => state.audit.entries_for_trade(&id).await,
        None => state.audit.entries().await,
    };
    Json(entries)
}

/// `GET /api/broker/status`: the startup-selected provider banner.
pub async fn broker_status(State(state): State<AppState>) -> Json<BrokerStatus> {
    Json(state.broker_status.clone())
}
