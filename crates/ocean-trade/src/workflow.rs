//! Reserve, sign, serialize and submit orders.
//!
//! Steps run strictly in sequence. The first failing step aborts the rest and
//! its error is returned, so a partially signed order is never submitted.

use ocean_core::{
    serialize_order, validate_address, CancelAllParams, CancelOrderParams, LimitOrderSubmission,
    LimitPlacement, MarketOrderSubmission, MaybeAmount, OrderParams, Reservation,
    ReservationRequest, SignedOrder, TokenBalanceQuery, UnsignedOrder, UserQuery,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::TradeApi;
use crate::error::{TradeError, TradeResult};
use crate::signer::{order_hash_hex, OrderSigner};

/// Observer for the raw reservation. Does not affect control flow.
pub type OnReserved<'a> = &'a (dyn Fn(&Reservation) + Send + Sync);

/// Drives order placement against the relayer.
pub struct OrderWorkflow<A, S> {
    api: A,
    signer: S,
}

impl<A: TradeApi, S: OrderSigner> OrderWorkflow<A, S> {
    pub fn new(api: A, signer: S) -> Self {
        Self { api, signer }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Reserve a market order, sign the matching fragment as `account` and
    /// submit `{signedMatchingOrder, matchingOrderID}`.
    ///
    /// # Errors
    /// - `InvalidAddress` before any request if `account` is malformed
    /// - `Reservation`, `Signing`, `Submission` from the failing step
    /// - `IncompleteReservation` if there is no signable matching fragment
    pub async fn new_market_order(
        &self,
        params: &OrderParams,
        account: &str,
        on_reserved: Option<OnReserved<'_>>,
    ) -> TradeResult<Value> {
        check_account(account)?;

        let request = ReservationRequest {
            wallet_address: account,
            params,
        };
        let reservation = self
            .api
            .reserve_market_order(&request)
            .await
            .map_err(TradeError::Reservation)?;
        info!(
            matching_order_id = ?reservation.matching_order_id,
            side = %params.side,
            "Market order reserved"
        );

        if let Some(observer) = on_reserved {
            observer(&reservation);
        }

        let unsigned = reservation.matching_order().ok_or_else(|| {
            TradeError::IncompleteReservation(
                "reservation has no signable matching order".to_string(),
            )
        })?;
        let signed = self.sign_order(&unsigned.with_maker(account), account).await?;

        let submission = MarketOrderSubmission {
            signed_matching_order: serialize_order(&signed),
            matching_order_id: reservation.matching_order_id.clone(),
        };
        let response = self
            .api
            .place_market_order(&submission)
            .await
            .map_err(TradeError::Submission)?;
        info!(order_hash = %signed.order_hash, "Market order submitted");
        Ok(response)
    }

    /// Reserve a limit order, sign whichever fragments the relayer returned
    /// and submit the assembled body.
    ///
    /// A rejected fragment is skipped. If neither fragment is signable the
    /// empty body is still submitted and the relayer's answer returned.
    pub async fn new_limit_order(
        &self,
        params: &OrderParams,
        account: &str,
        on_reserved: Option<OnReserved<'_>>,
    ) -> TradeResult<Value> {
        check_account(account)?;

        let request = ReservationRequest {
            wallet_address: account,
            params,
        };
        let reservation = self
            .api
            .reserve_limit_order(&request)
            .await
            .map_err(TradeError::Reservation)?;
        debug!(
            matching_order_id = ?reservation.matching_order_id,
            has_target = reservation.unsigned_target_order.is_some(),
            has_matching = reservation.unsigned_matching_order.is_some(),
            "Limit order reserved"
        );

        if let Some(observer) = on_reserved {
            observer(&reservation);
        }

        let mut submission = LimitOrderSubmission::default();
        if let Some(target) = reservation.target_order() {
            let signed = self.sign_order(&target.with_maker(account), account).await?;
            submission.signed_target_order = Some(serialize_order(&signed));
        }
        if let Some(matching) = reservation.matching_order() {
            let signed = self
                .sign_order(&matching.with_maker(account), account)
                .await?;
            submission.signed_matching_order = Some(serialize_order(&signed));
            submission.matching_order_id = reservation.matching_order_id.clone();
        }

        let placement = submission.placement();
        if placement == LimitPlacement::Empty {
            debug!("Limit reservation has no signable fragment");
        }

        let response = self
            .api
            .place_limit_order(&submission)
            .await
            .map_err(TradeError::Submission)?;
        info!(placement = ?placement, "Limit order submitted");
        Ok(response)
    }

    /// Hash the order's current fields and sign as `signer_address`.
    /// Returns a new value; `order` is not modified.
    pub async fn sign_order(
        &self,
        order: &UnsignedOrder,
        signer_address: &str,
    ) -> TradeResult<SignedOrder> {
        let order_hash = order_hash_hex(order)?;
        let ec_signature = self
            .signer
            .sign_order_hash(&order_hash, signer_address)
            .await?;
        Ok(SignedOrder {
            order: order.clone(),
            order_hash,
            ec_signature,
        })
    }

    pub async fn cancel_order(&self, params: &CancelOrderParams) -> TradeResult<Value> {
        self.api
            .cancel_order(params)
            .await
            .map_err(TradeError::Request)
    }

    pub async fn cancel_all_orders(&self, params: &CancelAllParams) -> TradeResult<Value> {
        self.api
            .cancel_all_orders(params)
            .await
            .map_err(TradeError::Request)
    }

    pub async fn user_history(&self, params: &UserQuery) -> TradeResult<Value> {
        self.api
            .user_history(params)
            .await
            .map_err(TradeError::Request)
    }

    pub async fn user_data(&self) -> TradeResult<Value> {
        self.api.user_data().await.map_err(TradeError::Request)
    }

    /// Available balance as a decimal, or the raw response if it has none.
    pub async fn token_available_balance(
        &self,
        query: &TokenBalanceQuery,
    ) -> TradeResult<MaybeAmount> {
        let response = self
            .api
            .token_available_balance(query)
            .await
            .map_err(TradeError::Request)?;
        Ok(MaybeAmount::from_field(response, "availableBalance"))
    }

    /// Committed amount as a decimal, or the raw response if it has none.
    pub async fn token_committed_amount(
        &self,
        query: &TokenBalanceQuery,
    ) -> TradeResult<MaybeAmount> {
        let response = self
            .api
            .token_committed_amount(query)
            .await
            .map_err(TradeError::Request)?;
        Ok(MaybeAmount::from_field(response, "amount"))
    }
}

fn check_account(account: &str) -> TradeResult<()> {
    validate_address(account)
        .map(|_| ())
        .map_err(|_| TradeError::InvalidAddress(account.to_string()))
}
