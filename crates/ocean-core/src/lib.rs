//! Core domain types for the relayer client.
//!
//! - `Amount`: arbitrary-precision integer amounts in token base units
//! - `UnsignedOrder`, `SignedOrder`, `EcSignature`: the order lifecycle
//! - `Reservation`, `Fragment`: what the relayer returns from a reserve call
//! - `WireOrder`, `serialize_order`: the shape submitted back to the relayer

pub mod address;
pub mod amount;
pub mod error;
pub mod order;
pub mod reservation;
pub mod serializer;
pub mod types;

pub use address::{is_address, validate_address};
pub use amount::Amount;
pub use error::{CoreError, Result};
pub use order::{EcSignature, FeeOption, OrderSide, SignedOrder, UnsignedOrder};
pub use reservation::{
    Fragment, LimitOrderSubmission, LimitPlacement, MarketOrderSubmission, OrderParams,
    Reservation, ReservationRequest,
};
pub use serializer::{serialize_order, WireOrder};
pub use types::{CancelAllParams, CancelOrderParams, MaybeAmount, TokenBalanceQuery, UserQuery};
