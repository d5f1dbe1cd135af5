//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The matching core: a pure, book-mutating walk across the opposite side of
// the book, shared by every order type. Limit/Market/Ioc/Fok differ only in
// whether the unfilled remainder rests, and whether the walk is allowed to
// happen at all (Fok requires a dry-run guarantee first).
//
// | Function            | Responsibility                                                     |
// |----------------------|--------------------------------------------------------------------|
// | tradable             | price-compatibility predicate between an incoming order and a maker|
// | fillable_quantity    | dry-run: quantity fillable without mutating the book (Fok)          |
// | walk                 | mutates the book, producing trades, never crosses an untradable lvl|
// | run                  | orchestrates walk + post-walk resting/discard per order type        |
// | resolve_status       | derives the externally reported OrderStatus from a MatchOutcome     |
//--------------------------------------------------------------------------------------------------

use crate::domain::models::types::{Order, OrderStatus, OrderType, Sequence, Side, Trade, TradeId};
use crate::domain::services::orderbook::OrderBook;

/// True if an incoming order at `incoming_price` (None = market, trades
/// through any price) may trade against a resting order at `maker_price` on
/// the opposite side.
fn tradable(incoming_price: Option<i64>, incoming_side: Side, maker_price: i64) -> bool {
    match incoming_price {
        None => true,
        Some(limit) => match incoming_side {
            Side::Buy => limit >= maker_price,
            Side::Sell => limit <= maker_price,
        },
    }
}

/// The result of matching one incoming order against the book: the trades
/// produced (in execution order) and whatever quantity remains unfilled.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub trades: Vec<Trade>,
    pub remaining_qty: u64,
    /// Set only for a Fok order that could not be filled in full; in that
    /// case `trades` is always empty and the book is untouched.
    pub fok_rejected: bool,
}

/// Dry-run: the quantity fillable against `book`'s `side.opposite()` without
/// mutating anything, capped at `want`. Used by Fok to decide, before
/// walking for real, whether the full quantity is achievable.
fn fillable_quantity(book: &OrderBook, side: Side, limit_price: Option<i64>, want: u64) -> u64 {
    let mut filled = 0u64;
    for level in book.levels_best_first(side.opposite()) {
        if !tradable(limit_price, side, level.price) {
            break;
        }
        filled += level.volume();
        if filled >= want {
            return want;
        }
    }
    filled
}

/// Walks the opposite side of `book`, consuming resting liquidity at or
/// better than `limit_price` (None = unbounded, i.e. a market order) until
/// either `want` lots are filled or no more tradable liquidity remains.
/// Mutates `book` in place; never crosses a level that fails `tradable`
/// (the no-trade-through invariant, T1).
fn walk(
    book: &mut OrderBook,
    side: Side,
    limit_price: Option<i64>,
    taker_id: crate::domain::models::types::OrderId,
    taker_sequence: Sequence,
    mut want: u64,
    trade_id: &mut impl FnMut() -> TradeId,
) -> Vec<Trade> {
    let mut trades = Vec::new();
    let opposite = side.opposite();
    while want > 0 {
        let Some((maker_id, maker_price, maker_qty)) = book.best_head(opposite) else {
            break;
        };
        if !tradable(limit_price, side, maker_price) {
            break;
        }
        let traded = want.min(maker_qty);
        book.consume_best(opposite, traded);
        want -= traded;
        trades.push(Trade {
            trade_id: trade_id(),
            symbol: book.symbol.clone(),
            price: maker_price,
            quantity: traded,
            aggressor_side: side,
            maker_order_id: maker_id,
            taker_order_id: taker_id,
            timestamp: crate::domain::models::types::now(),
            sequence: taker_sequence,
        });
    }
    trades
}

/// Runs `order` against `book`: walks the opposite side, then applies the
/// order type's post-walk behavior (rest the remainder, or discard it).
/// Every trade produced carries `order.sequence` — the submission's own
/// arrival sequence, assigned once by the facade before `run` is ever
/// called (SPEC_FULL §4.3: "sequence assignment therefore belongs in the
/// facade, never in the matching core"). `trade_id` is called once per
/// trade, in execution order, drawing from its own id-space distinct from
/// arrival sequence.
pub fn run(book: &mut OrderBook, order: &Order, trade_id: &mut impl FnMut() -> TradeId) -> MatchOutcome {
    if order.order_type == OrderType::Fok {
        let fillable = fillable_quantity(book, order.side, order.price, order.remaining_qty);
        if fillable < order.remaining_qty {
            return MatchOutcome {
                trades: Vec::new(),
                remaining_qty: order.remaining_qty,
                fok_rejected: true,
            };
        }
    }

    let trades = walk(
        book,
        order.side,
        order.price,
        order.id,
        order.sequence,
        order.remaining_qty,
        trade_id,
    );
    let filled: u64 = trades.iter().map(|t| t.quantity).sum();
    let remaining_qty = order.remaining_qty - filled;

    if remaining_qty > 0 && order.order_type == OrderType::Limit {
        let mut resting = order.clone();
        resting.remaining_qty = remaining_qty;
        book.insert_resting(resting)
            .expect("Limit orders always carry a price (OrderType::requires_price)");
    }

    MatchOutcome {
        trades,
        remaining_qty,
        fok_rejected: false,
    }
}

/// Derives the externally reported status for an order from the outcome of
/// `run`, per the submission contract (SPEC_FULL §4.3, §8).
pub fn resolve_status(order_type: OrderType, original_qty: u64, outcome: &MatchOutcome) -> OrderStatus {
    if outcome.fok_rejected {
        return OrderStatus::Rejected;
    }
    if outcome.remaining_qty == 0 {
        return OrderStatus::Filled;
    }
    let filled = original_qty - outcome.remaining_qty;
    match order_type {
        OrderType::Limit if filled == 0 => OrderStatus::Resting,
        OrderType::Limit => OrderStatus::PartiallyFilledResting,
        _ => OrderStatus::PartiallyFilledCancelled,
    }
}
