use std::collections::VecDeque;

use crate::actor_system::ActorContext;
use crate::pie_shop::messages::{CustomerMsg, PieCaseMsg, WaiterMsg};

pub const NO_PIE_LEFT: &str = "no pie left";

/// Hands out slices in the order they were put in the case.
///
/// An empty case answers with an error to the waiter and keeps serving.
pub fn reduce_pie_case(
    slices: &VecDeque<String>,
    msg: PieCaseMsg,
    ctx: &ActorContext<PieCaseMsg>,
) -> anyhow::Result<VecDeque<String>> {
    match msg {
        PieCaseMsg::GetSlice { customer, waiter } => {
            let mut remaining = slices.clone();
            match remaining.pop_front() {
                Some(slice) => {
                    log::debug!(
                        "{} hands out {} ({} left)",
                        ctx.myself().path(),
                        slice,
                        remaining.len()
                    );
                    customer.tell(CustomerMsg::PutOnTable {
                        food: slice.clone(),
                    })?;
                    // The slice is gone once the customer has it.
                    if let Err(e) = waiter.tell(WaiterMsg::AddToOrder { food: slice }) {
                        log::warn!(
                            "{} could not report to the waiter: {}",
                            ctx.myself().path(),
                            e
                        );
                    }
                    Ok(remaining)
                }
                None => {
                    log::debug!("{} is empty", ctx.myself().path());
                    waiter.tell(WaiterMsg::Error {
                        customer,
                        reason: NO_PIE_LEFT.to_string(),
                    })?;
                    Ok(remaining)
                }
            }
        }
        PieCaseMsg::Remaining { reply } => {
            reply.send(slices.iter().cloned().collect());
            Ok(slices.clone())
        }
    }
}
