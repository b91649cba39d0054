use crate::actor_system::{ActorContext, ActorPath, Reducer, async_trait};
use crate::pie_shop::messages::{CustomerMsg, PieCaseMsg, Tally, WaiterMsg};

pub const PIE_CASE: &str = "pieCase";

/// Relays orders to the pie case living under it and reports shortages back
/// to the customer who asked.
#[derive(Debug, Default)]
pub struct Waiter;

impl Waiter {
    fn pie_case_path(ctx: &ActorContext<WaiterMsg>) -> ActorPath {
        ctx.myself().path().clone() / PIE_CASE
    }
}

#[async_trait]
impl Reducer for Waiter {
    type State = Tally;
    type Message = WaiterMsg;

    async fn reduce(
        &self,
        tally: &Tally,
        msg: WaiterMsg,
        ctx: &ActorContext<WaiterMsg>,
    ) -> anyhow::Result<Tally> {
        match msg {
            WaiterMsg::Order { customer, wants } => {
                if wants != "pie" {
                    log::info!("Don't know how to order {}", wants);
                    return Ok(*tally);
                }
                let path = Self::pie_case_path(ctx);
                let pie_case = ctx
                    .system()
                    .lookup::<PieCaseMsg>(&path)
                    .ok_or_else(|| anyhow::anyhow!("no pie case at {}", path))?;
                pie_case.tell(PieCaseMsg::GetSlice {
                    customer,
                    waiter: ctx.myself().clone(),
                })?;
                Ok(*tally)
            }
            WaiterMsg::AddToOrder { food } => {
                log::debug!("Waiter adds {} to the bill", food);
                Ok(Tally {
                    served: tally.served + 1,
                    ..*tally
                })
            }
            WaiterMsg::Error { customer, reason } => {
                customer.tell(CustomerMsg::NoPieLeft { reason })?;
                Ok(Tally {
                    refused: tally.refused + 1,
                    ..*tally
                })
            }
            WaiterMsg::Tally { reply } => {
                reply.send(*tally);
                Ok(*tally)
            }
        }
    }
}
