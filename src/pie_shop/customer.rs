use tokio::sync::mpsc;

use crate::actor_system::{ActorContext, ActorRef, Reducer, async_trait};
use crate::pie_shop::messages::{CustomerMsg, Outcome, WaiterMsg};

/// A customer orders pie through its waiter and reacts to what lands on the table.
pub struct Customer {
    pub name: String,
    waiter: ActorRef<WaiterMsg>,
    observer: Option<mpsc::UnboundedSender<Outcome>>,
}

impl Customer {
    pub fn new(
        name: String,
        waiter: ActorRef<WaiterMsg>,
        observer: Option<mpsc::UnboundedSender<Outcome>>,
    ) -> Self {
        Self {
            name,
            waiter,
            observer,
        }
    }

    fn report(&self, outcome: Outcome) {
        if let Some(observer) = &self.observer {
            let _ = observer.send(outcome);
        }
    }
}

#[async_trait]
impl Reducer for Customer {
    type State = ();
    type Message = CustomerMsg;

    async fn reduce(
        &self,
        _state: &(),
        msg: CustomerMsg,
        ctx: &ActorContext<CustomerMsg>,
    ) -> anyhow::Result<()> {
        match msg {
            CustomerMsg::HungryForPie => {
                self.waiter.tell(WaiterMsg::Order {
                    customer: ctx.myself().clone(),
                    wants: "pie".to_string(),
                })?;
            }
            CustomerMsg::PutOnTable { food } => {
                log::info!("{} sees {} appear on the table", self.name, food);
                self.report(Outcome::Served {
                    customer: self.name.clone(),
                    food,
                });
            }
            CustomerMsg::NoPieLeft { reason } => {
                log::info!("{} sulks... ({})", self.name, reason);
                self.report(Outcome::Sulked {
                    customer: self.name.clone(),
                    reason,
                });
            }
        }
        Ok(())
    }
}
