//! Pie shop - customers, a waiter and a pie case exchanging orders, slices and refusals.

mod customer;
mod messages;
mod pie_case;
mod waiter;

use std::collections::VecDeque;

use tokio::sync::mpsc;
use tokio::time::Duration;

use crate::actor_system::{ActorError, ActorRef, ActorSystem};

pub use customer::Customer;
pub use messages::{CustomerMsg, Outcome, PieCaseMsg, Tally, WaiterMsg};
pub use pie_case::{NO_PIE_LEFT, reduce_pie_case};
pub use waiter::{PIE_CASE, Waiter};

pub const WAITER: &str = "waiter";
pub const CUSTOMER_PREFIX: &str = "customer-";

/// A running shop: `/waiter` with its `/waiter/pieCase`, plus seated customers.
pub struct PieShop {
    system: ActorSystem,
    waiter: ActorRef<WaiterMsg>,
    pie_case: ActorRef<PieCaseMsg>,
    observer: Option<mpsc::UnboundedSender<Outcome>>,
}

impl PieShop {
    pub fn open<I>(
        system: &ActorSystem,
        slices: I,
        observer: Option<mpsc::UnboundedSender<Outcome>>,
    ) -> Result<Self, ActorError>
    where
        I: IntoIterator<Item = String>,
    {
        let waiter = system.spawn(None, WAITER, Tally::default(), Waiter)?;
        let slices: VecDeque<String> = slices.into_iter().collect();
        log::info!("Opening the pie shop with {} slices", slices.len());
        let pie_case = system.spawn_fn(Some(waiter.id()), PIE_CASE, slices, reduce_pie_case)?;

        Ok(Self {
            system: system.clone(),
            waiter,
            pie_case,
            observer,
        })
    }

    /// Seats a customer at `/customer-<name>`.
    pub fn seat(&self, name: &str) -> Result<ActorRef<CustomerMsg>, ActorError> {
        let customer = Customer::new(
            name.to_string(),
            self.waiter.clone(),
            self.observer.clone(),
        );
        self.system
            .spawn(None, &format!("{CUSTOMER_PREFIX}{name}"), (), customer)
    }

    pub fn waiter(&self) -> &ActorRef<WaiterMsg> {
        &self.waiter
    }

    pub fn pie_case(&self) -> &ActorRef<PieCaseMsg> {
        &self.pie_case
    }

    pub async fn tally(&self, timeout: Duration) -> Result<Tally, ActorError> {
        self.waiter
            .query(|reply| WaiterMsg::Tally { reply }, timeout)
            .await
    }

    pub async fn remaining(&self, timeout: Duration) -> Result<Vec<String>, ActorError> {
        self.pie_case
            .query(|reply| PieCaseMsg::Remaining { reply }, timeout)
            .await
    }

    /// Stops the waiter, which takes the pie case down with it.
    pub fn close(&self) -> Result<(), ActorError> {
        self.waiter.stop()
    }
}
