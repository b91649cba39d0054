use crate::actor_system::{ActorRef, ReplyTo};

#[derive(Debug)]
pub enum CustomerMsg {
    HungryForPie,
    PutOnTable { food: String },
    NoPieLeft { reason: String },
}

#[derive(Debug)]
pub enum WaiterMsg {
    Order {
        customer: ActorRef<CustomerMsg>,
        wants: String,
    },
    AddToOrder {
        food: String,
    },
    Error {
        customer: ActorRef<CustomerMsg>,
        reason: String,
    },
    Tally {
        reply: ReplyTo<Tally>,
    },
}

#[derive(Debug)]
pub enum PieCaseMsg {
    GetSlice {
        customer: ActorRef<CustomerMsg>,
        waiter: ActorRef<WaiterMsg>,
    },
    Remaining {
        reply: ReplyTo<Vec<String>>,
    },
}

/// Orders the waiter has seen through, by result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub served: usize,
    pub refused: usize,
}

/// What happened at a customer's table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Served { customer: String, food: String },
    Sulked { customer: String, reason: String },
}
