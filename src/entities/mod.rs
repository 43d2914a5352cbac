//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod coin_transaction;
pub mod notification;
pub mod system_state;
pub mod topup_request;
pub mod user;

// Re-export specific types to avoid conflicts
pub use coin_transaction::{
    Column as CoinTransactionColumn, Entity as CoinTransaction, Model as CoinTransactionModel,
    TransactionKind,
};
pub use notification::{
    Column as NotificationColumn, Entity as Notification, Model as NotificationModel,
    NotificationKind,
};
pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
pub use topup_request::{
    Column as TopupRequestColumn, Entity as TopupRequest, Model as TopupRequestModel, TopupStatus,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
