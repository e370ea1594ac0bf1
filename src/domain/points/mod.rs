pub mod dto;
pub mod error;
pub mod gate;
pub mod lifecycle;
pub mod model;
pub mod policy;
pub mod recorder;
pub mod service;

pub use error::LedgerError;
pub use gate::SpendAuthorizationGate;
pub use lifecycle::{AccountLifecycleManager, ProvisionedAccount};
pub use model::{
    Account, AppendCondition, NewReservation, NewTransaction, Reservation, ReservationStatus,
    Settlement, Transaction, TransactionKind,
};
pub use policy::LedgerPolicy;
pub use recorder::TransactionRecorder;
pub use service::{DailyBonus, PointsService, PointsServiceApi, PointsSettings, SpendAuthorization};
