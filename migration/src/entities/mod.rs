pub mod direct_call;
pub mod inventory;
pub mod medicine;
pub mod notification;
pub mod pharmacy;
pub mod reservation;
pub mod user;

pub use direct_call::Entity as DirectCallEntity;
pub use inventory::Entity as InventoryEntity;
pub use medicine::Entity as MedicineEntity;
pub use notification::Entity as NotificationEntity;
pub use pharmacy::Entity as PharmacyEntity;
pub use reservation::Entity as ReservationEntity;
pub use user::Entity as UserEntity;
