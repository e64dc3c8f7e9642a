//! Domain models shared between till-server and its clients

pub mod bill;
pub mod invoice;
pub mod payment;
pub mod product;

pub use bill::{Bill, BillItem, BillStatus, Customer, PaymentMode};
pub use invoice::{Invoice, InvoiceLine};
pub use payment::{PendingCheckout, VerifyRequest};
pub use product::{ProductInfo, ProductType, ProductUnit};
