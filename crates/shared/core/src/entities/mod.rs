mod bar;
mod fill;
mod holding;
mod order;
mod order_status;
mod portfolio;
mod side;
mod target;

pub use bar::Bar;
pub use fill::Fill;
pub use holding::Holding;
pub use order::{Order, OrderId};
pub use order_status::OrderStatus;
pub use portfolio::PortfolioState;
pub use side::Side;
pub use target::{TargetPosition, TargetSide};
