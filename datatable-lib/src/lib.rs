//! Server-paginated data table library
//!
//! A headless controller for tables whose rows live on a server. The server
//! does the sorting, filtering and paging; this crate decides when to fetch,
//! what to ask for, and which response is allowed to reach the screen.

pub mod column;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod sort;
pub mod transport;
pub mod wire;

mod table;

pub use column::ColumnSpec;
pub use column::Row;
pub use config::DataTableConfig;
pub use controller::DisplayState;
pub use controller::FetchHandle;
pub use controller::TableController;
pub use sort::Direction;
pub use sort::SortSpec;
pub use table::*;
