//! Sending money between users and the pages for doing so.

mod core;
mod transfer_page;

pub use core::{
    TRANSFER_CATEGORY, Transfer, count_transfers, create_transfer, create_transfer_table,
    get_transfer,
};
pub use transfer_page::{create_transfer_endpoint, get_transfer_page};
