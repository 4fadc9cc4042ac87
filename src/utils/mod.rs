pub mod eth_utils;
pub mod logging;
