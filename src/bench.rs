//! Throughput sweep over {backend x filter x transform x resolution}.

pub(crate) mod config;
pub(crate) mod driver;
pub(crate) mod report;
pub(crate) mod stats;
